use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Exit status when no viewer binary was found (also used for config errors).
pub const EXIT_NOT_FOUND: u8 = 1;
/// Exit status when a resolved binary could not be executed.
pub const EXIT_LAUNCH_FAILED: u8 = 126;

#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("viewer binary not found ({} locations probed)", probed.len())]
    NotFound { probed: Vec<PathBuf> },
    #[error("failed to launch {}: {source}", path.display())]
    LaunchFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LauncherError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::LaunchFailed { .. } => EXIT_LAUNCH_FAILED,
            _ => EXIT_NOT_FOUND,
        }
    }
}
