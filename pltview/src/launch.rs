use crate::error::LauncherError;
use crate::resolve::{EnvironmentOverlay, ResolvedBinary};
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::Command;
use tracing::info;

/// Everything needed to hand the process over to another program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub program: PathBuf,
    pub arg0: OsString,
    pub args: Vec<OsString>,
    pub env: Vec<(String, PathBuf)>,
}

impl LaunchRequest {
    pub fn new(program: PathBuf, args: Vec<OsString>) -> Self {
        Self {
            arg0: program.clone().into_os_string(),
            program,
            args,
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, env: Vec<(String, PathBuf)>) -> Self {
        self.env = env;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

pub trait ProcessReplacer {
    /// Replaces the current process. Returns only when that was impossible.
    fn replace(&self, request: &LaunchRequest) -> io::Error;
}

pub struct ExecReplacer;

impl ProcessReplacer for ExecReplacer {
    #[cfg(unix)]
    fn replace(&self, request: &LaunchRequest) -> io::Error {
        use std::os::unix::process::CommandExt;
        let mut cmd = request.command();
        cmd.arg0(&request.arg0);
        cmd.exec()
    }

    // No exec here: run the child with our stdio and mirror its exit code.
    #[cfg(not(unix))]
    fn replace(&self, request: &LaunchRequest) -> io::Error {
        match request.command().status() {
            Ok(status) => std::process::exit(status.code().unwrap_or(1)),
            Err(err) => err,
        }
    }
}

pub fn launch_request(
    binary: &ResolvedBinary,
    overlay: &EnvironmentOverlay,
    args: &[OsString],
) -> LaunchRequest {
    LaunchRequest::new(binary.path().to_path_buf(), args.to_vec())
        .with_env(overlay.pending_in_process())
}

/// Hands the process to `request.program`. Any return is a failure.
pub fn replace_with<R: ProcessReplacer>(request: LaunchRequest, replacer: &R) -> LauncherError {
    info!(
        program = %request.program.display(),
        args = request.args.len(),
        overlay = request.env.len(),
        "replacing launcher process"
    );
    let source = replacer.replace(&request);
    LauncherError::LaunchFailed {
        path: request.program,
        source,
    }
}

pub fn launch<R: ProcessReplacer>(
    binary: &ResolvedBinary,
    overlay: &EnvironmentOverlay,
    args: &[OsString],
    replacer: &R,
) -> LauncherError {
    replace_with(launch_request(binary, overlay, args), replacer)
}
