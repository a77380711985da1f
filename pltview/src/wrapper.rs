//! Fallback wrapper: prefer the native viewer when a graphical session is
//! available, otherwise hand over to the secondary implementation.

use crate::config::LauncherConfig;
use crate::context::InvocationContext;
use crate::error::LauncherError;
use crate::launch::{replace_with, LaunchRequest, ProcessReplacer};
use std::env;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Decides whether the native viewer can run in this session.
pub trait SessionProbe {
    fn native_usable(&self) -> bool;
}

pub struct EnvSessionProbe {
    vars: Vec<String>,
}

impl EnvSessionProbe {
    pub fn new(vars: Vec<String>) -> Self {
        Self { vars }
    }

    pub fn from_config(cfg: &LauncherConfig) -> Self {
        Self::new(cfg.session.display_vars.clone())
    }
}

impl SessionProbe for EnvSessionProbe {
    fn native_usable(&self) -> bool {
        self.vars
            .iter()
            .any(|var| env::var_os(var).is_some_and(|value| !value.is_empty()))
    }
}

pub fn which_lookup(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

pub fn locate_native<F>(ctx: &InvocationContext, cfg: &LauncherConfig, path_lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    let beside = ctx.launcher_dir().join(&cfg.alternate_name);
    if beside.is_file() {
        return Some(beside);
    }
    path_lookup(&cfg.alternate_name)
}

pub fn secondary_request<F>(
    cfg: &LauncherConfig,
    args: &[OsString],
    path_lookup: F,
) -> Result<LaunchRequest, LauncherError>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    let Some((program, leading)) = cfg.fallback.command.split_first() else {
        return Err(LauncherError::Config(
            "fallback.command must name a program".to_string(),
        ));
    };
    let resolved = path_lookup(program).ok_or_else(|| LauncherError::LaunchFailed {
        path: PathBuf::from(program),
        source: io::Error::new(
            io::ErrorKind::NotFound,
            "secondary implementation not found on PATH",
        ),
    })?;
    let mut full_args: Vec<OsString> = leading.iter().map(OsString::from).collect();
    full_args.extend(args.iter().cloned());
    Ok(LaunchRequest::new(resolved, full_args))
}

/// Runs the wrapper to completion. Only returns when nothing could be run.
pub fn run_wrapper<S, R, F>(
    ctx: &InvocationContext,
    cfg: &LauncherConfig,
    session: &S,
    replacer: &R,
    path_lookup: F,
) -> LauncherError
where
    S: SessionProbe,
    R: ProcessReplacer,
    F: Fn(&str) -> Option<PathBuf>,
{
    if session.native_usable() {
        match locate_native(ctx, cfg, &path_lookup) {
            Some(native) => {
                let request = LaunchRequest::new(native, ctx.args().to_vec());
                let err = replace_with(request, replacer);
                warn!(error = %err, "native viewer failed to start");
                eprintln!("Failed to run native viewer: {err}");
                eprintln!("Falling back to secondary implementation...");
            }
            None => debug!(name = %cfg.alternate_name, "native viewer not installed"),
        }
    } else {
        debug!("no graphical session; skipping native viewer");
    }

    match secondary_request(cfg, ctx.args(), &path_lookup) {
        Ok(request) => replace_with(request, replacer),
        Err(err) => err,
    }
}
