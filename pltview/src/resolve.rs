//! Ordered probing of the places a viewer binary may be installed.
//!
//! The probe list is a single priority order: the first candidate that
//! exists wins and later probes are never consulted. New install layouts are
//! appended to [`Probe::ALL`], never special-cased.

use crate::config::LauncherConfig;
use crate::context::InvocationContext;
use crate::package::PackageLookup;
use serde::{Deserialize, Serialize};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Probe {
    PackageBinary,
    LauncherDir,
    LauncherParentDir,
    Argv0Suffixed,
    Argv0Alternate,
}

impl Probe {
    pub const ALL: [Probe; 5] = [
        Self::PackageBinary,
        Self::LauncherDir,
        Self::LauncherParentDir,
        Self::Argv0Suffixed,
        Self::Argv0Alternate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PackageBinary => "package_binary",
            Self::LauncherDir => "launcher_dir",
            Self::LauncherParentDir => "launcher_parent_dir",
            Self::Argv0Suffixed => "argv0_suffixed",
            Self::Argv0Alternate => "argv0_alternate",
        }
    }

    /// Installed siblings found through argv[0] must also carry an exec bit.
    fn requires_executable(&self) -> bool {
        matches!(self, Self::Argv0Suffixed | Self::Argv0Alternate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBinary {
    path: PathBuf,
    probe: Probe,
}

impl ResolvedBinary {
    pub fn new(path: PathBuf, probe: Probe) -> Self {
        Self { path, probe }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn probe(&self) -> Probe {
        self.probe
    }
}

/// Variables handed to the viewer only when the caller has not set them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentOverlay {
    entries: Vec<(String, PathBuf)>,
}

impl EnvironmentOverlay {
    pub fn insert(&mut self, key: &str, value: PathBuf) {
        if self.entries.iter().any(|(existing, _)| existing == key) {
            return;
        }
        self.entries.push((key.to_string(), value));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, PathBuf)] {
        &self.entries
    }

    /// Entries whose variable is absent according to `lookup`. A variable
    /// that is present, even empty, is never overwritten.
    pub fn pending_entries<F>(&self, lookup: F) -> Vec<(String, PathBuf)>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        self.entries
            .iter()
            .filter(|(key, _)| lookup(key).is_none())
            .cloned()
            .collect()
    }

    pub fn pending_in_process(&self) -> Vec<(String, PathBuf)> {
        self.pending_entries(|key| env::var_os(key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found {
        binary: ResolvedBinary,
        overlay: EnvironmentOverlay,
        probed: Vec<PathBuf>,
    },
    NotFound {
        probed: Vec<PathBuf>,
    },
}

impl Resolution {
    pub fn probed(&self) -> &[PathBuf] {
        match self {
            Self::Found { probed, .. } | Self::NotFound { probed } => probed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Accepted,
    Missing,
    NotAFile,
    NotExecutable,
    IsLauncher,
}

fn candidate_path<P: PackageLookup>(
    probe: Probe,
    ctx: &InvocationContext,
    cfg: &LauncherConfig,
    package: &P,
) -> Option<PathBuf> {
    match probe {
        Probe::PackageBinary => package.binary_path(),
        Probe::LauncherDir => Some(ctx.launcher_dir().join(&cfg.binary_name)),
        Probe::LauncherParentDir => ctx
            .launcher_dir()
            .parent()
            .map(|parent| parent.join(&cfg.binary_name)),
        Probe::Argv0Suffixed => Some(
            ctx.argv0_dir()
                .join(format!("{}{}", cfg.binary_name, cfg.sibling_suffix)),
        ),
        Probe::Argv0Alternate => Some(ctx.argv0_dir().join(&cfg.alternate_name)),
    }
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    true
}

fn judge(path: &Path, probe: Probe, launcher: Option<&Path>) -> Verdict {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(_) => return Verdict::Missing,
    };
    if !meta.is_file() {
        return Verdict::NotAFile;
    }
    if probe.requires_executable() && !is_executable(&meta) {
        return Verdict::NotExecutable;
    }
    if let Some(launcher) = launcher {
        if fs::canonicalize(path).ok().as_deref() == Some(launcher) {
            return Verdict::IsLauncher;
        }
    }
    Verdict::Accepted
}

/// Walks the configured probes in priority order. Reads the filesystem only;
/// the overlay is returned for the caller to apply at launch.
pub fn resolve<P: PackageLookup>(
    ctx: &InvocationContext,
    cfg: &LauncherConfig,
    package: &P,
) -> Resolution {
    let launcher = fs::canonicalize(ctx.launcher_path()).ok();
    let mut probed: Vec<PathBuf> = Vec::new();
    let mut overlay = EnvironmentOverlay::default();

    for probe in &cfg.resolver.probes {
        let probe = *probe;
        if probe == Probe::PackageBinary {
            if let Some(dir) = package.resource_dir() {
                debug!(var = %cfg.overlay_var, dir = %dir.display(), "recording resource overlay");
                overlay.insert(&cfg.overlay_var, dir);
            }
        }
        let Some(path) = candidate_path(probe, ctx, cfg, package) else {
            debug!(probe = probe.as_str(), "probe has no candidate");
            continue;
        };
        if probed.contains(&path) {
            continue;
        }
        probed.push(path.clone());

        let verdict = judge(&path, probe, launcher.as_deref());
        debug!(probe = probe.as_str(), path = %path.display(), ?verdict, "probed");
        if verdict == Verdict::Accepted {
            info!(probe = probe.as_str(), path = %path.display(), "resolved viewer binary");
            return Resolution::Found {
                binary: ResolvedBinary::new(path, probe),
                overlay,
                probed,
            };
        }
    }

    Resolution::NotFound { probed }
}
