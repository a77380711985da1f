use crate::error::LauncherError;
use std::env;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Snapshot of how this process was invoked. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    launcher_path: PathBuf,
    argv0_path: PathBuf,
    args: Vec<OsString>,
}

impl InvocationContext {
    pub fn new(launcher_path: PathBuf, argv0_path: PathBuf, args: Vec<OsString>) -> Self {
        Self {
            launcher_path,
            argv0_path,
            args,
        }
    }

    /// Captures the running process: its own executable, argv[0] as the
    /// shell passed it, and the trailing arguments untouched.
    pub fn capture() -> Result<Self, LauncherError> {
        let exe = env::current_exe()?;
        let launcher_path = fs::canonicalize(&exe).unwrap_or(exe);
        let mut raw = env::args_os();
        let argv0 = raw.next().unwrap_or_default();
        let args: Vec<OsString> = raw.collect();
        let argv0_path = absolute_argv0(&argv0, || env::current_dir().ok(), which_lookup)
            .unwrap_or_else(|| launcher_path.clone());
        Ok(Self::new(launcher_path, argv0_path, args))
    }

    pub fn launcher_path(&self) -> &Path {
        &self.launcher_path
    }

    pub fn launcher_dir(&self) -> &Path {
        self.launcher_path.parent().unwrap_or_else(|| Path::new("/"))
    }

    pub fn argv0_path(&self) -> &Path {
        &self.argv0_path
    }

    pub fn argv0_dir(&self) -> &Path {
        self.argv0_path.parent().unwrap_or_else(|| Path::new("/"))
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

fn which_lookup(name: &OsStr) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Makes argv[0] absolute the way a shell would have found it. Symlinks are
/// left alone so a linked invocation keeps its own directory. The working
/// directory is only consulted for relative names; `None` when it is needed
/// but unavailable.
pub fn absolute_argv0<C, W>(argv0: &OsStr, cwd: C, path_lookup: W) -> Option<PathBuf>
where
    C: FnOnce() -> Option<PathBuf>,
    W: FnOnce(&OsStr) -> Option<PathBuf>,
{
    if argv0.is_empty() {
        return None;
    }
    let path = Path::new(argv0);
    if path.is_absolute() {
        return Some(normalize_lexically(path));
    }
    if path.components().count() == 1 {
        if let Some(found) = path_lookup(argv0) {
            return Some(normalize_lexically(&found));
        }
    }
    let cwd = cwd()?;
    Some(normalize_lexically(&cwd.join(path)))
}

pub(crate) fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cwd_at(dir: &'static str) -> impl FnOnce() -> Option<PathBuf> {
        move || Some(PathBuf::from(dir))
    }

    fn no_path(_: &OsStr) -> Option<PathBuf> {
        None
    }

    #[test]
    fn relative_argv0_with_separator_joins_cwd() {
        let resolved =
            absolute_argv0(OsStr::new("./bin/pltview"), cwd_at("/home/user/data"), no_path)
                .unwrap();
        assert_eq!(resolved, PathBuf::from("/home/user/data/bin/pltview"));
    }

    #[test]
    fn parent_components_collapse() {
        let resolved =
            absolute_argv0(OsStr::new("../tools/pltview"), cwd_at("/home/user/data"), no_path)
                .unwrap();
        assert_eq!(resolved, PathBuf::from("/home/user/tools/pltview"));
    }

    #[test]
    fn absolute_argv0_is_kept() {
        let resolved = absolute_argv0(
            OsStr::new("/opt/pltview/bin/pltview"),
            || panic!("working directory consulted for an absolute path"),
            no_path,
        )
        .unwrap();
        assert_eq!(resolved, PathBuf::from("/opt/pltview/bin/pltview"));
    }

    #[test]
    fn empty_argv0_yields_nothing() {
        assert!(absolute_argv0(OsStr::new(""), cwd_at("/tmp"), no_path).is_none());
    }

    #[test]
    fn bare_name_found_on_path_uses_lookup_dir() {
        let resolved = absolute_argv0(
            OsStr::new("pltview"),
            || panic!("working directory consulted for a PATH hit"),
            |name| Some(Path::new("/usr/local/bin/../bin").join(name)),
        )
        .unwrap();
        assert_eq!(resolved, PathBuf::from("/usr/local/bin/pltview"));
    }

    #[test]
    fn bare_name_missing_from_path_joins_cwd() {
        let mut looked_up = None;
        let resolved = absolute_argv0(OsStr::new("pltview"), cwd_at("/srv/plots"), |name| {
            looked_up = Some(name.to_os_string());
            None
        })
        .unwrap();
        assert_eq!(looked_up, Some(OsString::from("pltview")));
        assert_eq!(resolved, PathBuf::from("/srv/plots/pltview"));
    }

    #[test]
    fn separator_path_skips_path_lookup() {
        let resolved = absolute_argv0(OsStr::new("bin/pltview"), cwd_at("/srv"), |_| {
            panic!("PATH consulted for a name with a separator")
        })
        .unwrap();
        assert_eq!(resolved, PathBuf::from("/srv/bin/pltview"));
    }

    #[test]
    fn relative_argv0_without_cwd_yields_nothing() {
        assert!(absolute_argv0(OsStr::new("./pltview"), || None, no_path).is_none());
        assert!(absolute_argv0(OsStr::new("pltview"), || None, no_path).is_none());
    }

    #[test]
    fn dirs_come_from_parents() {
        let ctx = InvocationContext::new(
            PathBuf::from("/opt/pltview/libexec/pltview"),
            PathBuf::from("/usr/local/bin/pltview"),
            vec![OsString::from("plt00100")],
        );
        assert_eq!(ctx.launcher_dir(), Path::new("/opt/pltview/libexec"));
        assert_eq!(ctx.argv0_dir(), Path::new("/usr/local/bin"));
        assert_eq!(ctx.args(), &[OsString::from("plt00100")]);
    }
}
