use crate::config::LauncherConfig;
use crate::context::normalize_lexically;
use std::env;
use std::path::{Path, PathBuf};

pub const PACKAGE_DIR_ENV: &str = "PLTVIEW_PACKAGE_DIR";

/// Trusted metadata of the installed viewer package.
pub trait PackageLookup {
    /// Where the package expects the compiled viewer. The path may not exist.
    fn binary_path(&self) -> Option<PathBuf>;
    /// Supplementary resource directory, only when it exists.
    fn resource_dir(&self) -> Option<PathBuf>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    root: PathBuf,
    binary_file: String,
    resource_dir: String,
}

impl InstalledPackage {
    pub fn new(root: PathBuf, binary_file: &str, resource_dir: &str) -> Self {
        Self {
            root,
            binary_file: binary_file.to_string(),
            resource_dir: resource_dir.to_string(),
        }
    }

    pub fn from_config(cfg: &LauncherConfig, launcher_dir: &Path) -> Self {
        let env_root = env::var(PACKAGE_DIR_ENV).ok();
        let root = package_root(env_root.as_deref(), &cfg.package.root, launcher_dir);
        Self::new(root, &cfg.package.binary_file, &cfg.package.resource_dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn package_root(env_root: Option<&str>, configured: &str, launcher_dir: &Path) -> PathBuf {
    if let Some(root) = env_root {
        if !root.trim().is_empty() {
            return PathBuf::from(root);
        }
    }
    if !configured.trim().is_empty() {
        return PathBuf::from(configured);
    }
    normalize_lexically(&launcher_dir.join("..").join("lib").join("pltview"))
}

impl PackageLookup for InstalledPackage {
    fn binary_path(&self) -> Option<PathBuf> {
        Some(self.root.join(&self.binary_file))
    }

    fn resource_dir(&self) -> Option<PathBuf> {
        let installed = self.root.join(&self.resource_dir);
        if installed.is_dir() {
            return Some(installed);
        }
        // source checkouts keep the layers beside the package directory
        let dev = self.root.parent()?.join(&self.resource_dir);
        dev.is_dir().then_some(dev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn env_root_wins_over_config_and_default() {
        let root = package_root(Some("/srv/pkg"), "/etc/pkg", Path::new("/usr/bin"));
        assert_eq!(root, PathBuf::from("/srv/pkg"));
    }

    #[test]
    fn blank_env_root_falls_back_to_config() {
        let root = package_root(Some("  "), "/etc/pkg", Path::new("/usr/bin"));
        assert_eq!(root, PathBuf::from("/etc/pkg"));
    }

    #[test]
    fn default_root_is_lib_dir_beside_launcher_dir() {
        let root = package_root(None, "", Path::new("/usr/bin"));
        assert_eq!(root, PathBuf::from("/usr/lib/pltview"));
    }

    #[test]
    fn resource_dir_prefers_installed_layout() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("pltview_pkg");
        fs::create_dir_all(root.join("map_layers")).unwrap();
        fs::create_dir_all(dir.path().join("map_layers")).unwrap();
        let pkg = InstalledPackage::new(root.clone(), "pltview_bin", "map_layers");
        assert_eq!(pkg.resource_dir(), Some(root.join("map_layers")));
    }

    #[test]
    fn resource_dir_falls_back_to_dev_layout() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("pltview_pkg");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(dir.path().join("map_layers")).unwrap();
        let pkg = InstalledPackage::new(root, "pltview_bin", "map_layers");
        assert_eq!(pkg.resource_dir(), Some(dir.path().join("map_layers")));
    }

    #[test]
    fn resource_dir_absent_when_nothing_exists() {
        let dir = tempdir().unwrap();
        let pkg = InstalledPackage::new(dir.path().join("pltview_pkg"), "pltview_bin", "map_layers");
        assert_eq!(pkg.resource_dir(), None);
        assert_eq!(
            pkg.binary_path(),
            Some(dir.path().join("pltview_pkg").join("pltview_bin"))
        );
    }
}
