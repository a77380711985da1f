use crate::error::LauncherError;
use crate::resolve::Probe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_YAML: &str = include_str!("../config/default.yaml");
pub const CONFIG_ENV: &str = "PLTVIEW_CONFIG";
const SUPPORTED_VERSION: u32 = 1;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    pub version: u32,
    pub binary_name: String,
    pub sibling_suffix: String,
    pub alternate_name: String,
    pub overlay_var: String,
    pub package: PackageConfig,
    pub resolver: ResolverConfig,
    pub session: SessionConfig,
    pub fallback: FallbackConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PackageConfig {
    pub root: String,
    pub binary_file: String,
    pub resource_dir: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub probes: Vec<Probe>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub display_vars: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FallbackConfig {
    pub command: Vec<String>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_VERSION,
            binary_name: "pltview".to_string(),
            sibling_suffix: "_bin".to_string(),
            alternate_name: "pltview_c".to_string(),
            overlay_var: "PLTVIEW_MAP_LAYERS".to_string(),
            package: PackageConfig::default(),
            resolver: ResolverConfig::default(),
            session: SessionConfig::default(),
            fallback: FallbackConfig::default(),
        }
    }
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            root: String::new(),
            binary_file: "pltview_bin".to_string(),
            resource_dir: "map_layers".to_string(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            probes: Probe::ALL.to_vec(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            display_vars: vec!["DISPLAY".to_string()],
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "python3".to_string(),
                "-m".to_string(),
                "pltview".to_string(),
            ],
        }
    }
}

/// Where the config file is read from, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    UserDefault(PathBuf),
    Builtin,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pltview").join("launcher.yaml"))
}

pub fn resolve_config_source() -> ConfigSource {
    if let Some(path) = env::var_os(CONFIG_ENV) {
        if !path.is_empty() {
            return ConfigSource::Explicit(PathBuf::from(path));
        }
    }
    match default_config_path() {
        Some(path) if path.is_file() => ConfigSource::UserDefault(path),
        _ => ConfigSource::Builtin,
    }
}

pub fn load_config() -> Result<LauncherConfig, LauncherError> {
    match resolve_config_source() {
        ConfigSource::Explicit(path) => {
            if !path.exists() {
                return Err(LauncherError::Config(format!(
                    "{CONFIG_ENV} points at a missing file: {}",
                    path.display()
                )));
            }
            read_config(&path)
        }
        ConfigSource::UserDefault(path) => read_config(&path),
        ConfigSource::Builtin => read_config_from_str(DEFAULT_CONFIG_YAML),
    }
}

pub fn read_config(path: &Path) -> Result<LauncherConfig, LauncherError> {
    let content = fs::read_to_string(path)?;
    read_config_from_str(&content).map_err(|err| match err {
        LauncherError::Config(message) => {
            LauncherError::Config(format!("{}: {message}", path.display()))
        }
        other => other,
    })
}

pub fn read_config_from_str(content: &str) -> Result<LauncherConfig, LauncherError> {
    let cfg: LauncherConfig = serde_yaml::from_str(content)?;
    if cfg.version != SUPPORTED_VERSION {
        return Err(LauncherError::Config(format!(
            "unsupported config version {}",
            cfg.version
        )));
    }
    validate_config(&cfg)?;
    Ok(cfg)
}

fn validate_file_name(value: &str, field: &str) -> Result<(), LauncherError> {
    if value.trim().is_empty() {
        return Err(LauncherError::Config(format!("{field} must be non-empty")));
    }
    if value.contains('/') || value.contains('\\') || value == "." || value == ".." {
        return Err(LauncherError::Config(format!(
            "{field} must be a plain file name, got '{value}'"
        )));
    }
    Ok(())
}

pub fn validate_config(cfg: &LauncherConfig) -> Result<(), LauncherError> {
    validate_file_name(&cfg.binary_name, "binary_name")?;
    validate_file_name(&cfg.alternate_name, "alternate_name")?;
    validate_file_name(&cfg.package.binary_file, "package.binary_file")?;
    validate_file_name(&cfg.package.resource_dir, "package.resource_dir")?;
    if cfg.sibling_suffix.trim().is_empty() {
        return Err(LauncherError::Config(
            "sibling_suffix must be non-empty".to_string(),
        ));
    }
    if cfg.sibling_suffix.contains('/') || cfg.sibling_suffix.contains('\\') {
        return Err(LauncherError::Config(
            "sibling_suffix must not contain a path separator".to_string(),
        ));
    }
    if cfg.overlay_var.trim().is_empty() || cfg.overlay_var.contains('=') {
        return Err(LauncherError::Config(
            "overlay_var must be a non-empty variable name without '='".to_string(),
        ));
    }
    if cfg.resolver.probes.is_empty() {
        return Err(LauncherError::Config(
            "resolver.probes must contain at least one probe".to_string(),
        ));
    }
    let mut seen = BTreeSet::new();
    for probe in &cfg.resolver.probes {
        if !seen.insert(probe.as_str()) {
            return Err(LauncherError::Config(format!(
                "resolver.probes lists '{}' more than once",
                probe.as_str()
            )));
        }
    }
    if cfg.session.display_vars.iter().any(|var| var.trim().is_empty()) {
        return Err(LauncherError::Config(
            "session.display_vars must not contain empty names".to_string(),
        ));
    }
    match cfg.fallback.command.first() {
        Some(program) if !program.trim().is_empty() => {}
        _ => {
            return Err(LauncherError::Config(
                "fallback.command must name a program".to_string(),
            ))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn embedded_defaults_match_builtin_defaults() {
        let cfg = read_config_from_str(DEFAULT_CONFIG_YAML).unwrap();
        assert_eq!(cfg, LauncherConfig::default());
    }

    #[test]
    fn omitted_keys_keep_defaults() {
        let cfg = read_config_from_str("version: 1\nalternate_name: viewer_native\n").unwrap();
        assert_eq!(cfg.alternate_name, "viewer_native");
        assert_eq!(cfg.binary_name, "pltview");
        assert_eq!(cfg.resolver.probes, Probe::ALL.to_vec());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = read_config_from_str("version: 1\nbinary_nmae: x\n").unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let err = read_config_from_str("version: 7\n").unwrap_err();
        assert!(err.to_string().contains("unsupported config version 7"));
    }

    #[test]
    fn binary_name_with_separator_is_rejected() {
        let err = read_config_from_str("version: 1\nbinary_name: bin/pltview\n").unwrap_err();
        assert!(err.to_string().contains("binary_name must be a plain file name"));
    }

    #[test]
    fn duplicate_probes_are_rejected() {
        let yaml = "version: 1\nresolver:\n  probes: [launcher_dir, package_binary, launcher_dir]\n";
        let err = read_config_from_str(yaml).unwrap_err();
        assert!(err.to_string().contains("'launcher_dir' more than once"));
    }

    #[test]
    fn empty_probe_list_is_rejected() {
        let err = read_config_from_str("version: 1\nresolver:\n  probes: []\n").unwrap_err();
        assert!(err.to_string().contains("at least one probe"));
    }

    #[test]
    fn empty_fallback_command_is_rejected() {
        let err = read_config_from_str("version: 1\nfallback:\n  command: []\n").unwrap_err();
        assert!(err.to_string().contains("fallback.command"));
    }

    #[test]
    fn read_config_prefixes_validation_errors_with_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("launcher.yaml");
        fs::write(&path, "version: 1\nsibling_suffix: ''\n").unwrap();
        let err = read_config(&path).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("launcher.yaml"));
        assert!(message.contains("sibling_suffix must be non-empty"));
    }
}
