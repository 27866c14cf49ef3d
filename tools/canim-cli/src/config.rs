//! canim.toml parsing

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG: &str = "canim.toml";

#[derive(Debug, Default, Deserialize)]
pub struct CanimConfig {
    #[serde(default)]
    pub batch: BatchSection,
    #[serde(default)]
    pub save: SaveSection,
}

/// Which files batch operations pick up
#[derive(Debug, Deserialize)]
pub struct BatchSection {
    #[serde(default = "default_anim_extension")]
    pub anim_extension: String,
    #[serde(default = "default_meta_extension")]
    pub meta_extension: String,
    #[serde(default = "default_json_suffix")]
    pub json_suffix: String,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            anim_extension: default_anim_extension(),
            meta_extension: default_meta_extension(),
            json_suffix: default_json_suffix(),
        }
    }
}

fn default_anim_extension() -> String {
    "canim".to_string()
}

fn default_meta_extension() -> String {
    "canim-meta".to_string()
}

fn default_json_suffix() -> String {
    "json".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SaveSection {
    /// Copy an existing container to `<file>.bak` before overwriting it,
    /// unless a backup already exists
    #[serde(default = "default_backup")]
    pub backup: bool,
}

impl Default for SaveSection {
    fn default() -> Self {
        Self {
            backup: default_backup(),
        }
    }
}

fn default_backup() -> bool {
    true
}

impl CanimConfig {
    /// Load `explicit`, else `./canim.toml` when present, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG);
                if default.is_file() {
                    Self::load_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse canim.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CanimConfig::parse("").unwrap();
        assert_eq!(config.batch.anim_extension, "canim");
        assert_eq!(config.batch.meta_extension, "canim-meta");
        assert_eq!(config.batch.json_suffix, "json");
        assert!(config.save.backup);
    }

    #[test]
    fn test_config_overrides() {
        let config = CanimConfig::parse(
            r#"
[batch]
anim_extension = "anim"

[save]
backup = false
"#,
        )
        .unwrap();
        assert_eq!(config.batch.anim_extension, "anim");
        assert_eq!(config.batch.meta_extension, "canim-meta");
        assert!(!config.save.backup);
    }

    #[test]
    fn test_config_rejects_bad_types() {
        assert!(CanimConfig::parse("[save]\nbackup = \"yes\"").is_err());
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CanimConfig::load(Some(dir.path().join("missing.toml").as_path())).is_err());
    }
}
