use crate::matcher::DEFAULT_THRESHOLD;
use crate::model::{default_search_keys, Item, WeightedKey};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown search key path '{0}'")]
    UnknownKeyPath(String),
    #[error("search key '{path}' has non-positive weight {weight}")]
    NonPositiveWeight { path: String, weight: f64 },
    #[error("threshold {0} is outside 0.0..=1.0")]
    InvalidThreshold(f64),
    #[error("section id '{0}' is declared twice")]
    DuplicateSection(String),
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub picker: PickerConfig,
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_search_keys")]
    pub keys: Vec<WeightedKey>,
}

fn default_threshold() -> f64 { DEFAULT_THRESHOLD }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            keys: default_search_keys(),
        }
    }
}

/// Popover lists end at the last row; dialogs take the full screen and get
/// a trailing padding row for the safe-area inset.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PresentationMode {
    #[default]
    Popover,
    Dialog,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SectionConfig {
    pub id: String,
    pub label: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PickerConfig {
    #[serde(default)]
    pub allow_custom_value: bool,
    #[serde(default = "default_custom_value_label")]
    pub custom_value_label: String,
    #[serde(default = "default_not_found_label")]
    pub not_found_label: String,
    #[serde(default = "default_empty_label")]
    pub empty_label: String,
    #[serde(default)]
    pub create_item_label: Option<String>,
    #[serde(default)]
    pub mode: PresentationMode,
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
}

fn default_custom_value_label() -> String { "Add custom item".to_string() }
fn default_not_found_label() -> String { "No matching items found".to_string() }
fn default_empty_label() -> String { "No items available".to_string() }

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            allow_custom_value: false,
            custom_value_label: default_custom_value_label(),
            not_found_label: default_not_found_label(),
            empty_label: default_empty_label(),
            create_item_label: None,
            mode: PresentationMode::default(),
            sections: Vec::new(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.search.threshold) {
            return Err(ConfigError::InvalidThreshold(self.search.threshold));
        }
        for key in &self.search.keys {
            if !key.path.is_known() {
                return Err(ConfigError::UnknownKeyPath(key.path.to_string()));
            }
            if key.weight <= 0.0 || !key.weight.is_finite() {
                return Err(ConfigError::NonPositiveWeight {
                    path: key.path.to_string(),
                    weight: key.weight,
                });
            }
        }
        for (i, section) in self.picker.sections.iter().enumerate() {
            if self.picker.sections[..i].iter().any(|s| s.id == section.id) {
                return Err(ConfigError::DuplicateSection(section.id.clone()));
            }
        }
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    ProjectDirs::from("org", "picker", "picker")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Loads `path`, or the platform config file when `None`. A missing file
/// yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

    if !config_path.exists() {
        log::debug!("No config at {:?}, using defaults", config_path);
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    parse_config(&content).with_context(|| format!("loading {}", config_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::KeyPath;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.search.keys, default_search_keys());
        assert_eq!(config.search.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.picker.mode, PresentationMode::Popover);
        assert!(!config.picker.allow_custom_value);
        assert!(config.items.is_empty());
    }

    #[test]
    fn parses_full_config() {
        let config = parse_config(
            r#"
            [search]
            threshold = 0.4
            keys = [
                { path = "primary", weight = 10 },
                { path = ["search_labels", "alias"], weight = 4 },
            ]

            [picker]
            allow_custom_value = true
            mode = "dialog"
            sections = [{ id = "rooms", label = "Rooms" }]

            [[items]]
            id = "kitchen"
            primary = "Kitchen"
            "#,
        )
        .unwrap();

        assert_eq!(config.search.threshold, 0.4);
        assert_eq!(config.search.keys[1].path, KeyPath::from("search_labels.alias"));
        assert_eq!(config.picker.mode, PresentationMode::Dialog);
        assert_eq!(config.picker.sections[0].label, "Rooms");
        assert_eq!(config.items[0].primary, "Kitchen");
    }

    #[test]
    fn rejects_bad_keys() {
        let err = parse_config("[search]\nkeys = [{ path = \"colour\", weight = 1 }]").unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::UnknownKeyPath(p)) if p == "colour"));

        let err = parse_config("[search]\nkeys = [{ path = \"primary\", weight = 0 }]").unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::NonPositiveWeight { .. })));

        let err = parse_config("[search]\nthreshold = 1.5").unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::InvalidThreshold(_))));
    }

    #[test]
    fn rejects_duplicate_sections() {
        let err = parse_config(
            "[picker]\nsections = [{ id = \"a\", label = \"A\" }, { id = \"a\", label = \"B\" }]",
        )
        .unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::DuplicateSection(_))));
    }

    #[test]
    fn empty_key_list_is_allowed() {
        let config = parse_config("[search]\nkeys = []").unwrap();
        assert!(config.search.keys.is_empty());
    }

    #[test]
    fn loads_from_path_or_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[picker]\nallow_custom_value = true").unwrap();
        assert!(load_config(Some(file.path())).unwrap().picker.allow_custom_value);

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("config.toml");
        assert!(!load_config(Some(&missing)).unwrap().picker.allow_custom_value);
    }
}
