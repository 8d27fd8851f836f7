use qti_workbench_engine::model::{Format, SpecVersion};
use qti_workbench_engine::scoring::{ScoringOptions, SliderTolerance};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Defaults for headless use. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Format for new documents and generated items.
    pub default_format: Format,
    /// Vocabulary version for generated markup.
    pub spec_version: SpecVersion,
    /// Where generated items are written; standard output when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    // A table in TOML, so it comes after the plain values.
    pub slider_tolerance: SliderTolerance,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_format: Format::Markup,
            spec_version: SpecVersion::V3_0,
            output_dir: None,
            slider_tolerance: SliderTolerance::default(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the output directory
        config.output_dir = config
            .output_dir
            .map(|dir| Self::expand_path(&dir).unwrap_or(dir));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// The file at `~/.config/qti-workbench/config.toml`, or the defaults.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/qti-workbench");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn scoring_options(&self) -> ScoringOptions {
        ScoringOptions {
            slider_tolerance: self.slider_tolerance,
        }
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/qti-workbench/config.toml"));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(
            config.scoring_options().slider_tolerance,
            SliderTolerance::HalfStep
        );
    }

    #[test]
    fn test_full_config() {
        let config: Config = toml::from_str(
            r#"
default_format = "object"
spec_version = "2.1"
slider_tolerance = { mode = "absolute", value = 2.5 }
output_dir = "/srv/items"
"#,
        )
        .unwrap();

        assert_eq!(
            config,
            Config {
                default_format: Format::StructuredObject,
                spec_version: SpecVersion::V2_1,
                slider_tolerance: SliderTolerance::Absolute(2.5),
                output_dir: Some(PathBuf::from("/srv/items")),
            }
        );
    }

    #[test]
    fn test_exact_tolerance() {
        let config: Config = toml::from_str(r#"slider_tolerance = { mode = "exact" }"#).unwrap();
        assert_eq!(config.slider_tolerance, SliderTolerance::Exact);
    }

    #[test]
    fn test_unknown_version_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "spec_version = \"4.0\"\n").unwrap();

        let error = Config::load_from_path(&config_file).unwrap_err();
        assert!(matches!(error, ConfigError::ConfigParseError { .. }));
        assert!(error.to_string().starts_with("Failed to parse config file at"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("QTI_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$QTI_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path);
        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/subdir")));

        unsafe {
            env::remove_var("QTI_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_path_with_relative_path() {
        let path = PathBuf::from("relative/path");
        assert_eq!(Config::expand_path(&path), Some(path));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/config.toml");
        let test_config = Config {
            default_format: Format::StructuredObject,
            spec_version: SpecVersion::V3_0,
            slider_tolerance: SliderTolerance::Absolute(0.25),
            output_dir: Some(PathBuf::from("/tmp/generated")),
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_tilde_in_output_dir_is_expanded() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "output_dir = \"~/qti/out\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        let output_dir = config.output_dir.unwrap();
        assert!(!output_dir.to_string_lossy().starts_with('~'));
        assert!(output_dir.to_string_lossy().ends_with("qti/out"));
    }
}
