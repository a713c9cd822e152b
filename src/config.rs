use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "djangoscope.toml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub discovery: DiscoveryConfig,
    pub models: ModelConfig,
    pub routes: RouteConfig,
    pub output: OutputConfig,
}

/// Which files are scanned and which directories are pruned
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// File name of model-bearing files
    pub model_file: String,
    /// File name of route-bearing files
    pub route_file: String,
    /// Directory names never descended into
    pub exclude_dirs: Vec<String>,
}

/// Shape of a data-model declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Module alias in `class X(<alias>.<base>)` and `<alias>.<Name>Field(...)`
    pub module_alias: String,
    /// Base class name, bare or behind the alias
    pub base_class: String,
    /// Suffix a callee must end with to count as a field
    pub field_suffix: String,
}

/// Shape of a route-registration call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Bare function names treated as route registration
    pub functions: Vec<String>,
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            model_file: "models.py".to_string(),
            route_file: "urls.py".to_string(),
            exclude_dirs: vec![
                ".venv".to_string(),
                "venv".to_string(),
                "__pycache__".to_string(),
                "node_modules".to_string(),
            ],
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            module_alias: "models".to_string(),
            base_class: "Model".to_string(),
            field_suffix: "Field".to_string(),
        }
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            functions: vec!["path".to_string()],
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file, or return defaults when the file does not exist.
    /// A file that exists but is invalid is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(&mut self, exclude: Vec<String>, format: Option<String>) {
        for dir in exclude {
            if !self.discovery.exclude_dirs.contains(&dir) {
                self.discovery.exclude_dirs.push(dir);
            }
        }

        if let Some(fmt) = format {
            self.output.format = match fmt.as_str() {
                "json" => OutputFormat::Json,
                _ => OutputFormat::Text,
            };
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (key, name) in [
            ("model_file", &self.discovery.model_file),
            ("route_file", &self.discovery.route_file),
        ] {
            if name.is_empty() {
                return Err(Error::config_validation(format!("{} must not be empty", key)));
            }
            if name.contains('/') || name.contains('\\') {
                return Err(Error::config_validation(format!(
                    "{} must be a file name, not a path: {}",
                    key, name
                )));
            }
        }

        if self.models.module_alias.is_empty() || self.models.base_class.is_empty() {
            return Err(Error::config_validation(
                "module_alias and base_class must not be empty",
            ));
        }

        if self.models.field_suffix.is_empty() {
            return Err(Error::config_validation("field_suffix must not be empty"));
        }

        if self.routes.functions.is_empty() {
            return Err(Error::config_validation(
                "at least one route function required",
            ));
        }

        if self.routes.functions.iter().any(|f| f.is_empty()) {
            return Err(Error::config_validation("route function names must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.discovery.model_file, "models.py");
        assert_eq!(config.discovery.route_file, "urls.py");
        assert_eq!(config.discovery.exclude_dirs.len(), 4);
        assert_eq!(config.models.module_alias, "models");
        assert_eq!(config.models.base_class, "Model");
        assert_eq!(config.models.field_suffix, "Field");
        assert_eq!(config.routes.functions, vec!["path".to_string()]);
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[discovery]
exclude_dirs = ["env", "build"]

[routes]
functions = ["path", "re_path"]

[output]
format = "json"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.discovery.exclude_dirs, vec!["env", "build"]);
        assert_eq!(config.discovery.model_file, "models.py");
        assert_eq!(config.routes.functions, vec!["path", "re_path"]);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/djangoscope.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/djangoscope.toml")).unwrap();
        assert_eq!(config.discovery.model_file, "models.py");
    }

    #[test]
    fn test_load_or_default_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[routes]\nfunctions = []").unwrap();
        assert!(Config::load_or_default(file.path()).is_err());
    }

    #[test]
    fn test_validation_empty_route_functions() {
        let mut config = Config::default();
        config.routes.functions.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_file_name_with_separator() {
        let mut config = Config::default();
        config.discovery.model_file = "app/models.py".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_empty_suffix() {
        let mut config = Config::default();
        config.models.field_suffix.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_cli_exclude() {
        let mut config = Config::default();
        config.merge_cli(vec!["build".to_string(), "venv".to_string()], None);
        assert_eq!(config.discovery.exclude_dirs.len(), 5);
        assert!(config.discovery.exclude_dirs.contains(&"build".to_string()));
    }

    #[test]
    fn test_merge_cli_format() {
        let mut config = Config::default();
        config.merge_cli(vec![], Some("json".to_string()));
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_output_format_parsing() {
        let toml_str = r#"format = "json""#;
        let output: OutputConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(output.format, OutputFormat::Json);
    }
}
