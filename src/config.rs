use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const CONFIG_FILENAME: &str = ".furigana.json";

/// Which of the two notation-rendering pipelines an operation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingsPattern {
    /// Pre-existing annotations are canonicalized through the bracket
    /// grammar on both sides of generation.
    Ruby,
    /// Pre-existing ruby markup passes through byte-identical; only bracket
    /// occurrences are rendered.
    Brackets,
}

/// External annotator command invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    #[serde(default = "default_generator_command")]
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,
}

const DEFAULT_GENERATOR_COMMAND: &str = "mecab-furigana";

fn default_generator_command() -> String {
    DEFAULT_GENERATOR_COMMAND.into()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_GENERATOR_COMMAND.into(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_readings_pattern")]
    pub readings_pattern: ReadingsPattern,

    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Emit informational notices (nothing to generate, no readings found)
    #[serde(default = "default_notify")]
    pub notify: bool,
}

const DEFAULT_READINGS_PATTERN: ReadingsPattern = ReadingsPattern::Ruby;
const DEFAULT_NOTIFY: bool = true;

fn default_readings_pattern() -> ReadingsPattern {
    DEFAULT_READINGS_PATTERN
}
fn default_notify() -> bool {
    DEFAULT_NOTIFY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            readings_pattern: DEFAULT_READINGS_PATTERN,
            generator: GeneratorConfig::default(),
            notify: DEFAULT_NOTIFY,
        }
    }
}

/// Parse a configuration file
pub fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| Error::Config {
        message: format!("{}: {e}", path.display()),
    })
}

/// Load configuration from file, applying environment variable overrides.
/// Loaded fresh per invocation and injected into the pipeline; the engine
/// never reads ambient global state.
pub fn load_config() -> Config {
    let mut config = find_config_file()
        .and_then(|path| match read_config(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                crate::output::print_error(&e.to_string());
                None
            }
        })
        .unwrap_or_default();

    // Apply environment variable overrides
    if let Ok(val) = std::env::var("FURIGANA_READINGS_PATTERN") {
        match val.as_str() {
            "ruby" => config.readings_pattern = ReadingsPattern::Ruby,
            "brackets" => config.readings_pattern = ReadingsPattern::Brackets,
            other => {
                crate::output::print_error(&format!("Unknown readings pattern: {other}"));
            }
        }
    }
    if let Ok(val) = std::env::var("FURIGANA_GENERATOR_CMD") {
        config.generator.command = val;
    }

    config
}

/// Search for config file in standard locations
fn find_config_file() -> Option<PathBuf> {
    let search_paths = [
        std::env::current_dir().ok(),
        dirs::home_dir(),
        dirs::config_dir().map(|p| p.join("furigana-ruby")),
    ];

    for base in search_paths.into_iter().flatten() {
        let config_path = base.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.readings_pattern, ReadingsPattern::Ruby);
        assert_eq!(config.generator.command, "mecab-furigana");
        assert!(config.generator.args.is_empty());
        assert!(config.notify);
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.readings_pattern, ReadingsPattern::Ruby);
        assert!(config.notify);
    }

    #[test]
    fn test_deserialize_partial() {
        let json = r#"{"readingsPattern": "brackets"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.readings_pattern, ReadingsPattern::Brackets);
        assert_eq!(config.generator.command, "mecab-furigana"); // default
    }

    #[test]
    fn test_deserialize_generator_override() {
        let json = r#"{"generator": {"command": "kakasi", "args": ["-JH"]}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.generator.command, "kakasi");
        assert_eq!(config.generator.args, vec!["-JH"]);
    }

    #[test]
    fn test_read_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"readingsPattern": "brackets", "notify": false}}"#).unwrap();
        let config = read_config(&path).unwrap();
        assert_eq!(config.readings_pattern, ReadingsPattern::Brackets);
        assert!(!config.notify);
    }

    #[test]
    fn test_read_config_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            read_config(&path),
            Err(Error::Config { .. })
        ));
    }
}
