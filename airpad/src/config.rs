//! Daemon configuration: one JSON file with nested sections
//!
//! Every field has a default, so a missing or partial file degrades to a
//! working setup; the file only needs to say what differs. Passing an
//! explicit `--config` path flips that around: a path the operator named
//! must exist and parse, or startup fails.
//!
//! ```json
//! {
//!   "network": { "listen_addr": "0.0.0.0:5005" },
//!   "model":   { "model_path": "model.json", "scaler_path": "scaler.json" },
//!   "pipeline": {
//!     "confidence_threshold": 0.7,
//!     "actions": { "jump": { "key": "space" } }
//!   }
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use airpad_pipeline::PipelineConfig;

/// Where to look when no `--config` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Where the collector listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// UDP bind address for the sensor stream.
    pub listen_addr: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5005".into(),
        }
    }
}

/// Where the inference artifacts live.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Classifier weights, classes, and feature set.
    pub model_path: PathBuf,
    /// Per-feature standardization parameters.
    pub scaler_path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: "model.json".into(),
            scaler_path: "scaler.json".into(),
        }
    }
}

/// Top-level daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub model: ModelConfig,
    pub pipeline: PipelineConfig,
}

/// Load configuration from `explicit`, or from [`DEFAULT_CONFIG_PATH`].
///
/// An explicit path that cannot be read or parsed is fatal. The default
/// path is allowed to be absent; any other problem with it is still
/// fatal, since silently ignoring a broken file hides typos.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig> {
    match explicit {
        Some(path) => read_file(path),
        None => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            match fs::read_to_string(path) {
                Ok(contents) => parse(&contents)
                    .with_context(|| format!("parsing config file {}", path.display())),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    log::info!("no {DEFAULT_CONFIG_PATH} found, using built-in defaults");
                    Ok(AppConfig::default())
                }
                Err(err) => {
                    Err(err).with_context(|| format!("reading config file {}", path.display()))
                }
            }
        }
    }
}

fn read_file(path: &Path) -> Result<AppConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse(&contents).with_context(|| format!("parsing config file {}", path.display()))
}

fn parse(contents: &str) -> Result<AppConfig> {
    Ok(serde_json::from_str(contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    use airpad_pipeline::ActionKind;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.network.listen_addr, "0.0.0.0:5005");
        assert_eq!(cfg.model.model_path, PathBuf::from("model.json"));
        assert_eq!(cfg.model.scaler_path, PathBuf::from("scaler.json"));
        assert_eq!(cfg.pipeline.confidence_threshold, 0.7);
        assert!(cfg.pipeline.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_sections_default() {
        let cfg = parse(r#"{ "network": { "listen_addr": "127.0.0.1:9000" } }"#).unwrap();
        assert_eq!(cfg.network.listen_addr, "127.0.0.1:9000");
        assert_eq!(cfg.model.model_path, PathBuf::from("model.json"));
        assert_eq!(cfg.pipeline.window_capacity, 50);
    }

    #[test]
    fn pipeline_section_reaches_the_runtime_config() {
        let cfg = parse(
            r#"{
                "pipeline": {
                    "confidence_threshold": 0.85,
                    "history_length": 5,
                    "actions": {
                        "jump": { "key": "up", "cooldown_s": 0.5 },
                        "walk": { "key": "w", "kind": "sustained" }
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.pipeline.confidence_threshold, 0.85);
        assert_eq!(cfg.pipeline.history_length, 5);
        let table = cfg.pipeline.validate().unwrap();
        assert_eq!(table.len(), 2);

        let jump = table
            .get(airpad_core::GestureLabel::Jump)
            .expect("jump stays bound");
        assert_eq!(jump.kind, ActionKind::Momentary);
        assert_eq!(jump.cooldown_s, 0.5);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse("{ not json").is_err());
    }

    #[test]
    fn explicit_missing_path_is_fatal() {
        let missing = Path::new("/nonexistent/airpad-config.json");
        assert!(load(Some(missing)).is_err());
    }

    #[test]
    fn explicit_file_is_read() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "network": {{ "listen_addr": "0.0.0.0:7001" }} }}"#).unwrap();

        let cfg = load(Some(file.path())).unwrap();
        assert_eq!(cfg.network.listen_addr, "0.0.0.0:7001");
    }
}
