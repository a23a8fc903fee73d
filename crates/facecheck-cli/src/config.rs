use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_OUTPUT: &str = "RESULTADO_RECONSTRUIDO.jpg";
const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

/// Runtime configuration: defaults, then the optional TOML file, then
/// `FACECHECK_*` environment variables. CLI flags are applied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory containing ONNX model files.
    pub model_dir: PathBuf,
    /// Where the composite image is written.
    pub output_path: PathBuf,
    /// Context padding around each face, in [0, 1].
    pub padding_ratio: f32,
    /// Minimum detector confidence for a face to be reported.
    pub min_confidence: f32,
    /// Whether eligible faces get an enhancement pass.
    pub enhance: bool,
}

/// Keys accepted in the TOML file. All optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub model_dir: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub padding_ratio: Option<f32>,
    pub min_confidence: Option<f32>,
    pub enhance: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            padding_ratio: facecheck_core::DEFAULT_PADDING_RATIO,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            enhance: true,
        }
    }
}

impl Config {
    /// Load from `FACECHECK_CONFIG` (if set) and the process environment.
    pub fn load() -> Result<Self> {
        let file = match std::env::var_os("FACECHECK_CONFIG") {
            Some(path) => Some(FileConfig::read(Path::new(&path))?),
            None => None,
        };
        Ok(Self::from_sources(file, |key| std::env::var(key).ok()))
    }

    /// Layer a parsed file and an environment lookup over the defaults.
    pub fn from_sources(file: Option<FileConfig>, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(file) = file {
            if let Some(dir) = file.model_dir {
                config.model_dir = dir;
            }
            if let Some(out) = file.output_path {
                config.output_path = out;
            }
            if let Some(ratio) = file.padding_ratio {
                config.padding_ratio = ratio;
            }
            if let Some(conf) = file.min_confidence {
                config.min_confidence = conf;
            }
            if let Some(enhance) = file.enhance {
                config.enhance = enhance;
            }
        }

        if let Some(dir) = env("FACECHECK_MODEL_DIR") {
            config.model_dir = PathBuf::from(dir);
        }
        if let Some(out) = env("FACECHECK_OUTPUT") {
            config.output_path = PathBuf::from(out);
        }
        config.padding_ratio = env_f32(&env, "FACECHECK_PADDING", config.padding_ratio);
        config.min_confidence = env_f32(&env, "FACECHECK_MIN_CONFIDENCE", config.min_confidence);
        config.enhance = env_bool(&env, "FACECHECK_ENHANCE", config.enhance);

        config.padding_ratio = config.padding_ratio.clamp(0.0, 1.0);
        config
    }

    /// Path to the SCRFD detection model.
    pub fn scrfd_model_path(&self) -> PathBuf {
        self.model_dir.join("det_10g.onnx")
    }
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// `$XDG_DATA_HOME/facecheck/models`, falling back to `~/.local/share`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("facecheck")
        .join("models")
}

fn env_f32(env: &impl Fn(&str) -> Option<String>, key: &str, default: f32) -> f32 {
    match env(key).map(|v| v.trim().parse::<f32>()) {
        Some(Ok(v)) if v.is_finite() => v,
        Some(_) => {
            tracing::warn!(key, "ignoring unparsable value");
            default
        }
        None => default,
    }
}

fn env_bool(env: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    env(key).map(|v| v.trim() != "0").unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = Config::from_sources(None, lookup(&[]));
        assert_eq!(config.output_path, PathBuf::from("RESULTADO_RECONSTRUIDO.jpg"));
        assert!((config.padding_ratio - 0.10).abs() < 1e-6);
        assert!((config.min_confidence - 0.5).abs() < 1e-6);
        assert!(config.enhance);
        assert!(config.model_dir.ends_with("facecheck/models"));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = FileConfig::parse(
            r#"
            output_path = "from_file.png"
            padding_ratio = 0.2
            enhance = false
            "#,
        )
        .unwrap();
        let config = Config::from_sources(
            Some(file),
            lookup(&[("FACECHECK_OUTPUT", "from_env.jpg"), ("FACECHECK_ENHANCE", "1")]),
        );
        assert_eq!(config.output_path, PathBuf::from("from_env.jpg"));
        assert!((config.padding_ratio - 0.2).abs() < 1e-6);
        assert!(config.enhance);
    }

    #[test]
    fn test_enhance_disabled_by_zero() {
        let config = Config::from_sources(None, lookup(&[("FACECHECK_ENHANCE", "0")]));
        assert!(!config.enhance);
    }

    #[test]
    fn test_padding_is_clamped() {
        let config = Config::from_sources(None, lookup(&[("FACECHECK_PADDING", "3.5")]));
        assert_eq!(config.padding_ratio, 1.0);
        let config = Config::from_sources(None, lookup(&[("FACECHECK_PADDING", "-0.4")]));
        assert_eq!(config.padding_ratio, 0.0);
    }

    #[test]
    fn test_bad_env_value_keeps_previous_layer() {
        let file = FileConfig::parse("min_confidence = 0.7").unwrap();
        let env = lookup(&[("FACECHECK_MIN_CONFIDENCE", "high")]);
        let config = Config::from_sources(Some(file), env);
        assert!((config.min_confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_file_key_rejected() {
        assert!(FileConfig::parse("sharpness_threshold = 10").is_err());
    }

    #[test]
    fn test_model_path_joins_dir() {
        let config = Config::from_sources(None, lookup(&[("FACECHECK_MODEL_DIR", "/opt/models")]));
        assert_eq!(config.scrfd_model_path(), PathBuf::from("/opt/models/det_10g.onnx"));
    }
}
