//! YAML configuration file support.
//!
//! Every stage of the originality pipeline can be configured from a single
//! YAML file. Sections that are left out fall back to the stage defaults.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "course-gate"
//!
//! canonical:
//!   version: 1
//!   languages: ["python", "javascript", "rust"]
//!   max_source_bytes: 1048576
//!   parse_timeout_micros: 2000000
//!
//! perceptual:
//!   version: 1
//!   k: 5
//!   w: 4
//!   seed: 0
//!   ignore_whitespace: true
//!   use_parallel: true
//!
//! text:
//!   shingle_size: 3
//!   seed: 0
//!   saturation: 32
//!   extract_fenced_code: true
//!
//! image:
//!   algorithm: "phash64"
//!   bits: 64
//!   saturation: 32
//!
//! report:
//!   use_parallel: true
//! ```

use std::fs;
use std::path::Path;

use canonical::{Language, NormalizerConfig};
use matcher::{HashScoring, ReportConfig};
use perceptual::PerceptualConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hashers::SimHasher;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration for the whole pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct OriginalityConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub canonical: CanonicalYamlConfig,

    #[serde(default)]
    pub perceptual: PerceptualYamlConfig,

    #[serde(default)]
    pub text: TextYamlConfig,

    #[serde(default)]
    pub image: ImageYamlConfig,

    #[serde(default)]
    pub report: ReportYamlConfig,
}

impl OriginalityConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: OriginalityConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigLoadError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.canonical.validate()?;
        self.perceptual.validate()?;
        self.text.validate()?;
        self.image.validate()?;
        self.to_report_config()
            .validate()
            .map_err(|err| ConfigLoadError::Validation(err.to_string()))?;
        Ok(())
    }

    pub fn to_normalizer_config(&self) -> Result<NormalizerConfig, ConfigLoadError> {
        Ok(NormalizerConfig::new()
            .with_version(self.canonical.version)
            .with_languages(self.canonical.parsed_languages()?)
            .with_max_source_bytes(self.canonical.max_source_bytes)
            .with_parse_timeout_micros(self.canonical.parse_timeout_micros))
    }

    pub fn to_perceptual_config(&self) -> PerceptualConfig {
        let p = &self.perceptual;
        PerceptualConfig::new()
            .with_version(p.version)
            .with_k(p.k)
            .with_w(p.w)
            .with_seed(p.seed)
            .with_ignore_whitespace(p.ignore_whitespace)
            .with_max_input_chars(p.max_input_chars)
            .with_parallel(p.use_parallel)
    }

    pub fn to_report_config(&self) -> ReportConfig {
        ReportConfig::new()
            .with_text_scoring(HashScoring::new(SimHasher::BITS, self.text.saturation))
            .with_image_scoring(HashScoring::new(self.image.bits, self.image.saturation))
            .with_parallel(self.report.use_parallel)
    }

    pub fn text_hasher(&self) -> SimHasher {
        SimHasher::new(self.text.shingle_size, self.text.seed)
    }
}

impl Default for OriginalityConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            canonical: CanonicalYamlConfig::default(),
            perceptual: PerceptualYamlConfig::default(),
            text: TextYamlConfig::default(),
            image: ImageYamlConfig::default(),
            report: ReportYamlConfig::default(),
        }
    }
}

/// Normalizer configuration in YAML format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Language tags, aliases such as `py` or `js` are accepted.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: usize,

    #[serde(default = "default_parse_timeout_micros")]
    pub parse_timeout_micros: u64,
}

impl CanonicalYamlConfig {
    fn parsed_languages(&self) -> Result<Vec<Language>, ConfigLoadError> {
        self.languages
            .iter()
            .map(|tag| {
                Language::from_tag(tag).ok_or_else(|| {
                    ConfigLoadError::Validation(format!("canonical.languages: unknown `{tag}`"))
                })
            })
            .collect()
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.version == 0 {
            return Err(ConfigLoadError::Validation(
                "canonical.version must be >= 1".to_string(),
            ));
        }
        if self.languages.is_empty() {
            return Err(ConfigLoadError::Validation(
                "canonical.languages must not be empty".to_string(),
            ));
        }
        self.parsed_languages()?;
        if self.max_source_bytes == 0 {
            return Err(ConfigLoadError::Validation(
                "canonical.max_source_bytes must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CanonicalYamlConfig {
    fn default() -> Self {
        Self {
            version: 1,
            languages: default_languages(),
            max_source_bytes: default_max_source_bytes(),
            parse_timeout_micros: default_parse_timeout_micros(),
        }
    }
}

/// Winnowing configuration in YAML format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerceptualYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_k")]
    pub k: usize,

    #[serde(default = "default_w")]
    pub w: usize,

    #[serde(default)]
    pub seed: u64,

    #[serde(default = "true_value")]
    pub ignore_whitespace: bool,

    /// `0` disables the bound.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    #[serde(default)]
    pub use_parallel: bool,
}

impl PerceptualYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.version == 0 {
            return Err(ConfigLoadError::Validation(
                "perceptual.version must be >= 1".to_string(),
            ));
        }
        if self.k == 0 {
            return Err(ConfigLoadError::Validation(
                "perceptual.k must be >= 1".to_string(),
            ));
        }
        if self.w == 0 {
            return Err(ConfigLoadError::Validation(
                "perceptual.w must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PerceptualYamlConfig {
    fn default() -> Self {
        Self {
            version: 1,
            k: default_k(),
            w: default_w(),
            seed: 0,
            ignore_whitespace: true,
            max_input_chars: default_max_input_chars(),
            use_parallel: false,
        }
    }
}

/// Chapter prose hashing in YAML format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextYamlConfig {
    /// Words per SimHash feature.
    #[serde(default = "default_shingle_size")]
    pub shingle_size: usize,

    #[serde(default)]
    pub seed: u64,

    /// Hamming distance at which prose counts as fully original.
    #[serde(default = "default_saturation")]
    pub saturation: u32,

    /// Lift fenced code out of Markdown chapters into code units.
    #[serde(default = "true_value")]
    pub extract_fenced_code: bool,
}

impl TextYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.shingle_size == 0 {
            return Err(ConfigLoadError::Validation(
                "text.shingle_size must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for TextYamlConfig {
    fn default() -> Self {
        Self {
            shingle_size: default_shingle_size(),
            seed: 0,
            saturation: default_saturation(),
            extract_fenced_code: true,
        }
    }
}

/// Image hash scheme in YAML format
///
/// Image hashes come from an external hasher or are precomputed, so this
/// section only documents their algorithm tag and width.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageYamlConfig {
    #[serde(default = "default_image_algorithm")]
    pub algorithm: String,

    #[serde(default = "default_bits")]
    pub bits: u32,

    #[serde(default = "default_saturation")]
    pub saturation: u32,
}

impl ImageYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.algorithm.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "image.algorithm must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ImageYamlConfig {
    fn default() -> Self {
        Self {
            algorithm: default_image_algorithm(),
            bits: default_bits(),
            saturation: default_saturation(),
        }
    }
}

/// Report configuration in YAML format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportYamlConfig {
    #[serde(default = "true_value")]
    pub use_parallel: bool,
}

impl Default for ReportYamlConfig {
    fn default() -> Self {
        Self { use_parallel: true }
    }
}

// Helper functions for serde defaults
fn default_version() -> u32 {
    1
}
fn true_value() -> bool {
    true
}
fn default_languages() -> Vec<String> {
    Language::ALL.iter().map(|l| l.tag().to_string()).collect()
}
fn default_max_source_bytes() -> usize {
    1024 * 1024
}
fn default_parse_timeout_micros() -> u64 {
    2_000_000
}
fn default_k() -> usize {
    5
}
fn default_w() -> usize {
    4
}
fn default_max_input_chars() -> usize {
    1_000_000
}
fn default_shingle_size() -> usize {
    SimHasher::DEFAULT_SHINGLE_SIZE
}
fn default_bits() -> u32 {
    64
}
fn default_saturation() -> u32 {
    32
}
fn default_image_algorithm() -> String {
    "phash64".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
version: "1.0"
name: "course gate"
canonical:
  languages: ["py", "js"]
perceptual:
  k: 7
"#;

        let config = OriginalityConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name, Some("course gate".to_string()));
        assert_eq!(config.perceptual.k, 7);
        assert_eq!(config.perceptual.w, 4);

        let normalizer = config.to_normalizer_config().unwrap();
        assert!(normalizer.is_enabled(Language::Python));
        assert!(normalizer.is_enabled(Language::JavaScript));
        assert!(!normalizer.is_enabled(Language::Rust));
    }

    #[test]
    fn test_load_from_file() {
        let yaml = r#"
version: "1"
report:
  use_parallel: false
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = OriginalityConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.version, "1");
        assert!(!config.to_report_config().use_parallel);
    }

    #[test]
    fn test_missing_file() {
        let result = OriginalityConfig::from_file("/nonexistent/originality.yaml");
        assert!(matches!(result, Err(ConfigLoadError::FileRead(_))));
    }

    #[test]
    fn test_default_config() {
        let config = OriginalityConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.to_perceptual_config(), PerceptualConfig::default());
        assert_eq!(config.to_report_config(), ReportConfig::default());
        assert_eq!(
            config.to_normalizer_config().unwrap(),
            NormalizerConfig::default()
        );
    }

    #[test]
    fn test_stage_versions_carried() {
        let yaml = r#"
version: "1"
canonical:
  version: 3
perceptual:
  version: 2
"#;

        let config = OriginalityConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.to_perceptual_config().params().version, 2);
        assert_eq!(config.to_normalizer_config().unwrap().version, 3);
    }

    #[test]
    fn test_unsupported_version() {
        let result = OriginalityConfig::from_yaml("version: \"2.0\"\n");
        assert!(matches!(
            result,
            Err(ConfigLoadError::UnsupportedVersion(v)) if v == "2.0"
        ));
    }

    #[test]
    fn test_perceptual_validation() {
        let yaml = r#"
version: "1.0"
perceptual:
  w: 0
"#;

        let result = OriginalityConfig::from_yaml(yaml);
        assert!(result.unwrap_err().to_string().contains("w must be >= 1"));
    }

    #[test]
    fn test_canonical_validation() {
        let empty = OriginalityConfig::from_yaml("version: \"1\"\ncanonical:\n  languages: []\n");
        assert!(empty.unwrap_err().to_string().contains("must not be empty"));

        let unknown =
            OriginalityConfig::from_yaml("version: \"1\"\ncanonical:\n  languages: [cobol]\n");
        assert!(unknown.unwrap_err().to_string().contains("cobol"));
    }

    #[test]
    fn test_saturation_validation() {
        let yaml = r#"
version: "1.0"
image:
  bits: 64
  saturation: 65
"#;

        let result = OriginalityConfig::from_yaml(yaml);
        assert!(matches!(result, Err(ConfigLoadError::Validation(_))));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = OriginalityConfig::default();
        config.name = Some("roundtrip".into());
        config.image.algorithm = "dhash64".into();
        config.text.extract_fenced_code = false;

        let yaml = config.to_yaml().unwrap();
        let parsed = OriginalityConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
    }
}
