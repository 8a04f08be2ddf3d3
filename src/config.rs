//! # Configuration Module
//!
//! Model shape and initialisation settings, stored as JSON in the platform
//! config directory:
//! - Linux: `~/.config/affinity/model.json`
//! - macOS: `~/Library/Application Support/affinity/model.json`
//! - Windows: `%APPDATA%\affinity\model.json`
//!
//! The default vocabulary sizes match the Spotify Million Playlist dataset.

use crate::error::{ScoreError, ScoreResult};
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Number of distinct tracks in the Million Playlist dataset.
pub const TRACK_VOCAB_SIZE: usize = 2_262_292;
/// Number of distinct albums.
pub const ALBUM_VOCAB_SIZE: usize = 734_684;
/// Number of distinct artists.
pub const ARTIST_VOCAB_SIZE: usize = 295_860;
/// Embedding width used when none is configured.
pub const DEFAULT_FEATURE_SIZE: usize = 64;
/// Parameter count above which building a model is worth a warning
/// (100M floats, 400 MB).
pub const LARGE_MODEL_PARAMETERS: usize = 100_000_000;

/// Shape and seed of a [`PlaylistModel`](crate::model::PlaylistModel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Width of each per-table vector; item embeddings are three times this.
    pub feature_size: usize,
    pub track_vocab_size: usize,
    pub album_vocab_size: usize,
    pub artist_vocab_size: usize,
    /// RNG seed for table initialisation.
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            feature_size: DEFAULT_FEATURE_SIZE,
            track_vocab_size: TRACK_VOCAB_SIZE,
            album_vocab_size: ALBUM_VOCAB_SIZE,
            artist_vocab_size: ARTIST_VOCAB_SIZE,
            seed: 0,
        }
    }
}

impl ModelConfig {
    /// Default vocabularies with an explicit feature size.
    pub fn with_feature_size(feature_size: usize) -> Self {
        Self {
            feature_size,
            ..Self::default()
        }
    }

    /// Reject shapes that cannot back an embedding table.
    pub fn validate(&self) -> ScoreResult<()> {
        let sizes = [
            ("feature_size", self.feature_size),
            ("track_vocab_size", self.track_vocab_size),
            ("album_vocab_size", self.album_vocab_size),
            ("artist_vocab_size", self.artist_vocab_size),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, size)| *size == 0) {
            return Err(ScoreError::InvalidConfig(format!("{name} must be > 0")));
        }
        self.checked_parameter_count().map(|_| ()).ok_or_else(|| {
            ScoreError::InvalidConfig(format!(
                "model of feature size {} overflows usize",
                self.feature_size
            ))
        })
    }

    /// Total number of floats across the three tables, `None` on overflow.
    pub fn checked_parameter_count(&self) -> Option<usize> {
        self.track_vocab_size
            .checked_add(self.album_vocab_size)?
            .checked_add(self.artist_vocab_size)?
            .checked_mul(self.feature_size)
    }

    /// Total number of floats across the three tables, saturating at
    /// `usize::MAX`.
    pub fn parameter_count(&self) -> usize {
        self.checked_parameter_count().unwrap_or(usize::MAX)
    }

    /// Whether initialising this model allocates more than
    /// [`LARGE_MODEL_PARAMETERS`] floats. The default config does.
    pub fn is_large(&self) -> bool {
        self.parameter_count() > LARGE_MODEL_PARAMETERS
    }

    /// Read a config from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not valid JSON, or describes an
    /// invalid shape.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model config at {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid model config JSON in {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Rejected model config from {}", path.display()))?;
        debug!("Loaded model config from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No model config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Write the config as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }
        let text = serde_json::to_string_pretty(self).context("Failed to serialise model config")?;
        fs::write(path, text)
            .with_context(|| format!("Failed to write model config to {}", path.display()))?;
        info!("Wrote model config to {}", path.display());
        Ok(())
    }
}

/// Returns the platform-appropriate config file path.
///
/// Creates the `affinity` directory under the system config directory if it
/// does not exist yet.
///
/// # Errors
///
/// - The system config directory cannot be determined
/// - The `affinity` subdirectory cannot be created
pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system config directory. Pass --config to choose a file explicitly."
        )
    })?;

    let affinity_dir = config_dir.join("affinity");
    fs::create_dir_all(&affinity_dir).with_context(|| {
        format!(
            "Failed to create config directory at {}. Please check file permissions.",
            affinity_dir.display()
        )
    })?;

    Ok(affinity_dir.join("model.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_vocab_sizes() {
        let config = ModelConfig::default();
        assert_eq!(config.track_vocab_size, 2_262_292);
        assert_eq!(config.album_vocab_size, 734_684);
        assert_eq!(config.artist_vocab_size, 295_860);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        let config = ModelConfig {
            album_vocab_size: 0,
            ..ModelConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ScoreError::InvalidConfig("album_vocab_size must be > 0".into()))
        );

        assert!(ModelConfig::with_feature_size(0).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_overflowing_shape() {
        let config = ModelConfig {
            feature_size: 1 << 62,
            track_vocab_size: 4,
            ..ModelConfig::default()
        };
        assert!(matches!(config.validate(), Err(ScoreError::InvalidConfig(_))));
        assert_eq!(config.checked_parameter_count(), None);
        assert_eq!(config.parameter_count(), usize::MAX);

        let vocab_sum = ModelConfig {
            track_vocab_size: usize::MAX,
            feature_size: 1,
            ..ModelConfig::default()
        };
        assert!(vocab_sum.validate().is_err());
    }

    #[test]
    fn test_large_model_detection() {
        assert!(ModelConfig::default().is_large());
        let small = ModelConfig {
            feature_size: 8,
            track_vocab_size: 1000,
            album_vocab_size: 100,
            artist_vocab_size: 10,
            seed: 0,
        };
        assert!(!small.is_large());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("model.json");
        let config = ModelConfig {
            feature_size: 8,
            track_vocab_size: 100,
            album_vocab_size: 50,
            artist_vocab_size: 20,
            seed: 42,
        };

        config.save(&path).unwrap();
        assert_eq!(ModelConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, r#"{ "feature_size": 16, "seed": 3 }"#).unwrap();

        let config = ModelConfig::load(&path).unwrap();
        assert_eq!(config.feature_size, 16);
        assert_eq!(config.seed, 3);
        assert_eq!(config.track_vocab_size, TRACK_VOCAB_SIZE);
    }

    #[test]
    fn test_load_rejects_invalid_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, r#"{ "feature_size": 0 }"#).unwrap();

        assert!(ModelConfig::load(&path).is_err());
    }

    #[test]
    fn test_load_or_default_when_missing() {
        let dir = TempDir::new().unwrap();
        let config = ModelConfig::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ModelConfig::default());
    }

    #[test]
    fn test_parameter_count() {
        let config = ModelConfig {
            feature_size: 4,
            track_vocab_size: 10,
            album_vocab_size: 5,
            artist_vocab_size: 2,
            seed: 0,
        };
        assert_eq!(config.parameter_count(), 68);
    }
}
