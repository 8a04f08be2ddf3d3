//! Playlist continuation by embedding affinity.
//!
//! Core modules:
//! - [`model`] - Item triples, the three-table model, Embed and Score
//! - [`embedding`] - Bounds-checked embedding tables
//! - [`image_url`] - Pin image key to CDN URL conversion
//! - [`error`] - Typed scoring errors
//!
//! ### Supporting Modules
//!
//! - [`config`] - Model shape, seed and the JSON config file
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```
//! use affinity::config::ModelConfig;
//! use affinity::model::{ItemTriple, PlaylistModel};
//!
//! let config = ModelConfig {
//!     feature_size: 8,
//!     track_vocab_size: 100,
//!     album_vocab_size: 40,
//!     artist_vocab_size: 20,
//!     seed: 1,
//! };
//! let model = PlaylistModel::new(&config)?;
//!
//! let context = [ItemTriple::new(3, 1, 0), ItemTriple::new(17, 9, 4)];
//! let candidates = [ItemTriple::new(42, 9, 4), ItemTriple::new(3, 1, 0)];
//!
//! let scores = model.score(&context, &candidates)?;
//! assert_eq!(scores.len(), candidates.len());
//! # Ok::<(), affinity::error::ScoreError>(())
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`error::ScoreError`]: out-of-range ids and an
//! empty context fail fast instead of producing undefined scores. Config file
//! handling and the binary use `anyhow` for context-rich errors.

pub mod cli;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod error;
pub mod image_url;
pub mod model;

pub use error::{ScoreError, ScoreResult};
pub use image_url::key_to_url;
pub use model::{ItemTriple, PlaylistModel};
