//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `affinity` binary.
//!
//! ## Commands
//!
//! - `url`: Convert pin image keys to CDN URLs
//! - `score`: Rank candidate items against a listening context
//! - `config`: Show or initialise the model config file
//! - `completion`: Generate shell completion scripts
//!
//! ## Examples
//!
//! ```bash
//! affinity url abcdef1234
//! affinity score --context 1:2:3 --context 4:5:6 --candidate 7:8:9 --candidate 1:2:3
//! affinity config init --feature-size 32
//! ```

use crate::model::ItemTriple;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "affinity")]
#[command(about = "Playlist continuation by embedding affinity")]
#[command(version)]
pub struct Args {
    /// Model config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "AFFINITY_CONFIG", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert pinterest image keys into CDN URLs
    ///
    /// Prints one URL per key. Keys are normally lowercase hex hashes; shorter
    /// keys than six characters are accepted and give short path segments.
    Url {
        /// One or more image keys
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Rank candidate items by affinity to a listening context
    ///
    /// Items are written TRACK:ALBUM:ARTIST. Each candidate is scored by its
    /// best inner product with any context item, using a model initialised
    /// from the config and seed.
    ///
    /// Without a config file the full Million Playlist vocabularies are used,
    /// which allocates about 840 MB of weights at feature size 64. Use
    /// --feature-size and the --*-vocab flags (or `config init`) to shrink it.
    Score {
        /// Context item (repeatable, at least one)
        #[arg(long = "context", short = 'c', required = true)]
        context: Vec<ItemTriple>,

        /// Candidate item (repeatable)
        #[arg(long = "candidate", short = 'n', required = true)]
        candidates: Vec<ItemTriple>,

        #[command(flatten)]
        overrides: ModelOverrides,

        /// Only print the best N candidates
        #[arg(long)]
        top: Option<usize>,
    },

    /// Show or initialise the model config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    ///
    /// Usage: affinity completion bash > ~/.local/share/bash-completion/completions/affinity
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Command-line overrides for the loaded model config.
#[derive(clap::Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct ModelOverrides {
    /// Width of each track/album/artist vector
    #[arg(long)]
    pub feature_size: Option<usize>,

    /// Track vocabulary size
    #[arg(long)]
    pub track_vocab: Option<usize>,

    /// Album vocabulary size
    #[arg(long)]
    pub album_vocab: Option<usize>,

    /// Artist vocabulary size
    #[arg(long)]
    pub artist_vocab: Option<usize>,

    /// Seed for embedding initialisation
    #[arg(long)]
    pub seed: Option<u64>,
}

impl ModelOverrides {
    /// Apply every override that was given on top of `config`.
    pub fn apply(&self, config: &mut crate::config::ModelConfig) {
        if let Some(v) = self.feature_size {
            config.feature_size = v;
        }
        if let Some(v) = self.track_vocab {
            config.track_vocab_size = v;
        }
        if let Some(v) = self.album_vocab {
            config.album_vocab_size = v;
        }
        if let Some(v) = self.artist_vocab {
            config.artist_vocab_size = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
    }
}

/// Config file actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective config as JSON
    Show,

    /// Write a config file with defaults plus any overrides
    Init {
        #[command(flatten)]
        overrides: ModelOverrides,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
