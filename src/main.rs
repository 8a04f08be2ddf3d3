//! # affinity
//!
//! Command-line front end for the affinity library.
//!
//! ## Usage
//!
//! ```bash
//! # Pin image URLs
//! affinity url abcdef1234 0a1b2c3d
//!
//! # Rank candidates against a context with a small seeded model
//! affinity score --feature-size 16 --seed 7 \
//!     -c 10:4:2 -c 11:4:2 -n 12:5:2 -n 900:30:17
//!
//! # Write a config file
//! affinity config init --feature-size 32
//! ```

use affinity::cli::{self, ConfigAction};
use affinity::config::{self, ModelConfig};
use affinity::{completion, image_url, model};
use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Resolve the config path: explicit flag or env var first, then the
/// platform default.
fn config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => config::get_config_path(),
    }
}

/// Main entry point.
///
/// Logging is controlled through `RUST_LOG`:
/// - `RUST_LOG=debug affinity score ...` - Enable debug logging
/// - `RUST_LOG=affinity::embedding=debug affinity score ...` - Module-specific logging
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    match args.command {
        cli::Command::Url { keys } => {
            for key in &keys {
                println!("{}", image_url::key_to_url(key));
            }
        }
        cli::Command::Score {
            context,
            candidates,
            overrides,
            top,
        } => {
            let path = config_path(args.config)?;
            let mut model_config = ModelConfig::load_or_default(&path)?;
            overrides.apply(&mut model_config);
            debug!("Effective model config: {model_config:?}");

            if model_config.is_large() {
                warn!(
                    "Initialising {} parameters (about {} MB). Pass --feature-size and \
                     --track-vocab/--album-vocab/--artist-vocab for a smaller model.",
                    model_config.parameter_count(),
                    model_config.parameter_count() / (1 << 18)
                );
            } else {
                info!(
                    "Initialising model with {} parameters",
                    model_config.parameter_count()
                );
            }
            let model = model::PlaylistModel::new(&model_config)
                .context("Failed to build embedding model")?;

            let ranked = model
                .rank(&context, &candidates)
                .context("Failed to score candidates")?;
            let limit = top.unwrap_or(ranked.len());
            for (item, score) in ranked.into_iter().take(limit) {
                println!("{item}\t{score:.6}");
            }
        }
        cli::Command::Config { action } => {
            let path = config_path(args.config)?;
            match action {
                ConfigAction::Show => {
                    let model_config = ModelConfig::load_or_default(&path)?;
                    println!("{}", serde_json::to_string_pretty(&model_config)?);
                }
                ConfigAction::Init { overrides, force } => {
                    if path.exists() && !force {
                        return Err(anyhow::anyhow!(
                            "Config already exists at {}. Use --force to overwrite.",
                            path.display()
                        ));
                    }
                    let mut model_config = ModelConfig::default();
                    overrides.apply(&mut model_config);
                    model_config
                        .validate()
                        .context("Refusing to write an invalid config")?;
                    model_config.save(&path)?;
                    println!("{}", path.display());
                }
            }
        }
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(&shell), &mut cmd);
        }
    }

    Ok(())
}
