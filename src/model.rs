//! Embedding affinity model for playlist continuation.
//!
//! Every playlist item is a `(track, album, artist)` triple. Its embedding is
//! the concatenation of the three table rows, in that order, so it has
//! `3 * feature_size` entries. A candidate's affinity to a listening context
//! is the largest inner product between the candidate's embedding and any
//! context item's embedding:
//!
//! ```text
//! score[i] = max_j dot(candidate_embed[i], context_embed[j])
//! ```
//!
//! Taking the max rather than the mean means one strong anchor in the
//! history (a shared artist, say) is enough to rank a candidate highly.
//!
//! Ids are bounds checked against each table and an empty context is
//! rejected, so scoring either returns exactly one value per candidate or an
//! error.

use crate::config::ModelConfig;
use crate::embedding::EmbeddingTable;
use crate::error::{ScoreError, ScoreResult, TableKind};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// One playlist item: track, album and artist ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemTriple {
    pub track: u32,
    pub album: u32,
    pub artist: u32,
}

impl ItemTriple {
    pub const fn new(track: u32, album: u32, artist: u32) -> Self {
        Self {
            track,
            album,
            artist,
        }
    }
}

impl fmt::Display for ItemTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.track, self.album, self.artist)
    }
}

/// Parses `TRACK:ALBUM:ARTIST`; commas are accepted as separators too.
impl FromStr for ItemTriple {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScoreError::InvalidTriple(s.to_string());
        let ids = s
            .split(|c: char| c == ':' || c == ',')
            .map(|part| part.trim().parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        match ids.as_slice() {
            [track, album, artist] => Ok(Self::new(*track, *album, *artist)),
            _ => Err(invalid()),
        }
    }
}

/// Three embedding tables sharing one feature size.
///
/// The tables are only read while scoring, so a model can be shared across
/// threads behind a plain reference.
#[derive(Debug, Clone)]
pub struct PlaylistModel {
    feature_size: usize,
    track: EmbeddingTable,
    album: EmbeddingTable,
    artist: EmbeddingTable,
}

impl PlaylistModel {
    /// Randomly initialised model with the shape and seed from `config`.
    pub fn new(config: &ModelConfig) -> ScoreResult<Self> {
        config.validate()?;
        debug!(
            "Building model: feature size {}, {} parameters, seed {}",
            config.feature_size,
            config.parameter_count(),
            config.seed
        );

        let mut rng = StdRng::seed_from_u64(config.seed);
        let f = config.feature_size;
        Self::from_tables(
            EmbeddingTable::random(TableKind::Track, config.track_vocab_size, f, &mut rng)?,
            EmbeddingTable::random(TableKind::Album, config.album_vocab_size, f, &mut rng)?,
            EmbeddingTable::random(TableKind::Artist, config.artist_vocab_size, f, &mut rng)?,
        )
    }

    /// Assemble a model from pre-populated tables.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` if the album or artist table is not as wide as the
    ///   track table
    /// - `InvalidConfig` if a concatenated embedding length overflows `usize`
    pub fn from_tables(
        track: EmbeddingTable,
        album: EmbeddingTable,
        artist: EmbeddingTable,
    ) -> ScoreResult<Self> {
        let feature_size = track.feature_size();
        if feature_size.checked_mul(3).is_none() {
            return Err(ScoreError::InvalidConfig(format!(
                "embedding of 3 x {feature_size} overflows usize"
            )));
        }
        for table in [&album, &artist] {
            if table.feature_size() != feature_size {
                return Err(ScoreError::DimensionMismatch {
                    expected: feature_size,
                    actual: table.feature_size(),
                });
            }
        }
        Ok(Self {
            feature_size,
            track,
            album,
            artist,
        })
    }

    pub fn feature_size(&self) -> usize {
        self.feature_size
    }

    /// Length of a concatenated item embedding.
    pub fn embedding_size(&self) -> usize {
        3 * self.feature_size
    }

    pub fn table(&self, kind: TableKind) -> &EmbeddingTable {
        match kind {
            TableKind::Track => &self.track,
            TableKind::Album => &self.album,
            TableKind::Artist => &self.artist,
        }
    }

    /// Embedding of a single item: track, album and artist rows concatenated.
    pub fn embed_item(&self, item: &ItemTriple) -> ScoreResult<Vec<f32>> {
        let mut out = Vec::with_capacity(self.embedding_size());
        out.extend_from_slice(self.track.lookup(item.track)?);
        out.extend_from_slice(self.album.lookup(item.album)?);
        out.extend_from_slice(self.artist.lookup(item.artist)?);
        Ok(out)
    }

    /// Embeddings for a sequence of items, one row per item, in input order.
    pub fn embed(&self, items: &[ItemTriple]) -> ScoreResult<Vec<Vec<f32>>> {
        items.iter().map(|item| self.embed_item(item)).collect()
    }

    /// Affinity of every candidate to the context.
    ///
    /// Returns one score per candidate, in candidate order. An empty candidate
    /// list gives an empty result.
    ///
    /// # Errors
    ///
    /// - `EmptyContext` if `context` is empty
    /// - `OutOfBoundsId` if any id in either list exceeds its table
    pub fn score(&self, context: &[ItemTriple], candidates: &[ItemTriple]) -> ScoreResult<Vec<f32>> {
        if context.is_empty() {
            return Err(ScoreError::EmptyContext);
        }

        let context_embed = self.embed(context)?;
        let candidate_embed = self.embed(candidates)?;
        debug!(
            "Scoring {} candidates against {} context items",
            candidates.len(),
            context.len()
        );

        // Each row reduces sequentially, so the parallel result is bit-identical
        // to a sequential one.
        let scores = candidate_embed
            .par_iter()
            .map(|candidate| max_affinity(candidate, &context_embed))
            .collect();
        Ok(scores)
    }

    /// Column-wise form of [`score`](Self::score): six parallel id slices
    /// instead of two lists of triples.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if the album or artist column differs in length from
    /// its track column, otherwise the same errors as `score`.
    #[allow(clippy::too_many_arguments)]
    pub fn score_columns(
        &self,
        track_context: &[u32],
        album_context: &[u32],
        artist_context: &[u32],
        next_track: &[u32],
        next_album: &[u32],
        next_artist: &[u32],
    ) -> ScoreResult<Vec<f32>> {
        let context = zip_columns(track_context, album_context, artist_context)?;
        let candidates = zip_columns(next_track, next_album, next_artist)?;
        self.score(&context, &candidates)
    }

    /// Candidates paired with their affinity, highest first.
    ///
    /// Ties keep their input order. NaN scores sort last.
    pub fn rank(
        &self,
        context: &[ItemTriple],
        candidates: &[ItemTriple],
    ) -> ScoreResult<Vec<(ItemTriple, f32)>> {
        let scores = self.score(context, candidates)?;
        let mut ranked: Vec<(ItemTriple, f32)> = candidates.iter().copied().zip(scores).collect();
        ranked.sort_by(|(_, a), (_, b)| match (a.is_nan(), b.is_nan()) {
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => b.total_cmp(a),
        });

        if let Some((best, score)) = ranked.first() {
            trace!("Top candidate {best} with affinity {score}");
        }
        Ok(ranked)
    }
}

/// Inner product of two equal-length vectors.
#[inline]
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Largest inner product between `candidate` and any row of `context`.
///
/// A NaN product makes the result NaN. Returns negative infinity for an empty
/// context; [`PlaylistModel::score`] never passes one.
#[must_use]
pub fn max_affinity(candidate: &[f32], context: &[Vec<f32>]) -> f32 {
    context
        .iter()
        .map(|row| dot(candidate, row))
        .fold(f32::NEG_INFINITY, nan_max)
}

/// `max` that propagates NaN instead of skipping it.
#[inline]
fn nan_max(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() {
        f32::NAN
    } else {
        a.max(b)
    }
}

fn zip_columns(track: &[u32], album: &[u32], artist: &[u32]) -> ScoreResult<Vec<ItemTriple>> {
    for column in [album, artist] {
        if column.len() != track.len() {
            return Err(ScoreError::DimensionMismatch {
                expected: track.len(),
                actual: column.len(),
            });
        }
    }
    Ok(track
        .iter()
        .zip(album)
        .zip(artist)
        .map(|((&t, &al), &ar)| ItemTriple::new(t, al, ar))
        .collect())
}
