//! Dense embedding tables addressed by integer id.
//!
//! Each table stores `vocab_size` rows of `feature_size` floats in one
//! row-major buffer. Lookups are bounds checked and borrow the row directly,
//! so scoring never copies a table.

use crate::error::{ScoreError, ScoreResult, TableKind};
use log::debug;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// One embedding table (track, album or artist).
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingTable {
    kind: TableKind,
    vocab_size: usize,
    feature_size: usize,
    weights: Vec<f32>,
}

impl EmbeddingTable {
    /// Build a table from a row-major weight buffer.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if `vocab_size` or `feature_size` is zero
    /// - `DimensionMismatch` if `weights.len() != vocab_size * feature_size`
    pub fn new(
        kind: TableKind,
        vocab_size: usize,
        feature_size: usize,
        weights: Vec<f32>,
    ) -> ScoreResult<Self> {
        let expected = check_shape(kind, vocab_size, feature_size)?;
        if weights.len() != expected {
            return Err(ScoreError::DimensionMismatch {
                expected,
                actual: weights.len(),
            });
        }
        Ok(Self {
            kind,
            vocab_size,
            feature_size,
            weights,
        })
    }

    /// All-zero table, for callers that fill rows themselves.
    pub fn zeros(kind: TableKind, vocab_size: usize, feature_size: usize) -> ScoreResult<Self> {
        let len = check_shape(kind, vocab_size, feature_size)?;
        Ok(Self {
            kind,
            vocab_size,
            feature_size,
            weights: vec![0.0; len],
        })
    }

    /// Randomly initialised table.
    ///
    /// Weights are drawn from `N(0, 1/feature_size)`, i.e. fan-in variance
    /// scaling with standard deviation `1/sqrt(feature_size)`. The same RNG
    /// state always yields the same table.
    pub fn random<R: Rng + ?Sized>(
        kind: TableKind,
        vocab_size: usize,
        feature_size: usize,
        rng: &mut R,
    ) -> ScoreResult<Self> {
        let len = check_shape(kind, vocab_size, feature_size)?;
        #[allow(clippy::cast_precision_loss)]
        let std_dev = 1.0 / (feature_size as f32).sqrt();
        let normal = Normal::new(0.0_f32, std_dev)
            .map_err(|e| ScoreError::InvalidConfig(format!("{kind} table init: {e}")))?;

        debug!(
            "Initialising {kind} embeddings: {vocab_size} x {feature_size} (std {std_dev:.4})"
        );
        let weights = (0..len)
            .map(|_| normal.sample(rng))
            .collect();

        Ok(Self {
            kind,
            vocab_size,
            feature_size,
            weights,
        })
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Number of valid ids; every id must be strictly below this.
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn feature_size(&self) -> usize {
        self.feature_size
    }

    /// Borrow the vector for `id`.
    ///
    /// # Errors
    ///
    /// `OutOfBoundsId` if `id >= vocab_size`.
    pub fn lookup(&self, id: u32) -> ScoreResult<&[f32]> {
        let start = self.row_start(id)?;
        Ok(&self.weights[start..start + self.feature_size])
    }

    /// Mutable access to one row, for populating a table from outside.
    pub fn row_mut(&mut self, id: u32) -> ScoreResult<&mut [f32]> {
        let start = self.row_start(id)?;
        let end = start + self.feature_size;
        Ok(&mut self.weights[start..end])
    }

    fn row_start(&self, id: u32) -> ScoreResult<usize> {
        let index = id as usize;
        if index >= self.vocab_size {
            return Err(ScoreError::OutOfBoundsId {
                table: self.kind,
                id,
                vocab_size: self.vocab_size,
            });
        }
        Ok(index * self.feature_size)
    }
}

/// Validate a table shape and return its weight count.
fn check_shape(kind: TableKind, vocab_size: usize, feature_size: usize) -> ScoreResult<usize> {
    match (vocab_size, feature_size) {
        (0, _) => Err(ScoreError::InvalidConfig(format!(
            "{kind} vocabulary size must be > 0"
        ))),
        (_, 0) => Err(ScoreError::InvalidConfig(format!(
            "{kind} feature size must be > 0"
        ))),
        _ => vocab_size.checked_mul(feature_size).ok_or_else(|| {
            ScoreError::InvalidConfig(format!(
                "{kind} table of {vocab_size} x {feature_size} overflows usize"
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_lookup_returns_row() {
        let table = EmbeddingTable::new(
            TableKind::Track,
            3,
            2,
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap();

        assert_eq!(table.lookup(0).unwrap(), &[0.0, 1.0]);
        assert_eq!(table.lookup(2).unwrap(), &[4.0, 5.0]);
    }

    #[test]
    fn test_lookup_out_of_range() {
        let table = EmbeddingTable::zeros(TableKind::Artist, 4, 3).unwrap();
        let err = table.lookup(4).unwrap_err();
        assert_eq!(
            err,
            ScoreError::OutOfBoundsId {
                table: TableKind::Artist,
                id: 4,
                vocab_size: 4
            }
        );
    }

    #[test]
    fn test_weight_length_must_match_shape() {
        let err = EmbeddingTable::new(TableKind::Album, 2, 3, vec![0.0; 5]).unwrap_err();
        assert_eq!(
            err,
            ScoreError::DimensionMismatch {
                expected: 6,
                actual: 5
            }
        );
    }

    #[test]
    fn test_zero_sizes_rejected() {
        assert!(matches!(
            EmbeddingTable::zeros(TableKind::Track, 0, 4),
            Err(ScoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            EmbeddingTable::zeros(TableKind::Track, 4, 0),
            Err(ScoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_overflowing_shape_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            EmbeddingTable::random(TableKind::Track, 4, 1 << 62, &mut rng),
            Err(ScoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            EmbeddingTable::zeros(TableKind::Album, usize::MAX, 2),
            Err(ScoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            EmbeddingTable::new(TableKind::Artist, usize::MAX, 2, Vec::new()),
            Err(ScoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_row_mut_writes_through() {
        let mut table = EmbeddingTable::zeros(TableKind::Track, 2, 2).unwrap();
        table.row_mut(1).unwrap().copy_from_slice(&[7.0, 8.0]);
        assert_eq!(table.lookup(1).unwrap(), &[7.0, 8.0]);
        assert_eq!(table.lookup(0).unwrap(), &[0.0, 0.0]);
        assert!(table.row_mut(2).is_err());
    }

    #[test]
    fn test_random_is_seed_deterministic() {
        let a = EmbeddingTable::random(TableKind::Track, 50, 8, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = EmbeddingTable::random(TableKind::Track, 50, 8, &mut StdRng::seed_from_u64(7)).unwrap();
        let c = EmbeddingTable::random(TableKind::Track, 50, 8, &mut StdRng::seed_from_u64(8)).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_random_scale_follows_feature_size() {
        let table =
            EmbeddingTable::random(TableKind::Album, 2000, 16, &mut StdRng::seed_from_u64(1)).unwrap();
        let values: Vec<f32> = (0..2000).flat_map(|id| table.lookup(id).unwrap().to_vec()).collect();

        #[allow(clippy::cast_precision_loss)]
        let n = values.len() as f32;
        let mean = values.iter().sum::<f32>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;

        assert!(mean.abs() < 0.01, "mean {mean} should be near zero");
        assert!((variance - 1.0 / 16.0).abs() < 0.005, "variance {variance} should be near 1/16");
        assert!(values.iter().all(|v| v.is_finite()));
    }
}
