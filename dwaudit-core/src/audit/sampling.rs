//! Sampling policy.
//!
//! Tables above the row threshold are reduced to a pseudo-random subsample
//! drawn with a fixed seed, so repeated audits of unchanged data analyze the
//! same rows and report the same examples.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::borrow::Cow;

use crate::dataset::Dataset;

/// Seed for client-side sampling.
pub const SAMPLE_SEED: u64 = 42;

/// Returns true when a table of `total_rows` must be sampled.
pub fn needs_sampling(total_rows: usize, threshold: usize) -> bool {
    total_rows > threshold
}

/// Picks `min(sample_size, total_rows)` distinct row positions with the
/// fixed seed, sorted ascending so the sample keeps dataset order.
pub fn sample_indices(total_rows: usize, sample_size: usize) -> Vec<usize> {
    let amount = sample_size.min(total_rows);
    let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
    let mut indices = rand::seq::index::sample(&mut rng, total_rows, amount).into_vec();
    indices.sort_unstable();
    indices
}

/// Applies the sampling policy.
///
/// Returns the dataset unchanged (borrowed) when it has at most `threshold`
/// rows, otherwise a new dataset of `min(sample_size, total_rows)` rows.
/// The boolean reports whether sampling happened.
pub fn sample(dataset: &Dataset, threshold: usize, sample_size: usize) -> (Cow<'_, Dataset>, bool) {
    let total_rows = dataset.row_count();
    if !needs_sampling(total_rows, threshold) {
        return (Cow::Borrowed(dataset), false);
    }

    let indices = sample_indices(total_rows, sample_size);
    tracing::debug!(
        "Sampling {} of {} rows (threshold {})",
        indices.len(),
        total_rows,
        threshold
    );
    (Cow::Owned(dataset.take(&indices)), true)
}
