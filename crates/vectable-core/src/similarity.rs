//! Similarity scoring between embeddings.
//!
//! All methods follow the same convention: a larger score means more similar.
//! Euclidean distance is negated to fit that convention.
//!
//! [`compute_set`] fans a base vector out against a candidate set on a scoped
//! pool of OS threads. Workers claim indices from an atomic counter and each
//! writes only its own result slot, so output order never depends on which
//! worker finishes first.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use vectable_types::config::{SimilarityMethod, SimilarityOptions};
use vectable_types::error::ComputationError;

fn check_dimensions(a: &[f64], b: &[f64]) -> Result<(), ComputationError> {
    if a.len() != b.len() {
        return Err(ComputationError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(())
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn dot_product(a: &[f64], b: &[f64]) -> Result<f64, ComputationError> {
    check_dimensions(a, b)?;
    Ok(dot(a, b))
}

pub fn cosine(a: &[f64], b: &[f64]) -> Result<f64, ComputationError> {
    check_dimensions(a, b)?;
    let norm_a = dot(a, a);
    let norm_b = dot(b, b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(ComputationError::ZeroMagnitude);
    }
    // sqrt of the product (not product of sqrts) so a vector scores exactly
    // 1.0 against itself.
    Ok(dot(a, b) / (norm_a * norm_b).sqrt())
}

pub fn negative_euclidean(a: &[f64], b: &[f64]) -> Result<f64, ComputationError> {
    check_dimensions(a, b)?;
    let squared: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    Ok(-squared.sqrt())
}

pub fn similarity(
    a: &[f64],
    b: &[f64],
    method: SimilarityMethod,
) -> Result<f64, ComputationError> {
    match method {
        SimilarityMethod::Cosine => cosine(a, b),
        SimilarityMethod::Euclidean => negative_euclidean(a, b),
        SimilarityMethod::DotProduct => dot_product(a, b),
    }
}

/// Score `base` against every vector, returning scores aligned by index.
///
/// The first failing pair aborts the whole call.
pub fn compute_set<T>(
    base: &[f64],
    vectors: &[T],
    options: &SimilarityOptions,
) -> Result<Vec<f64>, ComputationError>
where
    T: AsRef<[f64]> + Sync,
{
    let method = options.method;
    let workers = options.worker_count().min(vectors.len()).max(1);

    tracing::trace!(candidates = vectors.len(), workers, %method, "scoring candidate set");

    if workers == 1 {
        return vectors
            .iter()
            .map(|v| similarity(base, v.as_ref(), method))
            .collect();
    }

    let slots: Vec<OnceLock<f64>> = (0..vectors.len()).map(|_| OnceLock::new()).collect();
    let next = AtomicUsize::new(0);
    let failure: OnceLock<ComputationError> = OnceLock::new();

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                while failure.get().is_none() {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(candidate) = vectors.get(index) else {
                        break;
                    };
                    match similarity(base, candidate.as_ref(), method) {
                        Ok(score) => {
                            let _ = slots[index].set(score);
                        }
                        Err(err) => {
                            let _ = failure.set(err);
                            break;
                        }
                    }
                }
            });
        }
    });

    if let Some(err) = failure.into_inner() {
        return Err(err);
    }

    // Without a failure every index was claimed and scored.
    Ok(slots
        .into_iter()
        .map(|slot| slot.into_inner().unwrap_or(f64::NAN))
        .collect())
}
