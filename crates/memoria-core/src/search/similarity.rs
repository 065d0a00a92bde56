//! Vector similarity measures.
//!
//! Mismatched lengths are not an error: the pair is treated as not comparable
//! and scored 0.0 (cosine) or [`MAX_DISTANCE`] (euclidean).

/// Distance reported for vectors that cannot be compared.
pub const MAX_DISTANCE: f32 = f32::MAX;

/// Cosine similarity in `[-1, 1]`.
///
/// Returns 0.0 if the lengths differ or either vector has zero magnitude.
/// Accumulates in `f64` so that `cosine_similarity(v, v)` lands on 1.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if similarity.is_nan() {
        return 0.0;
    }
    similarity.clamp(-1.0, 1.0) as f32
}

/// Euclidean (L2) distance, or [`MAX_DISTANCE`] if the lengths differ.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return MAX_DISTANCE;
    }

    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt() as f32
}
