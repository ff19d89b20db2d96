//! Cosine similarity between taste vectors and the derived match numbers.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::TasteVector;

/// Cosine similarity over the union of keys; absent keys count as 0.
///
/// Returns 0 when either vector has zero magnitude, clamped to [-1, 1].
pub fn cosine_similarity(a: &TasteVector, b: &TasteVector) -> f64 {
    let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for key in keys {
        let x = a.get(key).copied().unwrap_or(0.0);
        let y = b.get(key).copied().unwrap_or(0.0);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    cosine_from_parts(dot, norm_a.sqrt(), norm_b.sqrt())
}

/// Cosine similarity of two dense vectors of equal length
pub fn cosine_similarity_dense(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|y| y * y).sum::<f64>().sqrt();

    cosine_from_parts(dot, norm_a, norm_b)
}

fn cosine_from_parts(dot: f64, norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Maps [-1, 1] linearly onto 0..=100: -1 → 0, 0 → 50, 1 → 100
pub fn to_percentage(cosine: f64) -> u32 {
    let cosine = if cosine.is_finite() {
        cosine.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    ((cosine + 1.0) * 50.0).round() as u32
}

/// Per-genre agreement: the one-dimensional cosine of each component pair as a percentage.
///
/// Each genre is scored on its own: same sign → 100, opposite sign → 0, and
/// 50 when either user has no weight on that genre.
pub fn genre_compatibility(a: &TasteVector, b: &TasteVector) -> BTreeMap<String, u32> {
    a.keys()
        .chain(b.keys())
        .map(|genre| {
            let x = a.get(genre).copied().unwrap_or(0.0);
            let y = b.get(genre).copied().unwrap_or(0.0);
            let cosine = cosine_from_parts(x * y, x.abs(), y.abs());
            (genre.clone(), to_percentage(cosine))
        })
        .collect()
}

pub const SUMMARY_EXCELLENT: &str = "Excellent match! You have very similar movie tastes.";
pub const SUMMARY_GREAT: &str = "Great match! You share many movie preferences.";
pub const SUMMARY_GOOD: &str = "Good match! You have quite a bit in common.";
pub const SUMMARY_MODERATE: &str = "Moderate match. You have some shared interests.";
pub const SUMMARY_DIFFERENT: &str =
    "Different tastes, but that's a great opportunity for discovery!";
pub const SUMMARY_VERY_DIFFERENT: &str =
    "Very different tastes. A perfect chance to explore new genres together!";

/// Human-readable tier for a match percentage
pub fn summary(percentage: u32) -> &'static str {
    match percentage {
        80.. => SUMMARY_EXCELLENT,
        70..=79 => SUMMARY_GREAT,
        60..=69 => SUMMARY_GOOD,
        50..=59 => SUMMARY_MODERATE,
        40..=49 => SUMMARY_DIFFERENT,
        _ => SUMMARY_VERY_DIFFERENT,
    }
}
