//! Alignment and entropy scoring.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scores for one fragment against one field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SemanticValidation {
    /// Cosine similarity rescaled to `[0, 1]`.
    pub prime_alignment: f64,
    /// Shannon entropy of the content, bits per character.
    pub entropy_score: f64,
    /// `significance < 0.7` or the scope's entropy floor is met.
    pub significance_verified: bool,
    /// `0.5 * alignment + 0.5 * min(1, entropy / 4)`.
    pub coherence_score: f64,
}

/// Cosine similarity between `factors` and `signature`, rescaled from
/// `[-1, 1]` to `[0, 1]`. Missing trailing dimensions count as zero.
/// Returns 0 when either vector is empty or its magnitude is zero or
/// overflows.
pub fn prime_alignment(factors: &[f64], signature: &[f64]) -> f64 {
    if factors.is_empty() || signature.is_empty() {
        return 0.0;
    }
    let len = factors.len().max(signature.len());
    let at = |v: &[f64], i: usize| v.get(i).copied().unwrap_or(0.0);

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for i in 0..len {
        let (a, b) = (at(factors, i), at(signature, i));
        dot += a * b;
        norm_a += a * a;
        norm_b += b * b;
    }
    let usable = |n: f64| n.is_finite() && n > 0.0;
    if !usable(norm_a) || !usable(norm_b) {
        return 0.0;
    }
    let cosine = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !cosine.is_finite() {
        return 0.0;
    }
    (cosine.clamp(-1.0, 1.0) + 1.0) / 2.0
}

/// Shannon entropy (base 2) over character frequencies. Terms are summed in
/// character order so the result is bit-for-bit reproducible.
pub fn shannon_entropy(content: &str) -> f64 {
    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    let mut total = 0usize;
    for c in content.chars() {
        *counts.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .values()
        .map(|&n| {
            let p = n as f64 / total;
            -p * p.log2()
        })
        .sum()
}

pub fn coherence(alignment: f64, entropy: f64) -> f64 {
    0.5 * alignment + 0.5 * (entropy / 4.0).min(1.0)
}
