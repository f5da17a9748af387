//! Token-set overlap.

use crate::tokenize::TokenSet;

/// Jaccard index `|A ∩ B| / |A ∪ B|`, or `0.0` when either set is empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn jaccard(a: &TokenSet, b: &TokenSet) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|t| large.contains(*t)).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}
