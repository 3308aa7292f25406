//! Weighted random selection.

use crate::{
    error::{Error, Result},
    random::RandomSource,
};

/// Pick one item with probability proportional to its weight.
pub fn weighted_select<'a, T>(
    items: impl IntoIterator<Item = (&'a T, f64)>,
    rng: &mut RandomSource,
) -> Result<&'a T> {
    let items: Vec<(&T, f64)> = items.into_iter().collect();
    if items.is_empty() {
        return Err(Error::invalid_operation("cannot select from an empty list"));
    }
    if let Some((_, w)) = items.iter().find(|(_, w)| !(*w >= 0.0) || !w.is_finite()) {
        return Err(Error::invalid_operation(format!(
            "selection weights must be finite and non-negative, got {w}"
        )));
    }
    let total: f64 = items.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Err(Error::invalid_operation(
            "cannot select when every weight is zero",
        ));
    }

    let threshold = rng.uniform() * total;
    let mut cumulative = 0.0;
    for &(item, weight) in &items {
        cumulative += weight;
        if weight > 0.0 && cumulative >= threshold {
            return Ok(item);
        }
    }
    // Rounding can leave the threshold just past the final sum.
    items
        .iter()
        .rev()
        .find(|(_, w)| *w > 0.0)
        .map(|(item, _)| *item)
        .ok_or_else(|| Error::invalid_operation("cannot select when every weight is zero"))
}
