use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use crate::content::kana::KanaPair;
use crate::engine::error_stats::ErrorStats;

/// The pool a prompt is drawn from. With `exclude_current` and more than
/// one item left, one occurrence of the current prompt is dropped so it is
/// not shown twice in a row.
pub fn candidates<'a>(
    unanswered: &'a [KanaPair],
    current: Option<&KanaPair>,
    exclude_current: bool,
) -> Vec<&'a KanaPair> {
    let mut available: Vec<&KanaPair> = unanswered.iter().collect();
    if exclude_current
        && available.len() > 1
        && let Some(idx) = current.and_then(|cur| available.iter().position(|p| *p == cur))
    {
        available.remove(idx);
    }
    available
}

pub fn sampling_weights(candidates: &[&KanaPair], stats: &ErrorStats) -> Vec<f64> {
    candidates.iter().map(|p| stats.sampling_weight(p)).collect()
}

/// Draw the next prompt. Weighted draws are proportional to
/// `1 + 3 * error_weight`; with no recorded errors every weight is 1 and
/// the draw is uniform. Returns `None` only for an empty pool.
pub fn pick_next<R: Rng + ?Sized>(
    unanswered: &[KanaPair],
    current: Option<&KanaPair>,
    exclude_current: bool,
    weighted: bool,
    stats: &ErrorStats,
    rng: &mut R,
) -> Option<KanaPair> {
    let available = candidates(unanswered, current, exclude_current);
    if available.is_empty() {
        return None;
    }
    let idx = if weighted {
        match WeightedIndex::new(sampling_weights(&available, stats)) {
            Ok(dist) => dist.sample(rng),
            Err(_) => rng.gen_range(0..available.len()),
        }
    } else {
        rng.gen_range(0..available.len())
    };
    Some(available[idx].clone())
}
