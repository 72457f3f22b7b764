//! Selection of the strongest per-row feature attributions

use crate::types::prediction::{round_to, Attribution, AttributionSet};

/// Number of attributions reported per row unless configured otherwise
pub const DEFAULT_TOP_K: usize = 3;

/// Pick the `k` features with the largest absolute impact.
///
/// Entries are ordered by descending absolute impact; equal magnitudes keep
/// ascending feature index. Impacts keep their sign and are rounded to 4
/// decimals. Names and impacts are paired positionally.
pub fn top_k<S: AsRef<str>>(feature_names: &[S], impacts: &[f64], k: usize) -> AttributionSet {
    let mut order: Vec<usize> = (0..feature_names.len().min(impacts.len())).collect();
    // stable sort: ties stay in index order
    order.sort_by(|&a, &b| impacts[b].abs().total_cmp(&impacts[a].abs()));

    order
        .into_iter()
        .take(k)
        .map(|i| Attribution::new(feature_names[i].as_ref(), round_to(impacts[i], 4)))
        .collect()
}
