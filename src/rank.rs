use std::collections::BTreeMap;

use crate::Normalized;

/// Assign standard competition ranks ("1224") by descending score. Candidates with exactly equal
/// scores share a rank, and the next distinct score resumes at its 1-based position.
///
/// Equal scores keep the id order of the input map, which makes the ordering deterministic.
pub fn assign_ranks<Id>(scores: &BTreeMap<Id, Normalized>) -> BTreeMap<Id, usize>
where
    Id: Ord + Clone,
{
    let ids: Vec<&Id> = scores.keys().collect();
    let values: Vec<Normalized> = scores.values().copied().collect();
    let order = permutation::sort_by(&values[..], |a, b| b.cmp(a));
    let ids = order.apply_slice(&ids[..]);
    let values = order.apply_slice(&values[..]);

    let mut ranks = BTreeMap::new();
    let mut previous: Option<(Normalized, usize)> = None;
    for (position, (id, score)) in ids.into_iter().zip(values).enumerate() {
        let rank = match previous {
            Some((previous_score, previous_rank)) if previous_score == score => previous_rank,
            _ => position + 1,
        };
        previous = Some((score, rank));
        ranks.insert(id.clone(), rank);
    }
    ranks
}
