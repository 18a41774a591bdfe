//! Neighbor expansion.
//!
//! Boundary truncation loses context at chunk edges; including the chunks
//! immediately before and after each retained chunk recovers it. Neighbors
//! inherit a discounted score and the expanded list is capped.

use std::collections::HashSet;

use uuid::Uuid;

/// Score discount applied to expanded neighbors.
pub(crate) const NEIGHBOR_SCORE_FACTOR: f64 = 0.9;

/// Cap on the expanded list: `max(2 × top_k, top_k + 2)`.
pub(crate) fn expansion_cap(top_k: usize) -> usize {
    (2 * top_k).max(top_k + 2)
}

/// The neighbor positions to fetch for a set of base chunks.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct NeighborPlan {
    /// Distinct source ids for the batched `IN` query.
    pub source_ids: Vec<Uuid>,
    /// Distinct chunk indices for the batched `IN` query.
    pub chunk_indices: Vec<i32>,
    /// Exact `(source_id, chunk_index)` pairs wanted; the over-fetched
    /// cross-product is filtered against this in memory.
    pub wanted: HashSet<(Uuid, i32)>,
}

/// Plans the neighbor fetch for base chunks at known positions.
///
/// `present` holds positions already in the candidate list; their neighbors
/// are only requested if not already present.
pub(crate) fn plan_neighbors(
    base: &[(Uuid, i32)],
    present: &HashSet<(Uuid, i32)>,
) -> NeighborPlan {
    let mut plan = NeighborPlan::default();
    let mut source_ids = HashSet::new();
    let mut chunk_indices = HashSet::new();

    for &(source_id, chunk_index) in base {
        for offset in [-1i32, 1] {
            let neighbor_index = chunk_index + offset;
            if neighbor_index < 0 {
                continue;
            }
            let pair = (source_id, neighbor_index);
            if present.contains(&pair) {
                continue;
            }
            if plan.wanted.insert(pair) {
                source_ids.insert(source_id);
                chunk_indices.insert(neighbor_index);
            }
        }
    }

    plan.source_ids = source_ids.into_iter().collect();
    plan.chunk_indices = chunk_indices.into_iter().collect();
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_bounds_context_size() {
        assert_eq!(expansion_cap(5), 10);
        assert_eq!(expansion_cap(1), 3);
        assert_eq!(expansion_cap(2), 4);
    }

    #[test]
    fn plans_both_neighbors() {
        let source = Uuid::new_v4();
        let base = vec![(source, 5)];
        let present: HashSet<_> = base.iter().copied().collect();

        let plan = plan_neighbors(&base, &present);
        assert!(plan.wanted.contains(&(source, 4)));
        assert!(plan.wanted.contains(&(source, 6)));
        assert_eq!(plan.wanted.len(), 2);
    }

    #[test]
    fn skips_negative_indices() {
        let source = Uuid::new_v4();
        let base = vec![(source, 0)];
        let present: HashSet<_> = base.iter().copied().collect();

        let plan = plan_neighbors(&base, &present);
        assert_eq!(plan.wanted.len(), 1);
        assert!(plan.wanted.contains(&(source, 1)));
    }

    #[test]
    fn skips_already_present_neighbors() {
        let source = Uuid::new_v4();
        let base = vec![(source, 3), (source, 4)];
        let present: HashSet<_> = base.iter().copied().collect();

        let plan = plan_neighbors(&base, &present);
        // 3's right neighbor and 4's left neighbor are already present.
        assert!(plan.wanted.contains(&(source, 2)));
        assert!(plan.wanted.contains(&(source, 5)));
        assert_eq!(plan.wanted.len(), 2);
    }

    #[test]
    fn shared_neighbors_deduplicate() {
        let source = Uuid::new_v4();
        // Chunks 2 and 4 share neighbor 3.
        let base = vec![(source, 2), (source, 4)];
        let present: HashSet<_> = base.iter().copied().collect();

        let plan = plan_neighbors(&base, &present);
        let count_of_3 = plan.wanted.iter().filter(|&&(_, i)| i == 3).count();
        assert_eq!(count_of_3, 1);
    }
}
