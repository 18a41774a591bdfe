//! Reciprocal rank fusion.

use std::collections::HashMap;

/// The `k` constant of reciprocal rank fusion.
pub(crate) const RRF_K: f64 = 60.0;

/// Merges ranked result sets with reciprocal rank fusion.
///
/// Each candidate accumulates `1 / (k + rank + 1)` for every set it appears
/// in (rank is 0-based). Ties break on the candidate id, so the output is
/// invariant under permutation of the input sets.
pub(crate) fn reciprocal_rank_fusion(result_sets: &[Vec<String>]) -> Vec<(String, f64)> {
    let mut scores: HashMap<String, f64> = HashMap::new();

    for set in result_sets {
        for (rank, id) in set.iter().enumerate() {
            *scores.entry(id.clone()).or_default() += 1.0 / (RRF_K + rank as f64 + 1.0);
        }
    }

    let mut fused: Vec<(String, f64)> = scores.into_iter().collect();
    fused.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn candidate_in_multiple_sets_wins()
    {
        let fused = reciprocal_rank_fusion(&[
            ids(&["a", "b", "c"]),
            ids(&["b", "d"]),
            ids(&["b", "a"]),
        ]);

        assert_eq!(fused[0].0, "b");
        // "a" appears twice, beating single-set "c" and "d".
        assert_eq!(fused[1].0, "a");
    }

    #[test]
    fn commutes_over_input_order() {
        let set1 = ids(&["a", "b", "c"]);
        let set2 = ids(&["c", "d"]);
        let set3 = ids(&["e", "a"]);

        let forward = reciprocal_rank_fusion(&[set1.clone(), set2.clone(), set3.clone()]);
        let backward = reciprocal_rank_fusion(&[set3, set2, set1]);

        let forward_ids: Vec<&String> = forward.iter().map(|(id, _)| id).collect();
        let backward_ids: Vec<&String> = backward.iter().map(|(id, _)| id).collect();
        assert_eq!(forward_ids, backward_ids);
    }

    #[test]
    fn scores_follow_rank() {
        let fused = reciprocal_rank_fusion(&[ids(&["first", "second"])]);

        assert_eq!(fused.len(), 2);
        assert!(fused[0].1 > fused[1].1);
        assert!((fused[0].1 - 1.0 / 61.0).abs() < 1e-12);
        assert!((fused[1].1 - 1.0 / 62.0).abs() < 1e-12);
    }

    #[test]
    fn empty_input() {
        assert!(reciprocal_rank_fusion(&[]).is_empty());
        assert!(reciprocal_rank_fusion(&[vec![]]).is_empty());
    }
}
