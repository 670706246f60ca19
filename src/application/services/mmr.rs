//! Maximal marginal relevance selection.
//!
//! Picks `k` candidates that balance similarity to the query against
//! similarity to what was already picked:
//! `lambda * sim(query, d) - (1 - lambda) * max(sim(d, selected))`.

use crate::domain::Embedding;

pub const DEFAULT_LAMBDA: f32 = 0.5;

/// Returns indices into `candidates` in selection order.
///
/// The first pick is always the candidate most similar to the query.
pub fn maximal_marginal_relevance(
    query: &Embedding,
    candidates: &[Embedding],
    k: usize,
    lambda: f32,
) -> Vec<usize> {
    let k = k.min(candidates.len());
    if k == 0 {
        return Vec::new();
    }

    let lambda = lambda.clamp(0.0, 1.0);
    let query_similarity: Vec<f32> = candidates
        .iter()
        .map(|candidate| query.cosine_similarity(candidate))
        .collect();

    let mut selected: Vec<usize> = Vec::with_capacity(k);
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();

    while selected.len() < k {
        let mut best_position = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (position, &candidate) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|&chosen| candidates[candidate].cosine_similarity(&candidates[chosen]))
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if selected.is_empty() { 0.0 } else { redundancy };

            let score = lambda * query_similarity[candidate] - (1.0 - lambda) * redundancy;
            if score > best_score {
                best_score = score;
                best_position = position;
            }
        }

        selected.push(remaining.remove(best_position));
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(values: &[f32]) -> Embedding {
        Embedding::new(values.to_vec())
    }

    #[test]
    fn given_no_candidates_when_selecting_then_returns_empty() {
        let selected = maximal_marginal_relevance(&vector(&[1.0, 0.0]), &[], 5, 0.5);

        assert!(selected.is_empty());
    }

    #[test]
    fn given_candidates_when_selecting_then_first_pick_is_most_relevant() {
        let candidates = vec![vector(&[0.0, 1.0]), vector(&[1.0, 0.1]), vector(&[0.7, 0.7])];

        let selected = maximal_marginal_relevance(&vector(&[1.0, 0.0]), &candidates, 1, 0.5);

        assert_eq!(selected, vec![1]);
    }

    #[test]
    fn given_near_duplicate_candidates_when_selecting_then_prefers_diverse_second_pick() {
        let candidates = vec![
            vector(&[0.9, 0.3]),
            vector(&[0.88, 0.32]),
            vector(&[0.7, -0.6]),
        ];

        let selected = maximal_marginal_relevance(&vector(&[1.0, 0.0]), &candidates, 2, 0.5);

        assert_eq!(selected, vec![0, 2]);
    }

    #[test]
    fn given_lambda_one_when_selecting_then_orders_by_relevance_only() {
        let candidates = vec![
            vector(&[0.6, 0.8]),
            vector(&[1.0, 0.0]),
            vector(&[0.99, 0.01]),
        ];

        let selected = maximal_marginal_relevance(&vector(&[1.0, 0.0]), &candidates, 3, 1.0);

        assert_eq!(selected, vec![1, 2, 0]);
    }

    #[test]
    fn given_k_larger_than_candidates_when_selecting_then_returns_every_candidate_once() {
        let candidates = vec![vector(&[1.0, 0.0]), vector(&[0.0, 1.0])];

        let mut selected = maximal_marginal_relevance(&vector(&[1.0, 1.0]), &candidates, 10, 0.5);
        selected.sort_unstable();

        assert_eq!(selected, vec![0, 1]);
    }
}
