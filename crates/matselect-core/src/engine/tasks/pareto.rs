use super::normalize::NormalizedScores;
use itertools::Itertools;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Pareto dominance over a set of objective score vectors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dominance {
    /// `true` for candidates no other candidate dominates.
    pub on_frontier: Vec<bool>,
    /// How many candidates dominate the candidate at the same index.
    pub dominated_by: Vec<usize>,
}

impl Dominance {
    pub fn frontier_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.on_frontier
            .iter()
            .enumerate()
            .filter_map(|(i, &on)| on.then_some(i))
    }

    pub fn frontier_len(&self) -> usize {
        self.on_frontier.iter().filter(|&&on| on).count()
    }
}

/// `a` dominates `b` when it is at least as good on every objective and strictly
/// better on one. Scores are oriented so that higher is better.
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    let mut strictly_better = false;
    for (x, y) in a.iter().zip(b) {
        if x < y {
            return false;
        }
        if x > y {
            strictly_better = true;
        }
    }
    strictly_better
}

#[instrument(skip_all, name = "pareto_frontier_task")]
pub fn run(normalized: &NormalizedScores) -> Dominance {
    let dominance = compute(&normalized.rows());
    info!(
        candidates = normalized.candidate_count(),
        frontier = dominance.frontier_len(),
        "Pareto frontier computed."
    );
    dominance
}

/// Pairwise dominance over all score vectors. Equal vectors never dominate each
/// other, so duplicates share frontier membership.
pub fn compute(vectors: &[Vec<f64>]) -> Dominance {
    let n = vectors.len();
    let pairs: Vec<(usize, usize)> = (0..n).tuple_combinations().collect();

    #[cfg(not(feature = "parallel"))]
    let iterator = pairs.iter();
    #[cfg(feature = "parallel")]
    let iterator = pairs.par_iter();

    // Index of the dominated member of every comparable pair.
    let relations: Vec<usize> = iterator
        .filter_map(|&(i, j)| {
            if dominates(&vectors[i], &vectors[j]) {
                Some(j)
            } else if dominates(&vectors[j], &vectors[i]) {
                Some(i)
            } else {
                None
            }
        })
        .collect();

    let mut dominated_by = vec![0; n];
    for loser in relations {
        dominated_by[loser] += 1;
    }
    Dominance {
        on_frontier: dominated_by.iter().map(|&d| d == 0).collect(),
        dominated_by,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominance_needs_one_strict_improvement() {
        assert!(dominates(&[1.0, 0.5], &[0.5, 0.5]));
        assert!(!dominates(&[0.5, 0.5], &[0.5, 0.5]));
        assert!(!dominates(&[1.0, 0.0], &[0.0, 1.0]));
    }

    #[test]
    fn dominance_is_irreflexive_and_asymmetric() {
        let a = [0.8, 0.3, 0.5];
        let b = [0.7, 0.3, 0.1];
        assert!(!dominates(&a, &a));
        assert!(dominates(&a, &b));
        assert!(!dominates(&b, &a));
    }

    #[test]
    fn frontier_excludes_dominated_vectors() {
        let vectors = vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.5, 0.5],
            vec![0.4, 0.4],
        ];
        let dominance = compute(&vectors);
        assert_eq!(dominance.on_frontier, vec![true, true, true, false]);
        assert_eq!(dominance.dominated_by, vec![0, 0, 0, 1]);
        assert_eq!(dominance.frontier_indices().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn single_objective_frontier_is_the_top_scorers() {
        let vectors = vec![vec![0.2], vec![1.0], vec![1.0], vec![0.0]];
        let dominance = compute(&vectors);
        assert_eq!(dominance.on_frontier, vec![false, true, true, false]);
        assert_eq!(dominance.dominated_by, vec![2, 0, 0, 3]);
    }

    #[test]
    fn frontier_is_never_empty_for_a_non_empty_set() {
        let vectors = vec![vec![0.1, 0.9], vec![0.9, 0.1], vec![0.0, 0.0]];
        assert!(compute(&vectors).frontier_len() >= 1);
    }

    #[test]
    fn no_objectives_puts_everyone_on_frontier() {
        let dominance = compute(&[vec![], vec![], vec![]]);
        assert_eq!(dominance.frontier_len(), 3);
    }

    #[test]
    fn empty_set_has_empty_frontier() {
        let dominance = compute(&[]);
        assert!(dominance.on_frontier.is_empty());
    }
}
