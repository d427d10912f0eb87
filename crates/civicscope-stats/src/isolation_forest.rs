//! Single-feature isolation forest
//!
//! An isolation forest scores how easy it is to separate a value from the rest
//! of a sample by random axis splits. Values that are isolated after few splits
//! receive scores close to 1.0; values buried in dense regions score well below
//! 0.5.
//!
//! # Algorithm
//!
//! For each of `n_estimators` trees:
//!
//! 1. Draw a subsample of `min(max_samples, n)` values without replacement
//! 2. Recursively split on a threshold drawn uniformly from `[min, max)` of the
//!    node's values, sending values `<= threshold` left
//! 3. Stop at depth `ceil(log2(subsample))`, at a single value, or when all
//!    values in the node are equal
//!
//! The path length of a value is the depth of the leaf it lands in plus the
//! expected path length `c(size)` of an unbuilt subtree holding the leaf's
//! training values. The anomaly score is `2^(-mean_path / c(subsample))`.
//!
//! All randomness comes from a [`Pcg32`] seeded by the caller, so a fit is a
//! pure function of `(values, params, seed)`.

use rand::{Rng as _, SeedableRng as _, seq::index};
use rand_pcg::Pcg32;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Hyperparameters of an isolation forest fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsolationForestParams {
    /// Number of trees in the ensemble.
    pub n_estimators: usize,
    /// Upper bound on the subsample drawn for each tree.
    pub max_samples: usize,
}

impl Default for IsolationForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 300,
            max_samples: 256,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// One isolation tree, stored as an arena of nodes rooted at index 0.
#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(sample: Vec<f64>, max_depth: usize, rng: &mut Pcg32) -> Self {
        let mut tree = Self { nodes: vec![] };
        tree.grow_node(sample, 0, max_depth, rng);
        tree
    }

    fn grow_node(
        &mut self,
        values: Vec<f64>,
        depth: usize,
        max_depth: usize,
        rng: &mut Pcg32,
    ) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf { size: values.len() });

        if depth >= max_depth || values.len() <= 1 {
            return index;
        }
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if min >= max {
            return index;
        }

        let threshold = split_threshold(min, max, rng);
        let (left_values, right_values): (Vec<f64>, Vec<f64>) =
            values.into_iter().partition(|&v| v <= threshold);
        let left = self.grow_node(left_values, depth + 1, max_depth, rng);
        let right = self.grow_node(right_values, depth + 1, max_depth, rng);
        self.nodes[index] = Node::Split {
            threshold,
            left,
            right,
        };
        index
    }

    #[expect(clippy::cast_precision_loss)]
    fn path_length(&self, value: f64) -> f64 {
        let mut index = 0;
        let mut depth = 0_usize;
        loop {
            match self.nodes[index] {
                Node::Leaf { size } => return depth as f64 + average_path_length(size),
                Node::Split {
                    threshold,
                    left,
                    right,
                } => {
                    index = if value <= threshold { left } else { right };
                    depth += 1;
                }
            }
        }
    }
}

/// A fitted single-feature isolation forest.
///
/// # Examples
///
/// ```
/// use civicscope_stats::isolation_forest::{IsolationForest, IsolationForestParams};
///
/// let values = [10.0, 11.0, 9.5, 10.5, 10.2, 55.0];
/// let params = IsolationForestParams { n_estimators: 100, max_samples: 256 };
///
/// let first = IsolationForest::fit(&values, &params, 7).unwrap();
/// let second = IsolationForest::fit(&values, &params, 7).unwrap();
/// assert_eq!(first.scores(&values), second.scores(&values));
/// ```
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    subsample_size: usize,
}

impl IsolationForest {
    /// Fits a forest on `values` using a [`Pcg32`] seeded with `seed`.
    ///
    /// # Returns
    ///
    /// * `Some(IsolationForest)` - if `values` is non-empty and `n_estimators > 0`
    /// * `None` - otherwise
    #[must_use]
    pub fn fit(values: &[f64], params: &IsolationForestParams, seed: u64) -> Option<Self> {
        if values.is_empty() || params.n_estimators == 0 {
            return None;
        }
        let subsample_size = params.max_samples.clamp(1, values.len());
        let max_depth = max_depth_for(subsample_size);
        let mut rng = Pcg32::seed_from_u64(seed);

        let trees = (0..params.n_estimators)
            .map(|_| {
                let sample = index::sample(&mut rng, values.len(), subsample_size)
                    .into_iter()
                    .map(|i| values[i])
                    .collect();
                IsolationTree::grow(sample, max_depth, &mut rng)
            })
            .collect();

        Some(Self {
            trees,
            subsample_size,
        })
    }

    /// Number of values each tree was grown on.
    #[must_use]
    pub fn subsample_size(&self) -> usize {
        self.subsample_size
    }

    /// Mean path length of `value` across all trees.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean_path_length(&self, value: f64) -> f64 {
        let total = self
            .trees
            .iter()
            .map(|tree| tree.path_length(value))
            .sum::<f64>();
        total / self.trees.len() as f64
    }

    /// Anomaly score of `value` in `(0, 1]`; higher is more anomalous.
    ///
    /// A forest grown on a single value cannot separate anything and scores
    /// every input as 0.5.
    #[must_use]
    pub fn score(&self, value: f64) -> f64 {
        let normalizer = average_path_length(self.subsample_size);
        if normalizer <= 0.0 {
            return 0.5;
        }
        (-self.mean_path_length(value) / normalizer).exp2()
    }

    /// Scores every value in `values`, preserving order.
    #[must_use]
    pub fn scores(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.score(v)).collect()
    }
}

/// Expected path length of an unsuccessful search in a binary search tree of `n` nodes.
///
/// # Examples
///
/// ```
/// use civicscope_stats::isolation_forest::average_path_length;
///
/// assert_eq!(average_path_length(1), 0.0);
/// assert_eq!(average_path_length(2), 1.0);
/// assert!(average_path_length(256) > average_path_length(10));
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Uniform threshold in `[min, max)`.
///
/// `max - min` may overflow for finite bounds of opposite sign, so the draw is
/// taken as a convex combination of the bounds instead.
fn split_threshold(min: f64, max: f64, rng: &mut Pcg32) -> f64 {
    let span = max - min;
    if span.is_finite() {
        return rng.random_range(min..max);
    }
    let u = rng.random::<f64>();
    let threshold = (1.0 - u) * min + u * max;
    if threshold < max { threshold } else { min }
}

#[expect(
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)]
fn max_depth_for(subsample_size: usize) -> usize {
    (subsample_size.max(2) as f64).log2().ceil() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(n_estimators: usize) -> IsolationForestParams {
        IsolationForestParams {
            n_estimators,
            max_samples: 256,
        }
    }

    #[test]
    fn test_empty_values() {
        assert!(IsolationForest::fit(&[], &params(10), 1).is_none());
    }

    #[test]
    fn test_zero_estimators() {
        assert!(IsolationForest::fit(&[1.0, 2.0], &params(0), 1).is_none());
    }

    #[test]
    fn test_max_depth() {
        assert_eq!(max_depth_for(1), 1);
        assert_eq!(max_depth_for(2), 1);
        assert_eq!(max_depth_for(30), 5);
        assert_eq!(max_depth_for(256), 8);
    }

    #[test]
    fn test_subsample_is_capped_by_input_size() {
        let values = (0..20).map(f64::from).collect::<Vec<_>>();
        let forest = IsolationForest::fit(&values, &params(5), 3).unwrap();
        assert_eq!(forest.subsample_size(), 20);
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let values = [0.12, 0.15, 0.11, 0.40, 0.13, 0.14, 0.01, 0.16];
        let a = IsolationForest::fit(&values, &params(300), 42).unwrap();
        let b = IsolationForest::fit(&values, &params(300), 42).unwrap();
        assert_eq!(a.scores(&values), b.scores(&values));
    }

    #[test]
    fn test_isolated_value_scores_highest() {
        let mut values = (0..30)
            .map(|i| 0.30 + f64::from(i) * 0.001)
            .collect::<Vec<_>>();
        values.push(0.95);
        let forest = IsolationForest::fit(&values, &params(300), 42).unwrap();
        let scores = forest.scores(&values);
        let (argmax, _) = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert_eq!(argmax, values.len() - 1);
        assert!(scores[values.len() - 1] > 0.5);
    }

    #[test]
    fn test_constant_values_score_equally() {
        let values = [0.5; 8];
        let forest = IsolationForest::fit(&values, &params(50), 9).unwrap();
        let scores = forest.scores(&values);
        assert!(scores.iter().all(|&s| (s - scores[0]).abs() < 1e-12));
    }

    #[test]
    fn test_span_wider_than_f64_range() {
        let values = [-1e308, 1e308, 0.0, 1.0, 2.0];
        let forest = IsolationForest::fit(&values, &params(100), 42).unwrap();
        let scores = forest.scores(&values);
        assert!(scores.iter().all(|s| s.is_finite() && *s > 0.0 && *s <= 1.0));

        let mut rng = <Pcg32 as rand::SeedableRng>::seed_from_u64(42);
        for _ in 0..1000 {
            let t = split_threshold(-f64::MAX, f64::MAX, &mut rng);
            assert!(t.is_finite() && t < f64::MAX);
        }
    }

    #[test]
    fn test_single_value_scores_half() {
        let forest = IsolationForest::fit(&[3.0], &params(10), 0).unwrap();
        assert_eq!(forest.score(3.0), 0.5);
    }
}
