//! CART classification tree
//!
//! Greedy, depth-first construction minimizing weighted Gini impurity. At each
//! node a random subset of features is examined; candidate thresholds are the
//! midpoints between adjacent distinct values. Leaves store the class
//! distribution of the training rows that reached them.

use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Stopping rules and feature sampling for one tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Number of features examined per split (already resolved)
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        /// Fraction of the node's rows in each class
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted classification tree stored as a flat node arena (root at index 0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_classes: usize,
    n_features: usize,
    depth: usize,
    /// Impurity decrease per feature, weighted by the share of rows at each node
    impurity_decrease: Vec<f64>,
}

/// Best split found at a node
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl DecisionTree {
    /// Fit a tree on the given `rows` of `x`.
    ///
    /// `targets` holds dense class indices (`0..n_classes`) for every row of
    /// `x`; `rows` may repeat indices (bootstrap samples).
    pub fn fit(
        x: ArrayView2<f64>,
        targets: &[usize],
        rows: Vec<usize>,
        n_classes: usize,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut builder = TreeBuilder {
            x: x.view(),
            targets,
            n_classes,
            params,
            rng,
            nodes: Vec::new(),
            impurity_decrease: vec![0.0; x.ncols()],
            root_size: rows.len().max(1) as f64,
            depth: 0,
        };
        builder.build_node(rows, 0);

        DecisionTree {
            nodes: builder.nodes,
            n_classes,
            n_features: x.ncols(),
            depth: builder.depth,
            impurity_decrease: builder.impurity_decrease,
        }
    }

    /// Class distribution of the leaf that `sample` falls into
    pub fn predict_distribution(&self, sample: ArrayView1<f64>) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if sample[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Per-feature impurity decrease normalized to sum to 1 (all zeros for a stump)
    pub fn feature_importances(&self) -> Vec<f64> {
        let total: f64 = self.impurity_decrease.iter().sum();
        if total <= 0.0 {
            return vec![0.0; self.n_features];
        }
        self.impurity_decrease.iter().map(|v| v / total).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }

    /// Length of the longest root-to-leaf path (0 for a single leaf)
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

struct TreeBuilder<'a, 'r> {
    x: ArrayView2<'a, f64>,
    targets: &'a [usize],
    n_classes: usize,
    params: &'a TreeParams,
    rng: &'r mut StdRng,
    nodes: Vec<Node>,
    impurity_decrease: Vec<f64>,
    root_size: f64,
    depth: usize,
}

impl TreeBuilder<'_, '_> {
    /// Recursively build the subtree for `rows`; returns its node index
    fn build_node(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let index = self.nodes.len();
        let counts = self.class_counts(&rows);
        let n = rows.len();
        let impurity = gini_impurity(&counts, n);

        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        if depth_reached
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
            || impurity <= 0.0
        {
            self.push_leaf(&counts, n);
            return index;
        }

        let Some(split) = self.find_best_split(&rows, &counts, impurity) else {
            self.push_leaf(&counts, n);
            return index;
        };

        // Placeholder; child indices are patched once the subtrees exist
        self.nodes.push(Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: 0,
            right: 0,
        });

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&row| self.x[[row, split.feature]] <= split.threshold);

        self.impurity_decrease[split.feature] += split.gain * n as f64 / self.root_size;
        self.depth = self.depth.max(depth + 1);

        let left = self.build_node(left_rows, depth + 1);
        let right = self.build_node(right_rows, depth + 1);
        if let Node::Split {
            left: l, right: r, ..
        } = &mut self.nodes[index]
        {
            *l = left;
            *r = right;
        }

        index
    }

    fn push_leaf(&mut self, counts: &[usize], n: usize) {
        let total = n.max(1) as f64;
        self.nodes.push(Node::Leaf {
            distribution: counts.iter().map(|&c| c as f64 / total).collect(),
        });
    }

    fn class_counts(&self, rows: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &row in rows {
            counts[self.targets[row]] += 1;
        }
        counts
    }

    /// Search a random subset of features for the split with the largest Gini gain
    fn find_best_split(
        &mut self,
        rows: &[usize],
        counts: &[usize],
        impurity: f64,
    ) -> Option<SplitCandidate> {
        let n_features = self.x.ncols();
        let amount = self.params.max_features.clamp(1, n_features);
        let candidates = rand::seq::index::sample(&mut *self.rng, n_features, amount);

        let mut best: Option<SplitCandidate> = None;
        let mut pairs: Vec<(f64, usize)> = Vec::with_capacity(rows.len());

        for feature in candidates.iter() {
            pairs.clear();
            pairs.extend(
                rows.iter()
                    .map(|&row| (self.x[[row, feature]], self.targets[row])),
            );
            pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            if let Some((threshold, gain)) =
                best_threshold(&pairs, counts, impurity, self.params.min_samples_leaf)
            {
                if best.map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }
}

/// Gini impurity `1 - sum(p_k^2)` for class counts over `n` rows
fn gini_impurity(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let total = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Best threshold on one feature.
///
/// `sorted_pairs` holds `(value, class)` sorted by value. Returns
/// `(threshold, gain)` or `None` when no position satisfies the leaf size or
/// every value is equal.
fn best_threshold(
    sorted_pairs: &[(f64, usize)],
    counts: &[usize],
    impurity: f64,
    min_samples_leaf: usize,
) -> Option<(f64, f64)> {
    let n = sorted_pairs.len();
    if n < 2 * min_samples_leaf || n < 2 {
        return None;
    }

    let total = n as f64;
    let mut left_counts = vec![0usize; counts.len()];
    let mut right_counts = counts.to_vec();
    let mut best: Option<(f64, f64)> = None;

    for i in 0..n - 1 {
        let (value, class) = sorted_pairs[i];
        left_counts[class] += 1;
        right_counts[class] -= 1;

        let left_n = i + 1;
        let right_n = n - left_n;
        if left_n < min_samples_leaf || right_n < min_samples_leaf {
            continue;
        }

        let next_value = sorted_pairs[i + 1].0;
        if next_value <= value {
            continue;
        }

        let child = (left_n as f64 * gini_impurity(&left_counts, left_n)
            + right_n as f64 * gini_impurity(&right_counts, right_n))
            / total;
        let gain = impurity - child;

        if best.map_or(true, |(_, best_gain)| gain > best_gain) {
            let mut threshold = value + (next_value - value) / 2.0;
            // Adjacent floats can round the midpoint up onto the right value
            if threshold >= next_value || !threshold.is_finite() {
                threshold = value;
            }
            best = Some((threshold, gain));
        }
    }

    best
}
