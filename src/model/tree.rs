//! CART decision tree with Gini impurity
//!
//! Nodes live in a flat vector and reference their children by index, and the
//! builder runs from an explicit work stack.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Minimum impurity decrease for a split to be accepted
const MIN_GAIN: f64 = 1e-12;

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth (root is depth 0); `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs before it may be split
    pub min_samples_split: usize,
    /// Features examined per split before settling for the best found
    pub max_features: usize,
}

/// A node of the flattened tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// Rows with `row[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Class probability distribution of the training rows that reached it
    Leaf {
        distribution: Vec<f64>,
        n_samples: usize,
    },
}

/// A fitted classification tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    n_classes: usize,
}

struct Pending {
    node: usize,
    indices: Vec<usize>,
    depth: usize,
}

struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl DecisionTree {
    /// Fit a tree on the rows of `x` listed in `indices` (repeats allowed)
    ///
    /// `y` holds class indices in `0..n_classes`. The random generator decides
    /// the order in which features are tried at each node.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        indices: Vec<usize>,
        n_classes: usize,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let n_features = x.first().map(|r| r.len()).unwrap_or(0);
        let placeholder = Node::Leaf {
            distribution: Vec::new(),
            n_samples: 0,
        };

        let mut nodes = vec![placeholder.clone()];
        let mut stack = vec![Pending {
            node: 0,
            indices,
            depth: 0,
        }];
        let mut features: Vec<usize> = (0..n_features).collect();

        while let Some(pending) = stack.pop() {
            let counts = class_counts(y, &pending.indices, n_classes);
            let n = pending.indices.len();

            let stop = n < params.min_samples_split.max(2)
                || counts.iter().filter(|c| **c > 0).count() <= 1
                || params.max_depth.is_some_and(|d| pending.depth >= d);

            let split = if stop {
                None
            } else {
                features.shuffle(rng);
                best_split(x, y, &pending.indices, &counts, &features, params.max_features)
            };

            let Some(split) = split else {
                nodes[pending.node] = leaf(&counts, n);
                continue;
            };

            let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = pending
                .indices
                .iter()
                .partition(|&&i| x[i][split.feature] <= split.threshold);

            // A split must shrink both children or the stack never drains.
            if left_indices.is_empty() || right_indices.is_empty() {
                nodes[pending.node] = leaf(&counts, n);
                continue;
            }

            let left = nodes.len();
            nodes.push(placeholder.clone());
            let right = nodes.len();
            nodes.push(placeholder.clone());

            nodes[pending.node] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            stack.push(Pending {
                node: right,
                indices: right_indices,
                depth: pending.depth + 1,
            });
            stack.push(Pending {
                node: left,
                indices: left_indices,
                depth: pending.depth + 1,
            });
        }

        Self {
            nodes,
            n_features,
            n_classes,
        }
    }

    /// Leaf distribution reached by `row`
    pub fn predict_distribution(&self, row: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf { distribution, .. } => return distribution,
            }
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Depth of the deepest leaf (a single leaf has depth 0)
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            match &self.nodes[idx] {
                Node::Split { left, right, .. } => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
                Node::Leaf { .. } => max_depth = max_depth.max(depth),
            }
        }
        max_depth
    }

    /// Check that the node graph is a well-formed tree for this shape
    ///
    /// Children must point forward (which rules out cycles), features must be
    /// in range, and every leaf must carry one probability per class.
    pub fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        if self.n_features != n_features || self.n_classes != n_classes {
            return Err(format!(
                "tree shape ({} features, {} classes) does not match forest ({}, {})",
                self.n_features, self.n_classes, n_features, n_classes
            ));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {} splits on unknown feature {}", idx, feature));
                    }
                    if *left <= idx || *right <= idx || *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(format!("node {} has invalid child indices", idx));
                    }
                }
                Node::Leaf { distribution, .. } => {
                    if distribution.len() != n_classes {
                        return Err(format!(
                            "leaf {} has {} probabilities for {} classes",
                            idx,
                            distribution.len(),
                            n_classes
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

fn class_counts(y: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in indices {
        counts[y[i]] += 1;
    }
    counts
}

fn leaf(counts: &[usize], n_samples: usize) -> Node {
    let total = n_samples.max(1) as f64;
    Node::Leaf {
        distribution: counts.iter().map(|c| *c as f64 / total).collect(),
        n_samples,
    }
}

/// Gini = 1 - Σ(p_i²)
fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Finite threshold `t` with `current <= t < next`, preferring the midpoint
///
/// Thresholds are stored in the JSON artifact, which cannot hold infinities.
fn separating_threshold(current: f64, next: f64) -> Option<f64> {
    let mid = current / 2.0 + next / 2.0;
    let candidate = if mid.is_finite() && current <= mid && mid < next {
        mid
    } else if current.is_finite() {
        current
    } else if next > f64::MIN {
        f64::MIN
    } else {
        return None;
    };
    (candidate.is_finite() && current <= candidate && candidate < next).then_some(candidate)
}

/// Search features in the given order for the split with the largest Gini gain
///
/// After `max_features` features have been examined the search stops, but only
/// once some valid split has been found.
fn best_split(
    x: &[Vec<f64>],
    y: &[usize],
    indices: &[usize],
    counts: &[usize],
    features: &[usize],
    max_features: usize,
) -> Option<Split> {
    let n = indices.len();
    let parent_impurity = gini(counts, n);
    let mut best: Option<Split> = None;

    for (examined, &feature) in features.iter().enumerate() {
        if examined >= max_features.max(1) && best.is_some() {
            break;
        }

        let mut order: Vec<usize> = indices.to_vec();
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_counts = vec![0usize; counts.len()];
        let mut right_counts = counts.to_vec();

        for pos in 0..n - 1 {
            let i = order[pos];
            left_counts[y[i]] += 1;
            right_counts[y[i]] -= 1;

            let current = x[i][feature];
            let next = x[order[pos + 1]][feature];
            if current.is_nan() || next.is_nan() || next <= current {
                continue;
            }
            let Some(threshold) = separating_threshold(current, next) else {
                continue;
            };

            let n_left = pos + 1;
            let n_right = n - n_left;
            let weighted = (n_left as f64 * gini(&left_counts, n_left)
                + n_right as f64 * gini(&right_counts, n_right))
                / n as f64;
            let gain = parent_impurity - weighted;

            if gain > MIN_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(Split {
                    feature,
                    threshold,
                    gain,
                });
            }
        }
    }

    best
}
