//! CART regression tree (variance reduction).
//!
//! Trees are grown on a list of row indices into the encoded matrix, so a
//! bootstrap sample with repeated rows needs no copying. Nodes live in a flat
//! arena; children are referenced by index.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::seq::index::sample;

/// Smallest impurity decrease that counts as a real split.
const MIN_DECREASE: f64 = 1e-12;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined at each split (already resolved against the matrix width).
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Grow a tree on `indices` (rows of `x`, repeats allowed).
    pub fn fit(x: &DMatrix<f64>, y: &[f64], indices: &[usize], params: &TreeParams, rng: &mut StdRng) -> Self {
        let mut nodes = Vec::new();
        let mut builder = Builder {
            x,
            y,
            params,
            rng,
            nodes: &mut nodes,
        };
        builder.grow(indices, 0);
        Self { nodes }
    }

    /// Predict the target for row `row` of `x`.
    pub fn predict_row(&self, x: &DMatrix<f64>, row: usize) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[(row, *feature)] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Leaf { .. })).count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }
}

struct Builder<'a> {
    x: &'a DMatrix<f64>,
    y: &'a [f64],
    params: &'a TreeParams,
    rng: &'a mut StdRng,
    nodes: &'a mut Vec<Node>,
}

impl Builder<'_> {
    fn grow(&mut self, indices: &[usize], depth: usize) -> usize {
        let value = mean(self.y, indices);

        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        if depth_reached || indices.len() < self.params.min_samples_split || is_constant(self.y, indices) {
            return self.push(Node::Leaf { value });
        }

        let Some(best) = self.best_split(indices) else {
            return self.push(Node::Leaf { value });
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.x[(i, best.feature)] <= best.threshold);
        if left_idx.is_empty() || right_idx.is_empty() {
            return self.push(Node::Leaf { value });
        }

        // Reserve the slot so the root stays at index 0.
        let node = self.push(Node::Leaf { value });
        let left = self.grow(&left_idx, depth + 1);
        let right = self.grow(&right_idx, depth + 1);
        self.nodes[node] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        node
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let n_features = self.x.ncols();
        if self.params.max_features >= n_features {
            return (0..n_features).collect();
        }
        let mut picked = sample(&mut *self.rng, n_features, self.params.max_features).into_vec();
        picked.sort_unstable();
        picked
    }

    /// Best (feature, threshold) by total squared-error decrease.
    ///
    /// Ties keep the lowest feature index and the lowest threshold.
    fn best_split(&mut self, indices: &[usize]) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let total_sum: f64 = indices.iter().map(|&i| self.y[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| self.y[i] * self.y[i]).sum();
        let parent_sse = total_sq - total_sum * total_sum / n as f64;

        let mut best: Option<SplitCandidate> = None;
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n);

        for feature in self.candidate_features() {
            pairs.clear();
            pairs.extend(indices.iter().map(|&i| (self.x[(i, feature)], self.y[i])));
            pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for k in 0..n - 1 {
                left_sum += pairs[k].1;
                left_sq += pairs[k].1 * pairs[k].1;

                if pairs[k].0 == pairs[k + 1].0 {
                    continue;
                }
                let left_n = k + 1;
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let left_sse = left_sq - left_sum * left_sum / left_n as f64;
                let right_sse = right_sq - right_sum * right_sum / right_n as f64;
                let decrease = parent_sse - (left_sse + right_sse);

                let floor = best.map_or(MIN_DECREASE, |b| b.decrease);
                if decrease > floor {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (pairs[k].0 + pairs[k + 1].0) / 2.0,
                        decrease,
                    });
                }
            }
        }

        best
    }
}

fn mean(y: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

fn is_constant(y: &[f64], indices: &[usize]) -> bool {
    let Some(&first) = indices.first() else {
        return true;
    };
    indices.iter().all(|&i| (y[i] - y[first]).abs() < 1e-15)
}
