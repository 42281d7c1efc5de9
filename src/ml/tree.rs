//! CART decision tree with Gini splits, stored as a flat node array.
//!
//! Rows go left when `value <= threshold`. Candidate thresholds sit halfway
//! between adjacent distinct values among the rows of the node being split.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeOptions {
    /// Depth limit; unlimited when `None`.
    pub max_depth: Option<usize>,
    /// Nodes with fewer rows become leaves.
    pub min_samples_split: usize,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
}

impl DecisionTree {
    /// Grow a tree on the rows of `x` listed in `rows`.
    ///
    /// `rows` may repeat indices (bootstrap samples). Labels are class indices
    /// below `n_classes`; callers validate them. A node that is pure, too small,
    /// at the depth limit or has no distinct feature values becomes a leaf
    /// holding its majority class (lowest index on ties).
    pub fn fit(
        x: &Array2<f64>,
        y: &[usize],
        rows: Vec<usize>,
        n_classes: usize,
        options: &TreeOptions,
    ) -> Self {
        let mut builder = Builder {
            x,
            y,
            n_classes: n_classes.max(1),
            options,
            nodes: Vec::new(),
        };
        builder.grow(rows, 0);
        Self {
            nodes: builder.nodes,
            n_features: x.ncols(),
        }
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> usize {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { class } => return *class,
                TreeNode::Split {
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
            }
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Array1<usize> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        self.node_depth(0)
    }

    fn node_depth(&self, idx: usize) -> usize {
        match &self.nodes[idx] {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => {
                1 + self.node_depth(*left).max(self.node_depth(*right))
            }
        }
    }

    /// Structural checks for trees read from disk.
    ///
    /// Children must point forward in the array, which rules out cycles.
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= self.n_features {
                    return Err(format!("node {idx} splits on missing feature {feature}"));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!("node {idx} has invalid child {child}"));
                    }
                }
            }
        }
        Ok(())
    }
}

struct Builder<'a> {
    x: &'a Array2<f64>,
    y: &'a [usize],
    n_classes: usize,
    options: &'a TreeOptions,
    nodes: Vec<TreeNode>,
}

struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl Builder<'_> {
    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&rows);
        let idx = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            class: majority(&counts),
        });

        let pure = counts.iter().filter(|&&count| count > 0).count() <= 1;
        let depth_reached = self.options.max_depth.is_some_and(|max| depth >= max);
        if pure || depth_reached || rows.len() < self.options.min_samples_split.max(2) {
            return idx;
        }
        let Some(split) = self.best_split(&rows, &counts) else {
            return idx;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&row| self.x[[row, split.feature]] <= split.threshold);
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[idx] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    fn class_counts(&self, rows: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &row in rows {
            counts[self.y[row]] += 1;
        }
        counts
    }

    /// Lowest weighted Gini over every feature and every boundary between
    /// distinct values. Zero-gain splits are allowed; ties keep the earlier
    /// feature.
    fn best_split(&self, rows: &[usize], parent: &[usize]) -> Option<Split> {
        let total = rows.len();
        let mut best: Option<Split> = None;
        let mut pairs: Vec<(f64, usize)> = Vec::with_capacity(total);
        let mut left = vec![0usize; self.n_classes];
        for feature in 0..self.x.ncols() {
            pairs.clear();
            pairs.extend(rows.iter().map(|&row| (self.x[[row, feature]], self.y[row])));
            pairs.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
            left.iter_mut().for_each(|count| *count = 0);

            for i in 0..total - 1 {
                left[pairs[i].1] += 1;
                let (value, next) = (pairs[i].0, pairs[i + 1].0);
                if value.total_cmp(&next).is_eq() {
                    continue;
                }
                let n_left = i + 1;
                let n_right = total - n_left;
                let right_gini = gini(
                    parent.iter().zip(&left).map(|(all, l)| all - l),
                    n_right,
                );
                let impurity = (n_left as f64 * gini(left.iter().copied(), n_left)
                    + n_right as f64 * right_gini)
                    / total as f64;
                if best.as_ref().is_none_or(|b| impurity < b.impurity) {
                    best = Some(Split {
                        feature,
                        threshold: value + (next - value) / 2.0,
                        impurity,
                    });
                }
            }
        }
        best
    }
}

fn gini(counts: impl Iterator<Item = usize>, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .map(|count| {
            let p = count as f64 / n;
            p * p
        })
        .sum::<f64>()
}

fn majority(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{RawRecord, generate};
    use crate::ml::pipeline::FeatureSchema;
    use ndarray::array;

    fn all_rows(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn threshold_sits_between_distinct_values() {
        let x = array![[0.0], [0.0], [1.0], [1.0]];
        let y = [0, 0, 1, 1];
        let tree = DecisionTree::fit(&x, &y, all_rows(4), 2, &TreeOptions::default());
        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict(&array![[0.5], [0.51], [-3.0]]).to_vec(), vec![0, 1, 0]);
    }

    #[test]
    fn learns_xor_of_binary_columns() {
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = [0, 1, 1, 0];
        let tree = DecisionTree::fit(&x, &y, all_rows(4), 2, &TreeOptions::default());
        assert_eq!(tree.predict(&x).to_vec(), y.to_vec());
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn one_hot_rows_are_fitted_exactly() {
        let records = generate(42, 2000);
        let rows: Vec<RawRecord> = records.iter().map(RawRecord::from_record).collect();
        let labels: Vec<usize> = records
            .iter()
            .map(|record| usize::from(record.recommend_mac == Some(true)))
            .collect();
        let (_, x) = FeatureSchema::fit(&rows).unwrap();
        let tree = DecisionTree::fit(&x, &labels, all_rows(x.nrows()), 2, &TreeOptions::default());
        assert_eq!(tree.predict(&x).to_vec(), labels);
        tree.validate().unwrap();
    }

    #[test]
    fn depth_limit_and_duplicates() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = [0, 1, 0, 1];
        let options = TreeOptions {
            max_depth: Some(1),
            ..TreeOptions::default()
        };
        let tree = DecisionTree::fit(&x, &y, vec![0, 0, 1, 2, 3, 3], 2, &options);
        assert!(tree.depth() <= 1);

        let same = array![[1.0], [1.0]];
        let tree = DecisionTree::fit(&same, &[0, 1], all_rows(2), 2, &TreeOptions::default());
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict(&same).to_vec(), vec![0, 0]);
    }

    #[test]
    fn validate_rejects_backward_children() {
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.5,
                    left: 0,
                    right: 1,
                },
                TreeNode::Leaf { class: 1 },
            ],
            n_features: 1,
        };
        assert!(tree.validate().is_err());
    }
}
