//! Classifier, its training parameters, and the persisted model artifact

pub mod artifact;
pub mod forest;
pub mod metrics;
pub mod tree;

pub use artifact::*;
pub use forest::*;
pub use tree::{DecisionTree, TreeParams};

use rayon::prelude::*;

/// A fitted multi-class classifier over dense `f64` feature rows
pub trait Classifier: Send + Sync {
    /// Class labels, in the column order of `predict_proba`
    fn classes(&self) -> &[String];

    /// Number of features each row must have
    fn n_features(&self) -> usize;

    /// Class probabilities for a single row
    fn predict_proba_row(&self, row: &[f64]) -> Vec<f64>;

    /// Class probabilities, one row per input row
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.par_iter().map(|row| self.predict_proba_row(row)).collect()
    }

    /// Most probable class label per row
    fn predict(&self, rows: &[Vec<f64>]) -> Vec<String> {
        self.predict_proba(rows)
            .iter()
            .map(|p| self.classes()[argmax(p)].clone())
            .collect()
    }
}

/// Index of the largest value; ties resolve to the lowest index
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
