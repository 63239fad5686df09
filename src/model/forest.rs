//! Random forest classifier
//!
//! Trees are fitted on bootstrap samples in parallel. Tree `i` draws from its
//! own generator seeded with `seed + i`, so a fitted forest depends only on the
//! data and the seed, never on how rayon schedules the work.

use std::collections::BTreeSet;

use log::info;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, TreeParams};
use super::Classifier;
use crate::error::{PipelineError, Result};

/// Default number of trees
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// Default seed threaded through fitting and explanation
pub const DEFAULT_SEED: u64 = 42;

/// Forest training parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features tried per split; `None` uses `sqrt(n_features)`
    pub max_features: Option<usize>,
    /// Fit each tree on a bootstrap sample instead of all rows
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: DEFAULT_N_ESTIMATORS,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            bootstrap: true,
            seed: DEFAULT_SEED,
        }
    }
}

impl ForestParams {
    fn tree_params(&self, n_features: usize) -> TreeParams {
        let max_features = self
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().round() as usize)
            .clamp(1, n_features.max(1));
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            max_features,
        }
    }
}

/// An ensemble of decision trees voting with averaged leaf distributions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    classes: Vec<String>,
    n_features: usize,
    params: ForestParams,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit a forest on row-major features and string labels
    ///
    /// Classes are the sorted distinct labels.
    pub fn fit(rows: &[Vec<f64>], labels: &[String], params: &ForestParams) -> Result<Self> {
        if rows.is_empty() {
            return Err(PipelineError::InvalidInput {
                reason: "cannot fit a forest on zero rows".to_string(),
            });
        }
        if rows.len() != labels.len() {
            return Err(PipelineError::InvalidInput {
                reason: format!("{} rows but {} labels", rows.len(), labels.len()),
            });
        }
        if params.n_estimators == 0 {
            return Err(PipelineError::InvalidInput {
                reason: "n_estimators must be at least 1".to_string(),
            });
        }

        let n_features = rows[0].len();
        if n_features == 0 {
            return Err(PipelineError::EmptyFeatureSet);
        }
        if let Some(bad) = rows.iter().position(|r| r.len() != n_features) {
            return Err(PipelineError::InvalidInput {
                reason: format!("row {} has {} features, expected {}", bad, rows[bad].len(), n_features),
            });
        }

        let classes: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let y: Vec<usize> = labels
            .iter()
            .map(|l| classes.binary_search(l).unwrap_or(0))
            .collect();

        let tree_params = params.tree_params(n_features);
        let n_samples = rows.len();

        info!(
            "Fitting {} trees on {} rows x {} features ({} classes)",
            params.n_estimators,
            n_samples,
            n_features,
            classes.len()
        );

        let trees: Vec<DecisionTree> = (0..params.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(i as u64));
                let indices = if params.bootstrap {
                    bootstrap_sample(n_samples, &mut rng)
                } else {
                    (0..n_samples).collect()
                };
                DecisionTree::fit(rows, &y, indices, classes.len(), &tree_params, &mut rng)
            })
            .collect();

        Ok(Self {
            classes,
            n_features,
            params: params.clone(),
            trees,
        })
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Check internal consistency after deserialization
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.classes.is_empty() {
            return Err("model has no classes".to_string());
        }
        if self.trees.is_empty() {
            return Err("model has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba_row(&self, row: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (p, v) in proba.iter_mut().zip(tree.predict_distribution(row)) {
                *p += v;
            }
        }
        let n_trees = self.trees.len().max(1) as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        proba
    }
}

/// Draw `n_samples` row indices with replacement
fn bootstrap_sample(n_samples: usize, rng: &mut StdRng) -> Vec<usize> {
    let dist = Uniform::from(0..n_samples);
    (0..n_samples).map(|_| dist.sample(rng)).collect()
}
