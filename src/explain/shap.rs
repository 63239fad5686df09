//! Sampled Shapley values for one class probability
//!
//! For each explained row, features are switched one at a time from a
//! background row's value to the explained row's value, in a random order,
//! and each probability change is credited to the feature just switched.
//! Averaging over background rows and orders gives values that sum exactly to
//! `f(row) - base_value`, where `base_value` is the mean prediction over the
//! background rows used.

use log::info;
use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::derived_rng;
use crate::error::{PipelineError, Result};
use crate::model::Classifier;
use crate::pipeline::FeatureMatrix;

pub const DEFAULT_MAX_BACKGROUND: usize = 50;
pub const DEFAULT_N_PERMUTATIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapOptions {
    /// Background rows are subsampled to at most this many
    pub max_background: usize,
    /// Random feature orders per (row, background row) pair
    pub n_permutations: usize,
    pub seed: u64,
    /// Class whose probability is explained; `None` means the first class
    pub class: Option<String>,
}

impl Default for ShapOptions {
    fn default() -> Self {
        Self {
            max_background: DEFAULT_MAX_BACKGROUND,
            n_permutations: DEFAULT_N_PERMUTATIONS,
            seed: crate::model::DEFAULT_SEED,
            class: None,
        }
    }
}

/// Mean absolute attribution of one feature across explained rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttribution {
    pub name: String,
    pub mean_abs: f64,
}

/// Per-row, per-feature attributions for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationSet {
    pub feature_names: Vec<String>,
    pub class: String,
    /// Mean predicted probability of `class` over the background rows
    pub base_value: f64,
    /// Predicted probability of `class` per explained row
    pub predictions: Vec<f64>,
    /// `values[row][feature]`
    pub values: Vec<Vec<f64>>,
}

impl ExplanationSet {
    /// Mean |value| per feature, largest first
    pub fn global_summary(&self) -> Vec<FeatureAttribution> {
        let n_rows = self.values.len().max(1) as f64;
        let mut summary: Vec<FeatureAttribution> = self
            .feature_names
            .iter()
            .enumerate()
            .map(|(j, name)| FeatureAttribution {
                name: name.clone(),
                mean_abs: self.values.iter().map(|row| row[j].abs()).sum::<f64>() / n_rows,
            })
            .collect();
        summary.sort_by(|a, b| {
            b.mean_abs
                .total_cmp(&a.mean_abs)
                .then_with(|| a.name.cmp(&b.name))
        });
        summary
    }
}

/// Explain every row of `matrix` against rows of `background`
///
/// Both matrices must already be in the model's column order.
pub fn shap_values<C: Classifier + ?Sized>(
    model: &C,
    background: &FeatureMatrix,
    matrix: &FeatureMatrix,
    options: &ShapOptions,
) -> Result<ExplanationSet> {
    for (what, m) in [("background", background), ("explained", matrix)] {
        if m.n_features() != model.n_features() {
            return Err(PipelineError::SchemaMismatch {
                reason: format!(
                    "model expects {} features but the {} matrix has {}",
                    model.n_features(),
                    what,
                    m.n_features()
                ),
            });
        }
    }
    if background.n_rows() == 0 {
        return Err(PipelineError::InvalidInput {
            reason: "background matrix has no rows".to_string(),
        });
    }
    if options.max_background == 0 || options.n_permutations == 0 {
        return Err(PipelineError::InvalidInput {
            reason: "max_background and n_permutations must be at least 1".to_string(),
        });
    }

    let class_index = match &options.class {
        None => 0,
        Some(name) => model
            .classes()
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PipelineError::InvalidInput {
                reason: format!("unknown class '{}' (model classes: {:?})", name, model.classes()),
            })?,
    };
    let class = model
        .classes()
        .get(class_index)
        .cloned()
        .ok_or_else(|| PipelineError::InvalidInput {
            reason: "model has no classes".to_string(),
        })?;

    let background_rows = subsample(background.to_rows()?, options.max_background, options.seed);
    let rows = matrix.to_rows()?;

    let base_value = background_rows
        .iter()
        .map(|b| model.predict_proba_row(b)[class_index])
        .sum::<f64>()
        / background_rows.len() as f64;

    info!(
        "Explaining {} rows against {} background rows ({} orders each, class '{}')",
        rows.len(),
        background_rows.len(),
        options.n_permutations,
        class
    );

    let explained: Vec<(f64, Vec<f64>)> = rows
        .par_iter()
        .enumerate()
        .map(|(i, row)| {
            let mut rng = derived_rng(options.seed, i);
            explain_row(
                model,
                row,
                &background_rows,
                class_index,
                options.n_permutations,
                &mut rng,
            )
        })
        .collect();

    let (predictions, values): (Vec<f64>, Vec<Vec<f64>>) = explained.into_iter().unzip();

    Ok(ExplanationSet {
        feature_names: matrix.column_names(),
        class,
        base_value,
        predictions,
        values,
    })
}

fn explain_row<C: Classifier + ?Sized>(
    model: &C,
    row: &[f64],
    background: &[Vec<f64>],
    class_index: usize,
    n_permutations: usize,
    rng: &mut StdRng,
) -> (f64, Vec<f64>) {
    let n_features = row.len();
    let mut phi = vec![0.0; n_features];
    let mut order: Vec<usize> = (0..n_features).collect();

    for base in background {
        for _ in 0..n_permutations {
            order.shuffle(rng);
            let mut current = base.clone();
            let mut previous = model.predict_proba_row(&current)[class_index];
            for &feature in &order {
                current[feature] = row[feature];
                let next = model.predict_proba_row(&current)[class_index];
                phi[feature] += next - previous;
                previous = next;
            }
        }
    }

    let samples = (background.len() * n_permutations) as f64;
    phi.iter_mut().for_each(|v| *v /= samples);
    (model.predict_proba_row(row)[class_index], phi)
}

/// Deterministic subsample preserving original row order
fn subsample(rows: Vec<Vec<f64>>, max_rows: usize, seed: u64) -> Vec<Vec<f64>> {
    if rows.len() <= max_rows {
        return rows;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = index::sample(&mut rng, rows.len(), max_rows).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| rows[i].clone()).collect()
}
