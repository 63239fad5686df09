//! Permutation feature importance
//!
//! A feature's importance is the drop in accuracy when its column is shuffled
//! across rows, averaged over several shuffles.

use log::info;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{derived_rng, mean_std};
use crate::error::{PipelineError, Result};
use crate::model::metrics::{accuracy, weighted_f1};
use crate::model::Classifier;
use crate::pipeline::FeatureMatrix;

/// Default number of shuffles per feature
pub const DEFAULT_N_REPEATS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PermutationOptions {
    pub n_repeats: usize,
    pub seed: u64,
}

impl Default for PermutationOptions {
    fn default() -> Self {
        Self {
            n_repeats: DEFAULT_N_REPEATS,
            seed: crate::model::DEFAULT_SEED,
        }
    }
}

/// Accuracy drop statistics for one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub name: String,
    pub mean: f64,
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceReport {
    /// Accuracy on the unshuffled rows
    pub baseline_score: f64,
    /// Support-weighted F1 on the unshuffled rows
    pub baseline_f1: f64,
    /// Number of labeled rows scored
    pub n_rows: usize,
    pub n_repeats: usize,
    /// One entry per feature, in schema order
    pub features: Vec<FeatureImportance>,
}

impl ImportanceReport {
    /// Features sorted by mean importance, highest first
    pub fn ranked(&self) -> Vec<FeatureImportance> {
        let mut ranked = self.features.clone();
        ranked.sort_by(|a, b| b.mean.total_cmp(&a.mean).then_with(|| a.name.cmp(&b.name)));
        ranked
    }
}

/// Compute permutation importance of every feature in `matrix`
///
/// `labels` is row-aligned with `matrix`; rows with a null label are left out
/// of scoring. The matrix must already be in the model's column order.
pub fn permutation_importance<C: Classifier + ?Sized>(
    model: &C,
    matrix: &FeatureMatrix,
    labels: &[Option<String>],
    options: &PermutationOptions,
) -> Result<ImportanceReport> {
    if labels.len() != matrix.n_rows() {
        return Err(PipelineError::InvalidInput {
            reason: format!("{} labels for {} rows", labels.len(), matrix.n_rows()),
        });
    }
    if matrix.n_features() != model.n_features() {
        return Err(PipelineError::SchemaMismatch {
            reason: format!(
                "model expects {} features but the matrix has {}",
                model.n_features(),
                matrix.n_features()
            ),
        });
    }
    if options.n_repeats == 0 {
        return Err(PipelineError::InvalidInput {
            reason: "n_repeats must be at least 1".to_string(),
        });
    }

    let all_rows = matrix.to_rows()?;
    let (rows, truth): (Vec<Vec<f64>>, Vec<&str>) = all_rows
        .into_iter()
        .zip(labels)
        .filter_map(|(row, label)| label.as_deref().map(|l| (row, l)))
        .unzip();

    if rows.is_empty() {
        return Err(PipelineError::InvalidInput {
            reason: "no labeled rows to score".to_string(),
        });
    }

    let baseline_predictions = model.predict(&rows);
    let baseline_score = accuracy(&truth, &baseline_predictions);
    let baseline_f1 = weighted_f1(&truth, &baseline_predictions);
    let names = matrix.column_names();

    info!(
        "Permutation importance: {} features x {} repeats on {} rows (baseline accuracy {:.4})",
        names.len(),
        options.n_repeats,
        rows.len(),
        baseline_score
    );

    let features: Vec<FeatureImportance> = names
        .par_iter()
        .enumerate()
        .map(|(feature, name)| {
            let mut rng = derived_rng(options.seed, feature);
            let original: Vec<f64> = rows.iter().map(|r| r[feature]).collect();
            let mut shuffled = original.clone();
            let mut permuted_rows = rows.clone();

            let drops: Vec<f64> = (0..options.n_repeats)
                .map(|_| {
                    shuffled.copy_from_slice(&original);
                    shuffled.shuffle(&mut rng);
                    for (row, value) in permuted_rows.iter_mut().zip(&shuffled) {
                        row[feature] = *value;
                    }
                    baseline_score - accuracy(&truth, &model.predict(&permuted_rows))
                })
                .collect();

            let (mean, std) = mean_std(&drops);
            FeatureImportance {
                name: name.clone(),
                mean,
                std,
            }
        })
        .collect();

    Ok(ImportanceReport {
        baseline_score,
        baseline_f1,
        n_rows: rows.len(),
        n_repeats: options.n_repeats,
        features,
    })
}
