//! Training path: directory of files to a persisted model artifact

use log::{info, warn};

use super::config::PipelineConfig;
use super::encoder::{encode_features, FeatureMatrix};
use super::loader::{load_and_combine, LoadOptions, SkippedFile};
use super::target::{class_distribution, split_target, LabeledTable};
use crate::error::{PipelineError, Result};
use crate::model::{ForestParams, ModelArtifact, RandomForest};

/// Consolidated, labeled and encoded training data
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub labeled: LabeledTable,
    /// Encoded features, row-aligned with `labeled.labels`
    pub matrix: FeatureMatrix,
    /// Files that failed to parse and were left out
    pub skipped: Vec<SkippedFile>,
}

impl TrainingSet {
    /// Rows whose chosen target is null (kept because another candidate had a value)
    pub fn unlabeled_rows(&self) -> usize {
        self.labeled.labels.iter().filter(|l| l.is_none()).count()
    }
}

/// Summary of a completed training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    /// Rows per class among the rows the model was fitted on
    pub distribution: Vec<(String, usize)>,
    /// Rows left out of fitting because their label was null
    pub unlabeled_excluded: usize,
}

/// Load, resolve the target and encode everything under `config.data_dir`
pub fn build_training_set(config: &PipelineConfig) -> Result<TrainingSet> {
    let consolidated = load_and_combine(&config.data_dir, &LoadOptions::from(config))?;
    let labeled = split_target(
        &consolidated.table,
        &config.target_candidates,
        config.exclude_other_candidates,
    )?;
    let matrix = encode_features(&labeled.features)?;

    info!(
        "Training set: {} rows x {} features from {} file(s)",
        matrix.n_rows(),
        matrix.n_features(),
        consolidated.table.sources().len()
    );

    Ok(TrainingSet {
        labeled,
        matrix,
        skipped: consolidated.skipped,
    })
}

/// Fit a forest on the labeled rows of `set` and bind it to the feature schema
pub fn fit_artifact(set: &TrainingSet, params: &ForestParams) -> Result<TrainingOutcome> {
    let mask: Vec<bool> = set.labeled.labels.iter().map(|l| l.is_some()).collect();
    let labels: Vec<String> = set.labeled.labels.iter().flatten().cloned().collect();
    let unlabeled_excluded = mask.len() - labels.len();

    if labels.is_empty() {
        return Err(PipelineError::NoLabeledRows {
            target: set.labeled.target.clone(),
        });
    }
    if unlabeled_excluded > 0 {
        warn!(
            "{} row(s) have no value in target '{}' and are excluded from fitting",
            unlabeled_excluded, set.labeled.target
        );
    }

    let fitted = if unlabeled_excluded > 0 {
        set.matrix.filter_rows(&mask)?
    } else {
        set.matrix.clone()
    };

    let model = RandomForest::fit(&fitted.to_rows()?, &labels, params)?;
    let artifact = ModelArtifact::new(model, &fitted, &set.labeled.target)?;

    let distribution = class_distribution(
        &labels.into_iter().map(Some).collect::<Vec<_>>(),
    );

    Ok(TrainingOutcome {
        artifact,
        distribution,
        unlabeled_excluded,
    })
}

/// Full training run: build the training set and fit the model
///
/// The artifact is returned, not written; call [`ModelArtifact::persist`].
pub fn train(config: &PipelineConfig, params: &ForestParams) -> Result<(TrainingSet, TrainingOutcome)> {
    let set = build_training_set(config)?;
    let outcome = fit_artifact(&set, params)?;
    Ok((set, outcome))
}
