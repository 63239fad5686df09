//! Integration tests for permutation importance and SHAP estimation on a trained model

use schemalock::explain::{permutation_importance, shap_values, PermutationOptions, ShapOptions};
use schemalock::model::ForestParams;
use schemalock::pipeline::{train, PipelineConfig, TrainingOutcome, TrainingSet};

#[path = "common/mod.rs"]
mod common;

use common::create_separable_dir;

fn trained() -> (TrainingSet, TrainingOutcome) {
    let (dir, _) = create_separable_dir(20);
    let params = ForestParams {
        n_estimators: 10,
        ..Default::default()
    };
    train(&PipelineConfig::with_data_dir(dir.path()), &params).unwrap()
}

#[test]
fn test_informative_feature_ranks_above_noise() {
    let (set, outcome) = trained();
    let options = PermutationOptions {
        n_repeats: 10,
        seed: 42,
    };

    let report = permutation_importance(
        outcome.artifact.model(),
        &set.matrix,
        &set.labeled.labels,
        &options,
    )
    .unwrap();

    assert_eq!(report.features.len(), set.matrix.n_features());
    assert!(report.baseline_score > 0.9);
    assert!(report.baseline_f1 > 0.9);
    let ranked = report.ranked();
    assert_eq!(ranked[0].name, "signal");
    assert!(ranked[0].mean > ranked[1].mean);
}

#[test]
fn test_importance_is_reproducible() {
    let (set, outcome) = trained();
    let options = PermutationOptions {
        n_repeats: 4,
        seed: 3,
    };
    let model = outcome.artifact.model();

    let a = permutation_importance(model, &set.matrix, &set.labeled.labels, &options).unwrap();
    let b = permutation_importance(model, &set.matrix, &set.labeled.labels, &options).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_shap_efficiency_holds_per_row() {
    let (set, outcome) = trained();
    let mask: Vec<bool> = (0..set.matrix.n_rows()).map(|i| i < 4).collect();
    let explained = set.matrix.filter_rows(&mask).unwrap();
    let options = ShapOptions {
        max_background: 8,
        n_permutations: 3,
        class: Some("CONFIRMED".to_string()),
        ..Default::default()
    };

    let set_values = shap_values(outcome.artifact.model(), &set.matrix, &explained, &options).unwrap();

    assert_eq!(set_values.values.len(), 4);
    for (prediction, row) in set_values.predictions.iter().zip(&set_values.values) {
        assert_eq!(row.len(), explained.n_features());
        let total: f64 = row.iter().sum();
        assert!((total - (prediction - set_values.base_value)).abs() < 1e-9);
    }
    assert_eq!(set_values.global_summary()[0].name, "signal");
}

#[test]
fn test_shap_is_reproducible() {
    let (set, outcome) = trained();
    let options = ShapOptions {
        max_background: 5,
        n_permutations: 2,
        ..Default::default()
    };
    let model = outcome.artifact.model();

    let a = shap_values(model, &set.matrix, &set.matrix, &options).unwrap();
    let b = shap_values(model, &set.matrix, &set.matrix, &options).unwrap();
    assert_eq!(a, b);
}
