//! Inference path: new raw data to predictions under a trained schema

use log::debug;

use super::align::{align_to_schema, AlignmentReport};
use super::encoder::{encode_for_schema, FeatureMatrix};
use super::loader::RawTable;
use crate::error::Result;
use crate::model::{argmax, Classifier, ModelArtifact};

/// Predicted labels and class probabilities, one entry per input row
#[derive(Debug, Clone, PartialEq)]
pub struct Predictions {
    /// Class labels in probability column order
    pub classes: Vec<String>,
    pub labels: Vec<String>,
    pub probabilities: Vec<Vec<f64>>,
}

impl Predictions {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Encode a raw batch and project it onto the artifact's feature schema
pub fn prepare_inference_matrix(
    artifact: &ModelArtifact,
    raw: &RawTable,
) -> Result<(FeatureMatrix, AlignmentReport)> {
    let (encoded, discarded) = encode_for_schema(raw, artifact.feature_columns())?;
    debug!(
        "Encoded inference batch: {} rows x {} features",
        encoded.n_rows(),
        encoded.n_features()
    );
    let (aligned, mut report) = align_to_schema(&encoded, artifact.feature_columns())?;
    report.dropped.extend(discarded);
    Ok((aligned, report))
}

/// Encode, align and predict
pub fn predict_batch(
    artifact: &ModelArtifact,
    raw: &RawTable,
) -> Result<(Predictions, AlignmentReport)> {
    let (aligned, report) = prepare_inference_matrix(artifact, raw)?;
    let model = artifact.model();

    let probabilities = model.predict_proba(&aligned.to_rows()?);
    let labels = probabilities
        .iter()
        .map(|p| model.classes()[argmax(p)].clone())
        .collect();

    Ok((
        Predictions {
            classes: model.classes().to_vec(),
            labels,
            probabilities,
        },
        report,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForestParams, RandomForest};
    use crate::pipeline::encode_features;
    use polars::prelude::*;

    fn artifact() -> ModelArtifact {
        let train = RawTable::new(
            df! {
                "size" => [1.0f64, 2.0, 3.0, 10.0, 11.0, 12.0],
                "shape" => ["round", "round", "square", "square", "round", "square"],
            }
            .unwrap(),
            Vec::new(),
        );
        let fm = encode_features(&train).unwrap();
        let labels: Vec<String> = ["small", "small", "small", "big", "big", "big"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let params = ForestParams {
            n_estimators: 10,
            ..Default::default()
        };
        let model = RandomForest::fit(&fm.to_rows().unwrap(), &labels, &params).unwrap();
        ModelArtifact::new(model, &fm, "label").unwrap()
    }

    #[test]
    fn test_predicts_batch_with_novel_category() {
        let artifact = artifact();
        let batch = RawTable::new(
            df! {
                "size" => [1.5f64, 11.5],
                "shape" => ["triangle", "round"],
            }
            .unwrap(),
            Vec::new(),
        );

        let (predictions, report) = predict_batch(&artifact, &batch).unwrap();
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions.classes, vec!["big", "small"]);
        assert_eq!(predictions.labels, vec!["small", "big"]);
        assert_eq!(report.added, vec!["shape_square"]);
        assert_eq!(report.dropped, vec!["shape_triangle"]);
        for row in &predictions.probabilities {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_aligned_matrix_matches_schema() {
        let artifact = artifact();
        let batch = RawTable::new(df! { "size" => [4.0f64] }.unwrap(), Vec::new());

        let (aligned, _) = prepare_inference_matrix(&artifact, &batch).unwrap();
        assert_eq!(aligned.column_names(), artifact.feature_columns());
        assert_eq!(aligned.column_values("shape_round").unwrap(), vec![0.0]);
    }

    #[test]
    fn test_novel_name_collision_is_dropped() {
        let artifact = artifact();
        let batch = RawTable::new(
            df! {
                "size" => [1.0f64, 12.0],
                "kind" => ["x", "y"],
                "kind_x" => [5.0f64, 6.0],
            }
            .unwrap(),
            Vec::new(),
        );

        let (predictions, report) = predict_batch(&artifact, &batch).unwrap();
        assert_eq!(predictions.len(), 2);
        assert!(report.dropped.contains(&"kind_x".to_string()));
        assert!(report.dropped.contains(&"kind_y".to_string()));
    }
}
