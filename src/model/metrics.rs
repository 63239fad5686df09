//! Classification scores over string labels

use std::collections::BTreeMap;

/// Fraction of rows where the prediction equals the truth
pub fn accuracy<P: AsRef<str>>(truth: &[&str], predicted: &[P]) -> f64 {
    let correct = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| **t == p.as_ref())
        .count();
    correct as f64 / truth.len().max(1) as f64
}

/// F1 per class, averaged with weights equal to each class's support in `truth`
///
/// Classes that only appear among the predictions have zero support and add
/// nothing except their false positives against the other classes.
pub fn weighted_f1<P: AsRef<str>>(truth: &[&str], predicted: &[P]) -> f64 {
    // (tp, fp, fn) per class
    let mut counts: BTreeMap<&str, (usize, usize, usize)> = BTreeMap::new();
    for (t, p) in truth.iter().zip(predicted) {
        let p = p.as_ref();
        if *t == p {
            counts.entry(*t).or_default().0 += 1;
        } else {
            counts.entry(p).or_default().1 += 1;
            counts.entry(*t).or_default().2 += 1;
        }
    }

    let total = truth.len();
    if total == 0 {
        return 0.0;
    }

    counts
        .values()
        .map(|&(tp, fp, fn_count)| {
            let support = tp + fn_count;
            let denom = 2 * tp + fp + fn_count;
            let f1 = if denom == 0 {
                0.0
            } else {
                2.0 * tp as f64 / denom as f64
            };
            f1 * support as f64 / total as f64
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let truth = ["a", "b", "b"];
        assert_eq!(accuracy(&truth, &["a", "b", "b"]), 1.0);
        assert!((weighted_f1(&truth, &["a", "b", "b"]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_f1_matches_hand_computation() {
        // a: tp 1, fp 1, fn 1 -> f1 0.5, support 2
        // b: tp 1, fp 1, fn 1 -> f1 0.5, support 2
        let truth = ["a", "a", "b", "b"];
        let predicted = ["a", "b", "b", "a"];
        assert_eq!(accuracy(&truth, &predicted), 0.5);
        assert!((weighted_f1(&truth, &predicted) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_prediction_only_class_has_no_weight() {
        // a: tp 2, fn 1 -> f1 0.8, support 3; z: fp 1, support 0
        let truth = ["a", "a", "a"];
        let predicted = ["a", "a", "z"];
        assert!((weighted_f1(&truth, &predicted) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_empty_is_zero() {
        let none: [&str; 0] = [];
        assert_eq!(weighted_f1(&none, &none), 0.0);
        assert_eq!(accuracy(&none, &none), 0.0);
    }
}
