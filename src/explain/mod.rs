//! Post-hoc explainability over a fitted classifier
//!
//! Both reporters are pure functions of (model, feature matrix, seed). Their
//! outputs are keyed by feature name and never stored in the model artifact.

pub mod permutation;
pub mod shap;

pub use permutation::*;
pub use shap::*;

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Generator for work item `index` (a feature or a row) under a user seed
pub(crate) fn derived_rng(seed: u64, index: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (index as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Mean and population standard deviation
pub(crate) fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_mean_std() {
        let (mean, std) = mean_std(&[1.0, 3.0]);
        assert!((mean - 2.0).abs() < 1e-12);
        assert!((std - 1.0).abs() < 1e-12);
        assert_eq!(mean_std(&[]), (0.0, 0.0));
    }

    #[test]
    fn test_derived_rng_is_reproducible() {
        let a: u64 = derived_rng(42, 3).gen();
        let b: u64 = derived_rng(42, 3).gen();
        let c: u64 = derived_rng(42, 4).gen();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
