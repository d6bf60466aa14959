//! Multiple testing correction for equivalence p-values, used when many features are
//! tested for equivalence at once.

use anyhow::{Result, anyhow};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionMethod {
    /// Family-wise error rate, single step
    Bonferroni,
    /// Family-wise error rate, step-down
    Holm,
    /// False discovery rate under independence or positive dependence
    BenjaminiHochberg,
    /// False discovery rate under arbitrary dependence
    BenjaminiYekutieli,
}

impl CorrectionMethod {
    pub fn name(&self) -> &'static str {
        match self {
            CorrectionMethod::Bonferroni => "bonferroni",
            CorrectionMethod::Holm => "holm",
            CorrectionMethod::BenjaminiHochberg => "benjamini_hochberg",
            CorrectionMethod::BenjaminiYekutieli => "benjamini_yekutieli",
        }
    }
}

/// Adjust p-values with the chosen method.
///
/// # Example
/// ```
/// use single_equivalence::testing::correction::{adjust_p_values, CorrectionMethod};
///
/// let adjusted = adjust_p_values(&[0.125, 0.25, 0.5], CorrectionMethod::Bonferroni).unwrap();
/// assert_eq!(adjusted, vec![0.375, 0.75, 1.0]);
/// ```
pub fn adjust_p_values(p_values: &[f64], method: CorrectionMethod) -> Result<Vec<f64>> {
    match method {
        CorrectionMethod::Bonferroni => bonferroni_correction(p_values),
        CorrectionMethod::Holm => holm_bonferroni_correction(p_values),
        CorrectionMethod::BenjaminiHochberg => benjamini_hochberg_correction(p_values),
        CorrectionMethod::BenjaminiYekutieli => benjamini_yekutieli_correction(p_values),
    }
}

fn validate_p_values(p_values: &[f64]) -> Result<()> {
    if p_values.is_empty() {
        return Err(anyhow!("Empty p-value array"));
    }

    for (i, &p) in p_values.iter().enumerate() {
        if !(0.0..=1.0).contains(&p) {
            return Err(anyhow!("Invalid p-value at index {}: {}", i, p));
        }
    }
    Ok(())
}

/// Indices of `p_values` in ascending p-value order.
fn ascending_order(p_values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..p_values.len()).collect();
    order.sort_by(|&a, &b| {
        p_values[a]
            .partial_cmp(&p_values[b])
            .unwrap_or(Ordering::Equal)
    });
    order
}

/// Apply Bonferroni correction: each p-value times the number of tests, capped at 1.
pub fn bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len() as f64;

    Ok(p_values.iter().map(|&p| (p * n).min(1.0)).collect())
}

/// Apply the Holm step-down procedure.
///
/// The i-th smallest p-value is multiplied by `n - i` (0-based), and the adjusted values
/// are made non-decreasing along the sorted order.
pub fn holm_bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len();
    let order = ascending_order(p_values);

    let mut adjusted_p_values = vec![0.0; n];
    let mut running_max: f64 = 0.0;

    for (i, &idx) in order.iter().enumerate() {
        let adjusted = (p_values[idx] * (n - i) as f64).min(1.0);
        running_max = running_max.max(adjusted);
        adjusted_p_values[idx] = running_max;
    }

    Ok(adjusted_p_values)
}

/// Apply the Benjamini-Hochberg step-up procedure controlling the false discovery rate.
pub fn benjamini_hochberg_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    Ok(step_up(p_values, 1.0))
}

/// Apply the Benjamini-Yekutieli procedure, BH scaled by the harmonic number of `n`.
pub fn benjamini_yekutieli_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let c_n: f64 = (1..=p_values.len()).map(|i| 1.0 / i as f64).sum();
    Ok(step_up(p_values, c_n))
}

fn step_up(p_values: &[f64], factor: f64) -> Vec<f64> {
    let n = p_values.len();
    let order = ascending_order(p_values);

    let mut adjusted_p_values = vec![0.0; n];
    let mut current_min: f64 = 1.0;

    // Process from largest to smallest p-value
    for (i, &idx) in order.iter().enumerate().rev() {
        let rank = (i + 1) as f64;
        let adjustment = (p_values[idx] * factor * n as f64 / rank).min(1.0);
        current_min = current_min.min(adjustment);
        adjusted_p_values[idx] = current_min;
    }

    adjusted_p_values
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_all_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert_abs_diff_eq!(*a, *e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_bonferroni() {
        let adjusted = bonferroni_correction(&[0.01, 0.02, 0.5]).unwrap();
        assert_all_close(&adjusted, &[0.03, 0.06, 1.0]);
    }

    #[test]
    fn test_holm() {
        // sorted: 0.01 * 4, 0.02 * 3, 0.03 * 2, 0.04 * 1 -> monotone: 0.04, 0.06, 0.06, 0.06
        let adjusted = holm_bonferroni_correction(&[0.03, 0.01, 0.04, 0.02]).unwrap();
        assert_all_close(&adjusted, &[0.06, 0.04, 0.06, 0.06]);
    }

    #[test]
    fn test_benjamini_hochberg() {
        // R: p.adjust(c(0.01, 0.04, 0.03, 0.005), "BH") = 0.02 0.04 0.04 0.02
        let adjusted = benjamini_hochberg_correction(&[0.01, 0.04, 0.03, 0.005]).unwrap();
        assert_all_close(&adjusted, &[0.02, 0.04, 0.04, 0.02]);
    }

    #[test]
    fn test_benjamini_yekutieli() {
        let p = [0.01, 0.04, 0.03, 0.005];
        let bh = benjamini_hochberg_correction(&p).unwrap();
        let by = benjamini_yekutieli_correction(&p).unwrap();
        let c_n = 1.0 + 0.5 + 1.0 / 3.0 + 0.25;
        for (b, y) in bh.iter().zip(&by) {
            assert_abs_diff_eq!(*y, (b * c_n).min(1.0), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_adjusted_never_below_raw() {
        let p = [0.2, 0.001, 0.049, 0.5, 0.03, 1.0];
        for method in [
            CorrectionMethod::Bonferroni,
            CorrectionMethod::Holm,
            CorrectionMethod::BenjaminiHochberg,
            CorrectionMethod::BenjaminiYekutieli,
        ] {
            let adjusted = adjust_p_values(&p, method).unwrap();
            for (raw, adj) in p.iter().zip(&adjusted) {
                assert!(adj >= raw, "{} lowered a p-value", method.name());
                assert!(*adj <= 1.0);
            }
        }
    }

    #[test]
    fn test_invalid_input() {
        assert!(bonferroni_correction(&[]).is_err());
        assert!(holm_bonferroni_correction(&[0.1, 1.2]).is_err());
        assert!(benjamini_hochberg_correction(&[-0.1]).is_err());
        assert!(benjamini_yekutieli_correction(&[f64::NAN]).is_err());
    }
}
