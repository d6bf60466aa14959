use crate::testing::error::{validate_finite, TostError};
use crate::testing::utils::SampleSummary;
use single_utilities::traits::FloatOps;

/// Convert a standardized effect size into symmetric equivalence margins.
///
/// Returns `(-d * pooled_std, d * pooled_std)`, the margins used when equivalence is
/// defined as "no effect larger than d standard deviations".
///
/// # Arguments
/// * `d` - Standardized effect size (e.g. Cohen's d of 0.5 for a medium effect)
/// * `pooled_std` - Pooled standard deviation, must be non-negative
///
/// # Example
/// ```
/// use single_equivalence::testing::effect::margins_from_effect_size;
///
/// let (lower, upper) = margins_from_effect_size(0.5, 10.0).unwrap();
/// assert_eq!((lower, upper), (-5.0, 5.0));
/// ```
pub fn margins_from_effect_size(d: f64, pooled_std: f64) -> Result<(f64, f64), TostError> {
    if !(pooled_std >= 0.0) || pooled_std.is_infinite() {
        return Err(TostError::DegenerateVariance {
            argument: "pooled standard deviation",
            value: pooled_std,
        });
    }
    validate_finite("effect size", d)?;

    let epsilon = d * pooled_std;
    Ok((-epsilon, epsilon))
}

/// Pooled standard deviation of two samples, weighting each variance by `n - 1`.
pub fn pooled_standard_deviation<T>(sample1: &[T], sample2: &[T]) -> Result<f64, TostError>
where
    T: FloatOps,
{
    let summary1 = SampleSummary::from_slice(sample1, "sample1")?;
    let summary2 = SampleSummary::from_slice(sample2, "sample2")?;
    Ok(pooled_sd_from_summaries(&summary1, &summary2))
}

fn pooled_sd_from_summaries(summary1: &SampleSummary, summary2: &SampleSummary) -> f64 {
    let n1 = summary1.n as f64;
    let n2 = summary2.n as f64;
    (((n1 - 1.0) * summary1.variance + (n2 - 1.0) * summary2.variance) / (n1 + n2 - 2.0)).sqrt()
}

/// Cohen's d of `mean1 - mean2` in pooled standard deviation units.
pub fn cohens_d<T>(sample1: &[T], sample2: &[T]) -> Result<f64, TostError>
where
    T: FloatOps,
{
    let summary1 = SampleSummary::from_slice(sample1, "sample1")?;
    let summary2 = SampleSummary::from_slice(sample2, "sample2")?;
    let pooled_sd = pooled_sd_from_summaries(&summary1, &summary2);

    if !(pooled_sd > 0.0) || !pooled_sd.is_finite() {
        return Err(TostError::DegenerateVariance {
            argument: "pooled standard deviation",
            value: pooled_sd,
        });
    }

    Ok((summary1.mean - summary2.mean) / pooled_sd)
}

/// Hedges' g, Cohen's d with the small-sample bias correction.
pub fn hedges_g<T>(sample1: &[T], sample2: &[T]) -> Result<f64, TostError>
where
    T: FloatOps,
{
    let d = cohens_d(sample1, sample2)?;

    let n = (sample1.len() + sample2.len()) as f64;
    let j = 1.0 - 3.0 / (4.0 * (n - 2.0) - 1.0);

    Ok(j * d)
}
