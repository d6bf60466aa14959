//! Two one-sided tests (TOST) for equivalence of means.
//!
//! Each variant reduces its sampling design to a mean difference, a standard error and
//! degrees of freedom, then hands them to [`run_tost`]. Equivalence is declared when both
//! one-sided null hypotheses (difference at or below the lower margin, difference at or
//! above the upper margin) are rejected at level `alpha`.

use crate::testing::distribution::students_t;
use crate::testing::error::{
    validate_alpha, validate_finite, validate_positive, validate_sample_size, TostError,
};
use crate::testing::utils::{paired_differences, SampleSummary};
use crate::testing::{EquivalenceMargins, TTestType, TostResult};
use log::debug;
use single_utilities::traits::FloatOps;
use statrs::distribution::ContinuousCDF;

/// Run the TOST procedure on a precomputed difference and its standard error.
///
/// # Arguments
///
/// * `mean_diff` - Observed difference
/// * `standard_error` - Standard error of the difference, must be positive
/// * `degrees_of_freedom` - Degrees of freedom of the t reference distribution
/// * `margins` - Equivalence margins
/// * `alpha` - Significance level of each one-sided test
///
/// # Returns
///
/// `TostResult` with both one-sided tests, the equivalence p-value (the larger of the two)
/// and the `1 - 2 * alpha` confidence interval of the difference.
pub fn run_tost(
    mean_diff: f64,
    standard_error: f64,
    degrees_of_freedom: f64,
    margins: EquivalenceMargins,
    alpha: f64,
) -> Result<TostResult, TostError> {
    validate_alpha(alpha)?;
    validate_finite("mean difference", mean_diff)?;
    validate_positive("standard error", standard_error)?;
    let t_dist = students_t(degrees_of_freedom)?;

    // H0: diff <= lower vs H1: diff > lower
    let t_lower = (mean_diff - margins.lower()) / standard_error;
    let p_lower = t_dist.sf(t_lower);

    // H0: diff >= upper vs H1: diff < upper
    let t_upper = (mean_diff - margins.upper()) / standard_error;
    let p_upper = t_dist.cdf(t_upper);

    let p_equivalence = p_lower.max(p_upper);

    // quantile at 1 - alpha: the interval has 1 - 2 * alpha coverage
    let t_crit = t_dist.inverse_cdf(1.0 - alpha);
    let ci_lower = mean_diff - t_crit * standard_error;
    let ci_upper = mean_diff + t_crit * standard_error;

    let is_equivalent = p_equivalence < alpha;

    debug!(
        "TOST: diff = {:.6}, se = {:.6}, df = {:.2}, p = {:.6}, equivalent = {}",
        mean_diff, standard_error, degrees_of_freedom, p_equivalence, is_equivalent
    );

    Ok(TostResult {
        t_lower,
        t_upper,
        p_lower,
        p_upper,
        p_equivalence,
        degrees_of_freedom,
        mean_diff,
        standard_error,
        ci_lower,
        ci_upper,
        margins,
        is_equivalent,
        alpha,
    })
}

/// Equivalence test for two independent samples.
///
/// # Arguments
///
/// * `sample1` - First sample (at least 2 observations)
/// * `sample2` - Second sample (at least 2 observations)
/// * `margin_lower` - Lower equivalence margin for `mean1 - mean2`
/// * `margin_upper` - Upper equivalence margin for `mean1 - mean2`
/// * `alpha` - Significance level, conventionally [`DEFAULT_ALPHA`](crate::testing::DEFAULT_ALPHA)
/// * `test_type` - `Student` pools the variances, `Welch` does not
pub fn independent_test<T>(
    sample1: &[T],
    sample2: &[T],
    margin_lower: f64,
    margin_upper: f64,
    alpha: f64,
    test_type: TTestType,
) -> Result<TostResult, TostError>
where
    T: FloatOps,
{
    let summary1 = SampleSummary::from_slice(sample1, "sample1")?;
    let summary2 = SampleSummary::from_slice(sample2, "sample2")?;
    let margins = EquivalenceMargins::new(margin_lower, margin_upper)?;
    validate_alpha(alpha)?;

    independent_test_from_summaries(&summary1, &summary2, margins, alpha, test_type)
}

/// Independent-samples TOST from already summarized groups.
pub fn independent_test_from_summaries(
    summary1: &SampleSummary,
    summary2: &SampleSummary,
    margins: EquivalenceMargins,
    alpha: f64,
    test_type: TTestType,
) -> Result<TostResult, TostError> {
    let (standard_error, df) = two_sample_standard_error(summary1, summary2, test_type)?;
    run_tost(
        summary1.mean - summary2.mean,
        standard_error,
        df,
        margins,
        alpha,
    )
}

fn two_sample_standard_error(
    summary1: &SampleSummary,
    summary2: &SampleSummary,
    test_type: TTestType,
) -> Result<(f64, f64), TostError> {
    for (argument, summary) in [("sample1", summary1), ("sample2", summary2)] {
        if summary.n < 2 {
            return Err(TostError::InvalidSampleSize {
                argument,
                len: summary.n,
            });
        }
    }

    let n1 = summary1.n as f64;
    let n2 = summary2.n as f64;
    let (var1, var2) = (summary1.variance, summary2.variance);

    let (standard_error, df) = match test_type {
        TTestType::Student => {
            let df = n1 + n2 - 2.0;
            let pooled_var = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / df;
            ((pooled_var * (1.0 / n1 + 1.0 / n2)).sqrt(), df)
        }
        TTestType::Welch => {
            let term1 = var1 / n1;
            let term2 = var2 / n2;
            ((term1 + term2).sqrt(), welch_degrees_of_freedom(term1, n1, term2, n2))
        }
    };

    validate_positive("standard error", standard_error)?;
    if !df.is_finite() {
        return Err(TostError::DegenerateVariance {
            argument: "Welch degrees of freedom",
            value: df,
        });
    }
    Ok((standard_error, df))
}

/// Welch-Satterthwaite degrees of freedom from the per-group terms `var / n`.
///
/// Written in terms of the ratio of the smaller term to the larger one, so squaring
/// never leaves the range of `f64` whatever the scale of the data.
fn welch_degrees_of_freedom(term1: f64, n1: f64, term2: f64, n2: f64) -> f64 {
    let (large, n_large, small, n_small) = if term1 >= term2 {
        (term1, n1, term2, n2)
    } else {
        (term2, n2, term1, n1)
    };
    let ratio = small / large;
    (1.0 + ratio).powi(2) / (1.0 / (n_large - 1.0) + ratio * ratio / (n_small - 1.0))
}

/// Equivalence test for paired samples of equal length.
///
/// Works on the per-unit differences `sample1[i] - sample2[i]`, which makes it the
/// one-sample test of those differences against zero.
pub fn paired_test<T>(
    sample1: &[T],
    sample2: &[T],
    margin_lower: f64,
    margin_upper: f64,
    alpha: f64,
) -> Result<TostResult, TostError>
where
    T: FloatOps,
{
    validate_sample_size("sample1", sample1.len())?;
    validate_sample_size("sample2", sample2.len())?;
    let differences = paired_differences(sample1, sample2)?;
    one_sample_test(&differences, 0.0, margin_lower, margin_upper, alpha)
}

/// Equivalence test of one sample's mean against a reference value.
///
/// The margins apply to `mean - reference`.
pub fn one_sample_test<T>(
    sample: &[T],
    reference: f64,
    margin_lower: f64,
    margin_upper: f64,
    alpha: f64,
) -> Result<TostResult, TostError>
where
    T: FloatOps,
{
    let summary = SampleSummary::from_slice(sample, "sample")?;
    validate_finite("reference", reference)?;
    let margins = EquivalenceMargins::new(margin_lower, margin_upper)?;
    validate_alpha(alpha)?;

    run_tost(
        summary.mean - reference,
        summary.standard_error(),
        summary.degrees_of_freedom(),
        margins,
        alpha,
    )
}
