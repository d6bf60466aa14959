use std::collections::HashMap;
use std::fmt;

pub mod correction;
pub mod distribution;
pub mod effect;
pub mod error;
pub mod inference;

pub mod utils;

pub use error::TostError;
pub use inference::power::{estimate_power, required_sample_size};
pub use inference::tost::{independent_test, one_sample_test, paired_test, run_tost};

/// Significance level used when the caller has no reason to pick another one.
pub const DEFAULT_ALPHA: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TTestType {
    #[default]
    Student, // Equal variance (pooled)
    Welch, // Unequal variance
}

impl TTestType {
    /// Map the conventional `equal_variance` flag onto a variance mode.
    pub fn from_equal_variance(equal_variance: bool) -> Self {
        if equal_variance {
            TTestType::Student
        } else {
            TTestType::Welch
        }
    }
}

/// Zone of practical equivalence around a zero difference.
///
/// The conventional layout is `lower <= 0 <= upper`, but shifted zones are accepted;
/// the only invariant is a finite, non-empty interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquivalenceMargins {
    lower: f64,
    upper: f64,
}

impl EquivalenceMargins {
    pub fn new(lower: f64, upper: f64) -> Result<Self, TostError> {
        if lower.is_finite() && upper.is_finite() && lower < upper {
            Ok(EquivalenceMargins { lower, upper })
        } else {
            Err(TostError::InvalidMargins { lower, upper })
        }
    }

    /// Margins `(-delta, +delta)`.
    pub fn symmetric(delta: f64) -> Result<Self, TostError> {
        Self::new(-delta, delta)
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower < value && value < self.upper
    }
}

/// Test settings shared by a series of equivalence tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TostConfig {
    /// Significance level of each one-sided test
    pub alpha: f64,
    /// Variance mode for the independent-samples test
    pub test_type: TTestType,
}

impl Default for TostConfig {
    fn default() -> Self {
        TostConfig {
            alpha: DEFAULT_ALPHA,
            test_type: TTestType::Student,
        }
    }
}

impl TostConfig {
    pub fn new(alpha: f64) -> Result<Self, TostError> {
        error::validate_alpha(alpha)?;
        Ok(TostConfig {
            alpha,
            ..Default::default()
        })
    }

    pub fn with_test_type(mut self, test_type: TTestType) -> Self {
        self.test_type = test_type;
        self
    }

    /// Coverage of the confidence interval reported with each result, `1 - 2 * alpha`.
    pub fn confidence_level(&self) -> f64 {
        1.0 - 2.0 * self.alpha
    }

    pub fn independent_test<T>(
        &self,
        sample1: &[T],
        sample2: &[T],
        margin_lower: f64,
        margin_upper: f64,
    ) -> Result<TostResult, TostError>
    where
        T: single_utilities::traits::FloatOps,
    {
        independent_test(
            sample1,
            sample2,
            margin_lower,
            margin_upper,
            self.alpha,
            self.test_type,
        )
    }

    pub fn paired_test<T>(
        &self,
        sample1: &[T],
        sample2: &[T],
        margin_lower: f64,
        margin_upper: f64,
    ) -> Result<TostResult, TostError>
    where
        T: single_utilities::traits::FloatOps,
    {
        paired_test(sample1, sample2, margin_lower, margin_upper, self.alpha)
    }

    pub fn one_sample_test<T>(
        &self,
        sample: &[T],
        reference: f64,
        margin_lower: f64,
        margin_upper: f64,
    ) -> Result<TostResult, TostError>
    where
        T: single_utilities::traits::FloatOps,
    {
        one_sample_test(sample, reference, margin_lower, margin_upper, self.alpha)
    }
}

/// Outcome of a single two one-sided tests procedure.
///
/// Built once by [`run_tost`] and never modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TostResult {
    /// t-statistic of the lower test (H0: difference <= lower margin)
    pub t_lower: f64,
    /// t-statistic of the upper test (H0: difference >= upper margin)
    pub t_upper: f64,
    /// Upper-tail p-value of the lower test
    pub p_lower: f64,
    /// Lower-tail p-value of the upper test
    pub p_upper: f64,
    /// Overall equivalence p-value, the larger of the two one-sided p-values
    pub p_equivalence: f64,
    pub degrees_of_freedom: f64,
    /// Observed difference (first minus second, or sample minus reference)
    pub mean_diff: f64,
    pub standard_error: f64,
    /// Lower bound of the `1 - 2 * alpha` confidence interval
    pub ci_lower: f64,
    /// Upper bound of the `1 - 2 * alpha` confidence interval
    pub ci_upper: f64,
    pub margins: EquivalenceMargins,
    pub is_equivalent: bool,
    pub alpha: f64,
}

impl TostResult {
    pub fn confidence_interval(&self) -> (f64, f64) {
        (self.ci_lower, self.ci_upper)
    }

    pub fn confidence_level(&self) -> f64 {
        1.0 - 2.0 * self.alpha
    }

    /// Whether the confidence interval lies inside the margins. For a result from
    /// [`run_tost`] this agrees with `is_equivalent` up to ties at the boundary.
    pub fn interval_within_margins(&self) -> bool {
        self.margins.lower() < self.ci_lower && self.ci_upper < self.margins.upper()
    }
}

impl fmt::Display for TostResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TOST equivalence test")?;
        writeln!(f, "  mean difference: {:.4}", self.mean_diff)?;
        writeln!(
            f,
            "  {:.0}% CI: [{:.4}, {:.4}]",
            self.confidence_level() * 100.0,
            self.ci_lower,
            self.ci_upper
        )?;
        writeln!(
            f,
            "  margins: [{:.4}, {:.4}]",
            self.margins.lower(),
            self.margins.upper()
        )?;
        writeln!(f, "  lower test: t = {:.4}, p = {:.4}", self.t_lower, self.p_lower)?;
        writeln!(f, "  upper test: t = {:.4}, p = {:.4}", self.t_upper, self.p_upper)?;
        writeln!(
            f,
            "  equivalence p = {:.4}, df = {:.2}",
            self.p_equivalence, self.degrees_of_freedom
        )?;
        write!(
            f,
            "  {} (alpha = {})",
            if self.is_equivalent {
                "equivalent"
            } else {
                "not equivalent"
            },
            self.alpha
        )
    }
}

/// Feature-wise equivalence results for a whole matrix.
#[derive(Debug, Clone)]
pub struct MultipleTestResults {
    /// Observed mean difference per feature (NaN for untested features)
    pub mean_differences: Vec<f64>,
    /// Equivalence p-values (1.0 for untested features)
    pub p_values: Vec<f64>,
    /// Adjusted equivalence p-values (after multiple testing correction)
    pub adjusted_p_values: Option<Vec<f64>>,
    /// `1 - 2 * alpha` confidence intervals of the differences
    pub confidence_intervals: Vec<(f64, f64)>,
    /// Features for which the test could not be run, with the reason
    pub untested: Vec<(usize, TostError)>,
    /// Global metadata about the analysis
    pub global_metadata: HashMap<String, String>,
}

impl MultipleTestResults {
    pub fn new(
        mean_differences: Vec<f64>,
        p_values: Vec<f64>,
        confidence_intervals: Vec<(f64, f64)>,
    ) -> Self {
        MultipleTestResults {
            mean_differences,
            p_values,
            adjusted_p_values: None,
            confidence_intervals,
            untested: Vec::new(),
            global_metadata: HashMap::new(),
        }
    }

    /// Collect per-feature outcomes, recording failed features as untested.
    pub fn from_outcomes(outcomes: Vec<Result<TostResult, TostError>>) -> Self {
        let n = outcomes.len();
        let mut mean_differences = Vec::with_capacity(n);
        let mut p_values = Vec::with_capacity(n);
        let mut confidence_intervals = Vec::with_capacity(n);
        let mut untested = Vec::new();

        for (feature, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(result) => {
                    mean_differences.push(result.mean_diff);
                    p_values.push(result.p_equivalence);
                    confidence_intervals.push(result.confidence_interval());
                }
                Err(err) => {
                    mean_differences.push(f64::NAN);
                    p_values.push(1.0);
                    confidence_intervals.push((f64::NAN, f64::NAN));
                    untested.push((feature, err));
                }
            }
        }

        let mut results = Self::new(mean_differences, p_values, confidence_intervals);
        results.untested = untested;
        results
    }

    pub fn with_adjusted_p_values(mut self, adjusted_p_values: Vec<f64>) -> Self {
        self.adjusted_p_values = Some(adjusted_p_values);
        self
    }

    pub fn with_global_metadata(mut self, key: &str, value: &str) -> Self {
        self.global_metadata
            .insert(key.to_string(), value.to_string());
        self
    }

    fn reported_p_values(&self) -> &[f64] {
        match &self.adjusted_p_values {
            Some(adj_p) => adj_p,
            None => &self.p_values,
        }
    }

    /// Indices of features shown equivalent at the given threshold
    /// (adjusted p-values when available).
    pub fn equivalent_indices(&self, alpha: f64) -> Vec<usize> {
        self.reported_p_values()
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| if p < alpha { Some(i) } else { None })
            .collect()
    }

    pub fn num_equivalent(&self, alpha: f64) -> usize {
        self.equivalent_indices(alpha).len()
    }

    /// Top n features by equivalence p-value
    pub fn top_features(&self, n: usize) -> Vec<usize> {
        let p_values = self.reported_p_values();

        let mut indices: Vec<usize> = (0..p_values.len()).collect();
        indices.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));
        indices.truncate(n);
        indices
    }
}
