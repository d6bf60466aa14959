use crate::testing::error::{validate_sample_size, TostError};
use nalgebra_sparse::CsrMatrix;
use single_utilities::traits::{FloatOps, FloatOpsTS};

/// Mean and unbiased variance of one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSummary {
    pub n: usize,
    pub mean: f64,
    pub variance: f64,
}

impl SampleSummary {
    /// Summarize a sample of at least two observations.
    ///
    /// Values that cannot be represented as `f64` become NaN, which later surfaces
    /// as a non-finite standard error.
    pub fn from_slice<T>(sample: &[T], argument: &'static str) -> Result<Self, TostError>
    where
        T: FloatOps,
    {
        validate_sample_size(argument, sample.len())?;

        let n = sample.len() as f64;
        let values = || sample.iter().map(|&v| as_f64(v));

        let mean = values().sum::<f64>() / n;
        let variance = values().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);

        Ok(SampleSummary {
            n: sample.len(),
            mean,
            variance,
        })
    }

    /// Summary from accumulated first and second raw moments.
    pub fn from_moments(n: usize, sum: f64, sum_sq: f64) -> Self {
        let n_f = n as f64;
        let mean = sum / n_f;
        let centered = sum_sq - sum * sum / n_f;
        // below this the centered sum is cancellation noise of the computational formula
        let variance = if centered <= n_f * f64::EPSILON * sum_sq {
            0.0
        } else {
            centered / (n_f - 1.0)
        };
        SampleSummary { n, mean, variance }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Standard error of the mean, `sd / sqrt(n)`.
    pub fn standard_error(&self) -> f64 {
        self.std_dev() / (self.n as f64).sqrt()
    }

    pub fn degrees_of_freedom(&self) -> f64 {
        (self.n - 1) as f64
    }
}

/// Per-unit differences `sample1[i] - sample2[i]` of two paired samples.
pub fn paired_differences<T>(sample1: &[T], sample2: &[T]) -> Result<Vec<f64>, TostError>
where
    T: FloatOps,
{
    if sample1.len() != sample2.len() {
        return Err(TostError::LengthMismatch {
            left: sample1.len(),
            right: sample2.len(),
        });
    }

    Ok(sample1
        .iter()
        .zip(sample2)
        .map(|(&a, &b)| as_f64(a) - as_f64(b))
        .collect())
}

/// Lossy conversion to `f64`; unrepresentable values become NaN.
pub(crate) fn as_f64<T>(value: T) -> f64
where
    T: FloatOps,
{
    num_traits::cast::<T, f64>(value).unwrap_or(f64::NAN)
}

/// Sum and sum of squares of every column over the selected rows of a sparse matrix.
pub fn accumulate_column_moments<T>(
    matrix: &CsrMatrix<T>,
    row_indices: &[usize],
) -> anyhow::Result<(Vec<f64>, Vec<f64>)>
where
    T: FloatOpsTS,
{
    let nrows = matrix.nrows();
    let ncols = matrix.ncols();

    let mut sums = vec![0.0; ncols];
    let mut sum_squares = vec![0.0; ncols];

    for &row in row_indices {
        if row >= nrows {
            return Err(anyhow::anyhow!(
                "Row index {} out of bounds for matrix with {} rows",
                row,
                nrows
            ));
        }
        let row_view = matrix.row(row);
        for (&col, value) in row_view.col_indices().iter().zip(row_view.values()) {
            let value = as_f64(*value);
            sums[col] += value;
            sum_squares[col] += value * value;
        }
    }

    Ok((sums, sum_squares))
}

pub fn extract_unique_groups(group_ids: &[usize]) -> Vec<usize> {
    let mut unique_groups = group_ids.to_vec();
    unique_groups.sort_unstable();
    unique_groups.dedup();
    unique_groups
}

/// Row indices belonging to `group`.
pub fn group_indices(group_ids: &[usize], group: usize) -> Vec<usize> {
    group_ids
        .iter()
        .enumerate()
        .filter_map(|(i, &g)| if g == group { Some(i) } else { None })
        .collect()
}
