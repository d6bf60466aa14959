use crate::testing::correction::{adjust_p_values, CorrectionMethod};
use crate::testing::inference::tost::independent_test_from_summaries;
use crate::testing::utils::{
    accumulate_column_moments, extract_unique_groups, group_indices, SampleSummary,
};
use crate::testing::{EquivalenceMargins, MultipleTestResults, TostConfig, TostError, TostResult};
use log::debug;
use nalgebra_sparse::CsrMatrix;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use single_utilities::traits::FloatOpsTS;

pub mod power;

pub mod tost;

/// Feature-wise equivalence testing on an observations × features matrix.
///
/// Rows are observations (e.g. cells), columns are features (e.g. genes). Each feature is
/// tested with the independent-samples TOST between two groups of rows.
pub trait MatrixEquivalenceTests<T>
where
    T: FloatOpsTS,
{
    /// One TOST outcome per feature. Features that cannot be tested (constant within
    /// both groups, for instance) yield the corresponding `TostError`.
    fn tost_test(
        &self,
        group1_indices: &[usize],
        group2_indices: &[usize],
        margins: EquivalenceMargins,
        config: TostConfig,
    ) -> anyhow::Result<Vec<Result<TostResult, TostError>>>;

    /// Run the TOST for every feature between the two groups labelled in `group_ids`
    /// and adjust the equivalence p-values for multiple testing.
    fn equivalence_analysis(
        &self,
        group_ids: &[usize],
        margins: EquivalenceMargins,
        config: TostConfig,
        correction: CorrectionMethod,
    ) -> anyhow::Result<MultipleTestResults>;
}

impl<T> MatrixEquivalenceTests<T> for CsrMatrix<T>
where
    T: FloatOpsTS,
{
    fn tost_test(
        &self,
        group1_indices: &[usize],
        group2_indices: &[usize],
        margins: EquivalenceMargins,
        config: TostConfig,
    ) -> anyhow::Result<Vec<Result<TostResult, TostError>>> {
        tost_matrix_groups(self, group1_indices, group2_indices, margins, config)
    }

    fn equivalence_analysis(
        &self,
        group_ids: &[usize],
        margins: EquivalenceMargins,
        config: TostConfig,
        correction: CorrectionMethod,
    ) -> anyhow::Result<MultipleTestResults> {
        if group_ids.len() != self.nrows() {
            return Err(anyhow::anyhow!(
                "Expected {} group labels, got {}",
                self.nrows(),
                group_ids.len()
            ));
        }

        let unique_groups = extract_unique_groups(group_ids);
        if unique_groups.len() != 2 {
            return Err(anyhow::anyhow!(
                "Equivalence analysis needs exactly two groups, found {}",
                unique_groups.len()
            ));
        }

        let group1_indices = group_indices(group_ids, unique_groups[0]);
        let group2_indices = group_indices(group_ids, unique_groups[1]);

        let outcomes = self.tost_test(&group1_indices, &group2_indices, margins, config)?;
        let results = MultipleTestResults::from_outcomes(outcomes);
        let adjusted_p_values = adjust_p_values(&results.p_values, correction)?;

        debug!(
            "equivalence analysis: {} features, {} untested, {} equivalent before correction",
            results.p_values.len(),
            results.untested.len(),
            results.num_equivalent(config.alpha)
        );

        Ok(results
            .with_adjusted_p_values(adjusted_p_values)
            .with_global_metadata("test_type", "tost")
            .with_global_metadata("variance", &format!("{:?}", config.test_type))
            .with_global_metadata("correction", correction.name())
            .with_global_metadata(
                "margins",
                &format!("[{}, {}]", margins.lower(), margins.upper()),
            ))
    }
}

/// Independent-samples TOST for every column of `matrix` between two sets of rows.
///
/// Column moments of each group are gathered in one pass over the sparse rows; implicit
/// zeros count as observations. The per-feature tests then run in parallel.
pub fn tost_matrix_groups<T>(
    matrix: &CsrMatrix<T>,
    group1_indices: &[usize],
    group2_indices: &[usize],
    margins: EquivalenceMargins,
    config: TostConfig,
) -> anyhow::Result<Vec<Result<TostResult, TostError>>>
where
    T: FloatOpsTS,
{
    if group1_indices.is_empty() || group2_indices.is_empty() {
        return Err(anyhow::anyhow!("Group indices cannot be empty"));
    }
    crate::testing::error::validate_alpha(config.alpha)?;

    let (sums1, sum_squares1) = accumulate_column_moments(matrix, group1_indices)?;
    let (sums2, sum_squares2) = accumulate_column_moments(matrix, group2_indices)?;
    let n1 = group1_indices.len();
    let n2 = group2_indices.len();

    let results = (0..matrix.ncols())
        .into_par_iter()
        .map(|col| {
            if n1 < 2 || n2 < 2 {
                return Err(TostError::InvalidSampleSize {
                    argument: if n1 < 2 { "group1" } else { "group2" },
                    len: n1.min(n2),
                });
            }
            let summary1 = SampleSummary::from_moments(n1, sums1[col], sum_squares1[col]);
            let summary2 = SampleSummary::from_moments(n2, sums2[col], sum_squares2[col]);
            independent_test_from_summaries(
                &summary1,
                &summary2,
                margins,
                config.alpha,
                config.test_type,
            )
        })
        .collect();

    Ok(results)
}
