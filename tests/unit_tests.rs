use approx::{assert_abs_diff_eq, assert_relative_eq};
use single_equivalence::testing::effect::margins_from_effect_size;
use single_equivalence::testing::{
    estimate_power, independent_test, one_sample_test, paired_test, TTestType, TostConfig,
    TostError, TostResult,
};

fn assert_consistent(result: &TostResult) {
    assert_eq!(result.p_equivalence, result.p_lower.max(result.p_upper));
    assert_eq!(result.is_equivalent, result.p_equivalence < result.alpha);
    assert!(result.ci_lower <= result.mean_diff && result.mean_diff <= result.ci_upper);
}

#[cfg(test)]
mod equivalence_properties {
    use super::*;

    const GROUP1: [f64; 5] = [5.1, 5.3, 5.0, 5.2, 5.1];
    const GROUP2: [f64; 5] = [5.0, 5.2, 4.9, 5.1, 5.0];

    #[test]
    fn verdict_matches_p_value() {
        let samples: [(&[f64], &[f64]); 3] = [
            (&GROUP1, &GROUP2),
            (&[1.0, 2.0, 3.0, 4.0], &[2.5, 3.5, 1.5, 4.5, 3.0]),
            (&[10.0, 12.0, 11.0], &[20.0, 21.0, 19.5]),
        ];

        for (x, y) in samples {
            for test_type in [TTestType::Student, TTestType::Welch] {
                for (lo, hi) in [(-0.5, 0.5), (-2.0, 1.0), (-20.0, 20.0)] {
                    for alpha in [0.01, 0.05, 0.1] {
                        let result = independent_test(x, y, lo, hi, alpha, test_type).unwrap();
                        assert_consistent(&result);
                    }
                }
            }
        }
    }

    #[test]
    fn sign_flip_invariance() {
        let x = [3.2, 2.9, 3.5, 3.1, 3.3, 2.8];
        let y = [3.0, 3.4, 2.7, 3.1, 2.9];

        for test_type in [TTestType::Student, TTestType::Welch] {
            let forward = independent_test(&x, &y, -0.3, 0.6, 0.05, test_type).unwrap();
            let backward = independent_test(&y, &x, -0.6, 0.3, 0.05, test_type).unwrap();

            assert_abs_diff_eq!(forward.mean_diff, -backward.mean_diff, epsilon = 1e-12);
            assert_abs_diff_eq!(
                forward.p_equivalence,
                backward.p_equivalence,
                epsilon = 1e-10
            );
            assert_abs_diff_eq!(forward.p_lower, backward.p_upper, epsilon = 1e-10);
            assert_eq!(forward.is_equivalent, backward.is_equivalent);
        }
    }

    #[test]
    fn shrinking_margins_lose_equivalence() {
        let wide = independent_test(&GROUP1, &GROUP2, -0.5, 0.5, 0.05, TTestType::Student)
            .unwrap();
        assert!(wide.is_equivalent);

        for width in [1e-1, 1e-3, 1e-6, 1e-9] {
            let result =
                independent_test(&GROUP1, &GROUP2, -width, width, 0.05, TTestType::Student)
                    .unwrap();
            assert!(!result.is_equivalent, "equivalent at width {}", width);
        }

        assert!(matches!(
            independent_test(&GROUP1, &GROUP2, 0.0, 0.0, 0.05, TTestType::Student),
            Err(TostError::InvalidMargins { .. })
        ));
    }

    #[test]
    fn pooled_and_welch_agree_for_equal_designs() {
        // same spread, same size
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 3.0, 4.0, 5.0, 6.0];

        let pooled = independent_test(&x, &y, -2.0, 2.0, 0.05, TTestType::Student).unwrap();
        let welch = independent_test(&x, &y, -2.0, 2.0, 0.05, TTestType::Welch).unwrap();

        assert_relative_eq!(
            pooled.degrees_of_freedom,
            welch.degrees_of_freedom,
            epsilon = 1e-10
        );
        assert_relative_eq!(pooled.standard_error, welch.standard_error, epsilon = 1e-12);
        assert_relative_eq!(pooled.p_lower, welch.p_lower, epsilon = 1e-10);
        assert_relative_eq!(pooled.p_upper, welch.p_upper, epsilon = 1e-10);
        assert_relative_eq!(pooled.p_equivalence, welch.p_equivalence, epsilon = 1e-10);
    }

    #[test]
    fn paired_equals_one_sample_on_differences() {
        let before = [23.5, 24.1, 23.8, 24.0, 23.7, 24.2, 23.9];
        let after = [23.4, 24.0, 23.6, 23.9, 23.6, 24.1, 23.8];
        let differences: Vec<f64> = before.iter().zip(&after).map(|(a, b)| a - b).collect();

        for (lo, hi) in [(-0.5, 0.5), (-0.05, 0.3)] {
            let paired = paired_test(&before, &after, lo, hi, 0.05).unwrap();
            let one_sample = one_sample_test(&differences, 0.0, lo, hi, 0.05).unwrap();
            assert_eq!(paired, one_sample);
        }
    }

    #[test]
    fn minimum_sample_sizes() {
        let result =
            independent_test(&[1.0, 2.0], &[1.5, 2.5], -5.0, 5.0, 0.05, TTestType::Student)
                .unwrap();
        assert_eq!(result.degrees_of_freedom, 2.0);
        assert_consistent(&result);
        // t(0.95, 2) = 2.919986 makes the interval wide
        assert!(result.ci_upper - result.ci_lower > 5.0 * result.standard_error);

        let result = one_sample_test(&[1.0, 2.0], 1.5, -5.0, 5.0, 0.05).unwrap();
        assert_eq!(result.degrees_of_freedom, 1.0);
        assert_consistent(&result);
    }
}

#[cfg(test)]
mod scenarios {
    use super::*;

    #[test]
    fn independent_samples_scenario() {
        let sample1 = [5.1, 5.3, 5.0, 5.2, 5.1];
        let sample2 = [5.0, 5.2, 4.9, 5.1, 5.0];

        let result = independent_test(&sample1, &sample2, -0.5, 0.5, 0.05, TTestType::Student)
            .unwrap();

        println!("{}", result);
        assert_abs_diff_eq!(result.mean_diff, 0.1, epsilon = 1e-12);
        assert!(result.is_equivalent);
        assert!(result.interval_within_margins());
    }

    #[test]
    fn one_sample_scenario() {
        let result =
            one_sample_test(&[98.6, 98.8, 98.4, 98.7, 98.5], 98.6, -0.5, 0.5, 0.05).unwrap();

        // the sample mean is exactly 98.6
        assert_abs_diff_eq!(result.mean_diff, 0.0, epsilon = 1e-9);
        assert!(result.is_equivalent);
        assert_consistent(&result);
    }

    #[test]
    fn paired_scenario() {
        let before = [23.5, 24.1, 23.8, 24.0, 23.7, 24.2, 23.9];
        let after = [23.4, 24.0, 23.6, 23.9, 23.6, 24.1, 23.8];

        let result = paired_test(&before, &after, -0.5, 0.5, 0.05).unwrap();
        assert_abs_diff_eq!(result.mean_diff, 0.8 / 7.0, epsilon = 1e-9);
        assert_eq!(result.degrees_of_freedom, 6.0);
        assert!(result.is_equivalent);
        assert_consistent(&result);
    }

    #[test]
    fn effect_size_margins_scenario() {
        assert_eq!(margins_from_effect_size(0.5, 10.0).unwrap(), (-5.0, 5.0));
    }

    #[test]
    fn clearly_different_groups_are_not_equivalent() {
        let result = independent_test(
            &[10.0, 12.0, 11.0, 10.5],
            &[20.0, 21.0, 19.5, 20.5],
            -1.0,
            1.0,
            0.05,
            TTestType::Welch,
        )
        .unwrap();
        assert!(!result.is_equivalent);
        assert!(result.p_equivalence > 0.9);
    }

    #[test]
    fn config_defaults() {
        let config = TostConfig::default();
        assert_eq!(config.alpha, 0.05);
        assert_eq!(config.test_type, TTestType::Student);
        assert_abs_diff_eq!(config.confidence_level(), 0.9, epsilon = 1e-12);
        assert_eq!(TostConfig::new(0.0), Err(TostError::InvalidAlpha(0.0)));

        let via_config = config
            .with_test_type(TTestType::Welch)
            .independent_test(&[1.0, 2.0, 3.0], &[1.5, 2.5, 2.0], -1.0, 1.0)
            .unwrap();
        let direct =
            independent_test(&[1.0, 2.0, 3.0], &[1.5, 2.5, 2.0], -1.0, 1.0, 0.05, TTestType::Welch)
                .unwrap();
        assert_eq!(via_config, direct);
        assert_eq!(TTestType::from_equal_variance(false), TTestType::Welch);
    }

    #[test]
    fn power_planning_scenario() {
        let mut previous = 0.0;
        for n in [10, 20, 30, 50, 100, 200] {
            let power = estimate_power(n, n, 0.0, -0.5, 0.5, 1.0, 0.05).unwrap();
            assert!(power >= previous);
            previous = power;
        }
        assert!(previous > 0.99);
    }
}

#[cfg(test)]
mod margins {
    use single_equivalence::testing::{EquivalenceMargins, TostError};

    #[test]
    fn construction_and_queries() {
        let margins = EquivalenceMargins::new(-0.3, 0.7).unwrap();
        assert_eq!(margins.lower(), -0.3);
        assert_eq!(margins.upper(), 0.7);
        assert!((margins.width() - 1.0).abs() < 1e-12);
        assert!(margins.contains(0.0));
        assert!(!margins.contains(0.7));

        let symmetric = EquivalenceMargins::symmetric(0.5).unwrap();
        assert_eq!((symmetric.lower(), symmetric.upper()), (-0.5, 0.5));
    }

    #[test]
    fn rejects_empty_or_non_finite_zones() {
        assert_eq!(
            EquivalenceMargins::new(1.0, 1.0),
            Err(TostError::InvalidMargins {
                lower: 1.0,
                upper: 1.0
            })
        );
        assert!(EquivalenceMargins::symmetric(-0.5).is_err());
        assert!(EquivalenceMargins::new(f64::NEG_INFINITY, 1.0).is_err());
        assert!(EquivalenceMargins::new(f64::NAN, 1.0).is_err());
    }
}
