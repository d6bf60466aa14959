//! # single-equivalence
//!
//! Equivalence testing with the two one-sided tests (TOST) procedure, part of the single-rust ecosystem.
//!
//! A classical difference test can only show that two means differ. Equivalence testing turns the
//! question around: it shows that the difference lies within a pre-specified margin that is too small
//! to matter in practice. Both one-sided null hypotheses (difference at or below the lower margin,
//! difference at or above the upper margin) have to be rejected for equivalence to be declared.
//!
//! ## Core Features
//!
//! - **Equivalence Tests**: independent samples (pooled or Welch), paired samples, one sample against a reference
//! - **Power Analysis**: approximate TOST power from the noncentral t distribution and sample-size planning
//! - **Margins from Effect Sizes**: Cohen's d based equivalence margins
//! - **Sparse Matrix Support**: feature-wise TOST on `CsrMatrix` from nalgebra-sparse with multiple testing correction
//!
//! ## Quick Start
//!
//! ```
//! use single_equivalence::testing::{independent_test, TTestType};
//!
//! let system_a = [5.1, 5.3, 5.0, 5.2, 5.1];
//! let system_b = [5.0, 5.2, 4.9, 5.1, 5.0];
//!
//! let result = independent_test(&system_a, &system_b, -0.5, 0.5, 0.05, TTestType::Student).unwrap();
//! assert!(result.is_equivalent);
//! ```
//!
//! ## Module Organization
//!
//! - **[`testing`]**: equivalence tests, power analysis, effect sizes and multiple testing correction

pub mod testing;
