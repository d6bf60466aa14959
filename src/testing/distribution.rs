//! Student's t distribution primitives used by the equivalence tests and the power estimator.
//!
//! The central distribution comes straight from `statrs`. `statrs` has no noncentral t,
//! so [`noncentral_t_cdf`] evaluates it as a Poisson mixture of regularized incomplete
//! beta functions on top of the `statrs` special functions.

use crate::testing::error::TostError;
use log::{trace, warn};
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::function::{beta, erf, gamma};
use std::f64::consts::{LN_2, PI, SQRT_2};

const NCT_MAX_ITERATIONS: usize = 1000;
const NCT_ERROR_BOUND: f64 = 1e-12;
/// Beyond this many degrees of freedom the normal approximation is used directly.
const NCT_NORMAL_DF: f64 = 4e5;
/// `2 * ln 2 * 1021`: squared noncentrality at which the Poisson weights underflow.
const NCT_MAX_LAMBDA: f64 = 2.0 * LN_2 * 1021.0;

/// Standard Student's t distribution with `df` degrees of freedom (non-integer allowed).
pub fn students_t(df: f64) -> Result<StudentsT, TostError> {
    if !(df > 0.0) || df.is_infinite() {
        return Err(TostError::InvalidDegreesOfFreedom(df));
    }
    StudentsT::new(0.0, 1.0, df).map_err(|e| TostError::Distribution(e.to_string()))
}

pub fn t_cdf(x: f64, df: f64) -> Result<f64, TostError> {
    Ok(students_t(df)?.cdf(x))
}

/// Quantile of the standard t distribution at cumulative probability `p`.
pub fn t_quantile(p: f64, df: f64) -> Result<f64, TostError> {
    if !(p > 0.0 && p < 1.0) {
        return Err(TostError::Distribution(format!(
            "quantile probability must lie in (0, 1), got {}",
            p
        )));
    }
    Ok(students_t(df)?.inverse_cdf(p))
}

#[inline]
fn standard_normal_cdf(x: f64) -> f64 {
    0.5 * erf::erfc(-x / SQRT_2)
}

/// CDF of the noncentral t distribution, `P(T <= x)` for `T ~ t(df, ncp)`.
///
/// Uses the series of Lenth (1989, AS 243) for `x >= 0` and the reflection
/// `F(x; df, ncp) = 1 - F(-x; df, -ncp)` otherwise. Very large `df` or `|ncp|`
/// fall back to a normal approximation.
pub fn noncentral_t_cdf(x: f64, df: f64, ncp: f64) -> Result<f64, TostError> {
    if !(df > 0.0) || df.is_infinite() {
        return Err(TostError::InvalidDegreesOfFreedom(df));
    }
    if !ncp.is_finite() {
        return Err(TostError::NonFinite {
            argument: "noncentrality",
            value: ncp,
        });
    }
    if x.is_nan() {
        return Err(TostError::NonFinite {
            argument: "x",
            value: x,
        });
    }
    if x.is_infinite() {
        return Ok(if x > 0.0 { 1.0 } else { 0.0 });
    }
    if ncp == 0.0 {
        return t_cdf(x, df);
    }

    let (t, delta, reflected) = if x >= 0.0 {
        (x, ncp, false)
    } else {
        (-x, -ncp, true)
    };

    let lower_tail = if df > NCT_NORMAL_DF || delta * delta > NCT_MAX_LAMBDA {
        normal_approximation(t, df, delta)
    } else {
        (poisson_beta_series(t, df, delta) + standard_normal_cdf(-delta))
            .clamp(0.0, 1.0)
    };

    let cdf = if reflected {
        1.0 - lower_tail
    } else {
        lower_tail
    };
    Ok(cdf.clamp(0.0, 1.0))
}

fn normal_approximation(t: f64, df: f64, delta: f64) -> f64 {
    let s = 1.0 / (4.0 * df);
    standard_normal_cdf((t * (1.0 - s) - delta) / (1.0 + t * t * 2.0 * s).sqrt())
}

/// `P(0 < T <= t)` for `t >= 0` as a Poisson-weighted sum of incomplete beta ratios.
fn poisson_beta_series(t: f64, df: f64, delta: f64) -> f64 {
    if t == 0.0 {
        return 0.0;
    }

    let x = t * t / (t * t + df);
    let lambda = delta * delta;

    let mut p = 0.5 * (-0.5 * lambda).exp();
    if p == 0.0 {
        return normal_approximation(t, df, delta) - standard_normal_cdf(-delta);
    }
    let mut q = (2.0 / PI).sqrt() * p * delta;
    let mut s = 0.5 - p;
    if s < 1e-7 {
        s = -0.5 * (-0.5 * lambda).exp_m1();
    }

    let mut a = 0.5;
    let b = 0.5 * df;
    let rxb = (df / (t * t + df)).powf(b);
    let ln_beta_half = 0.5 * PI.ln() + gamma::ln_gamma(b) - gamma::ln_gamma(0.5 + b);

    let mut xodd = beta::beta_reg(a, b, x);
    let mut godd = 2.0 * rxb * (a * x.ln() - ln_beta_half).exp();
    let bx = b * x;
    let mut xeven = if bx < f64::EPSILON { bx } else { 1.0 - rxb };
    let mut geven = bx * rxb;
    let mut total = p * xodd + q * xeven;

    for it in 1..=NCT_MAX_ITERATIONS {
        a += 1.0;
        xodd -= godd;
        xeven -= geven;
        godd *= x * (a + b - 1.0) / a;
        geven *= x * (a + b - 0.5) / (a + 0.5);
        p *= lambda / (2 * it) as f64;
        q *= lambda / (2 * it + 1) as f64;
        total += p * xodd + q * xeven;
        s -= p;

        if s < -1e-10 {
            warn!(
                "noncentral t series lost precision (t = {}, df = {}, ncp = {})",
                t, df, delta
            );
            break;
        }
        if s <= 0.0 && it > 1 {
            break;
        }
        let error_bound = 2.0 * s * (xodd - godd);
        if error_bound.abs() < NCT_ERROR_BOUND {
            trace!("noncentral t series converged after {} terms", it);
            break;
        }
        if it == NCT_MAX_ITERATIONS {
            warn!(
                "noncentral t series hit the iteration limit (t = {}, df = {}, ncp = {})",
                t, df, delta
            );
        }
    }

    total
}
