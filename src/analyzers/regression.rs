//! Ordinary least squares with the standard significance diagnostics.
//!
//! The design matrix (predictors plus an intercept column) is solved by
//! SVD, which stays robust for tall matrices and lets us detect rank
//! deficiency from the singular values directly. The coefficient
//! covariance comes from the same factorization, and exact p-values come
//! from the Student's-t and Fisher-Snedecor distributions.

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use tracing::debug;

use crate::analyzers::types::{Coefficient, RegressionEquation, Series};
use crate::analyzers::utility::mean;
use crate::errors::{AnalysisError, Result};

/// Relative singular-value cutoff below which the design matrix is
/// treated as rank deficient.
const RANK_EPS: f64 = 1e-10;

/// Fits `target` on `predictors` plus an intercept.
///
/// With zero predictors the model degenerates to a constant whose
/// estimate is the mean of the target. Requires at least one residual
/// degree of freedom (n ≥ k + 2) so standard errors exist.
///
/// # Errors
///
/// `Input` for length mismatches or non-finite values, `Degenerate` for
/// too few observations or a zero-variance sole regressor, `Singular`
/// for a rank-deficient (collinear) design matrix.
pub fn fit(target: &Series, predictors: &[Series]) -> Result<RegressionEquation> {
    let n = target.values.len();
    let k = predictors.len();

    validate(target, predictors)?;

    let mut x = DMatrix::<f64>::zeros(n, k + 1);
    for i in 0..n {
        x[(i, 0)] = 1.0;
    }
    for (j, p) in predictors.iter().enumerate() {
        for (i, &v) in p.values.iter().enumerate() {
            x[(i, j + 1)] = v;
        }
    }
    let y = DVector::from_column_slice(&target.values);

    let svd = x.clone().svd(true, true);
    let max_sv = svd.singular_values.iter().cloned().fold(0.0, f64::max);
    let cutoff = max_sv * RANK_EPS;
    if svd.singular_values.iter().any(|&s| s <= cutoff) {
        return Err(AnalysisError::Singular(format!(
            "predictors of {} are collinear",
            target.name
        )));
    }

    let beta = svd
        .solve(&y, cutoff)
        .map_err(|e| AnalysisError::Singular(e.to_string()))?;

    // (XᵀX)⁻¹ = V Σ⁻² Vᵀ from the same factorization.
    let v_t = svd
        .v_t
        .as_ref()
        .ok_or_else(|| AnalysisError::Singular("SVD factors unavailable".to_string()))?;
    let inv_s2 = DMatrix::from_diagonal(&svd.singular_values.map(|s| 1.0 / (s * s)));
    let xtx_inv = v_t.transpose() * inv_s2 * v_t;

    let residuals = &y - &x * &beta;
    let ssr: f64 = residuals.iter().map(|r| r * r).sum();
    let y_mean = mean(&target.values);
    let sst: f64 = target.values.iter().map(|v| (v - y_mean).powi(2)).sum();

    let df_residual = n - k - 1;
    let sigma2 = ssr / df_residual as f64;

    let r_squared = if sst > 0.0 { 1.0 - ssr / sst } else { 1.0 };
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / (df_residual as f64);

    let t_dist = StudentsT::new(0.0, 1.0, df_residual as f64)
        .map_err(|e| AnalysisError::Degenerate(format!("t distribution: {e}")))?;
    let coefficient = |idx: usize, name: &str| {
        let estimate = beta[idx];
        let std_error = (sigma2 * xtx_inv[(idx, idx)]).max(0.0).sqrt();
        let t_stat = if std_error > 0.0 {
            estimate / std_error
        } else {
            f64::INFINITY.copysign(estimate)
        };
        let p_value = if t_stat.is_finite() {
            (2.0 * (1.0 - t_dist.cdf(t_stat.abs()))).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Coefficient {
            name: name.to_string(),
            estimate,
            std_error,
            t_stat,
            p_value,
        }
    };

    let intercept = coefficient(0, "const");
    let coefficients: Vec<Coefficient> = predictors
        .iter()
        .enumerate()
        .map(|(j, p)| coefficient(j + 1, &p.name))
        .collect();

    let (f_statistic, f_p_value) = if k > 0 {
        let f = if 1.0 - r_squared > 0.0 {
            (r_squared / k as f64) / ((1.0 - r_squared) / df_residual as f64)
        } else {
            f64::INFINITY
        };
        let p = if f.is_finite() {
            let f_dist = FisherSnedecor::new(k as f64, df_residual as f64)
                .map_err(|e| AnalysisError::Degenerate(format!("F distribution: {e}")))?;
            (1.0 - f_dist.cdf(f)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (Some(f), Some(p))
    } else {
        (None, None)
    };

    debug!(
        y = %target.name,
        predictors = k,
        r_squared,
        "OLS fit complete"
    );

    Ok(RegressionEquation {
        target: target.name.clone(),
        intercept,
        coefficients,
        r_squared,
        adj_r_squared,
        f_statistic,
        f_p_value,
        n_observations: n,
        df_residual,
    })
}

fn validate(target: &Series, predictors: &[Series]) -> Result<()> {
    let n = target.values.len();
    let k = predictors.len();

    for p in predictors {
        if p.values.len() != n {
            return Err(AnalysisError::Input(format!(
                "predictor {} has {} values but target {} has {}",
                p.name,
                p.values.len(),
                target.name,
                n
            )));
        }
    }
    if target.values.iter().any(|v| !v.is_finite())
        || predictors
            .iter()
            .any(|p| p.values.iter().any(|v| !v.is_finite()))
    {
        return Err(AnalysisError::Input(
            "regression series must be finite".to_string(),
        ));
    }

    if n < k + 2 {
        return Err(AnalysisError::Degenerate(format!(
            "{n} observations cannot support {k} predictors plus an intercept \
             with a residual degree of freedom"
        )));
    }

    if k == 1 {
        let p = &predictors[0];
        let m = mean(&p.values);
        if p.values.iter().all(|&v| v == m) {
            return Err(AnalysisError::Degenerate(format!(
                "sole regressor {} has zero variance",
                p.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_line_recovers_coefficients() {
        let x: Vec<f64> = (0..6).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 2.0 * v).collect();
        let eq = fit(
            &Series::new("y", y),
            &[Series::new("x", x)],
        )
        .unwrap();

        assert!((eq.intercept.estimate - 3.0).abs() < 1e-8);
        assert!((eq.coefficients[0].estimate - 2.0).abs() < 1e-8);
        assert!(eq.r_squared > 0.999_999);
        assert!(eq.intercept.std_error < 1e-6);
        assert!(eq.coefficients[0].std_error < 1e-6);
        assert_eq!(eq.df_residual, 4);
    }

    #[test]
    fn test_constant_only_model_is_target_mean() {
        let eq = fit(&Series::new("y", vec![2.0, 4.0, 6.0, 8.0]), &[]).unwrap();
        assert!((eq.intercept.estimate - 5.0).abs() < 1e-12);
        assert!(eq.r_squared.abs() < 1e-12);
        assert!(eq.f_statistic.is_none());
        assert!(eq.f_p_value.is_none());
        assert_eq!(eq.df_residual, 3);
    }

    #[test]
    fn test_collinear_predictors_are_singular() {
        let x1 = Series::new("x1", vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let x2 = Series::new("x2", vec![2.0, 4.0, 6.0, 8.0, 10.0]);
        let y = Series::new("y", vec![1.1, 2.3, 2.9, 4.2, 5.1]);
        let err = fit(&y, &[x1, x2]).unwrap_err();
        assert!(matches!(err, AnalysisError::Singular(_)));
    }

    #[test]
    fn test_zero_variance_sole_regressor_is_degenerate() {
        let x = Series::new("flat", vec![3.0, 3.0, 3.0, 3.0]);
        let y = Series::new("y", vec![1.0, 2.0, 3.0, 4.0]);
        let err = fit(&y, &[x]).unwrap_err();
        assert!(matches!(err, AnalysisError::Degenerate(_)));
        assert!(err.to_string().contains("flat"));
    }

    #[test]
    fn test_too_few_observations_rejected() {
        let x = Series::new("x", vec![1.0, 2.0, 3.0]);
        let z = Series::new("z", vec![2.0, 1.0, 4.0]);
        let y = Series::new("y", vec![1.0, 2.0, 3.0]);
        let err = fit(&y, &[x, z]).unwrap_err();
        assert!(matches!(err, AnalysisError::Degenerate(_)));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let x = Series::new("x", vec![1.0, 2.0]);
        let y = Series::new("y", vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            fit(&y, &[x]).unwrap_err(),
            AnalysisError::Input(_)
        ));
    }

    #[test]
    fn test_noisy_fit_reports_sane_diagnostics() {
        // y ≈ 1 + 0.5 x with small deterministic noise.
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let noise = [0.05, -0.03, 0.04, -0.06, 0.02, 0.07, -0.04, 0.01, -0.05, 0.03];
        let y: Vec<f64> = x
            .iter()
            .zip(noise)
            .map(|(v, e)| 1.0 + 0.5 * v + e)
            .collect();
        let eq = fit(&Series::new("y", y), &[Series::new("x", x)]).unwrap();

        assert!((eq.coefficients[0].estimate - 0.5).abs() < 0.02);
        assert!(eq.r_squared > 0.99);
        assert!(eq.adj_r_squared <= eq.r_squared);
        assert!(eq.coefficients[0].p_value < 0.001);
        let f = eq.f_statistic.unwrap();
        assert!(f > 100.0);
        assert!(eq.f_p_value.unwrap() < 0.001);
        // t² equals F for a single predictor.
        assert!((eq.coefficients[0].t_stat.powi(2) - f).abs() / f < 1e-9);
    }
}
