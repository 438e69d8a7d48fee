//! One-period-ahead extrapolation of indicator series and evaluation of a
//! fitted equation at the forecast point.
//!
//! Each factor is projected by its mean yearly increment over a trailing
//! window, the classical average-absolute-increment extrapolation; the
//! target prediction is then the fitted equation evaluated at those
//! projections.

use tracing::debug;

use crate::analyzers::types::RegressionEquation;
use crate::errors::{AnalysisError, Result};

/// Projects the next value of a series from its mean yearly increment
/// over the trailing `window` periods.
///
/// # Errors
///
/// `Degenerate` when the window is smaller than two periods or the series
/// has fewer than two values.
pub fn forecast_next(values: &[f64], window: usize) -> Result<f64> {
    if window < 2 {
        return Err(AnalysisError::Degenerate(format!(
            "forecast window must span at least 2 periods, got {window}"
        )));
    }
    if values.len() < 2 {
        return Err(AnalysisError::Degenerate(format!(
            "forecasting needs at least 2 observed periods, got {}",
            values.len()
        )));
    }

    let tail = &values[values.len().saturating_sub(window)..];
    let last = tail[tail.len() - 1];
    let increment = (last - tail[0]) / (tail.len() - 1) as f64;

    Ok(last + increment)
}

/// Evaluates a fitted equation at the given per-factor forecasts.
///
/// # Errors
///
/// `Input` when a forecast is missing for one of the equation's factors.
pub fn predict(equation: &RegressionEquation, forecasts: &[(String, f64)]) -> Result<f64> {
    let mut prediction = equation.intercept.estimate;

    for coefficient in &equation.coefficients {
        let value = forecasts
            .iter()
            .find(|(name, _)| *name == coefficient.name)
            .map(|(_, v)| *v)
            .ok_or_else(|| {
                AnalysisError::Input(format!(
                    "no forecast supplied for factor {}",
                    coefficient.name
                ))
            })?;
        prediction += coefficient.estimate * value;
    }

    debug!(y = %equation.target, prediction, "Equation evaluated at forecast point");
    Ok(prediction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::regression::fit;
    use crate::analyzers::types::Series;

    #[test]
    fn test_linear_series_forecasts_next_step() {
        let values = [10.0, 12.0, 14.0, 16.0, 18.0];
        assert_eq!(forecast_next(&values, 5).unwrap(), 20.0);
    }

    #[test]
    fn test_window_shorter_than_series_uses_tail() {
        // Mean increment over the last 3 values only: (9 - 5) / 2 = 2.
        let values = [100.0, 1.0, 5.0, 7.0, 9.0];
        assert_eq!(forecast_next(&values, 3).unwrap(), 11.0);
    }

    #[test]
    fn test_constant_series_forecasts_itself() {
        assert_eq!(forecast_next(&[4.0, 4.0, 4.0], 5).unwrap(), 4.0);
    }

    #[test]
    fn test_too_short_series_rejected() {
        assert!(forecast_next(&[1.0], 5).is_err());
        assert!(forecast_next(&[], 5).is_err());
    }

    #[test]
    fn test_window_of_one_rejected() {
        assert!(forecast_next(&[1.0, 2.0], 1).is_err());
    }

    #[test]
    fn test_predict_evaluates_equation() {
        let x: Vec<f64> = (0..6).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 2.0 * v).collect();
        let eq = fit(&Series::new("y", y), &[Series::new("x", x)]).unwrap();

        let prediction = predict(&eq, &[("x".to_string(), 10.0)]).unwrap();
        assert!((prediction - 23.0).abs() < 1e-8);
    }

    #[test]
    fn test_predict_requires_all_factors() {
        let x: Vec<f64> = (0..6).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 2.0 * v).collect();
        let eq = fit(&Series::new("y", y), &[Series::new("x", x)]).unwrap();

        let err = predict(&eq, &[("other".to_string(), 1.0)]).unwrap_err();
        assert!(matches!(err, AnalysisError::Input(_)));
        assert!(err.to_string().contains('x'));
    }
}
