//! Backward stepwise elimination of insignificant regression factors.
//!
//! Each round fits the current candidate set, finds the factor with the
//! weakest evidence, and drops it if it fails the configured significance
//! test. Elimination stops once every remaining factor passes or the set
//! is empty; an iteration guard bounds the loop against evaluation bugs.

use tracing::{debug, info};

use crate::analyzers::regression::fit;
use crate::analyzers::tables::{f_critical, t_critical};
use crate::analyzers::types::{RegressionEquation, Series, StepwiseOutcome};
use crate::errors::{AnalysisError, Result};

/// Guard against non-termination; reaching it returns the current model
/// with the `aborted` flag set instead of failing.
const MAX_ROUNDS: usize = 50;

/// The significance test applied to each candidate coefficient.
///
/// The two criteria are interchangeable in intent: `TCritical` compares
/// |t| against the tabulated critical value for the model's residual
/// degrees of freedom, `PValue` compares the exact p-value against α.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignificancePolicy {
    TCritical,
    PValue { alpha: f64 },
}

impl Default for SignificancePolicy {
    fn default() -> Self {
        SignificancePolicy::TCritical
    }
}

/// Fits `target` on `candidates`, eliminating the weakest insignificant
/// factor one round at a time until all survivors pass.
///
/// The weakest factor is the one with the smallest |t| (or largest
/// p-value); an exact tie removes the earlier candidate, keeping the
/// procedure deterministic. After elimination finishes, the overall model
/// is cross-checked against the F table; a non-significant final model is
/// still returned, flagged via `model_significant`.
///
/// # Errors
///
/// Propagates fit errors; a singular design matrix is fatal for the whole
/// operation since no well-defined weaker subset exists to fall back to.
pub fn fit_stepwise(
    target: &Series,
    candidates: &[Series],
    policy: SignificancePolicy,
) -> Result<StepwiseOutcome> {
    if let SignificancePolicy::PValue { alpha } = policy {
        if !(0.0..1.0).contains(&alpha) || alpha <= 0.0 {
            return Err(AnalysisError::Input(format!(
                "significance level must be in (0, 1), got {alpha}"
            )));
        }
    }

    let mut current: Vec<Series> = candidates.to_vec();
    let mut removed: Vec<String> = Vec::new();
    let mut aborted = false;
    let mut rounds = 0;

    let equation = loop {
        rounds += 1;
        let eq = fit(target, &current)?;

        if current.is_empty() {
            break eq;
        }
        if rounds > MAX_ROUNDS {
            info!(rounds, "Stepwise elimination hit its round guard");
            aborted = true;
            break eq;
        }

        match weakest_failing(&eq, policy)? {
            Some(idx) => {
                let name = current.remove(idx).name;
                debug!(factor = %name, round = rounds, "Eliminating factor");
                removed.push(name);
            }
            None => break eq,
        }
    };

    let remaining: Vec<String> = current.iter().map(|s| s.name.clone()).collect();

    let (f_crit, model_significant) = if remaining.is_empty() {
        (None, None)
    } else {
        let f_crit = f_critical(remaining.len(), equation.df_residual)?;
        let significant = equation.f_statistic.map(|f| f > f_crit);
        (Some(f_crit), significant)
    };

    info!(
        y = %target.name,
        remaining = remaining.len(),
        removed = removed.len(),
        "Stepwise elimination finished"
    );

    Ok(StepwiseOutcome {
        equation,
        remaining,
        removed,
        f_critical: f_crit,
        model_significant,
        aborted,
    })
}

/// Index of the weakest candidate if it fails the significance test,
/// `None` when every candidate passes.
fn weakest_failing(eq: &RegressionEquation, policy: SignificancePolicy) -> Result<Option<usize>> {
    match policy {
        SignificancePolicy::TCritical => {
            let t_crit = t_critical(eq.df_residual)?;
            let mut weakest = 0;
            for (i, c) in eq.coefficients.iter().enumerate() {
                if c.t_stat.abs() < eq.coefficients[weakest].t_stat.abs() {
                    weakest = i;
                }
            }
            Ok((eq.coefficients[weakest].t_stat.abs() < t_crit).then_some(weakest))
        }
        SignificancePolicy::PValue { alpha } => {
            let mut weakest = 0;
            for (i, c) in eq.coefficients.iter().enumerate() {
                if c.p_value > eq.coefficients[weakest].p_value {
                    weakest = i;
                }
            }
            Ok((eq.coefficients[weakest].p_value > alpha).then_some(weakest))
        }
    }
}
