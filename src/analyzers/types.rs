//! Data types produced and consumed by the analysis engines.

use serde::{Deserialize, Serialize};

use crate::indicators::Indicator;

/// A named numeric series, one value per year.
#[derive(Debug, Clone)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// One estimated regression coefficient with its significance statistics.
#[derive(Debug, Clone, Serialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_stat: f64,
    pub p_value: f64,
}

/// A fitted ordinary-least-squares model.
///
/// `f_statistic` and `f_p_value` are absent for the constant-only model,
/// which has no overall significance test.
#[derive(Debug, Clone, Serialize)]
pub struct RegressionEquation {
    pub target: String,
    pub intercept: Coefficient,
    pub coefficients: Vec<Coefficient>,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: Option<f64>,
    pub f_p_value: Option<f64>,
    pub n_observations: usize,
    pub df_residual: usize,
}

/// Result of backward stepwise elimination.
#[derive(Debug, Clone, Serialize)]
pub struct StepwiseOutcome {
    pub equation: RegressionEquation,
    /// Factors that survived elimination, in candidate order.
    pub remaining: Vec<String>,
    /// Eliminated factors, in removal order.
    pub removed: Vec<String>,
    /// F critical value used for the overall model cross-check.
    pub f_critical: Option<f64>,
    /// Whether the final model passes the overall F-test; `None` when the
    /// final candidate set is empty.
    pub model_significant: Option<bool>,
    /// Set when the iteration guard fired before elimination finished.
    pub aborted: bool,
}

/// One composite quality score, keyed by year.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub year: i32,
    pub score: f64,
}

/// Final weight assigned to one indicator by the weighting iteration.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WeightEntry {
    pub indicator: Indicator,
    pub weight: f64,
}

/// The composite quality index for a run of years.
#[derive(Debug, Clone, Serialize)]
pub struct CompositeIndex {
    pub scores: Vec<ScoreEntry>,
    pub weights: Vec<WeightEntry>,
    pub rounds_run: usize,
    /// False when a tolerance-based policy hit its round cap first.
    pub converged: bool,
}

impl CompositeIndex {
    /// The score series alone, in year order.
    pub fn score_values(&self) -> Vec<f64> {
        self.scores.iter().map(|s| s.score).collect()
    }
}
