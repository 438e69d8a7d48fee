//! Pearson correlation, the pairwise correlation matrix, and screening of
//! regression candidates by their correlation with the target.

use serde::Serialize;
use tracing::debug;

use crate::analyzers::types::Series;
use crate::analyzers::utility::mean;
use crate::errors::{AnalysisError, Result};

/// Pearson correlation coefficient between two equal-length series.
///
/// Returns 0.0 when either side has zero variance (the correlation is
/// undefined there) or fewer than two points.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    if x.len() < 2 {
        return 0.0;
    }

    let mx = mean(x);
    let my = mean(y);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx) * (a - mx);
        syy += (b - my) * (b - my);
    }

    if sxx <= 0.0 || syy <= 0.0 {
        return 0.0;
    }
    sxy / (sxx * syy).sqrt()
}

/// Full pairwise correlation matrix over a set of named series.
///
/// `values[i][j]` is the correlation of series `i` with series `j`; the
/// diagonal is 1 by definition, even for zero-variance series.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

pub fn correlation_matrix(series: &[Series]) -> Result<CorrelationMatrix> {
    if let Some(first) = series.first() {
        for s in series {
            if s.values.len() != first.values.len() {
                return Err(AnalysisError::Input(format!(
                    "series {} has {} values, expected {}",
                    s.name,
                    s.values.len(),
                    first.values.len()
                )));
            }
        }
    }

    let n = series.len();
    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        values[i][i] = 1.0;
        for j in (i + 1)..n {
            let r = pearson(&series[i].values, &series[j].values);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        names: series.iter().map(|s| s.name.clone()).collect(),
        values,
    })
}

/// Selects the regression candidates worth offering to stepwise
/// elimination: those whose |correlation| with the target reaches
/// `threshold`.
///
/// At most `n - 2` candidates are kept (n = observation count), strongest
/// correlations first, so the initial fit always has at least one residual
/// degree of freedom. Candidate order is preserved in the result; an exact
/// |r| tie is resolved in favor of the earlier candidate.
pub fn screen_candidates(target: &[f64], candidates: &[Series], threshold: f64) -> Vec<Series> {
    let mut passed: Vec<(usize, f64)> = candidates
        .iter()
        .enumerate()
        .map(|(i, s)| (i, pearson(&s.values, target).abs()))
        .filter(|(_, r)| *r >= threshold)
        .collect();

    let cap = target.len().saturating_sub(2);
    if passed.len() > cap {
        debug!(
            passed = passed.len(),
            cap, "Screening keeps only the strongest candidates"
        );
        passed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        passed.truncate(cap);
        passed.sort_by_key(|(i, _)| *i);
    }

    passed
        .into_iter()
        .map(|(i, _)| candidates[i].clone())
        .collect()
}
