//! Output formatting and persistence for analysis results.
//!
//! Supports plain-text reports, JSON serialization, and CSV append of
//! composite scores keyed by year.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::analyzers::correlation::CorrelationMatrix;
use crate::analyzers::types::{CompositeIndex, RegressionEquation, StepwiseOutcome};

/// Envelope for JSON output, stamped with the generation time.
#[derive(Serialize)]
pub struct Report<T: Serialize> {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub body: T,
}

/// Serializes a result as pretty JSON inside a timestamped envelope.
pub fn to_json<T: Serialize>(body: T) -> Result<String> {
    let report = Report {
        generated_at: Utc::now(),
        body,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Renders a fitted equation as a single line, coefficients rounded to six
/// decimals: `y = 1.5 + 0.25*a - 3.1*b`.
pub fn format_equation(equation: &RegressionEquation) -> String {
    let mut out = format!("{} = {:.6}", equation.target, equation.intercept.estimate);
    for c in &equation.coefficients {
        let sign = if c.estimate >= 0.0 { '+' } else { '-' };
        let _ = write!(out, " {} {:.6}*{}", sign, c.estimate.abs(), c.name);
    }
    out
}

/// Renders the full stepwise regression report: the equation, model
/// diagnostics, the F-test verdict, and the per-coefficient table.
pub fn render_regression_report(outcome: &StepwiseOutcome) -> String {
    let eq = &outcome.equation;
    let mut out = String::new();

    let _ = writeln!(out, "Regression equation:");
    let _ = writeln!(out, "  {}", format_equation(eq));
    let _ = writeln!(out);
    let _ = writeln!(out, "R²          = {:.6}", eq.r_squared);
    let _ = writeln!(out, "adjusted R² = {:.6}", eq.adj_r_squared);

    match (eq.f_statistic, outcome.f_critical) {
        (Some(f), Some(f_crit)) => {
            let _ = writeln!(out, "F           = {:.6} (critical {:.4})", f, f_crit);
            let verdict = match outcome.model_significant {
                Some(true) => "model is significant (F > F critical)",
                Some(false) => "model is NOT significant (F <= F critical)",
                None => "model significance undetermined",
            };
            let _ = writeln!(out, "  -> {verdict}");
        }
        _ => {
            let _ = writeln!(out, "F           = n/a (constant-only model)");
        }
    }

    if outcome.aborted {
        let _ = writeln!(out, "warning: elimination hit its round guard");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Removed factors:   [{}]", outcome.removed.join(", "));
    let _ = writeln!(out, "Remaining factors: [{}]", outcome.remaining.join(", "));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<22} {:>14} {:>12} {:>12} {:>10}",
        "factor", "coefficient", "std error", "t", "p"
    );
    for c in std::iter::once(&eq.intercept).chain(&eq.coefficients) {
        let _ = writeln!(
            out,
            "{:<22} {:>14.6} {:>12.6} {:>12.4} {:>10.6}",
            c.name, c.estimate, c.std_error, c.t_stat, c.p_value
        );
    }

    out
}

/// Renders composite scores and indicator weights as a plain-text table.
pub fn render_composite(index: &CompositeIndex) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Composite quality index:");
    for entry in &index.scores {
        let _ = writeln!(out, "  {}  {:.6}", entry.year, entry.score);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Indicator weights:");
    for w in &index.weights {
        let _ = writeln!(out, "  {:<22} {:.6}", w.indicator.name(), w.weight);
    }
    let _ = writeln!(
        out,
        "({} rounds{})",
        index.rounds_run,
        if index.converged { "" } else { ", NOT converged" }
    );

    out
}

/// Renders the pairwise correlation matrix with aligned columns.
pub fn render_matrix(matrix: &CorrelationMatrix) -> String {
    let mut out = String::new();

    let _ = write!(out, "{:<22}", "");
    for name in &matrix.names {
        let _ = write!(out, " {:>12}", truncate(name, 12));
    }
    let _ = writeln!(out);

    for (name, row) in matrix.names.iter().zip(&matrix.values) {
        let _ = write!(out, "{:<22}", truncate(name, 22));
        for value in row {
            let _ = write!(out, " {:>12.4}", value);
        }
        let _ = writeln!(out);
    }

    out
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() > max { &s[..max] } else { s }
}

/// Appends the composite scores as rows to a CSV file, keyed by year.
///
/// Creates the file with headers if it does not already exist.
pub fn append_scores(path: &str, index: &CompositeIndex) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending composite scores");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for entry in &index.scores {
        writer.serialize(entry)?;
    }
    writer.flush()?;

    Ok(())
}
