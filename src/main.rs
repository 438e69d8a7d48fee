//! CLI entry point for the transit line rater tool.
//!
//! Provides subcommands for computing the composite quality index from
//! yearly indicators, printing the correlation matrix, fitting stepwise
//! regression models, and forecasting the next year.

use std::ffi::OsStr;
use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use transit_line_rater::analyzers::composite::{ConvergencePolicy, compute_composite};
use transit_line_rater::analyzers::correlation::{correlation_matrix, screen_candidates};
use transit_line_rater::analyzers::forecast::{forecast_next, predict};
use transit_line_rater::analyzers::normalize::normalize;
use transit_line_rater::analyzers::stepwise::{SignificancePolicy, fit_stepwise};
use transit_line_rater::analyzers::types::{CompositeIndex, Series, StepwiseOutcome};
use transit_line_rater::indicators::Indicator;
use transit_line_rater::output;
use transit_line_rater::table::{IndicatorTable, load_table};

#[derive(Parser)]
#[command(name = "transit_line_rater")]
#[command(about = "Rates a transit line's yearly service quality and fits explanatory regression models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the composite quality index from yearly indicators
    Index {
        /// CSV file with one row of indicators per year
        #[arg(short, long, default_value = "data.csv")]
        input: String,

        /// Re-weighting rounds for the fixed-round policy
        #[arg(long, default_value_t = 4)]
        rounds: usize,

        /// Iterate to this score tolerance instead of a fixed round count
        #[arg(long)]
        tolerance: Option<f64>,

        /// CSV file to append the computed scores to, keyed by year
        #[arg(short, long)]
        scores: Option<String>,

        /// Emit JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the pairwise indicator correlation matrix
    Matrix {
        /// CSV file with one row of indicators per year
        #[arg(short, long, default_value = "data.csv")]
        input: String,

        /// Include the composite quality index as an extra column
        #[arg(long, default_value_t = false)]
        with_index: bool,

        /// Emit JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Fit a stepwise regression model for the chosen target
    Regress {
        #[command(flatten)]
        model: ModelArgs,

        /// Emit JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Forecast the target one year ahead from the fitted model
    Forecast {
        #[command(flatten)]
        model: ModelArgs,

        /// Trailing window of years for the per-factor extrapolation
        #[arg(long, default_value_t = 5)]
        window: usize,

        /// Emit JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Debug, clap::Args)]
struct ModelArgs {
    /// CSV file with one row of indicators per year
    #[arg(short, long, default_value = "data.csv")]
    input: String,

    /// Dependent variable of the model
    #[arg(short, long, value_enum, default_value = "index")]
    target: Target,

    /// Significance criterion for factor elimination
    #[arg(short, long, value_enum, default_value = "t-statistic")]
    criterion: Criterion,

    /// Significance level for the p-value criterion
    #[arg(long, default_value_t = 0.05)]
    alpha: f64,

    /// Minimum |correlation| with the target for a factor to enter
    #[arg(long, default_value_t = 0.3)]
    screen_threshold: f64,

    /// Re-weighting rounds when the target is the composite index
    #[arg(long, default_value_t = 4)]
    rounds: usize,

    /// Iterate the index to this tolerance instead of a fixed round count
    #[arg(long)]
    tolerance: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    /// The composite quality index
    Index,
    /// The scheduled headway
    Headway,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Criterion {
    /// Compare |t| against the tabulated critical value
    TStatistic,
    /// Compare the exact p-value against alpha
    PValue,
}

#[derive(Serialize)]
struct ForecastReport {
    target: String,
    prediction: f64,
    factor_forecasts: Vec<FactorForecast>,
}

#[derive(Serialize)]
struct FactorForecast {
    factor: String,
    forecast: f64,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Index {
            input,
            rounds,
            tolerance,
            scores,
            json,
        } => {
            let table = load_table(&input)?;
            let index = build_index(&table, convergence_policy(rounds, tolerance));

            if let Some(path) = scores {
                output::append_scores(&path, &index)?;
                info!(path = %path, "Composite scores appended");
            }

            if json {
                println!("{}", output::to_json(&index)?);
            } else {
                print!("{}", output::render_composite(&index));
            }
        }
        Commands::Matrix {
            input,
            with_index,
            json,
        } => {
            let table = load_table(&input)?;
            let mut series = indicator_series(&table, &Indicator::ALL);
            if with_index {
                let index = build_index(&table, ConvergencePolicy::default());
                series.push(Series::new("quality_index", index.score_values()));
            }
            let matrix = correlation_matrix(&series)?;

            if json {
                println!("{}", output::to_json(&matrix)?);
            } else {
                print!("{}", output::render_matrix(&matrix));
            }
        }
        Commands::Regress { model, json } => {
            let table = load_table(&model.input)?;
            let (outcome, _) = run_stepwise(&table, &model)?;

            if json {
                println!("{}", output::to_json(&outcome)?);
            } else {
                print!("{}", output::render_regression_report(&outcome));
            }
        }
        Commands::Forecast {
            model,
            window,
            json,
        } => {
            let table = load_table(&model.input)?;
            let (outcome, target_name) = run_stepwise(&table, &model)?;

            let mut factor_forecasts = Vec::new();
            for name in &outcome.remaining {
                let indicator = indicator_by_name(name)?;
                let forecast = forecast_next(table.series(indicator), window)?;
                factor_forecasts.push((name.clone(), forecast));
            }
            let prediction = predict(&outcome.equation, &factor_forecasts)?;

            let report = ForecastReport {
                target: target_name,
                prediction,
                factor_forecasts: factor_forecasts
                    .into_iter()
                    .map(|(factor, forecast)| FactorForecast { factor, forecast })
                    .collect(),
            };

            if json {
                println!("{}", output::to_json(&report)?);
            } else {
                for f in &report.factor_forecasts {
                    println!("{:<22} -> {:.6}", f.factor, f.forecast);
                }
                println!("predicted {}: {:.6}", report.target, report.prediction);
            }
        }
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file. The returned
/// guard must stay alive for the whole process.
fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/transit_line_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("transit_line_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    file_guard
}

fn convergence_policy(rounds: usize, tolerance: Option<f64>) -> ConvergencePolicy {
    match tolerance {
        Some(tol) => ConvergencePolicy::Tolerance {
            tol,
            max_rounds: 100,
        },
        None => ConvergencePolicy::FixedRounds(rounds),
    }
}

fn build_index(table: &IndicatorTable, policy: ConvergencePolicy) -> CompositeIndex {
    let normalized = normalize(table, &Indicator::INDEX_COMPONENTS);
    let index = compute_composite(&normalized, policy);
    if !index.converged {
        info!(
            rounds = index.rounds_run,
            "Composite index hit its round cap before reaching tolerance"
        );
    }
    index
}

fn indicator_series(table: &IndicatorTable, indicators: &[Indicator]) -> Vec<Series> {
    indicators
        .iter()
        .map(|&ind| Series::new(ind.name(), table.series(ind).to_vec()))
        .collect()
}

fn indicator_by_name(name: &str) -> Result<Indicator> {
    Indicator::ALL
        .into_iter()
        .find(|i| i.name() == name)
        .ok_or_else(|| anyhow::anyhow!("unknown indicator: {name}"))
}

/// Builds the target series and candidate set, screens the candidates, and
/// runs stepwise elimination. Returns the outcome and the target name.
fn run_stepwise(table: &IndicatorTable, model: &ModelArgs) -> Result<(StepwiseOutcome, String)> {
    let (target, candidates) = match model.target {
        Target::Headway => (
            Series::new("headway", table.series(Indicator::Headway).to_vec()),
            indicator_series(table, &Indicator::INDEX_COMPONENTS),
        ),
        Target::Index => {
            let index = build_index(table, convergence_policy(model.rounds, model.tolerance));
            (
                Series::new("quality_index", index.score_values()),
                indicator_series(table, &Indicator::ALL),
            )
        }
    };

    let screened = screen_candidates(&target.values, &candidates, model.screen_threshold);
    info!(
        y = %target.name,
        offered = candidates.len(),
        screened = screened.len(),
        "Candidates screened by correlation"
    );

    let policy = match model.criterion {
        Criterion::TStatistic => SignificancePolicy::TCritical,
        Criterion::PValue => SignificancePolicy::PValue { alpha: model.alpha },
    };

    let outcome = fit_stepwise(&target, &screened, policy)?;
    let name = target.name;
    Ok((outcome, name))
}
