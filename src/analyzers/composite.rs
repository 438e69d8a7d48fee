//! The convergent weighting engine behind the composite quality index.
//!
//! Starting from the unweighted per-year mean of all normalized indicators,
//! each round re-estimates indicator weights from the |Pearson correlation|
//! of the indicator with the current composite score, renormalizes the
//! weights to sum to 1, and recomputes the score as the weighted sum.
//! Indicators that agree with the consensus signal gain influence; the
//! weight/score pair settles to a fixed point.

use tracing::debug;

use crate::analyzers::correlation::pearson;
use crate::analyzers::normalize::NormalizedTable;
use crate::analyzers::types::{CompositeIndex, ScoreEntry, WeightEntry};

/// Stopping rule for the weighting iteration.
///
/// The two rules can settle on numerically different fixed points for
/// ill-conditioned inputs, so the choice is an explicit parameter of every
/// run rather than a hidden constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConvergencePolicy {
    /// Run exactly this many re-weighting rounds.
    FixedRounds(usize),
    /// Stop once the largest per-year score change falls below `tol`,
    /// giving up (with `converged = false`) after `max_rounds`.
    Tolerance { tol: f64, max_rounds: usize },
}

impl Default for ConvergencePolicy {
    /// Four re-weighting rounds, the reference behavior.
    fn default() -> Self {
        ConvergencePolicy::FixedRounds(4)
    }
}

/// Computes the composite score series and indicator weights for a
/// normalized table.
///
/// Deterministic: identical input always yields bit-identical output. When
/// every indicator is uncorrelated with the consensus (degenerate inputs
/// such as one or two years of data), weighting falls back to equal
/// weights instead of producing NaN.
pub fn compute_composite(normalized: &NormalizedTable, policy: ConvergencePolicy) -> CompositeIndex {
    let columns = normalized.columns();
    let years = normalized.years();
    let k = columns.len();
    let n = years.len();

    if k == 0 {
        return CompositeIndex {
            scores: Vec::new(),
            weights: Vec::new(),
            rounds_run: 0,
            converged: true,
        };
    }

    let equal = 1.0 / k as f64;
    let mut weights = vec![equal; k];
    let mut score: Vec<f64> = (0..n)
        .map(|i| columns.iter().map(|(_, v)| v[i]).sum::<f64>() * equal)
        .collect();

    let max_rounds = match policy {
        ConvergencePolicy::FixedRounds(rounds) => rounds,
        ConvergencePolicy::Tolerance { max_rounds, .. } => max_rounds,
    };

    let mut rounds_run = 0;
    let mut converged = matches!(policy, ConvergencePolicy::FixedRounds(_));

    for round in 0..max_rounds {
        let correlations: Vec<f64> = columns
            .iter()
            .map(|(_, values)| pearson(values, &score).abs())
            .collect();
        let sum: f64 = correlations.iter().sum();

        if sum > 0.0 {
            for (w, r) in weights.iter_mut().zip(&correlations) {
                *w = r / sum;
            }
        } else {
            debug!(round, "All correlations vanished; using equal weights");
            weights.fill(equal);
        }

        let mut delta = 0.0f64;
        for i in 0..n {
            let new = columns
                .iter()
                .zip(&weights)
                .map(|((_, values), w)| values[i] * w)
                .sum::<f64>();
            delta = delta.max((new - score[i]).abs());
            score[i] = new;
        }
        rounds_run = round + 1;

        if let ConvergencePolicy::Tolerance { tol, .. } = policy {
            if delta < tol {
                converged = true;
                break;
            }
        }
    }

    debug!(rounds_run, converged, "Composite index settled");

    CompositeIndex {
        scores: years
            .iter()
            .zip(&score)
            .map(|(&year, &score)| ScoreEntry { year, score })
            .collect(),
        weights: columns
            .iter()
            .zip(&weights)
            .map(|((indicator, _), &weight)| WeightEntry {
                indicator: *indicator,
                weight,
            })
            .collect(),
        rounds_run,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::normalize::normalize;
    use crate::indicators::Indicator;
    use crate::table::{IndicatorTable, YearRecord};

    fn table_from_rows(rows: &[[f64; 9]]) -> IndicatorTable {
        let records: Vec<YearRecord> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| YearRecord {
                year: 2016 + i as i32,
                critical_failures: r[0],
                major_failures: r[1],
                minor_failures: r[2],
                train_hour_losses: r[3],
                investment: r[4],
                daily_ridership: r[5],
                equipment_failures: r[6],
                fare_cost: r[7],
                headway: r[8],
            })
            .collect();
        IndicatorTable::from_records(&records).unwrap()
    }

    fn sample_table() -> IndicatorTable {
        table_from_rows(&[
            [0.0, 20.0, 6.0, 87.91, 32561.7, 239186.0, 2.0, 50.0, 8.0],
            [0.0, 10.0, 37.0, 314.17, 38310.1, 302919.0, 1.0, 55.0, 8.0],
            [1.0, 3.0, 18.0, 53.13, 45684.2, 354665.0, 1.0, 55.0, 8.0],
            [1.0, 2.0, 10.0, 59.13, 74860.9, 405773.0, 0.0, 55.0, 5.9],
            [0.0, 5.0, 6.0, 186.01, 101163.1, 315804.0, 0.0, 57.0, 5.9],
            [1.0, 0.0, 7.0, 188.03, 114465.1, 409985.0, 0.0, 60.0, 5.9],
        ])
    }

    #[test]
    fn test_weights_sum_to_one() {
        let normalized = normalize(&sample_table(), &Indicator::INDEX_COMPONENTS);
        let index = compute_composite(&normalized, ConvergencePolicy::default());
        let sum: f64 = index.weights.iter().map(|w| w.weight).sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(index.weights.iter().all(|w| w.weight >= 0.0));
    }

    #[test]
    fn test_scores_stay_in_unit_interval() {
        let normalized = normalize(&sample_table(), &Indicator::INDEX_COMPONENTS);
        let index = compute_composite(&normalized, ConvergencePolicy::default());
        for entry in &index.scores {
            assert!((0.0..=1.0).contains(&entry.score));
        }
    }

    #[test]
    fn test_determinism_bits() {
        let normalized = normalize(&sample_table(), &Indicator::INDEX_COMPONENTS);
        let a = compute_composite(&normalized, ConvergencePolicy::default());
        let b = compute_composite(&normalized, ConvergencePolicy::default());
        for (x, y) in a.scores.iter().zip(&b.scores) {
            assert_eq!(x.score.to_bits(), y.score.to_bits());
        }
        for (x, y) in a.weights.iter().zip(&b.weights) {
            assert_eq!(x.weight.to_bits(), y.weight.to_bits());
        }
    }

    #[test]
    fn test_two_periods_fall_back_to_equal_weights() {
        // With two years every non-constant normalized column is a
        // two-point series perfectly correlated with the score, and
        // constant columns contribute zero; either way weights stay
        // uniform across the surviving signal or fall back entirely.
        let table = table_from_rows(&[
            [0.0, 20.0, 6.0, 87.91, 32561.7, 239186.0, 2.0, 50.0, 8.0],
            [0.0, 10.0, 37.0, 314.17, 38310.1, 302919.0, 1.0, 55.0, 8.0],
        ]);
        let normalized = normalize(&table, &Indicator::INDEX_COMPONENTS);
        let index = compute_composite(&normalized, ConvergencePolicy::default());
        let sum: f64 = index.weights.iter().map(|w| w.weight).sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(index.scores.iter().all(|s| s.score.is_finite()));
    }

    #[test]
    fn test_empty_table_yields_empty_index() {
        let table = IndicatorTable::from_records(&[]).unwrap();
        let normalized = normalize(&table, &Indicator::INDEX_COMPONENTS);
        let index = compute_composite(&normalized, ConvergencePolicy::default());
        assert!(index.scores.is_empty());
        assert_eq!(index.weights.len(), 8);
    }

    #[test]
    fn test_tolerance_policy_converges_and_reports_rounds() {
        let normalized = normalize(&sample_table(), &Indicator::INDEX_COMPONENTS);
        let index = compute_composite(
            &normalized,
            ConvergencePolicy::Tolerance {
                tol: 1e-9,
                max_rounds: 100,
            },
        );
        assert!(index.converged);
        assert!(index.rounds_run <= 100);
    }

    #[test]
    fn test_tolerance_cap_reports_not_converged() {
        let normalized = normalize(&sample_table(), &Indicator::INDEX_COMPONENTS);
        let index = compute_composite(
            &normalized,
            ConvergencePolicy::Tolerance {
                tol: 0.0,
                max_rounds: 2,
            },
        );
        // An exact-zero tolerance cannot be met before the cap.
        assert!(!index.converged);
        assert_eq!(index.rounds_run, 2);
    }

    #[test]
    fn test_dominant_indicator_gains_weight_over_rounds() {
        // critical_failures tracks the unweighted mean of the other four
        // noise columns, so its correlation with the consensus dominates
        // and its weight must keep growing round over round.
        let noise = [
            [2.4, 1.0, 4.0, 1.5, 0.7, 4.0, 9.2, 8.0, 7.7],
            [2.2, 5.4, 2.8, 1.7, 1.1, 2.1, 9.3, 8.3, 8.1],
            [8.0, 1.9, 3.1, 6.3, 7.3, 8.5, 8.8, 0.9, 6.1],
            [6.7, 5.1, 1.8, 4.7, 0.9, 9.3, 8.7, 5.5, 3.0],
        ];
        let lead: Vec<f64> = (0..9)
            .map(|i| noise.iter().map(|c| c[i]).sum::<f64>() / 4.0)
            .collect();

        let rows: Vec<[f64; 9]> = (0..9)
            .map(|i| {
                [
                    // Negate lower-is-better columns so normalization keeps
                    // the intended orientation of each signal.
                    -lead[i],
                    -noise[0][i],
                    -noise[1][i],
                    0.0,
                    noise[2][i],
                    noise[3][i],
                    0.0,
                    0.0,
                    0.0,
                ]
            })
            .collect();
        let table = table_from_rows(&rows);
        let used = [
            Indicator::CriticalFailures,
            Indicator::MajorFailures,
            Indicator::MinorFailures,
            Indicator::Investment,
            Indicator::DailyRidership,
        ];
        let normalized = normalize(&table, &used);

        let lead_weight = |rounds: usize| {
            let index = compute_composite(&normalized, ConvergencePolicy::FixedRounds(rounds));
            index.weights[0].weight
        };

        let w1 = lead_weight(1);
        let w2 = lead_weight(2);
        let w3 = lead_weight(3);
        assert!(w1 > 1.0 / 5.0);
        assert!(w2 > w1);
        assert!(w3 > w2);
    }
}
