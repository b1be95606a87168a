//! Summary statistics over a completed value series.
//!
//! Returns are measured against the initial investment,
//! `r_t = value_t / initial_investment - 1`, not tick-over-tick. Degenerate
//! inputs (flat series, no drawdown, no losing ticks) resolve to 0.

use super::error::PolicysimError;
use super::runner::SimulationResult;
use super::valuation::ValuePoint;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub mean_return: f64,
    pub median_return: f64,
    pub max_return: f64,
    pub min_return: f64,
    pub std_return: f64,
    /// Largest fall from a running peak, in currency units.
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub cagr: f64,
    pub calmar_ratio: f64,
    pub sortino_ratio: f64,
    pub total_return: f64,
    pub final_value: f64,
}

impl Metrics {
    pub fn compute(values: &[ValuePoint], initial_investment: f64) -> Result<Self, PolicysimError> {
        if values.is_empty() {
            return Err(PolicysimError::invalid_input(
                "cannot compute metrics for an empty value series",
            ));
        }
        if !initial_investment.is_finite() || initial_investment <= 0.0 {
            return Err(PolicysimError::invalid_input(format!(
                "initial investment must be positive, got {initial_investment}"
            )));
        }

        let returns: Vec<f64> = values
            .iter()
            .map(|p| p.value / initial_investment - 1.0)
            .collect();

        let mean_return = mean(&returns);
        let std_return = population_std(&returns);
        let max_return = returns.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min_return = returns.iter().copied().fold(f64::INFINITY, f64::min);

        let final_value = values[values.len() - 1].value;
        let total_return = final_value / initial_investment - 1.0;

        let sharpe_ratio = annualized_ratio(mean_return, std_return);

        let negative: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        let sortino_ratio = if negative.is_empty() {
            0.0
        } else {
            annualized_ratio(mean_return, population_std(&negative))
        };

        let n = values.len() as f64;
        let cagr = (final_value / initial_investment).powf(TRADING_DAYS_PER_YEAR / n) - 1.0;
        let cagr = if cagr.is_finite() { cagr } else { 0.0 };

        let max_drawdown = compute_drawdown(values);
        let calmar_ratio = if max_drawdown > 0.0 {
            cagr / max_drawdown
        } else {
            0.0
        };

        Ok(Metrics {
            mean_return,
            median_return: median(&returns),
            max_return,
            min_return,
            std_return,
            max_drawdown,
            sharpe_ratio,
            cagr,
            calmar_ratio,
            sortino_ratio,
            total_return,
            final_value,
        })
    }

    pub fn from_result(result: &SimulationResult) -> Result<Self, PolicysimError> {
        Self::compute(&result.values, result.initial_investment)
    }

    /// Name/value pairs in display order.
    pub fn summary(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("final_value", self.final_value),
            ("total_return", self.total_return),
            ("mean_return", self.mean_return),
            ("median_return", self.median_return),
            ("max_return", self.max_return),
            ("min_return", self.min_return),
            ("std_return", self.std_return),
            ("max_drawdown", self.max_drawdown),
            ("sharpe_ratio", self.sharpe_ratio),
            ("sortino_ratio", self.sortino_ratio),
            ("cagr", self.cagr),
            ("calmar_ratio", self.calmar_ratio),
        ]
    }
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn population_std(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let m = mean(xs);
    let variance = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64;
    variance.sqrt()
}

fn median(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn annualized_ratio(mean: f64, std: f64) -> f64 {
    if std > 0.0 {
        mean / std * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

// max(running_max(value) - value)
fn compute_drawdown(values: &[ValuePoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for point in values {
        peak = peak.max(point.value);
        max_dd = max_dd.max(peak - point.value);
    }
    max_dd
}
