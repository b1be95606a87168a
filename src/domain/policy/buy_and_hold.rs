//! Buy-and-hold baseline: never trades.

use super::{Policy, TickContext};
use crate::domain::error::PolicysimError;
use crate::domain::state::{PolicyState, StartingPosition};
use crate::domain::trade::Trade;

pub const NAME: &str = "buy_and_hold";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BuyAndHold;

impl Policy for BuyAndHold {
    fn name(&self) -> &'static str {
        NAME
    }

    fn display_name(&self) -> String {
        "Buy & Hold".to_string()
    }

    fn initial_state(&self, start: StartingPosition) -> Result<PolicyState, PolicysimError> {
        Ok(PolicyState::from_start(start))
    }

    fn on_tick(&self, _state: &mut PolicyState, _ctx: &TickContext<'_>) -> Option<Trade> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tick::Tick;
    use chrono::NaiveDate;

    fn ticks(prices: &[f64]) -> Vec<Tick> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Tick::new(start + chrono::Duration::days(i as i64), p))
            .collect()
    }

    #[test]
    fn tracks_price_times_shares_plus_cash() {
        let result = BuyAndHold
            .run(StartingPosition::new(10.0, 100.0, 50.0), &ticks(&[100.0, 80.0, 120.0]))
            .unwrap();
        let values: Vec<f64> = result.values.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1050.0, 850.0, 1250.0]);
        assert!(result.trades.is_empty());
    }

    #[test]
    fn cash_only_start_stays_flat() {
        let result = BuyAndHold
            .run(StartingPosition::new(0.0, 100.0, 1500.0), &ticks(&[100.0, 10.0]))
            .unwrap();
        assert!(result.values.iter().all(|p| (p.value - 1500.0).abs() < f64::EPSILON));
    }
}
