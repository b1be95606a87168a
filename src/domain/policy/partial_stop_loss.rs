//! Partial stop-loss and rebuy: scale out and back in instead of flipping
//! the whole position.
//!
//! A stop event sells `floor(shares_held * sell_ratio)` whole shares and
//! re-anchors both levels on the sell price. A rebuy event spends
//! `cash * buy_ratio` and re-anchors both levels on the new weighted average
//! cost. Cash and shares coexist. The tick's value is taken before its trade.

use super::stop_loss_rebuy::validate_levels;
use super::{invalid_param, Policy, TickContext, Valuation};
use crate::domain::config_validation::read_double;
use crate::domain::error::PolicysimError;
use crate::domain::state::{PolicyState, StartingPosition};
use crate::domain::trade::Trade;
use crate::ports::config_port::ConfigPort;

pub const NAME: &str = "partial_stop_loss_rebuy";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialStopLossRebuy {
    pub stop_loss_pct: f64,
    pub rebuy_gain_pct: f64,
    /// Fraction of held shares sold per stop event, in (0, 1].
    pub sell_ratio: f64,
    /// Fraction of cash spent per rebuy event, in (0, 1].
    pub buy_ratio: f64,
}

impl Default for PartialStopLossRebuy {
    fn default() -> Self {
        PartialStopLossRebuy {
            stop_loss_pct: -10.0,
            rebuy_gain_pct: 5.0,
            sell_ratio: 0.5,
            buy_ratio: 0.5,
        }
    }
}

impl PartialStopLossRebuy {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PolicysimError> {
        let d = Self::default();
        Ok(PartialStopLossRebuy {
            stop_loss_pct: read_double(config, NAME, "stop_loss_pct", d.stop_loss_pct)?,
            rebuy_gain_pct: read_double(config, NAME, "rebuy_gain_pct", d.rebuy_gain_pct)?,
            sell_ratio: read_double(config, NAME, "sell_ratio", d.sell_ratio)?,
            buy_ratio: read_double(config, NAME, "buy_ratio", d.buy_ratio)?,
        })
    }

    pub fn validate(&self) -> Result<(), PolicysimError> {
        validate_levels(NAME, self.stop_loss_pct, self.rebuy_gain_pct)?;
        for (key, value) in [("sell_ratio", self.sell_ratio), ("buy_ratio", self.buy_ratio)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(invalid_param(NAME, key, "ratio must be in (0, 1]"));
            }
        }
        Ok(())
    }

    fn anchor(&self, state: &mut PolicyState, reference: f64) {
        state.stop_price = Some(reference * (1.0 + self.stop_loss_pct / 100.0));
        state.rebuy_price = Some(reference * (1.0 + self.rebuy_gain_pct / 100.0));
    }
}

impl Policy for PartialStopLossRebuy {
    fn name(&self) -> &'static str {
        NAME
    }

    fn display_name(&self) -> String {
        "Partial Stop Loss & Rebuy Strategy".to_string()
    }

    fn initial_state(&self, start: StartingPosition) -> Result<PolicyState, PolicysimError> {
        let mut state = PolicyState::from_start(start);
        self.anchor(&mut state, start.avg_cost);
        Ok(state)
    }

    fn on_tick(&self, state: &mut PolicyState, ctx: &TickContext<'_>) -> Option<Trade> {
        let tick = ctx.tick();
        let price = tick.price;

        if state.shares_held > 0.0 && state.stop_price.is_some_and(|stop| price <= stop) {
            let quantity = (state.shares_held * self.sell_ratio).floor();
            // Stop has priority: a fractional holding that rounds to zero
            // shares blocks the rebuy check for this tick.
            if quantity < 1.0 {
                return None;
            }
            let trade = state.sell_shares(quantity, tick);
            self.anchor(state, price);
            return Some(trade);
        }

        if state.cash > 0.0 && state.rebuy_price.is_some_and(|rebuy| price >= rebuy) {
            let spend = state.cash * self.buy_ratio;
            let trade = state.buy_with_cash(spend, tick);
            let avg_cost = state.avg_cost;
            self.anchor(state, avg_cost);
            return Some(trade);
        }

        None
    }

    fn valuation(&self) -> Valuation {
        Valuation::PreTrade
    }
}
