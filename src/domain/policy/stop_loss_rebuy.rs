//! Stop-loss with full liquidation and full re-entry.
//!
//! Two states. HOLDING sells everything once price <= stop, where
//! stop = avg_cost * (1 + stop_loss_pct / 100). CASH buys back with all cash
//! once price >= rebuy = exit_price * (1 + rebuy_gain_pct / 100). After a
//! re-entry both levels are reset from the entry price. The stop check runs
//! first and a tick makes at most one transition.

use super::{invalid_param, Policy, TickContext};
use crate::domain::config_validation::read_double;
use crate::domain::error::PolicysimError;
use crate::domain::state::{PolicyState, StartingPosition};
use crate::domain::trade::Trade;
use crate::ports::config_port::ConfigPort;

pub const NAME: &str = "stop_loss_rebuy";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopLossRebuy {
    /// Percent below cost that triggers liquidation, e.g. -10.
    pub stop_loss_pct: f64,
    /// Percent above the exit price that triggers re-entry, e.g. 5.
    pub rebuy_gain_pct: f64,
}

impl Default for StopLossRebuy {
    fn default() -> Self {
        StopLossRebuy {
            stop_loss_pct: -10.0,
            rebuy_gain_pct: 5.0,
        }
    }
}

impl StopLossRebuy {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PolicysimError> {
        let defaults = Self::default();
        Ok(StopLossRebuy {
            stop_loss_pct: read_double(config, NAME, "stop_loss_pct", defaults.stop_loss_pct)?,
            rebuy_gain_pct: read_double(config, NAME, "rebuy_gain_pct", defaults.rebuy_gain_pct)?,
        })
    }

    pub fn validate(&self) -> Result<(), PolicysimError> {
        validate_levels(NAME, self.stop_loss_pct, self.rebuy_gain_pct)
    }

    pub fn stop_level(&self, reference: f64) -> f64 {
        reference * (1.0 + self.stop_loss_pct / 100.0)
    }

    pub fn rebuy_level(&self, reference: f64) -> f64 {
        reference * (1.0 + self.rebuy_gain_pct / 100.0)
    }
}

/// Shared by the full and partial variants.
pub(crate) fn validate_levels(
    section: &str,
    stop_loss_pct: f64,
    rebuy_gain_pct: f64,
) -> Result<(), PolicysimError> {
    if !stop_loss_pct.is_finite() || stop_loss_pct > 0.0 || stop_loss_pct <= -100.0 {
        return Err(invalid_param(
            section,
            "stop_loss_pct",
            "stop_loss_pct must be in (-100, 0]",
        ));
    }
    if !rebuy_gain_pct.is_finite() || rebuy_gain_pct < 0.0 {
        return Err(invalid_param(
            section,
            "rebuy_gain_pct",
            "rebuy_gain_pct must be non-negative",
        ));
    }
    Ok(())
}

impl Policy for StopLossRebuy {
    fn name(&self) -> &'static str {
        NAME
    }

    fn display_name(&self) -> String {
        "Stop Loss & Rebuy Strategy".to_string()
    }

    fn initial_state(&self, start: StartingPosition) -> Result<PolicyState, PolicysimError> {
        if start.shares <= 0.0 || start.cash != 0.0 {
            return Err(PolicysimError::invalid_input(format!(
                "{NAME} starts fully invested: need shares > 0 and cash = 0 (got shares {}, cash {})",
                start.shares, start.cash
            )));
        }
        let mut state = PolicyState::from_start(start);
        state.stop_price = Some(self.stop_level(start.avg_cost));
        Ok(state)
    }

    fn on_tick(&self, state: &mut PolicyState, ctx: &TickContext<'_>) -> Option<Trade> {
        let tick = ctx.tick();
        let price = tick.price;

        if state.is_holding {
            if state.stop_price.is_some_and(|stop| price <= stop) {
                let trade = state.liquidate(tick);
                state.stop_price = None;
                state.rebuy_price = Some(self.rebuy_level(price));
                return Some(trade);
            }
        } else if state.rebuy_price.is_some_and(|rebuy| price >= rebuy) {
            let trade = state.invest_all(tick);
            state.stop_price = Some(self.stop_level(price));
            state.rebuy_price = Some(self.rebuy_level(price));
            return Some(trade);
        }

        None
    }
}
