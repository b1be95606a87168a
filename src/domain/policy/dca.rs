//! Dollar-cost averaging on dips.
//!
//! Buys `additional_funds_per_buy / price` shares whenever the price has
//! dropped at least `dip_threshold` percent below the last buy price, until
//! `num_buys` purchases have been made. Purchases are funded from outside the
//! tracked cash balance; the total is kept in `PolicyState::contributed`.
//!
//! Each tick is valued as `cash + shares_held * price`. Starting cash is never
//! spent, so it sits in every value point unchanged. With no starting cash
//! this is the plain `shares_held * price`.

use super::{invalid_param, Policy, TickContext};
use crate::domain::config_validation::{read_double, read_int};
use crate::domain::error::PolicysimError;
use crate::domain::state::{PolicyState, StartingPosition};
use crate::domain::trade::Trade;
use crate::ports::config_port::ConfigPort;

pub const NAME: &str = "dca";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DollarCostAveraging {
    pub num_buys: u32,
    /// Percent drop from the last buy price that triggers a purchase.
    pub dip_threshold: f64,
    pub additional_funds_per_buy: f64,
}

impl Default for DollarCostAveraging {
    fn default() -> Self {
        DollarCostAveraging {
            num_buys: 4,
            dip_threshold: 5.0,
            additional_funds_per_buy: 1000.0,
        }
    }
}

impl DollarCostAveraging {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PolicysimError> {
        let d = Self::default();
        let num_buys = read_int(config, NAME, "num_buys", i64::from(d.num_buys))?;
        let num_buys = u32::try_from(num_buys)
            .map_err(|_| invalid_param(NAME, "num_buys", "num_buys must be a non-negative integer"))?;
        Ok(DollarCostAveraging {
            num_buys,
            dip_threshold: read_double(config, NAME, "dip_threshold", d.dip_threshold)?,
            additional_funds_per_buy: read_double(
                config,
                NAME,
                "additional_funds_per_buy",
                d.additional_funds_per_buy,
            )?,
        })
    }

    pub fn validate(&self) -> Result<(), PolicysimError> {
        if !self.dip_threshold.is_finite() || self.dip_threshold < 0.0 {
            return Err(invalid_param(
                NAME,
                "dip_threshold",
                "dip_threshold must be non-negative",
            ));
        }
        if !self.additional_funds_per_buy.is_finite() || self.additional_funds_per_buy <= 0.0 {
            return Err(invalid_param(
                NAME,
                "additional_funds_per_buy",
                "additional_funds_per_buy must be positive",
            ));
        }
        Ok(())
    }

    /// (price / last_buy_price - 1) * 100 <= -dip_threshold
    pub fn is_dip(&self, price: f64, last_buy_price: f64) -> bool {
        (price / last_buy_price - 1.0) * 100.0 <= -self.dip_threshold
    }
}

impl Policy for DollarCostAveraging {
    fn name(&self) -> &'static str {
        NAME
    }

    fn display_name(&self) -> String {
        "DCA Strategy".to_string()
    }

    fn initial_state(&self, start: StartingPosition) -> Result<PolicyState, PolicysimError> {
        let mut state = PolicyState::from_start(start);
        state.remaining_buys = self.num_buys;
        state.last_buy_price = start.avg_cost;
        Ok(state)
    }

    fn on_tick(&self, state: &mut PolicyState, ctx: &TickContext<'_>) -> Option<Trade> {
        let tick = ctx.tick();
        if state.remaining_buys == 0 || !self.is_dip(tick.price, state.last_buy_price) {
            return None;
        }

        let trade = state.buy_with_external_funds(self.additional_funds_per_buy, tick);
        state.remaining_buys -= 1;
        state.last_buy_price = tick.price;
        Some(trade)
    }
}
