//! Moving-average crossover signal policy.
//!
//! Golden cross (short SMA moves above long SMA) puts all cash into shares;
//! death cross (short moves below long) liquidates. A cross needs both
//! averages defined on the current and the previous tick.

use super::{invalid_param, Policy, TickContext};
use crate::domain::config_validation::read_int;
use crate::domain::error::PolicysimError;
use crate::domain::indicator::{calculate_sma, IndicatorSeries};
use crate::domain::state::{PolicyState, StartingPosition};
use crate::domain::tick::Tick;
use crate::domain::trade::Trade;
use crate::ports::config_port::ConfigPort;

pub const NAME: &str = "sma_crossover";

const SHORT: usize = 0;
const LONG: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cross {
    Golden,
    Death,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmaCrossover {
    pub short_period: usize,
    pub long_period: usize,
}

impl Default for SmaCrossover {
    fn default() -> Self {
        SmaCrossover {
            short_period: 10,
            long_period: 50,
        }
    }
}

impl SmaCrossover {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PolicysimError> {
        let d = Self::default();
        let read = |key: &str, default: usize| -> Result<usize, PolicysimError> {
            let value = read_int(config, NAME, key, default as i64)?;
            usize::try_from(value)
                .map_err(|_| invalid_param(NAME, key, "period must be a positive integer"))
        };
        Ok(SmaCrossover {
            short_period: read("short_period", d.short_period)?,
            long_period: read("long_period", d.long_period)?,
        })
    }

    pub fn validate(&self) -> Result<(), PolicysimError> {
        if self.short_period == 0 {
            return Err(invalid_param(
                NAME,
                "short_period",
                "short_period must be at least 1",
            ));
        }
        if self.long_period <= self.short_period {
            return Err(invalid_param(
                NAME,
                "long_period",
                "long_period must be greater than short_period",
            ));
        }
        Ok(())
    }

    /// Cross on the tick at `ctx.index`, if any.
    pub fn cross_at(&self, ctx: &TickContext<'_>) -> Option<Cross> {
        if ctx.index == 0 {
            return None;
        }
        let (i, prev) = (ctx.index, ctx.index - 1);

        let short = ctx.indicator(SHORT, i)?;
        let long = ctx.indicator(LONG, i)?;
        let prev_short = ctx.indicator(SHORT, prev)?;
        let prev_long = ctx.indicator(LONG, prev)?;

        if short > long && prev_short <= prev_long {
            Some(Cross::Golden)
        } else if short < long && prev_short >= prev_long {
            Some(Cross::Death)
        } else {
            None
        }
    }
}

impl Policy for SmaCrossover {
    fn name(&self) -> &'static str {
        NAME
    }

    fn display_name(&self) -> String {
        format!(
            "SMA Crossover ({}/{})",
            self.short_period, self.long_period
        )
    }

    fn initial_state(&self, start: StartingPosition) -> Result<PolicyState, PolicysimError> {
        Ok(PolicyState::from_start(start))
    }

    fn indicators(&self, prices: &[Tick]) -> Vec<IndicatorSeries> {
        vec![
            calculate_sma(prices, self.short_period),
            calculate_sma(prices, self.long_period),
        ]
    }

    fn on_tick(&self, state: &mut PolicyState, ctx: &TickContext<'_>) -> Option<Trade> {
        let tick = ctx.tick();
        match self.cross_at(ctx)? {
            Cross::Golden if state.cash > 0.0 => Some(state.invest_all(tick)),
            Cross::Death if state.shares_held > 0.0 => Some(state.liquidate(tick)),
            _ => None,
        }
    }
}
