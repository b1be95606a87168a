//! Drives a policy across a price series.
//!
//! Each tick the runner copies the current state, lets the policy mutate the
//! copy, then commits it. A tick therefore either applies its whole
//! transition or none of it, and contributes exactly one value point.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::error::PolicysimError;
use crate::domain::policy::{Policy, PolicyKind, TickContext, Valuation};
use crate::domain::state::{PolicyState, StartingPosition};
use crate::domain::tick::{validate_prices, Tick};
use crate::domain::trade::Trade;
use crate::domain::valuation::{ValuePoint, ValueSeries};

/// Everything a completed run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub policy: String,
    pub tag: &'static str,
    pub values: ValueSeries,
    pub trades: Vec<Trade>,
    pub final_state: PolicyState,
    pub initial_investment: f64,
}

impl SimulationResult {
    pub fn final_value(&self) -> Option<f64> {
        self.values.last().map(|p| p.value)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SimulationRunner<'a> {
    start: StartingPosition,
    prices: &'a [Tick],
    initial_investment: f64,
}

impl<'a> SimulationRunner<'a> {
    /// Validates the price series and starting position once; the runner can
    /// then be reused for any number of policies.
    pub fn new(start: StartingPosition, prices: &'a [Tick]) -> Result<Self, PolicysimError> {
        validate_prices(prices)?;
        start.validate()?;
        Ok(SimulationRunner {
            start,
            prices,
            initial_investment: start.initial_investment(),
        })
    }

    /// Override the capital that returns are measured against.
    pub fn with_initial_investment(mut self, amount: f64) -> Result<Self, PolicysimError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(PolicysimError::invalid_input(format!(
                "initial investment must be positive, got {amount}"
            )));
        }
        self.initial_investment = amount;
        Ok(self)
    }

    pub fn initial_investment(&self) -> f64 {
        self.initial_investment
    }

    pub fn run<P: Policy + ?Sized>(&self, policy: &P) -> Result<SimulationResult, PolicysimError> {
        let mut state = policy.initial_state(self.start)?;
        let valuation = policy.valuation();
        let indicators = policy.indicators(self.prices);

        info!(
            policy = policy.name(),
            ticks = self.prices.len(),
            "Starting simulation"
        );

        let mut values = Vec::with_capacity(self.prices.len());
        let mut trades = Vec::new();

        for (index, tick) in self.prices.iter().enumerate() {
            let ctx = TickContext::new(index, self.prices, &indicators);

            let mut next = state;
            let trade = policy.on_tick(&mut next, &ctx);

            let value = match valuation {
                Valuation::PreTrade => state.value_at(tick.price),
                Valuation::PostTrade => next.value_at(tick.price),
            };
            values.push(ValuePoint {
                date: tick.date,
                value,
            });

            if let Some(trade) = trade {
                debug!(
                    policy = policy.name(),
                    date = %trade.date,
                    side = %trade.side,
                    price = trade.price,
                    shares = trade.shares,
                    "Trade"
                );
                trades.push(trade);
            }

            state = next;
        }

        let result = SimulationResult {
            policy: policy.display_name(),
            tag: policy.name(),
            values,
            trades,
            final_state: state,
            initial_investment: self.initial_investment,
        };

        info!(
            policy = result.tag,
            trades = result.trades.len(),
            final_value = result.final_value().unwrap_or(0.0),
            "Simulation complete"
        );

        Ok(result)
    }

    /// Run independent policies in parallel over the same prices. Results
    /// keep the order of `policies`.
    pub fn run_all(&self, policies: &[PolicyKind]) -> Vec<Result<SimulationResult, PolicysimError>> {
        policies
            .par_iter()
            .map(|policy| {
                let result = self.run(policy);
                if let Err(e) = &result {
                    warn!(policy = policy.name(), error = %e, "Simulation failed");
                }
                result
            })
            .collect()
    }
}
