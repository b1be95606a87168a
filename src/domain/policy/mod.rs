//! Trading policies and the static policy registry.
//!
//! Every policy is an immutable parameter struct implementing [`Policy`].
//! [`PolicyKind`] wraps the concrete variants so callers can hold any of them
//! by value, and [`REGISTRY`] maps each config tag to its constructor. Adding
//! a policy means adding a variant, a registry row and a section name here.

pub mod buy_and_hold;
pub mod dca;
pub mod partial_stop_loss;
pub mod sma_crossover;
pub mod stop_loss_rebuy;

use crate::domain::error::PolicysimError;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::runner::{SimulationResult, SimulationRunner};
use crate::domain::state::{PolicyState, StartingPosition};
use crate::domain::tick::Tick;
use crate::domain::trade::Trade;
use crate::ports::config_port::ConfigPort;

pub use buy_and_hold::BuyAndHold;
pub use dca::DollarCostAveraging;
pub use partial_stop_loss::PartialStopLossRebuy;
pub use sma_crossover::SmaCrossover;
pub use stop_loss_rebuy::StopLossRebuy;

/// Which state a tick's valuation is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Valuation {
    /// State before the tick's trade is applied.
    PreTrade,
    /// State after the tick's trade is applied.
    PostTrade,
}

/// What a policy sees on each tick: the full series, the current index and
/// the indicator series the policy asked for. Policies must only read
/// positions `..=index`.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub index: usize,
    pub prices: &'a [Tick],
    pub indicators: &'a [IndicatorSeries],
}

impl<'a> TickContext<'a> {
    pub fn new(index: usize, prices: &'a [Tick], indicators: &'a [IndicatorSeries]) -> Self {
        TickContext {
            index,
            prices,
            indicators,
        }
    }

    pub fn tick(&self) -> &'a Tick {
        &self.prices[self.index]
    }

    /// Value of indicator `slot` at `index`; `None` during warmup, past the
    /// current tick, or if the slot does not exist.
    pub fn indicator(&self, slot: usize, index: usize) -> Option<f64> {
        if index > self.index {
            return None;
        }
        self.indicators.get(slot)?.get(index).copied().flatten()
    }
}

pub trait Policy: Send + Sync {
    /// Registry tag, also the config section holding the parameters.
    fn name(&self) -> &'static str;

    /// Human-readable title for reports.
    fn display_name(&self) -> String;

    /// Build the per-run state. Called once at the start of every run.
    fn initial_state(&self, start: StartingPosition) -> Result<PolicyState, PolicysimError>;

    /// Evaluate one tick, mutating `state` and returning the trade made, if
    /// any. At most one transition per tick.
    fn on_tick(&self, state: &mut PolicyState, ctx: &TickContext<'_>) -> Option<Trade>;

    fn valuation(&self) -> Valuation {
        Valuation::PostTrade
    }

    /// Indicator series computed once per run before the first tick and
    /// exposed through [`TickContext::indicator`] in the order returned.
    fn indicators(&self, _prices: &[Tick]) -> Vec<IndicatorSeries> {
        Vec::new()
    }

    fn run(
        &self,
        start: StartingPosition,
        prices: &[Tick],
    ) -> Result<SimulationResult, PolicysimError> {
        SimulationRunner::new(start, prices)?.run(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PolicyKind {
    BuyAndHold(BuyAndHold),
    StopLossRebuy(StopLossRebuy),
    PartialStopLossRebuy(PartialStopLossRebuy),
    DollarCostAveraging(DollarCostAveraging),
    SmaCrossover(SmaCrossover),
}

impl PolicyKind {
    fn inner(&self) -> &dyn Policy {
        match self {
            PolicyKind::BuyAndHold(p) => p,
            PolicyKind::StopLossRebuy(p) => p,
            PolicyKind::PartialStopLossRebuy(p) => p,
            PolicyKind::DollarCostAveraging(p) => p,
            PolicyKind::SmaCrossover(p) => p,
        }
    }
}

impl Policy for PolicyKind {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn display_name(&self) -> String {
        self.inner().display_name()
    }

    fn initial_state(&self, start: StartingPosition) -> Result<PolicyState, PolicysimError> {
        self.inner().initial_state(start)
    }

    fn on_tick(&self, state: &mut PolicyState, ctx: &TickContext<'_>) -> Option<Trade> {
        self.inner().on_tick(state, ctx)
    }

    fn valuation(&self) -> Valuation {
        self.inner().valuation()
    }

    fn indicators(&self, prices: &[Tick]) -> Vec<IndicatorSeries> {
        self.inner().indicators(prices)
    }
}

type Constructor = fn(&dyn ConfigPort) -> Result<PolicyKind, PolicysimError>;

/// Every known policy, by tag.
pub const REGISTRY: &[(&str, Constructor)] = &[
    (buy_and_hold::NAME, build_buy_and_hold),
    (stop_loss_rebuy::NAME, build_stop_loss_rebuy),
    (partial_stop_loss::NAME, build_partial_stop_loss_rebuy),
    (dca::NAME, build_dca),
    (sma_crossover::NAME, build_sma_crossover),
];

pub fn policy_names() -> Vec<&'static str> {
    REGISTRY.iter().map(|(name, _)| *name).collect()
}

/// Look up `name` in the registry and build it from its config section.
/// Missing keys fall back to the policy's defaults.
pub fn build_policy(name: &str, config: &dyn ConfigPort) -> Result<PolicyKind, PolicysimError> {
    let key = name.trim().to_lowercase();
    REGISTRY
        .iter()
        .find(|(tag, _)| *tag == key)
        .map(|(_, build)| build(config))
        .unwrap_or_else(|| {
            Err(PolicysimError::UnknownPolicy {
                name: name.to_string(),
            })
        })
}

fn build_buy_and_hold(_config: &dyn ConfigPort) -> Result<PolicyKind, PolicysimError> {
    Ok(PolicyKind::BuyAndHold(BuyAndHold))
}

fn build_stop_loss_rebuy(config: &dyn ConfigPort) -> Result<PolicyKind, PolicysimError> {
    let policy = StopLossRebuy::from_config(config)?;
    policy.validate()?;
    Ok(PolicyKind::StopLossRebuy(policy))
}

fn build_partial_stop_loss_rebuy(config: &dyn ConfigPort) -> Result<PolicyKind, PolicysimError> {
    let policy = PartialStopLossRebuy::from_config(config)?;
    policy.validate()?;
    Ok(PolicyKind::PartialStopLossRebuy(policy))
}

fn build_dca(config: &dyn ConfigPort) -> Result<PolicyKind, PolicysimError> {
    let policy = DollarCostAveraging::from_config(config)?;
    policy.validate()?;
    Ok(PolicyKind::DollarCostAveraging(policy))
}

fn build_sma_crossover(config: &dyn ConfigPort) -> Result<PolicyKind, PolicysimError> {
    let policy = SmaCrossover::from_config(config)?;
    policy.validate()?;
    Ok(PolicyKind::SmaCrossover(policy))
}

pub(crate) fn invalid_param(section: &str, key: &str, reason: &str) -> PolicysimError {
    PolicysimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn empty_config() -> FileConfigAdapter {
        FileConfigAdapter::from_string("[simulation]\n").unwrap()
    }

    #[test]
    fn registry_lists_every_policy_once() {
        let names = policy_names();
        assert_eq!(
            names,
            vec![
                "buy_and_hold",
                "stop_loss_rebuy",
                "partial_stop_loss_rebuy",
                "dca",
                "sma_crossover"
            ]
        );
    }

    #[test]
    fn every_registered_policy_builds_with_defaults() {
        let config = empty_config();
        for name in policy_names() {
            let policy = build_policy(name, &config).unwrap();
            assert_eq!(policy.name(), name);
        }
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = build_policy("rsi_strategy", &empty_config()).unwrap_err();
        assert!(matches!(err, PolicysimError::UnknownPolicy { name } if name == "rsi_strategy"));
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let policy = build_policy("  DCA ", &empty_config()).unwrap();
        assert!(matches!(policy, PolicyKind::DollarCostAveraging(_)));
    }

    #[test]
    fn build_reads_section_parameters() {
        let config = FileConfigAdapter::from_string(
            "[stop_loss_rebuy]\nstop_loss_pct = -7.5\nrebuy_gain_pct = 3\n",
        )
        .unwrap();
        let policy = build_policy("stop_loss_rebuy", &config).unwrap();
        assert_eq!(
            policy,
            PolicyKind::StopLossRebuy(StopLossRebuy {
                stop_loss_pct: -7.5,
                rebuy_gain_pct: 3.0,
            })
        );
    }

    #[test]
    fn build_rejects_invalid_parameters() {
        let config =
            FileConfigAdapter::from_string("[sma_crossover]\nshort_period = 50\nlong_period = 10\n")
                .unwrap();
        let err = build_policy("sma_crossover", &config).unwrap_err();
        assert!(matches!(err, PolicysimError::ConfigInvalid { section, .. } if section == "sma_crossover"));
    }

    #[test]
    fn kind_delegates_valuation() {
        let config = empty_config();
        let partial = build_policy("partial_stop_loss_rebuy", &config).unwrap();
        let full = build_policy("stop_loss_rebuy", &config).unwrap();
        assert_eq!(partial.valuation(), Valuation::PreTrade);
        assert_eq!(full.valuation(), Valuation::PostTrade);
    }

    #[test]
    fn tick_context_hides_future_indicator_values() {
        let d = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let prices: Vec<Tick> = (0..5)
            .map(|i| Tick::new(d + chrono::Duration::days(i), 100.0 + i as f64))
            .collect();
        let series = vec![vec![None, Some(1.0), Some(2.0), Some(3.0), Some(4.0)]];
        let ctx = TickContext::new(2, &prices, &series);

        assert!((ctx.tick().price - 102.0).abs() < f64::EPSILON);
        assert_eq!(ctx.indicator(0, 0), None);
        assert_eq!(ctx.indicator(0, 2), Some(2.0));
        assert_eq!(ctx.indicator(0, 3), None);
        assert_eq!(ctx.indicator(1, 2), None);
    }

    #[test]
    fn kind_delegates_indicators() {
        let d = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let prices: Vec<Tick> = (0..4)
            .map(|i| Tick::new(d + chrono::Duration::days(i), 100.0))
            .collect();
        let sma = PolicyKind::SmaCrossover(SmaCrossover {
            short_period: 2,
            long_period: 3,
        });
        assert_eq!(sma.indicators(&prices).len(), 2);
        assert!(PolicyKind::BuyAndHold(BuyAndHold).indicators(&prices).is_empty());
    }
}
