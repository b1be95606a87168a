//! Run configuration: which ticker, which window, which starting position and
//! which policies to simulate.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::error::PolicysimError;
use crate::domain::policy::{build_policy, policy_names, PolicyKind};
use crate::domain::runner::SimulationRunner;
use crate::domain::state::StartingPosition;
use crate::domain::tick::Tick;
use crate::ports::config_port::ConfigPort;

pub const SECTION: &str = "simulation";

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub data_dir: PathBuf,
    pub start: StartingPosition,
    /// Overrides `start.initial_investment()` when set.
    pub initial_investment: Option<f64>,
    pub policies: Vec<String>,
}

impl SimulationConfig {
    /// Runner over `prices` with this config's starting position and
    /// investment override applied.
    pub fn runner<'a>(&self, prices: &'a [Tick]) -> Result<SimulationRunner<'a>, PolicysimError> {
        let runner = SimulationRunner::new(self.start, prices)?;
        match self.initial_investment {
            Some(amount) => runner.with_initial_investment(amount),
            None => Ok(runner),
        }
    }

    /// Build every configured policy from its parameter section.
    pub fn build_policies(&self, config: &dyn ConfigPort) -> Result<Vec<PolicyKind>, PolicysimError> {
        self.policies
            .iter()
            .map(|name| build_policy(name, config))
            .collect()
    }
}

/// Split a comma-separated policy list into lowercase tags. Empty entries and
/// duplicates are rejected.
pub fn parse_policy_list(input: &str) -> Result<Vec<String>, PolicysimError> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(invalid_policies("empty entry in policy list"));
        }
        let name = trimmed.to_lowercase();
        if !seen.insert(name.clone()) {
            return Err(invalid_policies(&format!("duplicate policy: {name}")));
        }
        names.push(name);
    }

    Ok(names)
}

/// Policies from `[simulation] policies`, or every registered policy when the
/// key is absent.
pub fn resolve_policies(config: &dyn ConfigPort) -> Result<Vec<String>, PolicysimError> {
    match config.get_string(SECTION, "policies") {
        Some(list) => parse_policy_list(&list),
        None => Ok(policy_names().into_iter().map(String::from).collect()),
    }
}

fn invalid_policies(reason: &str) -> PolicysimError {
    PolicysimError::ConfigInvalid {
        section: SECTION.to_string(),
        key: "policies".to_string(),
        reason: reason.to_string(),
    }
}
