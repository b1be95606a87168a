#![allow(dead_code)]

use chrono::NaiveDate;
use policysim::domain::error::PolicysimError;
use policysim::domain::runner::SimulationResult;
use policysim::domain::simulation::SimulationConfig;
use policysim::domain::state::StartingPosition;
pub use policysim::domain::tick::Tick;
use policysim::domain::valuation::values_only;
use policysim::ports::data_port::DataPort;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Tick>>,
    pub errors: HashMap<String, String>,
    pub requests: RefCell<Vec<(String, NaiveDate, NaiveDate)>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_ticks(mut self, ticker: &str, ticks: Vec<Tick>) -> Self {
        self.data.insert(ticker.to_string(), ticks);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Tick>, PolicysimError> {
        self.requests
            .borrow_mut()
            .push((ticker.to_string(), start_date, end_date));
        if let Some(reason) = self.errors.get(ticker) {
            return Err(PolicysimError::Data {
                reason: reason.clone(),
            });
        }
        let ticks: Vec<Tick> = self
            .data
            .get(ticker)
            .map(|t| {
                t.iter()
                    .filter(|tick| tick.date >= start_date && tick.date <= end_date)
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        if ticks.is_empty() {
            return Err(PolicysimError::NoData {
                ticker: ticker.to_string(),
                start: start_date.to_string(),
                end: end_date.to_string(),
            });
        }
        Ok(ticks)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One tick per calendar day starting 2024-01-01.
pub fn make_ticks(prices: &[f64]) -> Vec<Tick> {
    let start = date(2024, 1, 1);
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| Tick::new(start + chrono::Duration::days(i as i64), p))
        .collect()
}

pub fn invested(shares: f64, avg_cost: f64) -> StartingPosition {
    StartingPosition::new(shares, avg_cost, 0.0)
}

pub fn sample_config(policies: &[&str]) -> SimulationConfig {
    SimulationConfig {
        ticker: "AAPL".to_string(),
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        data_dir: PathBuf::from("data"),
        start: invested(10.0, 100.0),
        initial_investment: None,
        policies: policies.iter().map(|p| p.to_string()).collect(),
    }
}

pub fn values(result: &SimulationResult) -> Vec<f64> {
    values_only(&result.values)
}
