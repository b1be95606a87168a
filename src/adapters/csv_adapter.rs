//! CSV file price adapter.
//!
//! Reads `<base_path>/<TICKER>.csv`. The header must contain `date` and
//! `close` columns (case-insensitive); any other columns are ignored.

use crate::domain::error::PolicysimError;
use crate::domain::tick::Tick;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker.to_uppercase()))
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, PolicysimError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| PolicysimError::Data {
            reason: format!("missing {name} column"),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Tick>, PolicysimError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| PolicysimError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| PolicysimError::Data {
                reason: format!("failed to read header of {}: {}", path.display(), e),
            })?
            .clone();
        let date_idx = column_index(&headers, "date")?;
        let close_idx = column_index(&headers, "close")?;

        let mut ticks = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| PolicysimError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(date_idx).ok_or_else(|| PolicysimError::Data {
                reason: "missing date value".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                PolicysimError::Data {
                    reason: format!("invalid date '{}': {}", date_str, e),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            let price: f64 = record
                .get(close_idx)
                .ok_or_else(|| PolicysimError::Data {
                    reason: "missing close value".into(),
                })?
                .trim()
                .parse()
                .map_err(|e| PolicysimError::Data {
                    reason: format!("invalid close value on {}: {}", date, e),
                })?;

            ticks.push(Tick::new(date, price));
        }

        if ticks.is_empty() {
            return Err(PolicysimError::NoData {
                ticker: ticker.to_string(),
                start: start_date.to_string(),
                end: end_date.to_string(),
            });
        }

        ticks.sort_by_key(|t| t.date);
        debug!(ticker, ticks = ticks.len(), path = %path.display(), "Loaded prices");
        Ok(ticks)
    }
}
