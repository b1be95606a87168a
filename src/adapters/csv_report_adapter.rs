//! CSV report adapter implementing ReportPort.
//!
//! Writes one row per tick: the portfolio value joined with the trade made on
//! that tick, if any. The metrics summary goes to a sibling
//! `<stem>.metrics.csv`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::domain::error::PolicysimError;
use crate::domain::metrics::Metrics;
use crate::domain::runner::SimulationResult;
use crate::domain::trade::Trade;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }

    pub fn metrics_path(output_path: &Path) -> PathBuf {
        let stem = output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        output_path.with_file_name(format!("{stem}.metrics.csv"))
    }

    fn write_series(result: &SimulationResult, path: &Path) -> Result<(), PolicysimError> {
        let trades: HashMap<NaiveDate, &Trade> =
            result.trades.iter().map(|t| (t.date, t)).collect();

        let mut wtr = csv::Writer::from_path(path).map_err(report_error)?;
        wtr.write_record(["date", "value", "side", "price", "shares", "amount"])
            .map_err(report_error)?;

        for point in &result.values {
            let date = point.date.to_string();
            let value = format!("{:.4}", point.value);
            let written = match trades.get(&point.date) {
                Some(trade) => wtr.write_record([
                    date,
                    value,
                    trade.side.to_string(),
                    format!("{:.4}", trade.price),
                    format!("{:.6}", trade.shares),
                    format!("{:.4}", trade.amount),
                ]),
                None => wtr.write_record([
                    date,
                    value,
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                ]),
            };
            written.map_err(report_error)?;
        }

        wtr.flush()?;
        Ok(())
    }

    fn write_metrics(
        result: &SimulationResult,
        metrics: &Metrics,
        path: &Path,
    ) -> Result<(), PolicysimError> {
        let mut wtr = csv::Writer::from_path(path).map_err(report_error)?;
        wtr.write_record(["metric", "value"]).map_err(report_error)?;
        wtr.write_record(["policy", result.policy.as_str()])
            .map_err(report_error)?;
        wtr.write_record(["trades", result.trades.len().to_string().as_str()])
            .map_err(report_error)?;
        for (name, value) in metrics.summary() {
            wtr.write_record([name.to_string(), format!("{value:.6}")])
                .map_err(report_error)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn report_error(e: csv::Error) -> PolicysimError {
    PolicysimError::Report {
        reason: e.to_string(),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &SimulationResult,
        metrics: &Metrics,
        output_path: &Path,
    ) -> Result<(), PolicysimError> {
        Self::write_series(result, output_path)?;
        let metrics_path = Self::metrics_path(output_path);
        Self::write_metrics(result, metrics, &metrics_path)?;
        info!(
            policy = result.tag,
            series = %output_path.display(),
            metrics = %metrics_path.display(),
            "Report written"
        );
        Ok(())
    }
}
