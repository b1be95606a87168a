//! Report generation port.

use crate::domain::error::PolicysimError;
use crate::domain::metrics::Metrics;
use crate::domain::runner::SimulationResult;
use std::path::Path;

/// Port for writing simulation reports.
pub trait ReportPort {
    fn write(
        &self,
        result: &SimulationResult,
        metrics: &Metrics,
        output_path: &Path,
    ) -> Result<(), PolicysimError>;
}
