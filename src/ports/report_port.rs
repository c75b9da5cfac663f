//! Report generation port trait.

use crate::domain::backtest::RunResult;
use crate::domain::error::SignalError;

/// Port for persisting a run's decision log.
pub trait ReportPort {
    fn write(&self, result: &RunResult, output_path: &str) -> Result<(), SignalError>;
}
