//! CSV decision-log writer.
//!
//! One row per ENTER_LONG / EXIT decision:
//! `strategy_id,bar_index,date,price,action,reason`.

use crate::domain::backtest::RunResult;
use crate::domain::error::SignalError;
use crate::ports::report_port::ReportPort;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Default)]
pub struct DecisionLogCsv;

impl DecisionLogCsv {
    pub fn new() -> Self {
        Self
    }
}

fn csv_error(path: &Path, e: csv::Error) -> SignalError {
    SignalError::Io(std::io::Error::other(format!(
        "failed to write {}: {}",
        path.display(),
        e
    )))
}

impl ReportPort for DecisionLogCsv {
    fn write(&self, result: &RunResult, output_path: &str) -> Result<(), SignalError> {
        let path = Path::new(output_path);
        let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
        if result.log.is_empty() {
            wtr.write_record(["strategy_id", "bar_index", "date", "price", "action", "reason"])
                .map_err(|e| csv_error(path, e))?;
        }
        for record in &result.log {
            wtr.serialize(record).map_err(|e| csv_error(path, e))?;
        }
        wtr.flush()?;
        debug!(path = output_path, rows = result.log.len(), "wrote decision log csv");
        Ok(())
    }
}
