//! JSON run report, and replay of a stored decision log.

use crate::domain::backtest::{DataShortfall, RunResult};
use crate::domain::decision_log::{DecisionLog, DecisionRecord, RoundTrip};
use crate::domain::error::SignalError;
use crate::domain::position::StrategyState;
use crate::domain::signal::StrategyId;
use crate::ports::report_port::ReportPort;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Serialize)]
struct Report<'a> {
    strategy_id: StrategyId,
    bars: usize,
    final_state: &'a StrategyState,
    shortfall: Option<DataShortfall>,
    decisions: &'a DecisionLog,
    round_trips: Vec<RoundTrip>,
}

#[derive(Deserialize)]
struct StoredReport {
    decisions: Vec<DecisionRecord>,
}

#[derive(Debug, Default)]
pub struct JsonReport;

impl JsonReport {
    pub fn new() -> Self {
        Self
    }

    pub fn render(result: &RunResult) -> Result<String, SignalError> {
        let report = Report {
            strategy_id: result.strategy_id,
            bars: result.signals.len(),
            final_state: &result.final_state,
            shortfall: result.shortfall,
            decisions: &result.log,
            round_trips: result.log.round_trips(),
        };
        serde_json::to_string_pretty(&report).map_err(|e| SignalError::Io(e.into()))
    }
}

impl ReportPort for JsonReport {
    fn write(&self, result: &RunResult, output_path: &str) -> Result<(), SignalError> {
        fs::write(output_path, Self::render(result)?)?;
        debug!(path = output_path, decisions = result.log.len(), "wrote json report");
        Ok(())
    }
}

/// Loads the `decisions` of a written report, re-checking alternation.
pub fn read_decision_log(path: &Path) -> Result<DecisionLog, SignalError> {
    let content = fs::read_to_string(path)?;
    let stored: StoredReport =
        serde_json::from_str(&content).map_err(|e| SignalError::DecisionLog {
            reason: format!("{}: {}", path.display(), e),
        })?;
    DecisionLog::from_records(stored.decisions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::run_strategy;
    use crate::domain::signal::Action;
    use crate::domain::strategy::test_support::bars_from_closes;
    use crate::domain::strategy::{RsiParams, StrategyConfig};
    use tempfile::TempDir;

    fn rsi_result() -> RunResult {
        let strategy = StrategyConfig::Rsi(RsiParams {
            period: 3,
            ..RsiParams::default()
        })
        .build()
        .unwrap();
        let bars = bars_from_closes(&[
            50.0, 48.0, 46.0, 44.0, 46.0, 49.0, 53.0, 52.0, 50.0, 47.0, 44.0, 41.0,
        ]);
        run_strategy(strategy.as_ref(), &bars).unwrap()
    }

    #[test]
    fn written_log_replays_identically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let result = rsi_result();

        JsonReport::new()
            .write(&result, path.to_str().unwrap())
            .unwrap();
        let replayed = read_decision_log(&path).unwrap();

        assert_eq!(replayed, result.log);
    }

    #[test]
    fn report_shape() {
        let result = rsi_result();
        let json: serde_json::Value =
            serde_json::from_str(&JsonReport::render(&result).unwrap()).unwrap();
        assert_eq!(json["strategy_id"], "rsi");
        assert_eq!(json["bars"], 12);
        assert!(json["shortfall"].is_null());
        assert_eq!(json["decisions"][0]["action"], "ENTER_LONG");
        assert_eq!(
            json["round_trips"].as_array().unwrap().len(),
            result.log.round_trips().len()
        );
    }

    #[test]
    fn tampered_log_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        let record = serde_json::json!({
            "strategy_id": "rsi",
            "bar_index": 3,
            "date": "2024-01-04",
            "price": 44.0,
            "action": Action::Exit,
            "reason": "x"
        });
        fs::write(&path, serde_json::json!({ "decisions": [record] }).to_string()).unwrap();

        let err = read_decision_log(&path).unwrap_err();
        assert!(matches!(err, SignalError::DecisionLog { .. }));
    }

    #[test]
    fn malformed_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            read_decision_log(&path),
            Err(SignalError::DecisionLog { .. })
        ));
        assert!(matches!(
            read_decision_log(&dir.path().join("missing.json")),
            Err(SignalError::Io(_))
        ));
    }
}
