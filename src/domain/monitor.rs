//! Signal monitor: latest decision per (code, strategy) and a consensus score.

use crate::domain::backtest::RunResult;
use crate::domain::batch::{CancelToken, RunUnit, UnitOutcome, run_batch};
use crate::domain::signal::{Action, StrategyId};
use crate::domain::strategy::StrategyConfig;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorCell {
    Buy,
    Sell,
    Holding,
    Wait,
    NoData,
    Error(String),
}

impl MonitorCell {
    pub fn score(&self) -> i32 {
        match self {
            MonitorCell::Buy => 1,
            MonitorCell::Sell => -1,
            _ => 0,
        }
    }
}

impl fmt::Display for MonitorCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorCell::Buy => f.write_str("BUY"),
            MonitorCell::Sell => f.write_str("SELL"),
            MonitorCell::Holding => f.write_str("HOLDING"),
            MonitorCell::Wait => f.write_str("WAIT"),
            MonitorCell::NoData => f.write_str("NO_DATA"),
            MonitorCell::Error(_) => f.write_str("ERROR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorRow {
    pub code: String,
    pub last_close: Option<f64>,
    pub cells: Vec<(StrategyId, MonitorCell)>,
}

impl MonitorRow {
    pub fn score(&self) -> i32 {
        self.cells.iter().map(|(_, cell)| cell.score()).sum()
    }
}

/// Classifies a finished run by its most recent decision.
///
/// A decision within the last `recent_bars` bars gives BUY or SELL; otherwise
/// the final position gives HOLDING or WAIT.
pub fn classify(result: &RunResult, recent_bars: usize) -> MonitorCell {
    let bars = result.signals.len();
    let window_start = bars.saturating_sub(recent_bars);
    match result.log.last() {
        Some(record) if recent_bars > 0 && record.bar_index >= window_start => match record.action {
            Action::EnterLong => MonitorCell::Buy,
            _ => MonitorCell::Sell,
        },
        _ if result.final_state.is_long() => MonitorCell::Holding,
        _ => MonitorCell::Wait,
    }
}

/// Runs every strategy over every code and classifies the outcome.
///
/// Codes without data produce NO_DATA cells instead of failing the scan. Rows
/// are ordered by descending score; ties keep the input order.
pub fn scan(
    data: &dyn DataPort,
    codes: &[String],
    configs: &[StrategyConfig],
    start: NaiveDate,
    end: NaiveDate,
    recent_bars: usize,
    cancel: &CancelToken,
) -> Vec<MonitorRow> {
    let mut rows = Vec::with_capacity(codes.len());
    let mut units = Vec::new();

    for code in codes {
        let bars = match data.fetch_ohlcv(code, start, end) {
            Ok(bars) if !bars.is_empty() => bars,
            Ok(_) => {
                warn!(code = %code, "no bars in range; skipping");
                rows.push(no_data_row(code, configs));
                continue;
            }
            Err(e) => {
                warn!(code = %code, error = %e, "failed to load bars; skipping");
                rows.push(no_data_row(code, configs));
                continue;
            }
        };

        let last_close = bars.last().map(|b| b.close);
        let bars = Arc::new(bars);
        for config in configs {
            units.push(RunUnit {
                code: code.clone(),
                bars: Arc::clone(&bars),
                config: config.clone(),
            });
        }
        rows.push(MonitorRow {
            code: code.clone(),
            last_close,
            cells: Vec::new(),
        });
    }

    for report in run_batch(&units, cancel) {
        let cell = match &report.outcome {
            UnitOutcome::Completed(result) => classify(result, recent_bars),
            UnitOutcome::Failed(e) => MonitorCell::Error(e.to_string()),
            UnitOutcome::Cancelled => MonitorCell::Error("cancelled".into()),
        };
        let id = report
            .outcome
            .result()
            .map(|r| r.strategy_id)
            .or_else(|| report.strategy.parse().ok());
        if let (Some(row), Some(id)) = (rows.iter_mut().find(|r| r.code == report.code), id) {
            row.cells.push((id, cell));
        }
    }

    rows.sort_by_key(|row| std::cmp::Reverse(row.score()));
    rows
}

fn no_data_row(code: &str, configs: &[StrategyConfig]) -> MonitorRow {
    MonitorRow {
        code: code.to_string(),
        last_close: None,
        cells: configs.iter().map(|c| (c.id(), MonitorCell::NoData)).collect(),
    }
}
