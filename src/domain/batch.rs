//! Parallel batch runner.
//!
//! Independent (code, bars, strategy) units run on the rayon pool. Units share
//! only the immutable bar sequence. Cancellation is cooperative: the token is
//! checked before a unit starts, and a unit that has started always finishes.

use crate::domain::backtest::{RunResult, run_strategy};
use crate::domain::error::SignalError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::strategy::StrategyConfig;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct RunUnit {
    pub code: String,
    pub bars: Arc<Vec<OhlcvBar>>,
    pub config: StrategyConfig,
}

#[derive(Debug)]
pub enum UnitOutcome {
    Completed(Box<RunResult>),
    Failed(SignalError),
    Cancelled,
}

#[derive(Debug)]
pub struct UnitReport {
    pub code: String,
    pub strategy: String,
    pub outcome: UnitOutcome,
}

impl UnitOutcome {
    pub fn result(&self) -> Option<&RunResult> {
        match self {
            UnitOutcome::Completed(result) => Some(&**result),
            _ => None,
        }
    }
}

/// Runs every unit, returning one report per unit in input order.
pub fn run_batch(units: &[RunUnit], cancel: &CancelToken) -> Vec<UnitReport> {
    info!(units = units.len(), "starting batch");

    let reports: Vec<UnitReport> = units
        .par_iter()
        .map(|unit| UnitReport {
            code: unit.code.clone(),
            strategy: unit.config.id().to_string(),
            outcome: run_unit(unit, cancel),
        })
        .collect();

    let completed = reports
        .iter()
        .filter(|r| matches!(r.outcome, UnitOutcome::Completed(_)))
        .count();
    info!(units = units.len(), completed, "batch finished");
    reports
}

fn run_unit(unit: &RunUnit, cancel: &CancelToken) -> UnitOutcome {
    if cancel.is_cancelled() {
        debug!(code = %unit.code, "unit cancelled before start");
        return UnitOutcome::Cancelled;
    }

    let result = unit
        .config
        .build()
        .and_then(|strategy| run_strategy(strategy.as_ref(), &unit.bars));
    match result {
        Ok(result) => UnitOutcome::Completed(Box::new(result)),
        Err(SignalError::NoData { .. }) => UnitOutcome::Failed(SignalError::NoData {
            code: unit.code.clone(),
        }),
        Err(e) => UnitOutcome::Failed(e),
    }
}
