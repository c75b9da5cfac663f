//! Append-only decision log.
//!
//! Only ENTER_LONG and EXIT decisions are recorded, and they must alternate
//! starting with ENTER_LONG. HOLD bars are not logged.

use crate::domain::error::SignalError;
use crate::domain::signal::{Action, Signal, StrategyId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub strategy_id: StrategyId,
    pub bar_index: usize,
    pub date: NaiveDate,
    pub price: f64,
    pub action: Action,
    pub reason: String,
}

/// One ENTER_LONG paired with its EXIT.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundTrip {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub bars_held: usize,
    /// Gross percentage change from entry to exit.
    pub return_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DecisionLog {
    records: Vec<DecisionRecord>,
}

impl DecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a decision, rejecting HOLD and any out-of-turn action.
    pub fn record(&mut self, record: DecisionRecord) -> Result<(), SignalError> {
        let expected = match self.records.last() {
            Some(last) if last.action == Action::EnterLong => Action::Exit,
            _ => Action::EnterLong,
        };
        if record.action != expected {
            return Err(SignalError::DecisionLog {
                reason: format!(
                    "{} at bar {} ({}): expected {}",
                    record.action, record.bar_index, record.date, expected
                ),
            });
        }
        if let Some(last) = self.records.last() {
            if record.bar_index <= last.bar_index {
                return Err(SignalError::DecisionLog {
                    reason: format!(
                        "bar {} does not follow bar {}",
                        record.bar_index, last.bar_index
                    ),
                });
            }
        }
        self.records.push(record);
        Ok(())
    }

    pub fn record_signal(&mut self, signal: &Signal, price: f64) -> Result<(), SignalError> {
        self.record(DecisionRecord {
            strategy_id: signal.strategy_id,
            bar_index: signal.bar_index,
            date: signal.date,
            price,
            action: signal.action,
            reason: signal.reason.clone(),
        })
    }

    /// Rebuilds a log from stored records, re-checking alternation.
    pub fn from_records(records: Vec<DecisionRecord>) -> Result<Self, SignalError> {
        let mut log = Self::new();
        for record in records {
            log.record(record)?;
        }
        Ok(log)
    }

    pub fn records(&self) -> &[DecisionRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DecisionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&DecisionRecord> {
        self.records.last()
    }

    /// Completed ENTER_LONG/EXIT pairs. A trailing open entry is not included.
    pub fn round_trips(&self) -> Vec<RoundTrip> {
        self.records
            .chunks_exact(2)
            .map(|pair| {
                let (entry, exit) = (&pair[0], &pair[1]);
                RoundTrip {
                    entry_date: entry.date,
                    exit_date: exit.date,
                    entry_price: entry.price,
                    exit_price: exit.price,
                    bars_held: exit.bar_index - entry.bar_index,
                    return_pct: (exit.price / entry.price - 1.0) * 100.0,
                }
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a DecisionLog {
    type Item = &'a DecisionRecord;
    type IntoIter = std::slice::Iter<'a, DecisionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
