//! Core domain types and logic.

pub mod ohlcv;
pub mod error;
pub mod indicator;
pub mod rule;
pub mod rule_eval;
pub mod signal;
pub mod position;
pub mod strategy;
pub mod decision_log;
pub mod backtest;
pub mod batch;
pub mod monitor;
pub mod config_validation;
