//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod decision_log_csv;
pub mod file_config_adapter;
pub mod json_report;
