//! Core types for the control-plane supervisor.
//!
//! This module provides foundational types used throughout the system:
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for processes and observability

mod config;
mod errors;

pub use config::{Config, ObservabilityConfig, ProcessConfig, DEFAULT_PROCESS_TIMEOUT};
pub use errors::{Error, Result};
