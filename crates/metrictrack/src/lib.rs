//! `metrictrack` - A local tracker for monthly indicators
//!
//! This library provides the record store with pluggable persistence, the
//! import validator, period formatting, a pure view model for display, and
//! templated report generation.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod period;
pub mod record;
pub mod report;
pub mod storage;
pub mod store;
pub mod transfer;
pub mod validate;
pub mod view;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use period::Period;
pub use record::MetricRecord;
pub use report::{Artifact, ReportError, ReportGenerator};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use store::{RecordStore, StoreObserver};
pub use validate::{validate, Schema, ValidationError};
pub use view::{CollapseState, ViewModel, ViewOptions};
