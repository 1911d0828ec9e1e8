//! # stormwatch-core
//!
//! Core types, errors, and utilities for stormwatch.
//!
//! This crate provides:
//! - [`AlertRecord`] and [`AlertField`] - the fixed shape of a weather alert
//! - [`AlertStore`] - the id-unique, newest-first alert collection with
//!   diff/merge/replace
//! - [`StormError`] - startup error types
//! - [`logging`] - tracing setup
//!
//! ## Example
//!
//! ```
//! use stormwatch_core::{AlertRecord, AlertStore};
//!
//! let mut store = AlertStore::new();
//! let snapshot = vec![AlertRecord::new("A1", "Flood Watch")];
//!
//! let new = store.diff(&snapshot);
//! store.merge(new);
//! assert!(store.diff(&snapshot).is_empty());
//! ```

pub mod error;
pub mod logging;
pub mod store;
pub mod types;

pub use error::{Result, StormError};
pub use logging::{LogGuard, init_logging};
pub use store::AlertStore;
pub use types::{AlertField, AlertId, AlertRecord, UnknownField};
