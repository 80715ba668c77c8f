//! Error types for the table core.
//!
//! Only contract violations are surfaced to callers. Everything else
//! (corrupt persisted state, a not-yet-ready engine, a rejected column
//! layout) degrades locally and is logged, never raised.

use thiserror::Error;

/// Errors returned across the public API.
#[derive(Debug, Error)]
pub enum TableError {
    /// A context-menu operation was invoked before any row was
    /// right-clicked, so there is no anchor to act on. This is a
    /// host-wiring bug: menu items must only be reachable while a row
    /// menu is open.
    #[error("{operation} requires an anchor row; no row has been right-clicked")]
    InvariantViolation { operation: &'static str },
}

/// Recoverable persistence faults. Logged at the load site and treated
/// as "absent"; never returned across the public API.
#[derive(Debug, Error)]
pub(crate) enum StateError {
    #[error("corrupt view state under '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
