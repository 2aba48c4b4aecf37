//! Cross-cutting error types for Trawl.
//!
//! Only errors that can originate from plain data handling live here.
//! Transport errors belong to `trawl-client` and store consistency errors to
//! `trawl-engine`; the binary converges them through `anyhow`.

use thiserror::Error;

/// Errors that can be raised while building or parsing core types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Input failed local validation and must be corrected by the user.
    #[error("validation rejected: {0}")]
    ValidationRejected(String),

    /// A platform identifier outside the supported set.
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    /// A task status string outside the lifecycle.
    #[error("unknown task status: {0}")]
    UnknownStatus(String),
}
