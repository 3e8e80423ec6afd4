//! Market clock entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Market clock as Alpaca sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawClock {
    /// Current timestamp.
    pub timestamp: String,
    /// Whether the market is open.
    pub is_open: bool,
    /// Next market open.
    pub next_open: String,
    /// Next market close.
    pub next_close: String,
}

/// Market clock with parsed timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    /// Current timestamp.
    pub timestamp: DateTime<Utc>,
    /// Whether the market is open.
    pub is_open: bool,
    /// Next market open.
    pub next_open: DateTime<Utc>,
    /// Next market close.
    pub next_close: DateTime<Utc>,
    pub(crate) raw: RawClock,
}

impl Clock {
    /// The payload this clock was parsed from.
    #[must_use]
    pub const fn raw(&self) -> &RawClock {
        &self.raw
    }
}
