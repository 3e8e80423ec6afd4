//! Trade update entity, streamed on the account `trade_updates` channel.
//!
//! # Wire Format (JSON)
//! ```json
//! {
//!   "stream": "trade_updates",
//!   "data": {
//!     "event": "fill",
//!     "execution_id": "2f63ea93-423d-4169-b3f6-3fdafc10c418",
//!     "timestamp": "2021-05-25T13:44:04.521Z",
//!     "position_qty": "100",
//!     "price": "209.71",
//!     "qty": "100",
//!     "order": { "...": "..." }
//!   }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::order::{Order, RawOrder};

/// Order lifecycle event. Mirrors [`super::OrderStatus`] with event wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeUpdateEvent {
    /// Order routed to the exchange.
    New,
    /// Order completely filled.
    Fill,
    /// Order partially filled.
    PartialFill,
    /// Order canceled.
    Canceled,
    /// Order expired.
    Expired,
    /// Order done for the day.
    DoneForDay,
    /// Order replaced.
    Replaced,
    /// Order rejected.
    Rejected,
    /// Order received, not yet accepted.
    PendingNew,
    /// Order stopped.
    Stopped,
    /// Cancel requested.
    PendingCancel,
    /// Replace requested.
    PendingReplace,
    /// Completed for the day, settlement pending.
    Calculated,
    /// Order suspended.
    Suspended,
    /// Replace request rejected.
    OrderReplaceRejected,
    /// Cancel request rejected.
    OrderCancelRejected,
}

impl TradeUpdateEvent {
    /// Whether the event reports an execution.
    #[must_use]
    pub const fn is_execution(self) -> bool {
        matches!(self, Self::Fill | Self::PartialFill)
    }
}

/// Trade update as Alpaca sends it (the `data` of a `trade_updates` frame).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTradeUpdate {
    /// Event name.
    pub event: String,
    /// Execution ID; absent on non-execution events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    /// The order after the event.
    pub order: RawOrder,
    /// Event ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Event time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<String>,
    /// Execution time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Position quantity after the execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_qty: Option<String>,
    /// Execution price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Executed quantity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty: Option<String>,
}

/// Trade update with the embedded order normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeUpdate {
    /// Event.
    pub event: TradeUpdateEvent,
    /// Execution ID.
    pub execution_id: Option<String>,
    /// The order after the event.
    pub order: Order,
    /// Event ID.
    pub event_id: Option<String>,
    /// Event time.
    pub at: Option<DateTime<Utc>>,
    /// Execution time.
    pub timestamp: Option<DateTime<Utc>>,
    /// Position quantity after the execution.
    pub position_qty: Option<f64>,
    /// Execution price.
    pub price: Option<f64>,
    /// Executed quantity.
    pub qty: Option<f64>,
    pub(crate) raw: RawTradeUpdate,
}

impl TradeUpdate {
    /// The payload this update was parsed from.
    #[must_use]
    pub const fn raw(&self) -> &RawTradeUpdate {
        &self.raw
    }

    /// Symbol of the order this update concerns.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.order.symbol
    }
}
