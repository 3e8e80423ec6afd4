//! Order entity.
//!
//! Orders carry a lifecycle of timestamps (created, submitted, filled,
//! expired, canceled, failed, replaced). Unset lifecycle timestamps arrive as
//! `null` and are `None` once parsed.
//!
//! Composite orders (`bracket`, `oco`, `oto`) carry their child orders in
//! `legs`. The parent owns the decoded subtree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enumerations
// =============================================================================

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Market order
    Market,
    /// Limit order
    Limit,
    /// Stop order
    Stop,
    /// Stop-limit order
    StopLimit,
    /// Trailing stop order
    TrailingStop,
}

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Buy order
    Buy,
    /// Sell order
    Sell,
}

/// Time in force for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Day order (canceled at end of day)
    Day,
    /// Good-til-canceled
    Gtc,
    /// Market open (execute at open)
    Opg,
    /// Market close (execute at close)
    Cls,
    /// Immediate-or-cancel
    Ioc,
    /// Fill-or-kill
    Fok,
}

/// Order class for composite orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderClass {
    /// Simple single-leg order
    Simple,
    /// Bracket order (entry + stop loss + take profit)
    Bracket,
    /// One-cancels-other
    Oco,
    /// One-triggers-other
    Oto,
}

impl OrderClass {
    /// Whether this class implies child orders in `legs`.
    #[must_use]
    pub const fn is_composite(self) -> bool {
        !matches!(self, Self::Simple)
    }
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Received and routed to the exchange.
    New,
    /// Partially filled.
    PartiallyFilled,
    /// Completely filled.
    Filled,
    /// Done for the day.
    DoneForDay,
    /// Canceled.
    Canceled,
    /// Expired.
    Expired,
    /// Replaced by another order.
    Replaced,
    /// Cancel requested, not yet confirmed.
    PendingCancel,
    /// Replace requested, not yet confirmed.
    PendingReplace,
    /// Accepted by Alpaca, not yet routed.
    Accepted,
    /// Received by Alpaca, not yet accepted.
    PendingNew,
    /// Accepted for bidding (e.g. auction orders).
    AcceptedForBidding,
    /// Stopped, a trade is guaranteed.
    Stopped,
    /// Rejected.
    Rejected,
    /// Suspended, not eligible for trading.
    Suspended,
    /// Completed for the day, settlement calculations pending.
    Calculated,
}

impl OrderStatus {
    /// Whether no further fills can happen.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Canceled | Self::Expired | Self::Replaced | Self::Rejected
        )
    }
}

// =============================================================================
// Raw Order
// =============================================================================

/// Order as Alpaca sends it.
///
/// # Wire Format (JSON)
/// ```json
/// {
///   "id": "61e69015-8549-4bfd-b9c3-01e75843f47d",
///   "client_order_id": "eb9e2aaa-f71a-4f51-b5b4-52a6c565dad4",
///   "created_at": "2021-03-16T18:38:01.942282Z",
///   "submitted_at": "2021-03-16T18:38:01.937734Z",
///   "filled_at": null,
///   "symbol": "AAPL",
///   "qty": "15",
///   "filled_qty": "0",
///   "type": "limit",
///   "limit_price": "107.00",
///   "order_class": "bracket",
///   "legs": [{ "...": "..." }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOrder {
    /// Order ID.
    pub id: String,
    /// Client-provided order ID.
    pub client_order_id: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
    /// Submission timestamp.
    #[serde(default)]
    pub submitted_at: Option<String>,
    /// Fill timestamp.
    #[serde(default)]
    pub filled_at: Option<String>,
    /// Expiry timestamp.
    #[serde(default)]
    pub expired_at: Option<String>,
    /// Cancellation timestamp.
    #[serde(default)]
    pub canceled_at: Option<String>,
    /// Failure timestamp.
    #[serde(default)]
    pub failed_at: Option<String>,
    /// Replacement timestamp.
    #[serde(default)]
    pub replaced_at: Option<String>,
    /// ID of the order that replaced this one.
    #[serde(default)]
    pub replaced_by: Option<String>,
    /// ID of the order this one replaces.
    #[serde(default)]
    pub replaces: Option<String>,
    /// Asset ID.
    pub asset_id: String,
    /// Asset symbol.
    pub symbol: String,
    /// Asset class.
    pub asset_class: String,
    /// Ordered quantity; null for notional orders.
    #[serde(default)]
    pub qty: Option<String>,
    /// Ordered notional value; null for quantity orders.
    #[serde(default)]
    pub notional: Option<String>,
    /// Filled quantity.
    pub filled_qty: String,
    /// Order type.
    #[serde(rename = "type")]
    pub order_type: String,
    /// Order side.
    pub side: String,
    /// Time in force.
    pub time_in_force: String,
    /// Limit price.
    #[serde(default)]
    pub limit_price: Option<String>,
    /// Stop price.
    #[serde(default)]
    pub stop_price: Option<String>,
    /// Average fill price.
    #[serde(default)]
    pub filled_avg_price: Option<String>,
    /// Order status.
    pub status: String,
    /// Whether the order may execute in extended hours.
    #[serde(default)]
    pub extended_hours: bool,
    /// Child orders of a composite order.
    #[serde(default)]
    pub legs: Option<Vec<RawOrder>>,
    /// Trailing stop dollar offset.
    #[serde(default)]
    pub trail_price: Option<String>,
    /// Trailing stop percent offset.
    #[serde(default)]
    pub trail_percent: Option<String>,
    /// High water mark of a trailing stop.
    #[serde(default)]
    pub hwm: Option<String>,
    /// Order class; Alpaca sends "" for simple orders.
    #[serde(default)]
    pub order_class: Option<String>,
}

// =============================================================================
// Parsed Order
// =============================================================================

/// Order with parsed numbers, timestamps and enumerations.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Order ID.
    pub id: String,
    /// Client-provided order ID.
    pub client_order_id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Submission timestamp.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Fill timestamp.
    pub filled_at: Option<DateTime<Utc>>,
    /// Expiry timestamp.
    pub expired_at: Option<DateTime<Utc>>,
    /// Cancellation timestamp.
    pub canceled_at: Option<DateTime<Utc>>,
    /// Failure timestamp.
    pub failed_at: Option<DateTime<Utc>>,
    /// Replacement timestamp.
    pub replaced_at: Option<DateTime<Utc>>,
    /// ID of the order that replaced this one.
    pub replaced_by: Option<String>,
    /// ID of the order this one replaces.
    pub replaces: Option<String>,
    /// Asset ID.
    pub asset_id: String,
    /// Asset symbol.
    pub symbol: String,
    /// Asset class.
    pub asset_class: String,
    /// Ordered quantity.
    pub qty: Option<f64>,
    /// Ordered notional value.
    pub notional: Option<f64>,
    /// Filled quantity.
    pub filled_qty: f64,
    /// Order type.
    pub order_type: OrderType,
    /// Order side.
    pub side: OrderSide,
    /// Time in force.
    pub time_in_force: TimeInForce,
    /// Limit price.
    pub limit_price: Option<f64>,
    /// Stop price.
    pub stop_price: Option<f64>,
    /// Average fill price.
    pub filled_avg_price: Option<f64>,
    /// Order status.
    pub status: OrderStatus,
    /// Whether the order may execute in extended hours.
    pub extended_hours: bool,
    /// Child orders, in the order Alpaca listed them.
    pub legs: Vec<Order>,
    /// Trailing stop dollar offset.
    pub trail_price: Option<f64>,
    /// Trailing stop percent offset.
    pub trail_percent: Option<f64>,
    /// High water mark of a trailing stop.
    pub hwm: Option<f64>,
    /// Order class.
    pub order_class: Option<OrderClass>,
    pub(crate) raw: RawOrder,
}

impl Order {
    /// The payload this order was parsed from, legs included.
    #[must_use]
    pub const fn raw(&self) -> &RawOrder {
        &self.raw
    }

    /// Whether this order carries child orders.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        self.order_class.is_some_and(OrderClass::is_composite)
    }
}

// =============================================================================
// Order Cancelation
// =============================================================================

/// One entry of the `DELETE /v2/orders` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOrderCancelation {
    /// Order ID.
    pub id: String,
    /// HTTP status of the individual cancel.
    pub status: u16,
    /// The order as it stood after the cancel request.
    pub body: RawOrder,
}

/// Result of cancelling one order in a bulk cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCancelation {
    /// Order ID.
    pub id: String,
    /// HTTP status of the individual cancel.
    pub status: u16,
    /// The order as it stood after the cancel request.
    pub order: Order,
    pub(crate) raw: RawOrderCancelation,
}

impl OrderCancelation {
    /// The payload this cancelation was parsed from.
    #[must_use]
    pub const fn raw(&self) -> &RawOrderCancelation {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_class_composite() {
        assert!(!OrderClass::Simple.is_composite());
        assert!(OrderClass::Bracket.is_composite());
        assert!(OrderClass::Oco.is_composite());
        assert!(OrderClass::Oto.is_composite());
    }

    #[test]
    fn order_status_terminal() {
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(!OrderStatus::PartiallyFilled.is_terminal());
        assert!(!OrderStatus::PendingNew.is_terminal());
    }

    #[test]
    fn deserialize_order_enums() {
        let status: OrderStatus = serde_json::from_str(r#""accepted_for_bidding""#).unwrap();
        assert_eq!(status, OrderStatus::AcceptedForBidding);

        let order_type: OrderType = serde_json::from_str(r#""trailing_stop""#).unwrap();
        assert_eq!(order_type, OrderType::TrailingStop);
    }
}
