//! Account activity entities.
//!
//! `GET /v2/account/activities` returns a heterogeneous list. Order fills
//! (`activity_type == "FILL"`) carry execution details; every other activity
//! type (dividends, journals, fees, ...) carries a cash amount and a date.
//!
//! # Wire Format (JSON)
//! ```json
//! [
//!   {
//!     "activity_type": "FILL",
//!     "id": "20190524113406977::8efc7b9a-8b2b-4000-9955-d36e7db0df74",
//!     "cum_qty": "1",
//!     "leaves_qty": "0",
//!     "price": "1.63",
//!     "qty": "1",
//!     "side": "buy",
//!     "symbol": "LPCN",
//!     "transaction_time": "2019-05-24T15:34:06.977Z",
//!     "order_id": "904837e3-3b76-47ec-b432-046db621571b",
//!     "type": "fill"
//!   },
//!   {
//!     "activity_type": "DIV",
//!     "id": "20190801011955195::5f596936-6f23-4cef-bdf1-3806aae57dbf",
//!     "date": "2019-08-01",
//!     "net_amount": "1.02",
//!     "symbol": "T",
//!     "qty": "2",
//!     "per_share_amount": "0.51"
//!   }
//! ]
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::order::OrderSide;

// =============================================================================
// Enumerations
// =============================================================================

/// Activity type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityType {
    /// Order fills (partial and full)
    Fill,
    /// Cash transactions (CSD and CSR)
    Trans,
    /// Miscellaneous or rarely used activity types
    Misc,
    /// ACATS in/out (cash)
    Acatc,
    /// ACATS in/out (securities)
    Acats,
    /// Cash disbursement (+)
    Csd,
    /// Cash receipt (-)
    Csr,
    /// Dividends
    Div,
    /// Dividend (capital gain long term)
    Divcgl,
    /// Dividend (capital gain short term)
    Divcgs,
    /// Dividend fee
    Divfee,
    /// Dividend adjusted (foreign tax withheld)
    Divft,
    /// Dividend adjusted (NRA withheld)
    Divnra,
    /// Dividend return of capital
    Divroc,
    /// Dividend adjusted (Tefra withheld)
    Divtw,
    /// Dividend (tax exempt)
    Divtxex,
    /// Interest (credit/margin)
    Int,
    /// Interest adjusted (NRA withheld)
    Intnra,
    /// Interest adjusted (Tefra withheld)
    Inttw,
    /// Journal entry
    Jnl,
    /// Journal entry (cash)
    Jnlc,
    /// Journal entry (stock)
    Jnls,
    /// Merger/acquisition
    Ma,
    /// Name change
    Nc,
    /// Option assignment
    Opasn,
    /// Option expiration
    Opexp,
    /// Option exercise
    Opxrc,
    /// Pass-through charge
    Ptc,
    /// Pass-through rebate
    Ptr,
    /// Reorg CA
    Reorg,
    /// Symbol change
    Sc,
    /// Stock spinoff
    Sso,
    /// Stock split
    Ssp,
}

impl ActivityType {
    /// Whether this is the order fill code.
    #[must_use]
    pub const fn is_trade(self) -> bool {
        matches!(self, Self::Fill)
    }
}

/// Fill kind of a trade activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeActivityType {
    /// The order was completely filled.
    Fill,
    /// The order was partially filled.
    PartialFill,
}

// =============================================================================
// Raw Activities
// =============================================================================

/// Order fill activity as Alpaca sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTradeActivity {
    /// Always "FILL".
    pub activity_type: String,
    /// Activity ID, usable as a page token.
    pub id: String,
    /// Cumulative filled quantity.
    pub cum_qty: String,
    /// Quantity left to fill.
    pub leaves_qty: String,
    /// Execution price.
    pub price: String,
    /// Executed quantity.
    pub qty: String,
    /// Execution side.
    pub side: String,
    /// Asset symbol.
    pub symbol: String,
    /// Execution timestamp.
    pub transaction_time: String,
    /// Order ID.
    pub order_id: String,
    /// "fill" or "partial_fill".
    #[serde(rename = "type")]
    pub fill_type: String,
}

/// Non-trade activity as Alpaca sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNonTradeActivity {
    /// Activity type code, anything but "FILL".
    pub activity_type: String,
    /// Activity ID, usable as a page token.
    pub id: String,
    /// Activity date.
    pub date: String,
    /// Net cash amount.
    pub net_amount: String,
    /// Asset symbol, absent for pure cash activities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Quantity involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty: Option<String>,
    /// Per-share amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_share_amount: Option<String>,
}

/// Discriminant of order fills.
const FILL: &str = "FILL";

/// One element of the activities list, keyed on `activity_type`.
///
/// `FILL` must carry the fill fields and any other known code the cash
/// fields. Unknown codes are kept as sent and rejected by normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RawActivity {
    /// `FILL` payload.
    Trade(RawTradeActivity),
    /// Payload of a known non-fill code.
    NonTrade(RawNonTradeActivity),
    /// Payload whose code is not a known activity type.
    Unrecognized(Value),
}

impl RawActivity {
    /// The `activity_type` discriminant as sent.
    #[must_use]
    pub fn activity_type(&self) -> &str {
        match self {
            Self::Trade(raw) => &raw.activity_type,
            Self::NonTrade(raw) => &raw.activity_type,
            Self::Unrecognized(value) => value
                .get("activity_type")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        }
    }
}

impl<'de> Deserialize<'de> for RawActivity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let code = value
            .get("activity_type")
            .and_then(Value::as_str)
            .ok_or_else(|| D::Error::missing_field("activity_type"))?;

        if code == FILL {
            return RawTradeActivity::deserialize(value)
                .map(Self::Trade)
                .map_err(D::Error::custom);
        }
        if serde_json::from_value::<ActivityType>(Value::String(code.to_owned())).is_err() {
            return Ok(Self::Unrecognized(value));
        }
        RawNonTradeActivity::deserialize(value)
            .map(Self::NonTrade)
            .map_err(D::Error::custom)
    }
}

// =============================================================================
// Parsed Activities
// =============================================================================

/// Order fill activity.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeActivity {
    /// Always [`ActivityType::Fill`].
    pub activity_type: ActivityType,
    /// Activity ID.
    pub id: String,
    /// Cumulative filled quantity.
    pub cum_qty: f64,
    /// Quantity left to fill.
    pub leaves_qty: f64,
    /// Execution price.
    pub price: f64,
    /// Executed quantity.
    pub qty: f64,
    /// Execution side.
    pub side: OrderSide,
    /// Asset symbol.
    pub symbol: String,
    /// Execution timestamp.
    pub transaction_time: DateTime<Utc>,
    /// Order ID.
    pub order_id: String,
    /// Fill kind.
    pub fill_type: TradeActivityType,
    pub(crate) raw: RawTradeActivity,
}

impl TradeActivity {
    /// The payload this activity was parsed from.
    #[must_use]
    pub const fn raw(&self) -> &RawTradeActivity {
        &self.raw
    }
}

/// Any activity other than an order fill.
#[derive(Debug, Clone, PartialEq)]
pub struct NonTradeActivity {
    /// Activity type code.
    pub activity_type: ActivityType,
    /// Activity ID.
    pub id: String,
    /// Activity date.
    pub date: NaiveDate,
    /// Net cash amount.
    pub net_amount: f64,
    /// Asset symbol.
    pub symbol: Option<String>,
    /// Quantity involved.
    pub qty: Option<f64>,
    /// Per-share amount.
    pub per_share_amount: Option<f64>,
    pub(crate) raw: RawNonTradeActivity,
}

impl NonTradeActivity {
    /// The payload this activity was parsed from.
    #[must_use]
    pub const fn raw(&self) -> &RawNonTradeActivity {
        &self.raw
    }
}

/// A classified account activity.
#[derive(Debug, Clone, PartialEq)]
pub enum Activity {
    /// An order fill.
    Trade(TradeActivity),
    /// Anything else.
    NonTrade(NonTradeActivity),
}

impl Activity {
    /// Activity type code.
    #[must_use]
    pub const fn activity_type(&self) -> ActivityType {
        match self {
            Self::Trade(activity) => activity.activity_type,
            Self::NonTrade(activity) => activity.activity_type,
        }
    }

    /// Activity ID.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Trade(activity) => &activity.id,
            Self::NonTrade(activity) => &activity.id,
        }
    }

    /// The payload this activity was parsed from.
    #[must_use]
    pub fn raw(&self) -> RawActivity {
        match self {
            Self::Trade(activity) => RawActivity::Trade(activity.raw.clone()),
            Self::NonTrade(activity) => RawActivity::NonTrade(activity.raw.clone()),
        }
    }
}
