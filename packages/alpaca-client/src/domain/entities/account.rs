//! Account entity.
//!
//! `GET /v2/account` returns every balance as a decimal string. The parsed
//! [`Account`] exposes them as `f64` and keeps the payload it came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account as Alpaca sends it.
///
/// # Wire Format (JSON)
/// ```json
/// {
///   "id": "904837e3-3b76-47ec-b432-046db621571b",
///   "account_number": "010203ABCD",
///   "status": "ACTIVE",
///   "currency": "USD",
///   "cash": "4000.32",
///   "buying_power": "262113.632",
///   "created_at": "2019-06-12T22:47:07.99658Z",
///   "daytrade_count": 0,
///   "...": "..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAccount {
    /// If true, account activity by the user is prohibited.
    pub account_blocked: bool,
    /// Account number.
    pub account_number: String,
    /// Current available buying power.
    pub buying_power: String,
    /// Cash balance.
    pub cash: String,
    /// Account creation timestamp.
    pub created_at: String,
    /// Account currency, e.g. "USD".
    pub currency: String,
    /// Day trades made in the last 5 trading days.
    pub daytrade_count: i64,
    /// Buying power for day trades.
    pub daytrading_buying_power: String,
    /// Cash + long market value + short market value.
    pub equity: String,
    /// Account ID.
    pub id: String,
    /// Reg T initial margin requirement.
    pub initial_margin: String,
    /// Equity as of previous trading day at 16:00 ET.
    pub last_equity: String,
    /// Maintenance margin requirement on the previous trading day.
    pub last_maintenance_margin: String,
    /// Mark-to-market value of all long positions.
    pub long_market_value: String,
    /// Maintenance margin requirement.
    pub maintenance_margin: String,
    /// Buying power multiplier (1, 2 or 4).
    pub multiplier: String,
    /// Whether the account is flagged as a pattern day trader.
    pub pattern_day_trader: bool,
    /// Deprecated alias of equity.
    pub portfolio_value: String,
    /// Buying power under Regulation T.
    pub regt_buying_power: String,
    /// Mark-to-market value of all short positions.
    pub short_market_value: String,
    /// Whether the account may short.
    pub shorting_enabled: bool,
    /// Special memorandum account value.
    pub sma: String,
    /// Account status, e.g. "ACTIVE".
    pub status: String,
    /// User setting: orders are blocked.
    pub trade_suspended_by_user: bool,
    /// Orders are blocked.
    pub trading_blocked: bool,
    /// Money transfers are blocked.
    pub transfers_blocked: bool,
}

/// Account status lifecycle values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// The account is onboarding.
    Onboarding,
    /// The account application submission failed.
    SubmissionFailed,
    /// The account application has been submitted for review.
    Submitted,
    /// Personal information is being updated.
    AccountUpdated,
    /// Final approval is pending.
    ApprovalPending,
    /// Active for trading.
    Active,
    /// The account application has been rejected.
    Rejected,
}

/// Account with numeric and temporal fields parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// If true, account activity by the user is prohibited.
    pub account_blocked: bool,
    /// Account number.
    pub account_number: String,
    /// Current available buying power.
    pub buying_power: f64,
    /// Cash balance.
    pub cash: f64,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Account currency.
    pub currency: String,
    /// Day trades made in the last 5 trading days.
    pub daytrade_count: i64,
    /// Buying power for day trades.
    pub daytrading_buying_power: f64,
    /// Cash + long market value + short market value.
    pub equity: f64,
    /// Account ID.
    pub id: String,
    /// Reg T initial margin requirement.
    pub initial_margin: f64,
    /// Equity as of previous trading day at 16:00 ET.
    pub last_equity: f64,
    /// Maintenance margin requirement on the previous trading day.
    pub last_maintenance_margin: f64,
    /// Mark-to-market value of all long positions.
    pub long_market_value: f64,
    /// Maintenance margin requirement.
    pub maintenance_margin: f64,
    /// Buying power multiplier.
    pub multiplier: f64,
    /// Whether the account is flagged as a pattern day trader.
    pub pattern_day_trader: bool,
    /// Deprecated alias of equity.
    pub portfolio_value: f64,
    /// Buying power under Regulation T.
    pub regt_buying_power: f64,
    /// Mark-to-market value of all short positions.
    pub short_market_value: f64,
    /// Whether the account may short.
    pub shorting_enabled: bool,
    /// Special memorandum account value.
    pub sma: f64,
    /// Account status.
    pub status: AccountStatus,
    /// User setting: orders are blocked.
    pub trade_suspended_by_user: bool,
    /// Orders are blocked.
    pub trading_blocked: bool,
    /// Money transfers are blocked.
    pub transfers_blocked: bool,
    pub(crate) raw: RawAccount,
}

impl Account {
    /// The payload this account was parsed from, exactly as received.
    #[must_use]
    pub const fn raw(&self) -> &RawAccount {
        &self.raw
    }

    /// Consume the account, returning the original payload.
    #[must_use]
    pub fn into_raw(self) -> RawAccount {
        self.raw
    }
}
