//! Position entity.
//!
//! Valuation fields (`market_value`, `unrealized_*`, `current_price`,
//! `lastday_price`, `change_today`) are `null` when Alpaca has no current
//! price for the asset. They stay `None` after parsing.

use serde::{Deserialize, Serialize};

/// Position side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    /// Long position
    Long,
    /// Short position
    Short,
}

/// Position as Alpaca sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPosition {
    /// Asset ID.
    pub asset_id: String,
    /// Asset symbol.
    pub symbol: String,
    /// Exchange the asset trades on.
    pub exchange: String,
    /// Asset class.
    pub asset_class: String,
    /// Average entry price.
    pub avg_entry_price: String,
    /// Quantity held.
    pub qty: String,
    /// Position side.
    pub side: String,
    /// Total market value.
    #[serde(default)]
    pub market_value: Option<String>,
    /// Total cost basis.
    pub cost_basis: String,
    /// Unrealized profit/loss.
    #[serde(default)]
    pub unrealized_pl: Option<String>,
    /// Unrealized profit/loss percent.
    #[serde(default)]
    pub unrealized_plpc: Option<String>,
    /// Unrealized profit/loss for the day.
    #[serde(default)]
    pub unrealized_intraday_pl: Option<String>,
    /// Unrealized profit/loss percent for the day.
    #[serde(default)]
    pub unrealized_intraday_plpc: Option<String>,
    /// Current asset price.
    #[serde(default)]
    pub current_price: Option<String>,
    /// Last day's closing price.
    #[serde(default)]
    pub lastday_price: Option<String>,
    /// Percent change from last day's close.
    #[serde(default)]
    pub change_today: Option<String>,
}

/// Position with parsed numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    /// Asset ID.
    pub asset_id: String,
    /// Asset symbol.
    pub symbol: String,
    /// Exchange the asset trades on.
    pub exchange: String,
    /// Asset class.
    pub asset_class: String,
    /// Average entry price.
    pub avg_entry_price: f64,
    /// Quantity held.
    pub qty: f64,
    /// Position side.
    pub side: PositionSide,
    /// Total market value.
    pub market_value: Option<f64>,
    /// Total cost basis.
    pub cost_basis: f64,
    /// Unrealized profit/loss.
    pub unrealized_pl: Option<f64>,
    /// Unrealized profit/loss percent.
    pub unrealized_plpc: Option<f64>,
    /// Unrealized profit/loss for the day.
    pub unrealized_intraday_pl: Option<f64>,
    /// Unrealized profit/loss percent for the day.
    pub unrealized_intraday_plpc: Option<f64>,
    /// Current asset price.
    pub current_price: Option<f64>,
    /// Last day's closing price.
    pub lastday_price: Option<f64>,
    /// Percent change from last day's close.
    pub change_today: Option<f64>,
    pub(crate) raw: RawPosition,
}

impl Position {
    /// The payload this position was parsed from.
    #[must_use]
    pub const fn raw(&self) -> &RawPosition {
        &self.raw
    }
}
