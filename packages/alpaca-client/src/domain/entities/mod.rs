//! Brokerage entities.
//!
//! Every entity comes in two shapes:
//!
//! - a **raw** struct mirroring the wire JSON exactly (decimals and
//!   timestamps as strings, enumerations as strings), which serializes back
//!   to the same JSON;
//! - a **parsed** struct with numbers, `DateTime<Utc>` timestamps and closed
//!   enumerations, which keeps its raw payload behind `raw()`.
//!
//! Parsed entities are built only by [`crate::domain::normalize`].

mod account;
mod activity;
mod clock;
mod market_data;
mod order;
mod position;
mod trade_update;

pub use account::{Account, AccountStatus, RawAccount};
pub use activity::{
    Activity, ActivityType, NonTradeActivity, RawActivity, RawNonTradeActivity,
    RawTradeActivity, TradeActivity, TradeActivityType,
};
pub use clock::{Clock, RawClock};
pub use market_data::{
    Bar, DataSource, LatestTrade, Page, PageOfBars, PageOfQuotes, PageOfTrades, Quote, RawBar,
    RawLatestTrade, RawPageOfBars, RawPageOfQuotes, RawPageOfTrades, RawQuote, RawSnapshot,
    RawTrade, Snapshot, Trade,
};
pub use order::{
    Order, OrderCancelation, OrderClass, OrderSide, OrderStatus, OrderType, RawOrder,
    RawOrderCancelation, TimeInForce,
};
pub use position::{Position, PositionSide, RawPosition};
pub use trade_update::{RawTradeUpdate, TradeUpdate, TradeUpdateEvent};
