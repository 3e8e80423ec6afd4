//! Raw-to-parsed normalization.
//!
//! Pure functions turning each raw wire entity into its parsed form. Every
//! parsed entity keeps the raw value it was built from, so `parsed.raw()`
//! equals the input.
//!
//! # Field rules
//!
//! | Field kind | `null` / absent | `""` | malformed |
//! |---|---|---|---|
//! | required decimal | n/a | error | [`NormalizeError::InvalidNumber`] |
//! | nullable decimal | `None` | `None` | [`NormalizeError::InvalidNumber`] |
//! | required timestamp | n/a | error | [`NormalizeError::InvalidTimestamp`] |
//! | lifecycle timestamp | `None` | `None` | [`NormalizeError::InvalidTimestamp`] |
//! | enumeration | n/a | error | [`NormalizeError::InvalidEnum`] |
//!
//! Nothing ever falls back to `0.0`, `NaN`, "now" or the epoch.

mod market_data;
mod trading;

pub use market_data::{
    bar, bars, latest_trade, page_of_bars, page_of_quotes, page_of_trades, quote, quotes,
    snapshot, snapshots, trade, trades,
};
pub use trading::{
    account, activities, activity, clock, non_trade_activity, order, order_cancelation,
    order_cancelations, orders, position, positions, trade_activity, trade_update,
};

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{DeserializeOwned, IntoDeserializer};
use thiserror::Error;

/// Errors raised while normalizing a raw entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// A decimal string could not be parsed.
    #[error("invalid number in {field}: {value:?}")]
    InvalidNumber {
        /// Wire field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// A timestamp or date string could not be parsed.
    #[error("invalid timestamp in {field}: {value:?}")]
    InvalidTimestamp {
        /// Wire field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// An enumeration value is not one of the known variants.
    #[error("invalid value in {field}: {value:?}")]
    InvalidEnum {
        /// Wire field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// A field required for this entity is missing.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The `activity_type` discriminant is not a known activity code.
    #[error("unknown activity type: {0:?}")]
    UnknownActivityType(String),

    /// The payload shape does not match its `activity_type`.
    #[error("activity {activity_type:?} does not have the {expected} shape")]
    ActivityShapeMismatch {
        /// Discriminant as sent.
        activity_type: String,
        /// Shape the discriminant requires.
        expected: &'static str,
    },
}

// =============================================================================
// Field Parsers
// =============================================================================

pub(crate) fn number(field: &'static str, value: &str) -> Result<f64, NormalizeError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
        .ok_or_else(|| NormalizeError::InvalidNumber {
            field,
            value: value.to_owned(),
        })
}

pub(crate) fn nullable_number(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<f64>, NormalizeError> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => number(field, v).map(Some),
    }
}

pub(crate) fn timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, NormalizeError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| NormalizeError::InvalidTimestamp {
            field,
            value: value.to_owned(),
        })
}

pub(crate) fn optional_timestamp(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, NormalizeError> {
    match value {
        None => Ok(None),
        Some("") => Ok(None),
        Some(v) => timestamp(field, v).map(Some),
    }
}

pub(crate) fn date(field: &'static str, value: &str) -> Result<NaiveDate, NormalizeError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| NormalizeError::InvalidTimestamp {
        field,
        value: value.to_owned(),
    })
}

/// Parse a wire string into a closed enumeration using its serde names.
pub(crate) fn enumeration<T: DeserializeOwned>(
    field: &'static str,
    value: &str,
) -> Result<T, NormalizeError> {
    let deserializer: serde::de::value::StrDeserializer<'_, serde::de::value::Error> =
        value.into_deserializer();
    T::deserialize(deserializer).map_err(|_| NormalizeError::InvalidEnum {
        field,
        value: value.to_owned(),
    })
}
