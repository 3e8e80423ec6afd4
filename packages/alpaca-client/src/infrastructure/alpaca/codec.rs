//! Stream Codec
//!
//! JSON decoding for both Alpaca stream kinds.
//!
//! - **Market data** frames are JSON arrays whose elements carry a `T`
//!   discriminator.
//! - **Account** frames are single JSON objects carrying a `stream`
//!   discriminator and a `data` payload.
//!
//! A single text frame may hold several messages; each is decoded on its
//! own so one malformed element does not hide the others.
//!
//! # Wire Format (JSON)
//! ```json
//! [{"T":"success","msg":"authenticated"},{"T":"t","S":"AAPL","p":187.5,...}]
//! {"stream":"trade_updates","data":{"event":"fill","order":{...}}}
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::messages::{
    AuthorizationData, ErrorMessage, InboundMessage, ListeningData, SubscriptionMessage,
    SuccessMessage,
};

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON encoding/decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid message format.
    #[error("invalid message format: {0}")]
    InvalidFormat(String),
}

/// Decode one text frame into its messages.
///
/// Returns one result per message so the caller can report a bad element
/// and still dispatch the good ones.
///
/// # Errors
///
/// Returns an error if the frame itself is not a JSON array or object.
pub fn decode(text: &str) -> Result<Vec<Result<InboundMessage, CodecError>>, CodecError> {
    let trimmed = text.trim();

    if !(trimmed.starts_with('[') || trimmed.starts_with('{')) {
        let preview: String = trimmed.chars().take(50).collect();
        return Err(CodecError::InvalidFormat(format!(
            "expected JSON array or object, got: {preview}..."
        )));
    }

    match serde_json::from_str::<Value>(trimmed)? {
        Value::Array(values) => Ok(values.into_iter().map(decode_value).collect()),
        value @ Value::Object(_) => Ok(vec![decode_value(value)]),
        _ => Err(CodecError::InvalidFormat(
            "expected JSON array or object".to_string(),
        )),
    }
}

/// Decode a single message value.
///
/// # Errors
///
/// Returns an error if the value does not match the shape its
/// discriminator announces.
pub fn decode_value(value: Value) -> Result<InboundMessage, CodecError> {
    if let Some(kind) = value.get("T").and_then(Value::as_str) {
        return match kind {
            "success" => Ok(InboundMessage::Success(from_value::<SuccessMessage>(value)?)),
            "error" => Ok(InboundMessage::Error(from_value::<ErrorMessage>(value)?)),
            "subscription" => Ok(InboundMessage::Subscription(
                from_value::<SubscriptionMessage>(value)?,
            )),
            "t" => Ok(InboundMessage::Trade(from_value(value)?)),
            "q" => Ok(InboundMessage::Quote(from_value(value)?)),
            "b" => Ok(InboundMessage::Bar(from_value(value)?)),
            other => Ok(InboundMessage::Other(other.to_string())),
        };
    }

    if let Some(stream) = value.get("stream").and_then(Value::as_str) {
        let stream = stream.to_string();
        let data = match value {
            Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
            _ => Value::Null,
        };

        return match stream.as_str() {
            "authorization" => Ok(InboundMessage::Authorization(from_value::<
                AuthorizationData,
            >(data)?)),
            "listening" => Ok(InboundMessage::Listening(from_value::<ListeningData>(
                data,
            )?)),
            "trade_updates" => Ok(InboundMessage::TradeUpdate(Box::new(from_value(data)?))),
            _ => Ok(InboundMessage::Other(stream)),
        };
    }

    Err(CodecError::InvalidFormat(
        "message has neither a `T` nor a `stream` field".to_string(),
    ))
}

/// Encode an outbound message.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn encode<T: Serialize>(value: &T) -> Result<String, CodecError> {
    Ok(serde_json::to_string(value)?)
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, CodecError> {
    Ok(serde_json::from_value(value)?)
}
