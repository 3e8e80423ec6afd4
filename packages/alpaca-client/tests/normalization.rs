//! Normalization Integration Tests
//!
//! Wire JSON in, parsed entities out: nullable numbers, raw preservation,
//! order and leg preservation, activity classification and page tokens.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use proptest::prelude::*;
use serde_json::json;

use alpaca_client::domain::normalize;
use alpaca_client::{
    Activity, ActivityType, NormalizeError, OrderStatus, RawActivity, RawOrder, RawPageOfBars,
    RawPageOfTrades, RawPosition, TradeActivityType,
};

fn order_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "client_order_id": format!("client-{id}"),
        "created_at": "2021-03-16T18:38:01.942282Z",
        "updated_at": "2021-03-16T18:38:01.942282Z",
        "submitted_at": "2021-03-16T18:38:01.937734Z",
        "filled_at": null,
        "expired_at": null,
        "canceled_at": null,
        "failed_at": null,
        "replaced_at": null,
        "replaced_by": null,
        "replaces": null,
        "asset_id": "b0b6dd9d-8b9b-48a9-ba46-b9d54906e415",
        "symbol": "AAPL",
        "asset_class": "us_equity",
        "notional": null,
        "qty": "10",
        "filled_qty": "0",
        "filled_avg_price": null,
        "order_class": "",
        "type": "limit",
        "side": "buy",
        "time_in_force": "gtc",
        "limit_price": "180.25",
        "stop_price": null,
        "status": "new",
        "extended_hours": false,
        "legs": null,
        "trail_percent": null,
        "trail_price": null,
        "hwm": null
    })
}

fn raw_order(id: &str) -> RawOrder {
    serde_json::from_value(order_json(id)).unwrap()
}

// =============================================================================
// Nullable numbers and raw preservation
// =============================================================================

#[test]
fn null_numeric_strings_become_none() {
    let parsed = normalize::order(raw_order("a")).unwrap();

    assert_eq!(parsed.filled_avg_price, None);
    assert_eq!(parsed.stop_price, None);
    assert_eq!(parsed.notional, None);
    assert_eq!(parsed.limit_price, Some(180.25));
    assert_eq!(parsed.status, OrderStatus::New);
}

#[test]
fn parsed_entities_keep_their_raw_payload() {
    let raw = raw_order("keep");
    let parsed = normalize::order(raw.clone()).unwrap();
    assert_eq!(parsed.raw(), &raw);

    let position: RawPosition = serde_json::from_value(json!({
        "asset_id": "904837e3-3b76-47ec-b432-046db621571b",
        "symbol": "AAPL",
        "exchange": "NASDAQ",
        "asset_class": "us_equity",
        "avg_entry_price": "100.0",
        "qty": "5",
        "qty_available": "5",
        "side": "long",
        "market_value": "600.0",
        "cost_basis": "500.0",
        "unrealized_pl": "100.0",
        "unrealized_plpc": "0.20",
        "unrealized_intraday_pl": "10.0",
        "unrealized_intraday_plpc": "0.0084",
        "current_price": "120.0",
        "lastday_price": "119.0",
        "change_today": "0.0084"
    }))
    .unwrap();
    let parsed = normalize::position(position.clone()).unwrap();
    assert_eq!(parsed.raw(), &position);
    assert_eq!(parsed.qty, 5.0);
}

#[test]
fn malformed_decimal_is_an_error_not_zero() {
    let mut raw = raw_order("bad");
    raw.filled_qty = "abc".to_owned();

    assert!(matches!(
        normalize::order(raw),
        Err(NormalizeError::InvalidNumber { field: "filled_qty", .. })
    ));
}

// =============================================================================
// Plural conversions
// =============================================================================

#[test]
fn legs_keep_length_and_nesting() {
    let mut child = order_json("child");
    child["legs"] = json!([order_json("grandchild")]);
    let mut parent = order_json("parent");
    parent["order_class"] = json!("bracket");
    parent["legs"] = json!([order_json("first"), child]);

    let parsed = normalize::order(serde_json::from_value(parent).unwrap()).unwrap();

    let leg_ids: Vec<&str> = parsed.legs.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(leg_ids, vec!["first", "child"]);
    assert_eq!(parsed.legs[1].legs.len(), 1);
    assert_eq!(parsed.legs[1].legs[0].id, "grandchild");
    assert!(parsed.legs[0].legs.is_empty());
}

proptest! {
    #[test]
    fn orders_preserve_count_and_order(ids in prop::collection::vec("[a-z0-9]{1,12}", 0..40)) {
        let raw: Vec<RawOrder> = ids.iter().map(|id| raw_order(id)).collect();
        let parsed = normalize::orders(raw).unwrap();

        prop_assert_eq!(parsed.len(), ids.len());
        for (order, id) in parsed.iter().zip(&ids) {
            prop_assert_eq!(&order.id, id);
        }
    }

    #[test]
    fn trade_pages_preserve_order(prices in prop::collection::vec(1.0f64..10_000.0, 0..50)) {
        let trades: Vec<serde_json::Value> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| json!({"t": "2024-01-02T15:30:00Z", "x": "V", "p": p, "s": 1, "i": i, "z": "C"}))
            .collect();
        let raw: RawPageOfTrades = serde_json::from_value(json!({
            "symbol": "AAPL",
            "trades": trades,
            "next_page_token": null
        }))
        .unwrap();

        let page = normalize::page_of_trades(raw).unwrap();
        prop_assert_eq!(page.items.len(), prices.len());
        for (trade, price) in page.items.iter().zip(&prices) {
            prop_assert_eq!(trade.price, *price);
            prop_assert_eq!(trade.symbol.as_str(), "AAPL");
        }
    }
}

// =============================================================================
// Activities
// =============================================================================

fn fill_json(fill_type: &str) -> serde_json::Value {
    json!({
        "activity_type": "FILL",
        "id": "20240102093000000::8e4e",
        "cum_qty": "10",
        "leaves_qty": "0",
        "price": "187.50",
        "qty": "10",
        "side": "buy",
        "symbol": "AAPL",
        "transaction_time": "2024-01-02T14:30:00.123Z",
        "order_id": "904837e3-3b76-47ec-b432-046db621571b",
        "type": fill_type
    })
}

#[test]
fn fill_becomes_trade_activity() {
    for (wire, expected) in [
        ("fill", TradeActivityType::Fill),
        ("partial_fill", TradeActivityType::PartialFill),
    ] {
        let raw: RawActivity = serde_json::from_value(fill_json(wire)).unwrap();
        let Activity::Trade(activity) = normalize::activity(raw).unwrap() else {
            panic!("expected a trade activity");
        };
        assert_eq!(activity.fill_type, expected);
        assert_eq!(activity.activity_type, ActivityType::Fill);
    }
}

#[test]
fn known_non_fill_becomes_non_trade_activity() {
    let raw: RawActivity = serde_json::from_value(json!({
        "activity_type": "DIV",
        "id": "20240102000000000::1",
        "date": "2024-01-02",
        "net_amount": "12.34",
        "symbol": "AAPL",
        "qty": "50",
        "per_share_amount": "0.24"
    }))
    .unwrap();

    let Activity::NonTrade(activity) = normalize::activity(raw.clone()).unwrap() else {
        panic!("expected a non-trade activity");
    };
    assert_eq!(activity.activity_type, ActivityType::Div);
    assert_eq!(activity.net_amount, 12.34);
    assert_eq!(Activity::NonTrade(activity).raw(), raw);
}

#[test]
fn unknown_activity_type_is_rejected() {
    let raw: RawActivity = serde_json::from_value(json!({
        "activity_type": "NOPE",
        "id": "1",
        "date": "2024-01-02",
        "net_amount": "1"
    }))
    .unwrap();

    assert_eq!(
        normalize::activity(raw),
        Err(NormalizeError::UnknownActivityType("NOPE".to_owned()))
    );
}

#[test]
fn unknown_activity_type_wins_over_missing_fields() {
    let raw: RawActivity =
        serde_json::from_value(json!({"activity_type": "FEE", "id": "1"})).unwrap();

    assert_eq!(
        normalize::activity(raw),
        Err(NormalizeError::UnknownActivityType("FEE".to_owned()))
    );
}

#[test]
fn fill_in_cash_shape_is_a_malformed_fill() {
    let result = serde_json::from_value::<RawActivity>(json!({
        "activity_type": "FILL",
        "id": "20240102000000000::2",
        "date": "2024-01-02",
        "net_amount": "12.34"
    }));

    let err = result.unwrap_err().to_string();
    assert!(err.contains("missing field"), "{err}");
}

#[test]
fn fill_with_unknown_fill_type_is_rejected() {
    let raw: RawActivity = serde_json::from_value(fill_json("overfill")).unwrap();
    assert!(normalize::activity(raw).is_err());
}

// =============================================================================
// Page tokens
// =============================================================================

#[test]
fn page_token_is_none_iff_null_or_empty() {
    for (token, expected) in [
        (json!(null), None),
        (json!(""), None),
        (json!("QUFQTHwyMDI0"), Some("QUFQTHwyMDI0")),
    ] {
        let raw: RawPageOfBars = serde_json::from_value(json!({
            "symbol": "SPY",
            "bars": null,
            "next_page_token": token
        }))
        .unwrap();

        let page = normalize::page_of_bars(raw).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next_page_token.as_deref(), expected);
        assert_eq!(page.has_next(), expected.is_some());
    }
}
