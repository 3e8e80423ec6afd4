//! Normalization of trading API entities.

use super::{
    NormalizeError, date, enumeration, nullable_number, number, optional_timestamp, timestamp,
};
use crate::domain::entities::{
    Account, Activity, ActivityType, Clock, NonTradeActivity, Order, OrderCancelation, OrderClass,
    Position, RawAccount, RawActivity, RawClock, RawNonTradeActivity, RawOrder,
    RawOrderCancelation, RawPosition, RawTradeActivity, RawTradeUpdate, TradeActivity,
    TradeUpdate,
};

// =============================================================================
// Account / Clock
// =============================================================================

/// Normalize an account.
pub fn account(raw: RawAccount) -> Result<Account, NormalizeError> {
    Ok(Account {
        account_blocked: raw.account_blocked,
        account_number: raw.account_number.clone(),
        buying_power: number("buying_power", &raw.buying_power)?,
        cash: number("cash", &raw.cash)?,
        created_at: timestamp("created_at", &raw.created_at)?,
        currency: raw.currency.clone(),
        daytrade_count: raw.daytrade_count,
        daytrading_buying_power: number("daytrading_buying_power", &raw.daytrading_buying_power)?,
        equity: number("equity", &raw.equity)?,
        id: raw.id.clone(),
        initial_margin: number("initial_margin", &raw.initial_margin)?,
        last_equity: number("last_equity", &raw.last_equity)?,
        last_maintenance_margin: number("last_maintenance_margin", &raw.last_maintenance_margin)?,
        long_market_value: number("long_market_value", &raw.long_market_value)?,
        maintenance_margin: number("maintenance_margin", &raw.maintenance_margin)?,
        multiplier: number("multiplier", &raw.multiplier)?,
        pattern_day_trader: raw.pattern_day_trader,
        portfolio_value: number("portfolio_value", &raw.portfolio_value)?,
        regt_buying_power: number("regt_buying_power", &raw.regt_buying_power)?,
        short_market_value: number("short_market_value", &raw.short_market_value)?,
        shorting_enabled: raw.shorting_enabled,
        sma: number("sma", &raw.sma)?,
        status: enumeration("status", &raw.status)?,
        trade_suspended_by_user: raw.trade_suspended_by_user,
        trading_blocked: raw.trading_blocked,
        transfers_blocked: raw.transfers_blocked,
        raw,
    })
}

/// Normalize the market clock.
pub fn clock(raw: RawClock) -> Result<Clock, NormalizeError> {
    Ok(Clock {
        timestamp: timestamp("timestamp", &raw.timestamp)?,
        is_open: raw.is_open,
        next_open: timestamp("next_open", &raw.next_open)?,
        next_close: timestamp("next_close", &raw.next_close)?,
        raw,
    })
}

// =============================================================================
// Orders
// =============================================================================

/// Normalize an order and, recursively, its legs.
///
/// `null` legs become an empty list. Leg order and nesting are preserved.
pub fn order(raw: RawOrder) -> Result<Order, NormalizeError> {
    let legs = match &raw.legs {
        Some(legs) => legs.iter().cloned().map(order).collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    let order_class = match raw.order_class.as_deref() {
        None | Some("") => None,
        Some(class) => Some(enumeration::<OrderClass>("order_class", class)?),
    };

    Ok(Order {
        id: raw.id.clone(),
        client_order_id: raw.client_order_id.clone(),
        created_at: timestamp("created_at", &raw.created_at)?,
        updated_at: timestamp("updated_at", &raw.updated_at)?,
        submitted_at: optional_timestamp("submitted_at", raw.submitted_at.as_deref())?,
        filled_at: optional_timestamp("filled_at", raw.filled_at.as_deref())?,
        expired_at: optional_timestamp("expired_at", raw.expired_at.as_deref())?,
        canceled_at: optional_timestamp("canceled_at", raw.canceled_at.as_deref())?,
        failed_at: optional_timestamp("failed_at", raw.failed_at.as_deref())?,
        replaced_at: optional_timestamp("replaced_at", raw.replaced_at.as_deref())?,
        replaced_by: raw.replaced_by.clone(),
        replaces: raw.replaces.clone(),
        asset_id: raw.asset_id.clone(),
        symbol: raw.symbol.clone(),
        asset_class: raw.asset_class.clone(),
        qty: nullable_number("qty", raw.qty.as_deref())?,
        notional: nullable_number("notional", raw.notional.as_deref())?,
        filled_qty: number("filled_qty", &raw.filled_qty)?,
        order_type: enumeration("type", &raw.order_type)?,
        side: enumeration("side", &raw.side)?,
        time_in_force: enumeration("time_in_force", &raw.time_in_force)?,
        limit_price: nullable_number("limit_price", raw.limit_price.as_deref())?,
        stop_price: nullable_number("stop_price", raw.stop_price.as_deref())?,
        filled_avg_price: nullable_number("filled_avg_price", raw.filled_avg_price.as_deref())?,
        status: enumeration("status", &raw.status)?,
        extended_hours: raw.extended_hours,
        legs,
        trail_price: nullable_number("trail_price", raw.trail_price.as_deref())?,
        trail_percent: nullable_number("trail_percent", raw.trail_percent.as_deref())?,
        hwm: nullable_number("hwm", raw.hwm.as_deref())?,
        order_class,
        raw,
    })
}

/// Normalize a list of orders, preserving order.
pub fn orders(raw: Vec<RawOrder>) -> Result<Vec<Order>, NormalizeError> {
    raw.into_iter().map(order).collect()
}

/// Normalize one entry of a bulk cancel response.
pub fn order_cancelation(raw: RawOrderCancelation) -> Result<OrderCancelation, NormalizeError> {
    Ok(OrderCancelation {
        id: raw.id.clone(),
        status: raw.status,
        order: order(raw.body.clone())?,
        raw,
    })
}

/// Normalize a bulk cancel response, preserving order.
pub fn order_cancelations(
    raw: Vec<RawOrderCancelation>,
) -> Result<Vec<OrderCancelation>, NormalizeError> {
    raw.into_iter().map(order_cancelation).collect()
}

// =============================================================================
// Positions
// =============================================================================

/// Normalize a position.
pub fn position(raw: RawPosition) -> Result<Position, NormalizeError> {
    Ok(Position {
        asset_id: raw.asset_id.clone(),
        symbol: raw.symbol.clone(),
        exchange: raw.exchange.clone(),
        asset_class: raw.asset_class.clone(),
        avg_entry_price: number("avg_entry_price", &raw.avg_entry_price)?,
        qty: number("qty", &raw.qty)?,
        side: enumeration("side", &raw.side)?,
        market_value: nullable_number("market_value", raw.market_value.as_deref())?,
        cost_basis: number("cost_basis", &raw.cost_basis)?,
        unrealized_pl: nullable_number("unrealized_pl", raw.unrealized_pl.as_deref())?,
        unrealized_plpc: nullable_number("unrealized_plpc", raw.unrealized_plpc.as_deref())?,
        unrealized_intraday_pl: nullable_number(
            "unrealized_intraday_pl",
            raw.unrealized_intraday_pl.as_deref(),
        )?,
        unrealized_intraday_plpc: nullable_number(
            "unrealized_intraday_plpc",
            raw.unrealized_intraday_plpc.as_deref(),
        )?,
        current_price: nullable_number("current_price", raw.current_price.as_deref())?,
        lastday_price: nullable_number("lastday_price", raw.lastday_price.as_deref())?,
        change_today: nullable_number("change_today", raw.change_today.as_deref())?,
        raw,
    })
}

/// Normalize a list of positions, preserving order.
pub fn positions(raw: Vec<RawPosition>) -> Result<Vec<Position>, NormalizeError> {
    raw.into_iter().map(position).collect()
}

// =============================================================================
// Activities
// =============================================================================

fn activity_type(value: &str) -> Result<ActivityType, NormalizeError> {
    enumeration::<ActivityType>("activity_type", value)
        .map_err(|_| NormalizeError::UnknownActivityType(value.to_owned()))
}

/// Normalize an order fill activity.
///
/// The discriminant must be `FILL` and `type` must be `fill` or
/// `partial_fill`.
pub fn trade_activity(raw: RawTradeActivity) -> Result<TradeActivity, NormalizeError> {
    let kind = activity_type(&raw.activity_type)?;
    if !kind.is_trade() {
        return Err(NormalizeError::ActivityShapeMismatch {
            activity_type: raw.activity_type,
            expected: "non-trade",
        });
    }

    Ok(TradeActivity {
        activity_type: kind,
        id: raw.id.clone(),
        cum_qty: number("cum_qty", &raw.cum_qty)?,
        leaves_qty: number("leaves_qty", &raw.leaves_qty)?,
        price: number("price", &raw.price)?,
        qty: number("qty", &raw.qty)?,
        side: enumeration("side", &raw.side)?,
        symbol: raw.symbol.clone(),
        transaction_time: timestamp("transaction_time", &raw.transaction_time)?,
        order_id: raw.order_id.clone(),
        fill_type: enumeration("type", &raw.fill_type)?,
        raw,
    })
}

/// Normalize any activity other than an order fill.
pub fn non_trade_activity(raw: RawNonTradeActivity) -> Result<NonTradeActivity, NormalizeError> {
    let kind = activity_type(&raw.activity_type)?;
    if kind.is_trade() {
        return Err(NormalizeError::ActivityShapeMismatch {
            activity_type: raw.activity_type,
            expected: "trade",
        });
    }

    Ok(NonTradeActivity {
        activity_type: kind,
        id: raw.id.clone(),
        date: date("date", &raw.date)?,
        net_amount: number("net_amount", &raw.net_amount)?,
        symbol: raw.symbol.clone(),
        qty: nullable_number("qty", raw.qty.as_deref())?,
        per_share_amount: nullable_number("per_share_amount", raw.per_share_amount.as_deref())?,
        raw,
    })
}

/// Classify and normalize an activity by its `activity_type`.
///
/// `FILL` yields [`Activity::Trade`], any other known code yields
/// [`Activity::NonTrade`], and an unknown code is an error.
pub fn activity(raw: RawActivity) -> Result<Activity, NormalizeError> {
    match raw {
        RawActivity::Trade(raw) => trade_activity(raw).map(Activity::Trade),
        RawActivity::NonTrade(raw) => non_trade_activity(raw).map(Activity::NonTrade),
        RawActivity::Unrecognized(_) => Err(NormalizeError::UnknownActivityType(
            raw.activity_type().to_owned(),
        )),
    }
}

/// Normalize a list of activities, preserving order.
pub fn activities(raw: Vec<RawActivity>) -> Result<Vec<Activity>, NormalizeError> {
    raw.into_iter().map(activity).collect()
}

// =============================================================================
// Trade Updates
// =============================================================================

/// Normalize a streamed trade update and its embedded order.
pub fn trade_update(raw: RawTradeUpdate) -> Result<TradeUpdate, NormalizeError> {
    Ok(TradeUpdate {
        event: enumeration("event", &raw.event)?,
        execution_id: raw.execution_id.clone(),
        order: order(raw.order.clone())?,
        event_id: raw.event_id.clone(),
        at: optional_timestamp("at", raw.at.as_deref())?,
        timestamp: optional_timestamp("timestamp", raw.timestamp.as_deref())?,
        position_qty: nullable_number("position_qty", raw.position_qty.as_deref())?,
        price: nullable_number("price", raw.price.as_deref())?,
        qty: nullable_number("qty", raw.qty.as_deref())?,
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{OrderStatus, TradeActivityType, TradeUpdateEvent};

    fn raw_order(id: &str) -> RawOrder {
        RawOrder {
            id: id.to_owned(),
            client_order_id: format!("client-{id}"),
            created_at: "2021-03-16T18:38:01.942282Z".to_owned(),
            updated_at: "2021-03-16T18:38:01.942282Z".to_owned(),
            submitted_at: Some("2021-03-16T18:38:01.937734Z".to_owned()),
            filled_at: None,
            expired_at: None,
            canceled_at: None,
            failed_at: None,
            replaced_at: None,
            replaced_by: None,
            replaces: None,
            asset_id: "b0b6dd9d-8b9b-48a9-ba46-b9d54906e415".to_owned(),
            symbol: "AAPL".to_owned(),
            asset_class: "us_equity".to_owned(),
            qty: Some("15".to_owned()),
            notional: None,
            filled_qty: "0".to_owned(),
            order_type: "limit".to_owned(),
            side: "buy".to_owned(),
            time_in_force: "day".to_owned(),
            limit_price: Some("107.00".to_owned()),
            stop_price: None,
            filled_avg_price: None,
            status: "accepted".to_owned(),
            extended_hours: false,
            legs: None,
            trail_price: None,
            trail_percent: None,
            hwm: None,
            order_class: Some(String::new()),
        }
    }

    #[test]
    fn order_nullable_fields_stay_none() {
        let parsed = order(raw_order("1")).unwrap();
        assert_eq!(parsed.filled_avg_price, None);
        assert_eq!(parsed.stop_price, None);
        assert_eq!(parsed.filled_at, None);
        assert_eq!(parsed.order_class, None);
        assert_eq!(parsed.limit_price, Some(107.0));
        assert_eq!(parsed.status, OrderStatus::Accepted);
        assert!(parsed.legs.is_empty());
    }

    #[test]
    fn order_recurses_into_legs() {
        let mut child = raw_order("child");
        child.legs = Some(vec![raw_order("grandchild")]);
        let mut parent = raw_order("parent");
        parent.order_class = Some("bracket".to_owned());
        parent.legs = Some(vec![raw_order("first"), child]);

        let parsed = order(parent.clone()).unwrap();
        assert_eq!(parsed.order_class, Some(OrderClass::Bracket));
        assert!(parsed.is_composite());
        assert_eq!(parsed.legs.len(), 2);
        assert_eq!(parsed.legs[0].id, "first");
        assert_eq!(parsed.legs[1].legs[0].id, "grandchild");
        assert_eq!(parsed.raw(), &parent);
    }

    #[test]
    fn order_rejects_bad_leg() {
        let mut bad = raw_order("bad");
        bad.filled_qty = "lots".to_owned();
        let mut parent = raw_order("parent");
        parent.legs = Some(vec![bad]);

        assert!(matches!(
            order(parent),
            Err(NormalizeError::InvalidNumber { field: "filled_qty", .. })
        ));
    }

    #[test]
    fn order_rejects_unknown_status() {
        let mut raw = raw_order("1");
        raw.status = "vanished".to_owned();
        assert!(matches!(
            order(raw),
            Err(NormalizeError::InvalidEnum { field: "status", .. })
        ));
    }

    #[test]
    fn order_rejects_empty_created_at() {
        let mut raw = raw_order("1");
        raw.created_at = String::new();
        assert!(matches!(
            order(raw),
            Err(NormalizeError::InvalidTimestamp { field: "created_at", .. })
        ));
    }

    fn raw_fill(fill_type: &str) -> RawTradeActivity {
        RawTradeActivity {
            activity_type: "FILL".to_owned(),
            id: "20190524113406977::8efc7b9a".to_owned(),
            cum_qty: "1".to_owned(),
            leaves_qty: "0".to_owned(),
            price: "1.63".to_owned(),
            qty: "1".to_owned(),
            side: "buy".to_owned(),
            symbol: "LPCN".to_owned(),
            transaction_time: "2019-05-24T15:34:06.977Z".to_owned(),
            order_id: "904837e3".to_owned(),
            fill_type: fill_type.to_owned(),
        }
    }

    #[test]
    fn trade_activity_fill_kinds() {
        let fill = trade_activity(raw_fill("fill")).unwrap();
        assert_eq!(fill.fill_type, TradeActivityType::Fill);
        let partial = trade_activity(raw_fill("partial_fill")).unwrap();
        assert_eq!(partial.fill_type, TradeActivityType::PartialFill);
        assert!(trade_activity(raw_fill("bust")).is_err());
    }

    #[test]
    fn trade_activity_requires_fill_discriminant() {
        let mut raw = raw_fill("fill");
        raw.activity_type = "DIV".to_owned();
        assert!(matches!(
            trade_activity(raw),
            Err(NormalizeError::ActivityShapeMismatch { .. })
        ));
    }

    #[test]
    fn non_trade_activity_parses_optional_amounts() {
        let raw = RawNonTradeActivity {
            activity_type: "CSD".to_owned(),
            id: "20190801011955195::5f596936".to_owned(),
            date: "2019-08-01".to_owned(),
            net_amount: "1000".to_owned(),
            symbol: None,
            qty: None,
            per_share_amount: None,
        };
        let parsed = non_trade_activity(raw.clone()).unwrap();
        assert_eq!(parsed.activity_type, ActivityType::Csd);
        assert_eq!(parsed.qty, None);
        assert_eq!(parsed.raw(), &raw);
    }

    #[test]
    fn unknown_activity_type_is_an_error() {
        let raw = RawActivity::NonTrade(RawNonTradeActivity {
            activity_type: "LOTTERY".to_owned(),
            id: "1".to_owned(),
            date: "2019-08-01".to_owned(),
            net_amount: "1".to_owned(),
            symbol: None,
            qty: None,
            per_share_amount: None,
        });
        assert_eq!(
            activity(raw).unwrap_err(),
            NormalizeError::UnknownActivityType("LOTTERY".to_owned())
        );
    }

    #[test]
    fn trade_update_embeds_normalized_order() {
        let raw = RawTradeUpdate {
            event: "fill".to_owned(),
            execution_id: Some("2f63ea93".to_owned()),
            order: raw_order("1"),
            event_id: None,
            at: None,
            timestamp: Some("2021-05-25T13:44:04.521Z".to_owned()),
            position_qty: Some("100".to_owned()),
            price: Some("209.71".to_owned()),
            qty: Some("100".to_owned()),
        };
        let parsed = trade_update(raw.clone()).unwrap();
        assert_eq!(parsed.event, TradeUpdateEvent::Fill);
        assert!(parsed.event.is_execution());
        assert_eq!(parsed.symbol(), "AAPL");
        assert_eq!(parsed.price, Some(209.71));
        assert_eq!(parsed.at, None);
        assert_eq!(parsed.raw(), &raw);
    }
}
