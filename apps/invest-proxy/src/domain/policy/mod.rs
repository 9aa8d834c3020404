//! Order Policy Gate
//!
//! Order placement, cancellation and listing are switched off unless the
//! operator enables them at startup. While disabled the proxy answers those
//! actions itself with HTTP 200 and a body shaped like an upstream response,
//! so the consumer keeps working without ever reaching the brokerage.

use serde_json::{Value, json};

use super::action::Action;

/// Message placed in the canned error for refused order operations.
pub const ORDERS_DISABLED_MESSAGE: &str =
    "Order operations are disabled on this proxy (ORDERS_ALLOW=false)";

/// Error code placed in the canned error for refused order operations.
pub const ORDERS_DISABLED_CODE: &str = "OrderNotAvailable";

/// Outcome of the gate for one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Continue to validation and forwarding.
    Forward,
    /// Answer with this body and do not contact upstream.
    Refuse(Value),
}

/// Static order feature gate, fixed for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderPolicy {
    orders_allowed: bool,
}

impl OrderPolicy {
    /// Create a gate.
    #[must_use]
    pub const fn new(orders_allowed: bool) -> Self {
        Self { orders_allowed }
    }

    /// Whether order actions are forwarded.
    #[must_use]
    pub const fn orders_allowed(&self) -> bool {
        self.orders_allowed
    }

    /// Decide whether `action` may proceed.
    #[must_use]
    pub fn check(&self, action: Action) -> GateDecision {
        if self.orders_allowed || !action.is_order_action() {
            return GateDecision::Forward;
        }

        match action {
            Action::ListOrders => GateDecision::Refuse(empty_orders_body()),
            _ => GateDecision::Refuse(orders_disabled_body()),
        }
    }
}

/// Canned error for placement and cancellation.
#[must_use]
pub fn orders_disabled_body() -> Value {
    json!({
        "trackingId": -1,
        "payload": {
            "message": ORDERS_DISABLED_MESSAGE,
            "code": ORDERS_DISABLED_CODE,
        },
        "status": "Error",
    })
}

/// Canned empty listing for `GET /orders`.
#[must_use]
pub fn empty_orders_body() -> Value {
    json!({
        "trackingId": -1,
        "payload": [],
        "status": "Ok",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::action::ROUTES;
    use test_case::test_case;

    #[test]
    fn disabled_gate_passes_read_only_actions() {
        let policy = OrderPolicy::new(false);
        for &(_, _, action) in ROUTES {
            if !action.is_order_action() {
                assert_eq!(policy.check(action), GateDecision::Forward, "{action}");
            }
        }
    }

    #[test]
    fn enabled_gate_passes_everything() {
        let policy = OrderPolicy::new(true);
        for &(_, _, action) in ROUTES {
            assert_eq!(policy.check(action), GateDecision::Forward, "{action}");
        }
    }

    #[test_case(Action::LimitOrder ; "limit order")]
    #[test_case(Action::MarketOrder ; "market order")]
    #[test_case(Action::CancelOrder ; "cancel")]
    fn disabled_gate_refuses_order_changes(action: Action) {
        let GateDecision::Refuse(body) = OrderPolicy::new(false).check(action) else {
            panic!("expected refusal for {action}");
        };
        assert_eq!(body["trackingId"], -1);
        assert_eq!(body["status"], "Error");
        assert_eq!(body["payload"]["code"], "OrderNotAvailable");
        assert_eq!(body["payload"]["message"], ORDERS_DISABLED_MESSAGE);
    }

    #[test]
    fn disabled_gate_answers_listing_with_empty_success() {
        let decision = OrderPolicy::new(false).check(Action::ListOrders);
        assert_eq!(
            decision,
            GateDecision::Refuse(json!({"trackingId": -1, "payload": [], "status": "Ok"}))
        );
    }

    #[test]
    fn canned_error_keeps_field_order() {
        let text = serde_json::to_string(&orders_disabled_body()).unwrap();
        assert!(text.starts_with(r#"{"trackingId":-1,"payload":{"message":"#));
        assert!(text.ends_with(r#""code":"OrderNotAvailable"},"status":"Error"}"#));
    }

    #[test]
    fn default_policy_is_disabled() {
        assert!(!OrderPolicy::default().orders_allowed());
    }
}
