//! Supported Actions
//!
//! The consumer selects an operation with the `action` query parameter and
//! the HTTP method. Only the combinations listed in [`ROUTES`] are served;
//! everything else is answered with 404.
//!
//! | Method | Action                  | Gated |
//! |--------|-------------------------|-------|
//! | GET    | `/user/accounts`        |       |
//! | GET    | `/portfolio/currencies` |       |
//! | GET    | `/portfolio`            |       |
//! | GET    | `/market/orderbook`     |       |
//! | POST   | `/orders/limit-order`   | yes   |
//! | POST   | `/orders/market-order`  | yes   |
//! | POST   | `/orders/cancel`        | yes   |
//! | GET    | `/orders`               | yes   |
//! | GET    | `/operations`           |       |
//! | GET    | `/portfolio_summary`    |       |

use std::fmt;

/// HTTP methods accepted from the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl HttpMethod {
    /// Parse an inbound method name. Matching is exact, as sent on the wire.
    #[must_use]
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            _ => None,
        }
    }

    /// Wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A logical operation exposed to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// List brokerage accounts.
    UserAccounts,
    /// Currency balances of one account.
    PortfolioCurrencies,
    /// Securities held by one account.
    Portfolio,
    /// Order book snapshot for an instrument.
    Orderbook,
    /// Place a limit order.
    LimitOrder,
    /// Place a market order.
    MarketOrder,
    /// Cancel an active order.
    CancelOrder,
    /// List active orders.
    ListOrders,
    /// Operations of one account over a period.
    Operations,
    /// Currencies and portfolio of one account in a single response.
    PortfolioSummary,
}

/// Routing table: `(method, action) -> Action`.
pub const ROUTES: &[(HttpMethod, &str, Action)] = &[
    (HttpMethod::Get, "/user/accounts", Action::UserAccounts),
    (
        HttpMethod::Get,
        "/portfolio/currencies",
        Action::PortfolioCurrencies,
    ),
    (HttpMethod::Get, "/portfolio", Action::Portfolio),
    (HttpMethod::Get, "/market/orderbook", Action::Orderbook),
    (HttpMethod::Post, "/orders/limit-order", Action::LimitOrder),
    (HttpMethod::Post, "/orders/market-order", Action::MarketOrder),
    (HttpMethod::Post, "/orders/cancel", Action::CancelOrder),
    (HttpMethod::Get, "/orders", Action::ListOrders),
    (HttpMethod::Get, "/operations", Action::Operations),
    (HttpMethod::Get, "/portfolio_summary", Action::PortfolioSummary),
];

impl Action {
    /// Resolve a `(method, action)` pair. The action string must match exactly.
    #[must_use]
    pub fn resolve(method: HttpMethod, action: &str) -> Option<Self> {
        ROUTES
            .iter()
            .find(|(m, path, _)| *m == method && *path == action)
            .map(|&(_, _, resolved)| resolved)
    }

    /// The action path, which is also the upstream path for forwarded actions.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::UserAccounts => "/user/accounts",
            Self::PortfolioCurrencies => "/portfolio/currencies",
            Self::Portfolio => "/portfolio",
            Self::Orderbook => "/market/orderbook",
            Self::LimitOrder => "/orders/limit-order",
            Self::MarketOrder => "/orders/market-order",
            Self::CancelOrder => "/orders/cancel",
            Self::ListOrders => "/orders",
            Self::Operations => "/operations",
            Self::PortfolioSummary => "/portfolio_summary",
        }
    }

    /// Method the action is served on.
    #[must_use]
    pub const fn method(self) -> HttpMethod {
        match self {
            Self::LimitOrder | Self::MarketOrder | Self::CancelOrder => HttpMethod::Post,
            _ => HttpMethod::Get,
        }
    }

    /// Whether the order policy gate applies.
    #[must_use]
    pub const fn is_order_action(self) -> bool {
        matches!(
            self,
            Self::LimitOrder | Self::MarketOrder | Self::CancelOrder | Self::ListOrders
        )
    }

    /// Metric label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::UserAccounts => "user_accounts",
            Self::PortfolioCurrencies => "portfolio_currencies",
            Self::Portfolio => "portfolio",
            Self::Orderbook => "orderbook",
            Self::LimitOrder => "limit_order",
            Self::MarketOrder => "market_order",
            Self::CancelOrder => "cancel_order",
            Self::ListOrders => "list_orders",
            Self::Operations => "operations",
            Self::PortfolioSummary => "portfolio_summary",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}
