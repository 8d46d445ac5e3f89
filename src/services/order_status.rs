//! Order lifecycle rules shared by the purchase (receive) and sales (ship)
//! paths. Both services run the same gates through [`FulfillmentDirection`]
//! so the fulfillment invariants cannot drift between the two.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
    entities::stock_transaction::TransactionType,
    errors::ServiceError,
    events::OrderKind,
};

/// Header status for purchase and sales orders. `Received` is the purchase
/// mirror of the sales `Shipped`; the remaining states are shared.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Approved,
    Processing,
    Partial,
    Received,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Terminal states admit no further transitions or fulfillment.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Whether item lines may still be received/shipped in this state.
    pub fn accepts_fulfillment(&self) -> bool {
        matches!(
            self,
            OrderStatus::Approved
                | OrderStatus::Processing
                | OrderStatus::Partial
                | OrderStatus::Received
                | OrderStatus::Shipped
        )
    }

    /// Whether an explicit header-level transition to `to` is allowed.
    /// Automatic recomputation after fulfillment does not go through here.
    pub fn can_transition_to(&self, to: OrderStatus, kind: OrderKind) -> bool {
        let fulfilled = fulfilled_status(kind);
        match self {
            OrderStatus::Pending => matches!(to, OrderStatus::Approved | OrderStatus::Cancelled),
            OrderStatus::Approved => {
                to == OrderStatus::Processing
                    || to == OrderStatus::Partial
                    || to == OrderStatus::Cancelled
                    || to == fulfilled
            }
            OrderStatus::Processing => {
                to == OrderStatus::Partial || to == OrderStatus::Cancelled || to == fulfilled
            }
            OrderStatus::Partial => {
                to == OrderStatus::Completed || to == OrderStatus::Cancelled || to == fulfilled
            }
            OrderStatus::Received | OrderStatus::Shipped => {
                matches!(to, OrderStatus::Completed | OrderStatus::Cancelled)
            }
            OrderStatus::Completed | OrderStatus::Cancelled => false,
        }
    }
}

/// Parses a stored status string; a value outside the enum means the row
/// was written by something other than these services.
pub(crate) fn parse_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    raw.parse()
        .map_err(|_| ServiceError::InternalError(format!("unknown order status '{raw}'")))
}

/// The status an order reaches when every line is fully fulfilled.
pub fn fulfilled_status(kind: OrderKind) -> OrderStatus {
    match kind {
        OrderKind::Purchase => OrderStatus::Received,
        OrderKind::Sales => OrderStatus::Shipped,
    }
}

/// Pure derivation of a header status from aggregate item counters. Callers
/// must not persist the result over a terminal status.
pub fn derive_status(kind: OrderKind, total_ordered: i64, total_fulfilled: i64) -> OrderStatus {
    if total_fulfilled == 0 {
        OrderStatus::Pending
    } else if total_fulfilled < total_ordered {
        OrderStatus::Partial
    } else {
        fulfilled_status(kind)
    }
}

/// Validates the requested quantity against a line's remaining fulfillable
/// amount. Over-fulfillment is rejected, never clamped.
pub fn check_fulfillment_quantity(
    quantity_ordered: i32,
    quantity_fulfilled: i32,
    requested: i32,
) -> Result<(), ServiceError> {
    if requested <= 0 {
        return Err(ServiceError::InvalidInput(
            "fulfillment quantity must be positive".to_string(),
        ));
    }
    let remaining = quantity_ordered - quantity_fulfilled;
    if requested > remaining {
        return Err(ServiceError::BadRequest(format!(
            "cannot fulfill {} units; only {} of {} remain unfulfilled",
            requested, remaining, quantity_ordered
        )));
    }
    Ok(())
}

/// Selects enforcement, ledger transaction type, and location side for the
/// two fulfillment paths. Receipt adds stock without a floor; shipment
/// removes stock and must never drive a balance negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentDirection {
    Receipt,
    Shipment,
}

impl FulfillmentDirection {
    pub fn order_kind(&self) -> OrderKind {
        match self {
            FulfillmentDirection::Receipt => OrderKind::Purchase,
            FulfillmentDirection::Shipment => OrderKind::Sales,
        }
    }

    pub fn transaction_type(&self) -> TransactionType {
        match self {
            FulfillmentDirection::Receipt => TransactionType::Purchase,
            FulfillmentDirection::Shipment => TransactionType::Sale,
        }
    }

    pub fn enforces_non_negative(&self) -> bool {
        matches!(self, FulfillmentDirection::Shipment)
    }

    /// Signed ledger quantity for an unsigned fulfillment amount.
    pub fn signed_change(&self, quantity: i32) -> i32 {
        match self {
            FulfillmentDirection::Receipt => quantity,
            FulfillmentDirection::Shipment => -quantity,
        }
    }
}
