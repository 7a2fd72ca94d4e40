//! Core order data types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason attached to orders rejected for a non-positive quantity.
pub const INVALID_QUANTITY_REASON: &str = "quantity must be greater than zero";

/// Lifecycle status of an order.
///
/// Statuses only advance in declaration order; the derived `Ord` follows it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Received,
    Reserved,
    Filled,
}

impl OrderStatus {
    /// Get the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Received => "received",
            OrderStatus::Reserved => "reserved",
            OrderStatus::Filled => "filled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order flowing through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub product_code: i64,
    /// Kept exactly as supplied, fractional values included.
    pub quantity: f64,
    pub status: OrderStatus,
}

impl Order {
    /// Create a freshly received order.
    pub fn received(product_code: i64, quantity: f64) -> Self {
        Self {
            product_code,
            quantity,
            status: OrderStatus::Received,
        }
    }

    /// Advance `from` -> `to`.
    ///
    /// Returns `true` if the status changed. Orders in any other status are
    /// left untouched, so replaying an order through a stage is a no-op.
    pub fn advance(&mut self, from: OrderStatus, to: OrderStatus) -> bool {
        debug_assert!(from < to, "status transitions must move forward");
        if self.status == from {
            self.status = to;
            true
        } else {
            false
        }
    }

    /// Mark the order reserved if it is still `Received`.
    pub fn reserve(&mut self) -> bool {
        self.advance(OrderStatus::Received, OrderStatus::Reserved)
    }

    /// Mark the order filled if it is currently `Reserved`.
    pub fn fill(&mut self) -> bool {
        self.advance(OrderStatus::Reserved, OrderStatus::Filled)
    }

    /// Whether the quantity passes validation.
    pub fn has_positive_quantity(&self) -> bool {
        self.quantity > 0.0
    }
}

/// An order rejected by validation, together with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidOrder {
    pub order: Order,
    pub reason: String,
}

impl InvalidOrder {
    pub fn new(order: Order, reason: impl Into<String>) -> Self {
        Self {
            order,
            reason: reason.into(),
        }
    }
}

/// Error decoding a raw record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("malformed order record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Wire form of an order record.
///
/// Missing fields decode to zero and unknown fields are ignored. The incoming
/// `status` is type-checked but never trusted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrder {
    #[serde(default)]
    pub product_code: i64,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub status: i64,
}

impl RawOrder {
    /// Decode a single JSON record.
    pub fn parse(record: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(record)?)
    }

    /// Convert into a pipeline order with status `Received`.
    pub fn into_order(self) -> Order {
        Order::received(self.product_code, self.quantity)
    }
}
