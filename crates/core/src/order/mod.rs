//! Order model shared by every pipeline stage.
//!
//! An [`Order`] is created by the source stage from a raw JSON record and then
//! moves through the pipeline by value. Each hop owns the order exclusively;
//! ownership transfers when it is sent on a conduit.

mod types;

pub use types::{InvalidOrder, Order, OrderStatus, RawOrder, RecordError, INVALID_QUANTITY_REASON};
