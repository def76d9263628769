//! Order fulfillment: inventory reservation and lifecycle orchestration.
//!
//! `place_order` runs a two-step flow with a compensating action on
//! failure: stock is reserved first (all-or-nothing), then the ledger
//! entry is created. If the ledger write fails — or the request is
//! abandoned in between — the reservation is released and stock
//! re-incremented.

mod controller;
mod error;
mod reservation;

pub use controller::{FulfillmentService, OrderItemRequest};
pub use error::FulfillmentError;
pub use reservation::{InventoryReservation, Reservation};
