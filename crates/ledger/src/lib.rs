//! Order ledger for the storefront backend.
//!
//! The ledger is the durable, append-mostly record of orders. Entries are
//! created once, move forward through a finite status lifecycle, and are
//! never deleted (retained for audit and export).

mod error;
mod ledger;
mod memory;
mod order;
mod postgres;
mod status;
mod store;

pub use error::{LedgerError, Result};
pub use ledger::{LedgerStats, OrderLedger};
pub use memory::InMemoryOrderStore;
pub use order::{LineItem, Order, PaymentMethod};
pub use postgres::PostgresOrderStore;
pub use status::OrderStatus;
pub use store::{OrderFilter, OrderStore};
