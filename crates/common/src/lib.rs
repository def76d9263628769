//! Shared types used across the storefront backend.

mod types;

pub use types::{Money, OrderId, ProductId, Role, UserId};
