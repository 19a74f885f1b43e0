//! Checkout: orders, customer details, and payment reconciliation.

mod customer;
mod order;
mod service;

pub use customer::CustomerInfo;
pub use order::{
    Order, OrderLine, OrderStatus, PaymentMethod, Settlement, COD_AUTO_COMPLETE_SECS,
    COD_DISPLAY_COMPLETE_SECS,
};
pub use service::{CheckoutService, PlacedOrder, ReturnResult};
