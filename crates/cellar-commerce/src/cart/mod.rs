//! Shopping cart module.
//!
//! Contains the cart, its lines, the priced view, and the per-user service.

mod cart;
mod pricing;
mod service;

pub use cart::{Cart, CartLine, MAX_QUANTITY_PER_ITEM};
pub use pricing::{CartView, CartViewLine};
pub use service::CartService;
