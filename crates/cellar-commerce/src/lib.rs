//! Storefront domain types and logic for Cellar.
//!
//! This crate provides everything behind the storefront's HTTP surface:
//!
//! - **Catalog**: Wines, accessories, gift sets, reviews, search
//! - **Cart**: Per-user cart with priced view
//! - **Checkout**: Orders, cash on delivery, VNPay payment reconciliation
//! - **Store**: SQLite persistence on top of `cellar-db`
//!
//! # Example
//!
//! ```rust,ignore
//! use cellar_commerce::prelude::*;
//! use std::sync::Arc;
//!
//! let db = Arc::new(Db::open("cellar.db")?);
//! cellar_commerce::store::migrate(&db)?;
//!
//! let checkout = CheckoutService::new(db.clone(), Some(Arc::new(gateway)));
//! match checkout.place_order(&user_id, customer, PaymentMethod::Vnpay, &ctx, Utc::now())? {
//!     PlacedOrder::Redirect { payment_url, .. } => redirect(payment_url),
//!     PlacedOrder::Cod(order) => show(order),
//! }
//!
//! // Later, from the gateway's server-to-server call:
//! let ack = checkout.handle_ipn(&params, Utc::now());
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod payment;
pub mod store;

pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Catalog
    pub use crate::catalog::{
        CatalogService, Item, ItemDetails, ItemKind, ItemPage, NewItem, NewReview,
        RatingSummary, Review, SearchHit, StockShortfall,
    };

    // Cart
    pub use crate::cart::{Cart, CartLine, CartService, CartView, CartViewLine};

    // Checkout
    pub use crate::checkout::{
        CheckoutService, CustomerInfo, Order, OrderLine, OrderStatus, PaymentMethod,
        PlacedOrder, ReturnResult,
    };

    // Payment
    pub use crate::payment::vnpay::RequestContext;
    pub use crate::payment::{
        IpnAck, PaymentError, PaymentOutcome, VerifiedCallback, VnpayConfig, VnpayGateway,
    };
}
