//! Catalog module.
//!
//! Contains types for items, reviews, and stock checks, plus the catalog
//! service used by item pages, listings and search.

mod browse;
mod inventory;
mod item;
mod review;
mod service;

pub use browse::{
    fold, in_category, BrowseFilter, BrowsePage, BrowseSort, PriceRange, BROWSE_PAGE_SIZE,
};
pub use inventory::{check_stock, StockShortfall};
pub use item::{Item, ItemDetails, ItemKind, NewItem};
pub use review::{NewReview, RatingSummary, Review, MAX_RATING, MIN_RATING};
pub use service::{
    CatalogService, ItemPage, SearchHit, LIVE_SEARCH_MIN_CHARS, LIVE_SEARCH_PER_KIND,
    LIVE_SEARCH_TOTAL,
};
