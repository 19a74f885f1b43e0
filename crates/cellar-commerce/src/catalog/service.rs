//! Read-mostly catalog operations: detail pages, listings, search, reviews, seeding.

use crate::catalog::{
    fold, in_category, BrowseFilter, BrowsePage, Item, ItemKind, NewItem, NewReview, PriceRange,
    RatingSummary, Review,
};
use crate::error::CommerceError;
use crate::ids::{ItemId, ReviewId, UserId};
use crate::store::ItemStore;
use cellar_db::Db;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Queries shorter than this return no live-search results.
pub const LIVE_SEARCH_MIN_CHARS: usize = 2;
/// Live-search results per item kind.
pub const LIVE_SEARCH_PER_KIND: usize = 3;
/// Live-search results overall.
pub const LIVE_SEARCH_TOTAL: usize = 6;

/// An item page: the item, its reviews (newest first) and their summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPage {
    pub item: Item,
    pub reviews: Vec<Review>,
    pub rating: RatingSummary,
}

/// Compact search hit for the header search box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ItemId,
    pub name: String,
    pub image_url: Option<String>,
    pub kind: ItemKind,
}

impl From<Item> for SearchHit {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            name: item.name,
            image_url: item.image_url,
            kind: item.kind,
        }
    }
}

#[derive(Clone)]
pub struct CatalogService {
    db: Arc<Db>,
}

impl CatalogService {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    fn items(&self) -> ItemStore<'_, Db> {
        ItemStore::new(&*self.db)
    }

    fn find(&self, kind: ItemKind, id: &ItemId) -> Result<Item, CommerceError> {
        self.items()
            .get_of_kind(kind, id)?
            .ok_or_else(|| CommerceError::ItemNotFound(id.to_string()))
    }

    pub fn item_page(&self, kind: ItemKind, id: &ItemId) -> Result<ItemPage, CommerceError> {
        let item = self.find(kind, id)?;
        let reviews = self.items().reviews(id)?;
        let rating = RatingSummary::from_ratings(reviews.iter().map(|r| r.rating));
        Ok(ItemPage {
            item,
            reviews,
            rating,
        })
    }

    /// Header search: a few hits per kind, wines first.
    pub fn live_search(&self, query: &str) -> Result<Vec<SearchHit>, CommerceError> {
        let query = query.trim();
        if query.chars().count() < LIVE_SEARCH_MIN_CHARS {
            return Ok(Vec::new());
        }
        let mut hits = Vec::new();
        for kind in ItemKind::ALL {
            let found = self
                .items()
                .search(query, Some(kind), Some(LIVE_SEARCH_PER_KIND))?;
            hits.extend(found.into_iter().map(SearchHit::from));
        }
        hits.truncate(LIVE_SEARCH_TOTAL);
        Ok(hits)
    }

    /// Full search across every kind. A blank query matches nothing.
    pub fn search(&self, query: &str) -> Result<Vec<Item>, CommerceError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let mut results = Vec::new();
        for kind in ItemKind::ALL {
            results.extend(self.items().search(query, Some(kind), None)?);
        }
        Ok(results)
    }

    /// One page of the filtered catalog listing.
    pub fn browse(
        &self,
        filter: &BrowseFilter,
        page: usize,
    ) -> Result<BrowsePage, CommerceError> {
        let candidates = self.items().list(filter.kinds(), filter.budget)?;
        Ok(filter.apply(candidates, page))
    }

    /// Every item in a category, wines first, then by name.
    pub fn by_category(&self, category: &str) -> Result<Vec<Item>, CommerceError> {
        let mut items: Vec<Item> = self
            .items()
            .list(&ItemKind::ALL, PriceRange::default())?
            .into_iter()
            .filter(|item| in_category(item, category))
            .collect();
        items.sort_by_cached_key(|item| {
            let rank = ItemKind::ALL.iter().position(|k| *k == item.kind);
            (rank, fold(&item.name), item.id.clone())
        });
        Ok(items)
    }

    /// Items for a list of ids, in the requested order.
    pub fn items_by_ids(&self, ids: &[ItemId]) -> Result<Vec<Item>, CommerceError> {
        self.items().get_many(ids)
    }

    pub fn add_review(
        &self,
        user_id: &UserId,
        kind: ItemKind,
        item_id: &ItemId,
        input: &NewReview,
        now: i64,
    ) -> Result<Review, CommerceError> {
        let (name, rating, comment) = input.validate()?;
        let item = self.find(kind, item_id)?;
        let review = Review {
            id: ReviewId::generate(),
            item_id: item.id,
            user_id: user_id.clone(),
            name,
            rating,
            comment,
            created_at: now,
        };
        self.items().add_review(&review)?;
        tracing::info!(item_id = %review.item_id, rating, "review added");
        Ok(review)
    }

    /// Insert or replace catalog items in one transaction.
    pub fn seed(&self, items: Vec<NewItem>, now: i64) -> Result<usize, CommerceError> {
        let items = items
            .into_iter()
            .map(|item| item.into_item(now))
            .collect::<Result<Vec<_>, _>>()?;
        self.db.transaction(|tx| -> Result<(), CommerceError> {
            let store = ItemStore::new(tx);
            for item in &items {
                store.upsert(item)?;
            }
            Ok(())
        })?;
        tracing::info!(count = items.len(), "catalog seeded");
        Ok(items.len())
    }
}
