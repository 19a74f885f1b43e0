//! Item pages, listings, search and reviews.

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::state::{blocking, SharedState};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use cellar_commerce::catalog::{
    BrowseFilter, BrowsePage, BrowseSort, Item, ItemKind, ItemPage, NewReview, PriceRange, Review,
    SearchHit,
};
use cellar_commerce::ItemId;
use http::StatusCode;
use serde::Deserialize;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/products", get(browse))
        .route("/products/category/{name}", get(category))
        .route("/items/detail/{kind}/{id}", get(detail))
        .route("/items/live-search", get(live_search))
        .route("/items/cart-details", post(cart_details))
        .route("/items/review/{kind}/{id}", post(add_review))
        .route("/search", get(search))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Deserialize)]
pub struct IdsRequest {
    #[serde(default)]
    pub ids: Vec<ItemId>,
}

/// `/products` query string. Blank values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub wine_type: Option<String>,
    pub origin: Option<String>,
    pub brand: Option<String>,
    /// `min-max` in dong; either side may be omitted.
    pub budget: Option<String>,
    /// `asc` or `desc` by price; newest first otherwise.
    pub sort: Option<String>,
    pub page: Option<String>,
}

impl BrowseQuery {
    fn into_filter(self) -> (BrowseFilter, usize) {
        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<usize>().ok())
            .unwrap_or(1);
        let filter = BrowseFilter {
            search: self.search,
            wine_type: self.wine_type,
            origin: self.origin,
            brand: self.brand,
            budget: self
                .budget
                .as_deref()
                .map(PriceRange::parse)
                .unwrap_or_default(),
            sort: BrowseSort::parse(self.sort.as_deref()),
        };
        (filter, page)
    }
}

fn parse_kind(raw: &str) -> Result<ItemKind, ApiError> {
    raw.parse::<ItemKind>().map_err(ApiError::from)
}

async fn detail(
    State(state): State<SharedState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<ItemPage>, ApiError> {
    let kind = parse_kind(&kind)?;
    let page = blocking(&state, move |s| s.catalog.item_page(kind, &ItemId::new(id))).await?;
    Ok(Json(page))
}

async fn browse(
    State(state): State<SharedState>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<BrowsePage>, ApiError> {
    let (filter, page) = query.into_filter();
    let listing = blocking(&state, move |s| s.catalog.browse(&filter, page)).await?;
    Ok(Json(listing))
}

async fn category(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let items = blocking(&state, move |s| s.catalog.by_category(&name)).await?;
    Ok(Json(items))
}

async fn live_search(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
    let hits = blocking(&state, move |s| s.catalog.live_search(&query.q)).await?;
    Ok(Json(hits))
}

async fn search(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let items = blocking(&state, move |s| s.catalog.search(&query.q)).await?;
    Ok(Json(items))
}

async fn cart_details(
    State(state): State<SharedState>,
    Json(body): Json<IdsRequest>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let items = blocking(&state, move |s| s.catalog.items_by_ids(&body.ids)).await?;
    Ok(Json(items))
}

async fn add_review(
    State(state): State<SharedState>,
    CurrentUser(session): CurrentUser,
    Path((kind, id)): Path<(String, String)>,
    Json(review): Json<NewReview>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let kind = parse_kind(&kind)?;
    let now = chrono::Utc::now().timestamp();
    let review = blocking(&state, move |s| {
        s.catalog
            .add_review(&session.user_id, kind, &ItemId::new(id), &review, now)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browse_query_defaults_and_parsing() {
        let (filter, page) = BrowseQuery::default().into_filter();
        assert_eq!(filter, BrowseFilter::default());
        assert_eq!(page, 1);

        let query: BrowseQuery =
            serde_urlencoded::from_str("type=Vang+%C4%91%E1%BB%8F&budget=500000-&sort=desc&page=x")
                .unwrap();
        let (filter, page) = query.into_filter();
        assert_eq!(filter.wine_type.as_deref(), Some("Vang đỏ"));
        assert_eq!(filter.budget.min, Some(500_000));
        assert_eq!(filter.budget.max, None);
        assert_eq!(filter.sort, BrowseSort::PriceDesc);
        assert_eq!(page, 1);
    }
}
