//! Catalog and review persistence.

use crate::catalog::{fold, Item, ItemDetails, ItemKind, PriceRange, RatingSummary, Review};
use crate::error::CommerceError;
use crate::ids::{ItemId, ReviewId, UserId};
use crate::money::{Currency, Money};
use cellar_db::{params, Executor, Value};
use serde::Deserialize;
use std::collections::HashMap;

const ITEM_COLUMNS: &str =
    "id, kind, name, description, image_url, price, currency, stock, details, created_at";

#[derive(Deserialize)]
struct ItemRow {
    id: String,
    kind: String,
    name: String,
    description: String,
    image_url: Option<String>,
    price: i64,
    currency: String,
    stock: i64,
    details: String,
    created_at: i64,
}

impl TryFrom<ItemRow> for Item {
    type Error = CommerceError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let kind: ItemKind = row.kind.parse()?;
        let details: ItemDetails = serde_json::from_str(&row.details)?;
        let currency = Currency::from_code(&row.currency).ok_or_else(|| {
            CommerceError::UnknownVariant {
                what: "currency",
                value: row.currency.clone(),
            }
        })?;
        Ok(Item {
            id: ItemId::new(row.id),
            kind,
            name: row.name,
            description: row.description,
            image_url: row.image_url,
            price: Money::new(row.price, currency),
            stock: row.stock,
            details,
            created_at: row.created_at,
        })
    }
}

#[derive(Deserialize)]
struct ReviewRow {
    id: String,
    item_id: String,
    user_id: String,
    name: String,
    rating: i64,
    comment: String,
    created_at: i64,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: ReviewId::new(row.id),
            item_id: ItemId::new(row.item_id),
            user_id: UserId::new(row.user_id),
            name: row.name,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

/// Escape `%`, `_` and the escape char itself for a `LIKE ... ESCAPE '\'` pattern.
fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Item and review queries over any executor.
pub struct ItemStore<'a, E: Executor> {
    exec: &'a E,
}

impl<'a, E: Executor> ItemStore<'a, E> {
    pub fn new(exec: &'a E) -> Self {
        Self { exec }
    }

    /// Insert an item, replacing any existing row with the same id.
    pub fn upsert(&self, item: &Item) -> Result<(), CommerceError> {
        let details = serde_json::to_string(&item.details)?;
        self.exec.execute(
            "INSERT INTO items (id, kind, name, name_folded, description, image_url, price, currency, stock, details, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                kind = excluded.kind, name = excluded.name, name_folded = excluded.name_folded,
                description = excluded.description,
                image_url = excluded.image_url, price = excluded.price, currency = excluded.currency,
                stock = excluded.stock, details = excluded.details",
            params![
                &item.id,
                item.kind.slug(),
                &item.name,
                fold(&item.name),
                &item.description,
                item.image_url.clone(),
                item.price.amount,
                item.price.currency.code(),
                item.stock,
                details,
                item.created_at
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &ItemId) -> Result<Option<Item>, CommerceError> {
        let row: Option<ItemRow> = self.exec.query_optional(
            &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?"),
            params![id],
        )?;
        row.map(Item::try_from).transpose()
    }

    /// Get an item only if it is of the given kind.
    pub fn get_of_kind(&self, kind: ItemKind, id: &ItemId) -> Result<Option<Item>, CommerceError> {
        Ok(self.get(id)?.filter(|item| item.kind == kind))
    }

    /// Load several items keyed by id. Missing ids are absent from the map.
    pub fn get_map(&self, ids: &[ItemId]) -> Result<HashMap<ItemId, Item>, CommerceError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id IN ({})",
            placeholders(ids.len())
        );
        let values: Vec<Value> = ids.iter().map(Value::from).collect();
        let rows: Vec<ItemRow> = self.exec.query_as(&sql, &values)?;
        rows.into_iter()
            .map(|row| Item::try_from(row).map(|item| (item.id.clone(), item)))
            .collect()
    }

    /// Load several items in the requested order, skipping missing ids.
    pub fn get_many(&self, ids: &[ItemId]) -> Result<Vec<Item>, CommerceError> {
        let mut found = self.get_map(ids)?;
        Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
    }

    /// Name search, ignoring case for any script.
    pub fn search(
        &self,
        needle: &str,
        kind: Option<ItemKind>,
        limit: Option<usize>,
    ) -> Result<Vec<Item>, CommerceError> {
        let mut sql =
            format!("SELECT {ITEM_COLUMNS} FROM items WHERE name_folded LIKE ? ESCAPE '\\'");
        let mut values = vec![Value::from(like_pattern(&fold(needle)))];
        if let Some(kind) = kind {
            sql.push_str(" AND kind = ?");
            values.push(Value::from(kind.slug()));
        }
        sql.push_str(" ORDER BY name_folded, id");
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            values.push(Value::from(limit as i64));
        }
        let rows: Vec<ItemRow> = self.exec.query_as(&sql, &values)?;
        rows.into_iter().map(Item::try_from).collect()
    }

    /// Items of the given kinds within a price range, in no particular order.
    pub fn list(
        &self,
        kinds: &[ItemKind],
        budget: PriceRange,
    ) -> Result<Vec<Item>, CommerceError> {
        if kinds.is_empty() {
            return Ok(Vec::new());
        }
        let mut sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE kind IN ({})",
            placeholders(kinds.len())
        );
        let mut values: Vec<Value> = kinds.iter().map(|k| Value::from(k.slug())).collect();
        if let Some(min) = budget.min {
            sql.push_str(" AND price >= ?");
            values.push(Value::from(min));
        }
        if let Some(max) = budget.max {
            sql.push_str(" AND price <= ?");
            values.push(Value::from(max));
        }
        let rows: Vec<ItemRow> = self.exec.query_as(&sql, &values)?;
        rows.into_iter().map(Item::try_from).collect()
    }

    /// Fill `name_folded` for rows written before the column existed.
    pub fn refold_names(&self) -> Result<usize, CommerceError> {
        #[derive(Deserialize)]
        struct Name {
            id: String,
            name: String,
        }
        let rows: Vec<Name> = self.exec.query_as(
            "SELECT id, name FROM items WHERE name_folded = '' AND name != ''",
            params![],
        )?;
        for row in &rows {
            self.exec.execute(
                "UPDATE items SET name_folded = ? WHERE id = ?",
                params![fold(&row.name), &row.id],
            )?;
        }
        Ok(rows.len())
    }

    /// Take stock for sold quantities, never going below zero.
    pub fn decrement_stock<'l>(
        &self,
        sold: impl IntoIterator<Item = (&'l ItemId, i64)>,
    ) -> Result<(), CommerceError> {
        for (id, quantity) in sold {
            self.exec.execute(
                "UPDATE items SET stock = MAX(0, stock - ?) WHERE id = ?",
                params![quantity, id],
            )?;
        }
        Ok(())
    }

    pub fn count(&self) -> Result<i64, CommerceError> {
        #[derive(Deserialize)]
        struct Count {
            n: i64,
        }
        let row: Count = self.exec.query_one("SELECT COUNT(*) AS n FROM items", params![])?;
        Ok(row.n)
    }

    pub fn add_review(&self, review: &Review) -> Result<(), CommerceError> {
        self.exec.execute(
            "INSERT INTO reviews (id, item_id, user_id, name, rating, comment, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                &review.id,
                &review.item_id,
                &review.user_id,
                &review.name,
                review.rating,
                &review.comment,
                review.created_at
            ],
        )?;
        Ok(())
    }

    /// Reviews for an item, newest first.
    pub fn reviews(&self, item_id: &ItemId) -> Result<Vec<Review>, CommerceError> {
        let rows: Vec<ReviewRow> = self.exec.query_as(
            "SELECT id, item_id, user_id, name, rating, comment, created_at
             FROM reviews WHERE item_id = ? ORDER BY created_at DESC, rowid DESC",
            params![item_id],
        )?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    pub fn rating_summary(&self, item_id: &ItemId) -> Result<RatingSummary, CommerceError> {
        #[derive(Deserialize)]
        struct Rating {
            rating: i64,
        }
        let rows: Vec<Rating> = self.exec.query_as(
            "SELECT rating FROM reviews WHERE item_id = ?",
            params![item_id],
        )?;
        Ok(RatingSummary::from_ratings(rows.into_iter().map(|r| r.rating)))
    }
}
