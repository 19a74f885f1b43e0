//! Stock checks against cart contents.

use crate::cart::CartLine;
use crate::catalog::Item;
use crate::ids::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A cart line that cannot be fulfilled from current stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockShortfall {
    pub item_id: ItemId,
    /// Item name, or `None` when the item no longer exists.
    pub name: Option<String>,
    pub available: i64,
    pub requested: i64,
}

impl StockShortfall {
    /// The item was removed from the catalog after it was carted.
    pub fn is_missing_item(&self) -> bool {
        self.name.is_none()
    }
}

impl fmt::Display for StockShortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(
                f,
                "{name}: only {} left, {} requested",
                self.available, self.requested
            ),
            None => write!(f, "an item in the cart is no longer available"),
        }
    }
}

/// Compare every cart line against stock and report all shortfalls.
///
/// `items` holds whatever catalog rows could be loaded for the lines.
pub fn check_stock(lines: &[CartLine], items: &HashMap<ItemId, Item>) -> Vec<StockShortfall> {
    lines
        .iter()
        .filter_map(|line| match items.get(&line.item_id) {
            None => Some(StockShortfall {
                item_id: line.item_id.clone(),
                name: None,
                available: 0,
                requested: line.quantity,
            }),
            Some(item) if !item.can_fulfill(line.quantity) => Some(StockShortfall {
                item_id: line.item_id.clone(),
                name: Some(item.name.clone()),
                available: item.stock.max(0),
                requested: line.quantity,
            }),
            Some(_) => None,
        })
        .collect()
}
