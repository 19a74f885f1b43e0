//! Catalog item types.

use crate::error::CommerceError;
use crate::ids::ItemId;
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three product lines the store sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    #[serde(rename = "product", alias = "Product", alias = "wine")]
    Wine,
    #[serde(rename = "accessory", alias = "Accessory")]
    Accessory,
    #[serde(rename = "giftset", alias = "GiftSet")]
    GiftSet,
}

impl ItemKind {
    /// All kinds, in catalog display order.
    pub const ALL: [ItemKind; 3] = [ItemKind::Wine, ItemKind::Accessory, ItemKind::GiftSet];

    /// URL slug, also the stored form.
    pub fn slug(&self) -> &'static str {
        match self {
            ItemKind::Wine => "product",
            ItemKind::Accessory => "accessory",
            ItemKind::GiftSet => "giftset",
        }
    }

    /// Model name used by cart payloads (`Product`, `Accessory`, `GiftSet`).
    pub fn model_name(&self) -> &'static str {
        match self {
            ItemKind::Wine => "Product",
            ItemKind::Accessory => "Accessory",
            ItemKind::GiftSet => "GiftSet",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ItemKind {
    type Err = CommerceError;

    /// Accepts either the slug or the model name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemKind::ALL
            .into_iter()
            .find(|k| k.slug() == s || k.model_name() == s)
            .ok_or_else(|| CommerceError::UnknownVariant {
                what: "item kind",
                value: s.to_string(),
            })
    }
}

/// Kind-specific attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemDetails {
    Wine {
        brand: Option<String>,
        origin: Option<String>,
        wine_type: Option<String>,
        volume_ml: Option<u32>,
    },
    Accessory {
        category: Option<String>,
    },
    GiftSet {
        category: Option<String>,
    },
}

impl ItemDetails {
    /// The kind these details belong to.
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemDetails::Wine { .. } => ItemKind::Wine,
            ItemDetails::Accessory { .. } => ItemKind::Accessory,
            ItemDetails::GiftSet { .. } => ItemKind::GiftSet,
        }
    }

    /// Empty details for a kind.
    pub fn empty(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Wine => ItemDetails::Wine {
                brand: None,
                origin: None,
                wine_type: None,
                volume_ml: None,
            },
            ItemKind::Accessory => ItemDetails::Accessory { category: None },
            ItemKind::GiftSet => ItemDetails::GiftSet { category: None },
        }
    }
}

/// A sellable catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    /// Unit price.
    pub price: Money,
    /// Units on hand. Never negative.
    pub stock: i64,
    pub details: ItemDetails,
    /// Unix timestamp of creation.
    pub created_at: i64,
}

impl Item {
    /// Check whether `quantity` units can be sold.
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

/// An item as supplied to the seeding command.
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    /// Optional stable id; generated when absent.
    pub id: Option<ItemId>,
    pub kind: ItemKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub image_url: Option<String>,
    /// Price in dong.
    pub price: i64,
    #[serde(default)]
    pub stock: i64,
    pub details: Option<ItemDetails>,
}

impl NewItem {
    /// Validate and turn into an [`Item`].
    pub fn into_item(self, now: i64) -> Result<Item, CommerceError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(CommerceError::ValidationError("item name is required".into()));
        }
        if self.price < 0 {
            return Err(CommerceError::ValidationError(format!(
                "{name}: price must not be negative"
            )));
        }
        if self.stock < 0 {
            return Err(CommerceError::ValidationError(format!(
                "{name}: stock must not be negative"
            )));
        }
        let details = self.details.unwrap_or_else(|| ItemDetails::empty(self.kind));
        if details.kind() != self.kind {
            return Err(CommerceError::ValidationError(format!(
                "{name}: details describe a {} but the item is a {}",
                details.kind(),
                self.kind
            )));
        }

        Ok(Item {
            id: self.id.unwrap_or_else(ItemId::generate),
            kind: self.kind,
            name,
            description: self.description,
            image_url: self.image_url,
            price: Money::vnd(self.price),
            stock: self.stock,
            details,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_slug_and_model_name() {
        assert_eq!("product".parse::<ItemKind>().unwrap(), ItemKind::Wine);
        assert_eq!("Product".parse::<ItemKind>().unwrap(), ItemKind::Wine);
        assert_eq!("giftset".parse::<ItemKind>().unwrap(), ItemKind::GiftSet);
        assert_eq!("Accessory".parse::<ItemKind>().unwrap(), ItemKind::Accessory);
        assert!("Bottle".parse::<ItemKind>().is_err());
    }

    #[test]
    fn test_kind_serde_accepts_model_name() {
        let kind: ItemKind = serde_json::from_str("\"GiftSet\"").unwrap();
        assert_eq!(kind, ItemKind::GiftSet);
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"giftset\"");
    }

    #[test]
    fn test_new_item_validation() {
        let raw = NewItem {
            id: None,
            kind: ItemKind::Accessory,
            name: "  Waiter's friend  ".into(),
            description: String::new(),
            image_url: None,
            price: 120_000,
            stock: 4,
            details: None,
        };
        let item = raw.into_item(0).unwrap();
        assert_eq!(item.name, "Waiter's friend");
        assert_eq!(item.details, ItemDetails::Accessory { category: None });

        let mismatched = NewItem {
            id: None,
            kind: ItemKind::Wine,
            name: "Barolo".into(),
            description: String::new(),
            image_url: None,
            price: 900_000,
            stock: 1,
            details: Some(ItemDetails::GiftSet { category: None }),
        };
        assert!(mismatched.into_item(0).is_err());
    }
}
