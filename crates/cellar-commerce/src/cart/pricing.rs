//! Priced cart view.

use crate::cart::Cart;
use crate::catalog::{Item, ItemKind};
use crate::error::CommerceError;
use crate::ids::ItemId;
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A cart line joined with current catalog data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartViewLine {
    pub item_id: ItemId,
    pub kind: ItemKind,
    pub name: String,
    pub image_url: Option<String>,
    pub unit_price: Money,
    pub quantity: i64,
    /// unit_price * quantity.
    pub subtotal: Money,
    pub stock: i64,
}

/// The cart as shown to the customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartView {
    pub lines: Vec<CartViewLine>,
    pub total_amount: Money,
    /// Sum of quantities over the priced lines.
    pub count: i64,
}

impl CartView {
    /// Price a cart. Lines whose item no longer exists are dropped.
    pub fn build(cart: &Cart, items: &HashMap<ItemId, Item>) -> Result<Self, CommerceError> {
        let mut lines = Vec::with_capacity(cart.lines.len());
        for line in &cart.lines {
            let Some(item) = items.get(&line.item_id) else {
                continue;
            };
            let subtotal = item
                .price
                .try_multiply(line.quantity)
                .ok_or(CommerceError::Overflow)?;
            lines.push(CartViewLine {
                item_id: item.id.clone(),
                kind: item.kind,
                name: item.name.clone(),
                image_url: item.image_url.clone(),
                unit_price: item.price,
                quantity: line.quantity,
                subtotal,
                stock: item.stock,
            });
        }

        let total_amount = Money::try_sum(lines.iter().map(|l| &l.subtotal), Currency::VND)
            .ok_or_else(|| CommerceError::CurrencyMismatch {
                expected: Currency::VND.code().to_string(),
                got: "mixed".to_string(),
            })?;
        let count = lines.iter().map(|l| l.quantity).sum();

        Ok(Self {
            lines,
            total_amount,
            count,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
