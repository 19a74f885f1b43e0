//! Cart and cart line types.

use crate::catalog::ItemKind;
use crate::error::CommerceError;
use crate::ids::{ItemId, UserId};
use serde::{Deserialize, Serialize};

/// Maximum quantity allowed per cart line.
pub const MAX_QUANTITY_PER_ITEM: i64 = 99;

/// One item in a cart. Prices are looked up at view and checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: ItemId,
    pub kind: ItemKind,
    pub quantity: i64,
}

/// A user's shopping cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: UserId,
    /// Lines in insertion order.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            lines: Vec::new(),
        }
    }

    /// Add an item to the cart.
    ///
    /// Returns an error if:
    /// - Quantity is not positive
    /// - Adding would exceed MAX_QUANTITY_PER_ITEM
    pub fn add_item(
        &mut self,
        item_id: ItemId,
        kind: ItemKind,
        quantity: i64,
    ) -> Result<i64, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }

        if let Some(existing) = self.lines.iter_mut().find(|l| l.item_id == item_id) {
            let new_quantity = existing
                .quantity
                .checked_add(quantity)
                .ok_or(CommerceError::Overflow)?;
            if new_quantity > MAX_QUANTITY_PER_ITEM {
                return Err(CommerceError::QuantityExceedsLimit(
                    new_quantity,
                    MAX_QUANTITY_PER_ITEM,
                ));
            }
            existing.quantity = new_quantity;
            return Ok(new_quantity);
        }

        if quantity > MAX_QUANTITY_PER_ITEM {
            return Err(CommerceError::QuantityExceedsLimit(
                quantity,
                MAX_QUANTITY_PER_ITEM,
            ));
        }

        self.lines.push(CartLine {
            item_id,
            kind,
            quantity,
        });
        Ok(quantity)
    }

    /// Set a line's quantity.
    ///
    /// If quantity is <= 0, removes the line. An item that is not in the
    /// cart is an error.
    pub fn update_quantity(&mut self, item_id: &ItemId, quantity: i64) -> Result<(), CommerceError> {
        if !self.contains(item_id) {
            return Err(CommerceError::ItemNotInCart(item_id.to_string()));
        }
        if quantity <= 0 {
            self.remove_item(item_id);
            return Ok(());
        }
        if quantity > MAX_QUANTITY_PER_ITEM {
            return Err(CommerceError::QuantityExceedsLimit(
                quantity,
                MAX_QUANTITY_PER_ITEM,
            ));
        }
        if let Some(line) = self.lines.iter_mut().find(|l| &l.item_id == item_id) {
            line.quantity = quantity;
        }
        Ok(())
    }

    /// Remove a line from the cart.
    pub fn remove_item(&mut self, item_id: &ItemId) -> bool {
        let len_before = self.lines.len();
        self.lines.retain(|l| &l.item_id != item_id);
        self.lines.len() < len_before
    }

    pub fn contains(&self, item_id: &ItemId) -> bool {
        self.lines.iter().any(|l| &l.item_id == item_id)
    }

    /// Clear all lines from the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Get total item count (sum of quantities).
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
