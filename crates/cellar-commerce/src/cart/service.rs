//! Cart operations for a signed-in user.

use crate::cart::{Cart, CartView};
use crate::catalog::ItemKind;
use crate::error::CommerceError;
use crate::ids::{ItemId, UserId};
use crate::store::{CartStore, ItemStore};
use cellar_db::{Db, Tx};
use std::sync::Arc;

#[derive(Clone)]
pub struct CartService {
    db: Arc<Db>,
}

impl CartService {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    /// Total quantity in the cart.
    pub fn count(&self, user_id: &UserId) -> Result<i64, CommerceError> {
        Ok(CartStore::new(&*self.db).load(user_id)?.item_count())
    }

    /// The cart priced against the current catalog.
    pub fn view(&self, user_id: &UserId) -> Result<CartView, CommerceError> {
        let db = &*self.db;
        let cart = CartStore::new(db).load(user_id)?;
        let ids: Vec<ItemId> = cart.lines.iter().map(|l| l.item_id.clone()).collect();
        let items = ItemStore::new(db).get_map(&ids)?;
        CartView::build(&cart, &items)
    }

    /// Add units of an item. Returns the new cart count.
    pub fn add(
        &self,
        user_id: &UserId,
        kind: ItemKind,
        item_id: &ItemId,
        quantity: i64,
    ) -> Result<i64, CommerceError> {
        self.modify(user_id, |tx, cart| {
            ItemStore::new(tx)
                .get_of_kind(kind, item_id)?
                .ok_or_else(|| CommerceError::ItemNotFound(item_id.to_string()))?;
            cart.add_item(item_id.clone(), kind, quantity)?;
            Ok(())
        })
    }

    /// Drop a line. Removing an absent item is not an error.
    pub fn remove(&self, user_id: &UserId, item_id: &ItemId) -> Result<i64, CommerceError> {
        self.modify(user_id, |_, cart| {
            cart.remove_item(item_id);
            Ok(())
        })
    }

    /// Set a line's quantity; zero or less removes it.
    pub fn update(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
        quantity: i64,
    ) -> Result<i64, CommerceError> {
        self.modify(user_id, |_, cart| cart.update_quantity(item_id, quantity))
    }

    fn modify<F>(&self, user_id: &UserId, f: F) -> Result<i64, CommerceError>
    where
        F: FnOnce(&Tx<'_>, &mut Cart) -> Result<(), CommerceError>,
    {
        self.db.transaction(|tx| -> Result<i64, CommerceError> {
            let store = CartStore::new(tx);
            let mut cart = store.load(user_id)?;
            f(tx, &mut cart)?;
            store.save(&cart)?;
            tracing::debug!(user_id = %user_id, lines = cart.lines.len(), "cart saved");
            Ok(cart.item_count())
        })
    }
}
