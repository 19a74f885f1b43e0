//! Cart persistence, one row per line.

use crate::cart::{Cart, CartLine};
use crate::error::CommerceError;
use crate::ids::{ItemId, UserId};
use cellar_db::{params, Executor};
use serde::Deserialize;

#[derive(Deserialize)]
struct CartLineRow {
    item_id: String,
    kind: String,
    quantity: i64,
}

pub struct CartStore<'a, E: Executor> {
    exec: &'a E,
}

impl<'a, E: Executor> CartStore<'a, E> {
    pub fn new(exec: &'a E) -> Self {
        Self { exec }
    }

    /// Load a user's cart; a user without lines gets an empty cart.
    pub fn load(&self, user_id: &UserId) -> Result<Cart, CommerceError> {
        let rows: Vec<CartLineRow> = self.exec.query_as(
            "SELECT item_id, kind, quantity FROM cart_lines WHERE user_id = ? ORDER BY position",
            params![user_id],
        )?;
        let lines = rows
            .into_iter()
            .map(|row| -> Result<CartLine, CommerceError> {
                Ok(CartLine {
                    item_id: ItemId::new(row.item_id),
                    kind: row.kind.parse()?,
                    quantity: row.quantity,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Cart {
            user_id: user_id.clone(),
            lines,
        })
    }

    /// Replace the stored lines with the cart's current lines.
    pub fn save(&self, cart: &Cart) -> Result<(), CommerceError> {
        self.exec.execute(
            "DELETE FROM cart_lines WHERE user_id = ?",
            params![&cart.user_id],
        )?;
        for (position, line) in cart.lines.iter().enumerate() {
            self.exec.execute(
                "INSERT INTO cart_lines (user_id, item_id, kind, quantity, position)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    &cart.user_id,
                    &line.item_id,
                    line.kind.slug(),
                    line.quantity,
                    position as i64
                ],
            )?;
        }
        Ok(())
    }

    /// Empty a user's cart, returning how many lines were removed.
    pub fn clear(&self, user_id: &UserId) -> Result<usize, CommerceError> {
        Ok(self
            .exec
            .execute("DELETE FROM cart_lines WHERE user_id = ?", params![user_id])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemKind;
    use crate::store::test_db;

    #[test]
    fn test_load_missing_cart_is_empty() {
        let db = test_db();
        let cart = CartStore::new(&db).load(&UserId::new("nobody")).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_save_preserves_line_order() {
        let db = test_db();
        let store = CartStore::new(&db);
        let user = UserId::new("u1");
        let mut cart = Cart::new(user.clone());
        cart.add_item(ItemId::new("z"), ItemKind::GiftSet, 1).unwrap();
        cart.add_item(ItemId::new("a"), ItemKind::Wine, 2).unwrap();
        store.save(&cart).unwrap();

        let loaded = store.load(&user).unwrap();
        assert_eq!(loaded, cart);

        cart.remove_item(&ItemId::new("z"));
        store.save(&cart).unwrap();
        assert_eq!(store.load(&user).unwrap().lines.len(), 1);
    }

    #[test]
    fn test_clear() {
        let db = test_db();
        let store = CartStore::new(&db);
        let user = UserId::new("u1");
        let mut cart = Cart::new(user.clone());
        cart.add_item(ItemId::new("a"), ItemKind::Accessory, 1).unwrap();
        store.save(&cart).unwrap();

        assert_eq!(store.clear(&user).unwrap(), 1);
        assert_eq!(store.clear(&user).unwrap(), 0);
    }
}
