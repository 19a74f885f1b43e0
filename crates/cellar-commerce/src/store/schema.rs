//! Storefront schema.

use cellar_db::Migration;

/// Migrations owned by the commerce crate, in order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        id: "commerce/001_catalog",
        sql: "
            CREATE TABLE items (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL CHECK (kind IN ('product', 'accessory', 'giftset')),
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                image_url TEXT,
                price INTEGER NOT NULL CHECK (price >= 0),
                currency TEXT NOT NULL DEFAULT 'VND',
                stock INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
                details TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX idx_items_kind ON items(kind, name);

            CREATE TABLE reviews (
                id TEXT PRIMARY KEY,
                item_id TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                comment TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX idx_reviews_item ON reviews(item_id, created_at);
        ",
    },
    Migration {
        id: "commerce/002_carts",
        sql: "
            CREATE TABLE cart_lines (
                user_id TEXT NOT NULL,
                item_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                quantity INTEGER NOT NULL CHECK (quantity > 0),
                position INTEGER NOT NULL,
                PRIMARY KEY (user_id, item_id)
            );
        ",
    },
    Migration {
        id: "commerce/003_orders",
        sql: "
            CREATE TABLE orders (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                customer_name TEXT NOT NULL,
                customer_phone TEXT NOT NULL,
                customer_address TEXT NOT NULL,
                amount INTEGER NOT NULL,
                currency TEXT NOT NULL DEFAULT 'VND',
                payment_method TEXT NOT NULL CHECK (payment_method IN ('cod', 'vnpay')),
                status TEXT NOT NULL,
                paid INTEGER NOT NULL DEFAULT 0,
                paid_at INTEGER,
                payment_info TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX idx_orders_user ON orders(user_id, created_at);

            CREATE TABLE order_lines (
                order_id TEXT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                item_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                name TEXT NOT NULL,
                quantity INTEGER NOT NULL CHECK (quantity > 0),
                unit_price INTEGER NOT NULL,
                PRIMARY KEY (order_id, position)
            );
        ",
    },
    Migration {
        id: "commerce/004_folded_names",
        sql: "
            ALTER TABLE items ADD COLUMN name_folded TEXT NOT NULL DEFAULT '';
            CREATE INDEX idx_items_folded ON items(kind, name_folded);
        ",
    },
];
