//! Order persistence.
//!
//! Payment state changes are conditional updates: the `WHERE` clause carries
//! the state the caller expects, and the returned row count says whether this
//! caller won. Concurrent callbacks for the same order therefore apply their
//! side effects at most once.

use crate::checkout::{CustomerInfo, Order, OrderLine, OrderStatus};
use crate::error::CommerceError;
use crate::ids::{ItemId, OrderId, UserId};
use crate::money::{Currency, Money};
use cellar_db::{params, Executor, Value};
use serde::Deserialize;
use std::collections::HashMap;

const ORDER_COLUMNS: &str = "id, user_id, customer_name, customer_phone, customer_address, \
     amount, currency, payment_method, status, paid, paid_at, payment_info, created_at, updated_at";

#[derive(Deserialize)]
struct OrderRow {
    id: String,
    user_id: String,
    customer_name: String,
    customer_phone: String,
    customer_address: String,
    amount: i64,
    currency: String,
    payment_method: String,
    status: String,
    paid: i64,
    paid_at: Option<i64>,
    payment_info: Option<String>,
    created_at: i64,
    updated_at: i64,
}

#[derive(Deserialize)]
struct OrderLineRow {
    order_id: String,
    item_id: String,
    kind: String,
    name: String,
    quantity: i64,
    unit_price: i64,
}

fn currency(code: &str) -> Result<Currency, CommerceError> {
    Currency::from_code(code).ok_or_else(|| CommerceError::UnknownVariant {
        what: "currency",
        value: code.to_string(),
    })
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Result<Order, CommerceError> {
        let payment_info = self
            .payment_info
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            customer: CustomerInfo {
                name: self.customer_name,
                phone: self.customer_phone,
                address: self.customer_address,
            },
            lines,
            amount: Money::new(self.amount, currency(&self.currency)?),
            payment_method: self.payment_method.parse()?,
            status: self.status.parse()?,
            paid: self.paid != 0,
            paid_at: self.paid_at,
            payment_info,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub struct OrderStore<'a, E: Executor> {
    exec: &'a E,
}

impl<'a, E: Executor> OrderStore<'a, E> {
    pub fn new(exec: &'a E) -> Self {
        Self { exec }
    }

    /// Insert an order and its lines.
    pub fn insert(&self, order: &Order) -> Result<(), CommerceError> {
        let payment_info = order
            .payment_info
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        self.exec.execute(
            &format!(
                "INSERT INTO orders ({ORDER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            params![
                &order.id,
                &order.user_id,
                &order.customer.name,
                &order.customer.phone,
                &order.customer.address,
                order.amount.amount,
                order.amount.currency.code(),
                order.payment_method.as_str(),
                order.status.as_str(),
                order.paid,
                order.paid_at,
                payment_info,
                order.created_at,
                order.updated_at
            ],
        )?;
        for (position, line) in order.lines.iter().enumerate() {
            self.exec.execute(
                "INSERT INTO order_lines (order_id, position, item_id, kind, name, quantity, unit_price)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    &order.id,
                    position as i64,
                    &line.item_id,
                    line.kind.slug(),
                    &line.name,
                    line.quantity,
                    line.unit_price.amount
                ],
            )?;
        }
        Ok(())
    }

    pub fn get(&self, id: &OrderId) -> Result<Option<Order>, CommerceError> {
        let row: Option<OrderRow> = self.exec.query_optional(
            &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"),
            params![id],
        )?;
        match row {
            Some(row) => Ok(self.attach_lines(vec![row])?.pop()),
            None => Ok(None),
        }
    }

    /// Get an order only if it belongs to the user.
    pub fn get_for_user(
        &self,
        user_id: &UserId,
        id: &OrderId,
    ) -> Result<Option<Order>, CommerceError> {
        Ok(self.get(id)?.filter(|order| &order.user_id == user_id))
    }

    /// A user's orders, newest first.
    pub fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, CommerceError> {
        let rows: Vec<OrderRow> = self.exec.query_as(
            &format!(
                "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?
                 ORDER BY created_at DESC, rowid DESC"
            ),
            params![user_id],
        )?;
        self.attach_lines(rows)
    }

    /// Every order, newest first.
    pub fn list_all(&self) -> Result<Vec<Order>, CommerceError> {
        let rows: Vec<OrderRow> = self.exec.query_as(
            &format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, rowid DESC"),
            params![],
        )?;
        self.attach_lines(rows)
    }

    /// Set the status unconditionally.
    pub fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
        now: i64,
    ) -> Result<usize, CommerceError> {
        Ok(self.exec.execute(
            "UPDATE orders SET status = ?, updated_at = ? WHERE id = ?",
            params![status.as_str(), now, id],
        )?)
    }

    /// Move an unpaid order to paid and completed.
    ///
    /// Returns 1 when this call made the transition, 0 when the order was
    /// already paid or does not exist.
    pub fn mark_paid_if_unpaid(
        &self,
        id: &OrderId,
        payment_info: &serde_json::Value,
        now: i64,
    ) -> Result<usize, CommerceError> {
        let info = serde_json::to_string(payment_info)?;
        Ok(self.exec.execute(
            "UPDATE orders
             SET paid = 1, status = 'completed', paid_at = ?, payment_info = ?, updated_at = ?
             WHERE id = ? AND paid = 0",
            params![now, info, now, id],
        )?)
    }

    /// Fail an order that is still unpaid and pending.
    pub fn mark_failed_if_pending(
        &self,
        id: &OrderId,
        payment_info: Option<&serde_json::Value>,
        now: i64,
    ) -> Result<usize, CommerceError> {
        let info = payment_info.map(serde_json::to_string).transpose()?;
        Ok(self.exec.execute(
            "UPDATE orders
             SET status = 'failed', payment_info = COALESCE(?, payment_info), updated_at = ?
             WHERE id = ? AND paid = 0 AND status = 'pending'",
            params![info, now, id],
        )?)
    }

    /// Bring a paid order's status back to completed if it drifted.
    pub fn reaffirm_paid(&self, id: &OrderId, now: i64) -> Result<usize, CommerceError> {
        Ok(self.exec.execute(
            "UPDATE orders SET status = 'completed', updated_at = ?
             WHERE id = ? AND paid = 1 AND status != 'completed'",
            params![now, id],
        )?)
    }

    /// Complete a COD order that is still processing.
    pub fn complete_if_processing(&self, id: &OrderId, now: i64) -> Result<usize, CommerceError> {
        Ok(self.exec.execute(
            "UPDATE orders SET status = 'completed', updated_at = ?
             WHERE id = ? AND status = 'processing'",
            params![now, id],
        )?)
    }

    fn attach_lines(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, CommerceError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Value> = rows.iter().map(|r| Value::from(&r.id)).collect();
        let sql = format!(
            "SELECT order_id, item_id, kind, name, quantity, unit_price FROM order_lines
             WHERE order_id IN ({}) ORDER BY order_id, position",
            vec!["?"; ids.len()].join(", ")
        );
        let line_rows: Vec<OrderLineRow> = self.exec.query_as(&sql, &ids)?;

        let mut by_order: HashMap<String, Vec<OrderLineRow>> = HashMap::new();
        for line in line_rows {
            by_order.entry(line.order_id.clone()).or_default().push(line);
        }

        rows.into_iter()
            .map(|row| -> Result<Order, CommerceError> {
                let order_currency = currency(&row.currency)?;
                let lines = by_order
                    .remove(&row.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|l| -> Result<OrderLine, CommerceError> {
                        Ok(OrderLine {
                            item_id: ItemId::new(l.item_id),
                            kind: l.kind.parse()?,
                            name: l.name,
                            quantity: l.quantity,
                            unit_price: Money::new(l.unit_price, order_currency),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                row.into_order(lines)
            })
            .collect()
    }
}
