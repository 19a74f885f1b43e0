//! Order types and the payment settlement rule.

use crate::catalog::ItemKind;
use crate::checkout::CustomerInfo;
use crate::error::CommerceError;
use crate::ids::{ItemId, OrderId, UserId};
use crate::money::Money;
use crate::payment::PaymentOutcome;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A COD order still `processing` this long after creation is completed
/// the next time its detail is viewed.
pub const COD_AUTO_COMPLETE_SECS: i64 = 10;

/// A COD order still `processing` this long after creation is listed as
/// completed in order history.
pub const COD_DISPLAY_COMPLETE_SECS: i64 = 2 * 60 * 60;

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order placed, awaiting online payment.
    #[default]
    Pending,
    /// Cash on delivery order accepted and being prepared.
    Processing,
    /// Paid or delivered.
    Completed,
    /// Payment declined or could not be started.
    Failed,
    /// Order cancelled.
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "completed" => Ok(OrderStatus::Completed),
            "failed" => Ok(OrderStatus::Failed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(CommerceError::UnknownVariant {
                what: "order status",
                value: other.to_string(),
            }),
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cod,
    /// VNPay hosted checkout.
    Vnpay,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Vnpay => "vnpay",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(PaymentMethod::Cod),
            "vnpay" => Ok(PaymentMethod::Vnpay),
            other => Err(CommerceError::UnknownVariant {
                what: "payment method",
                value: other.to_string(),
            }),
        }
    }
}

/// A line in an order, with the price captured at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub kind: ItemKind,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl OrderLine {
    pub fn subtotal(&self) -> Option<Money> {
        self.unit_price.try_multiply(self.quantity)
    }
}

/// What to do with an order when a verified payment callback arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// First success: mark paid and completed, take stock, clear the cart.
    Confirm,
    /// Success seen before: make sure the status says completed, nothing else.
    Reaffirm,
    /// Decline on an unpaid pending order.
    Fail,
    /// Late or duplicate decline; leave the order alone.
    Ignore,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Gateway transaction reference.
    pub id: OrderId,
    pub user_id: UserId,
    pub customer: CustomerInfo,
    pub lines: Vec<OrderLine>,
    /// Grand total.
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub paid: bool,
    pub paid_at: Option<i64>,
    /// Raw parameters of the callback that settled the order.
    pub payment_info: Option<serde_json::Value>,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl Order {
    /// Decide how a verified callback changes this order.
    ///
    /// A decline never moves a paid order backwards, and a repeated success
    /// never takes stock twice.
    pub fn settle(&self, outcome: &PaymentOutcome) -> Settlement {
        match outcome {
            PaymentOutcome::Succeeded if !self.paid => Settlement::Confirm,
            PaymentOutcome::Succeeded => Settlement::Reaffirm,
            PaymentOutcome::Declined { .. } if self.paid => Settlement::Ignore,
            PaymentOutcome::Declined { .. } if self.status == OrderStatus::Pending => {
                Settlement::Fail
            }
            PaymentOutcome::Declined { .. } => Settlement::Ignore,
        }
    }

    /// True when a COD order should now be persisted as completed.
    pub fn cod_settled(&self, now: i64) -> bool {
        self.payment_method == PaymentMethod::Cod
            && self.status == OrderStatus::Processing
            && now - self.created_at > COD_AUTO_COMPLETE_SECS
    }

    /// True for a paid online order whose status lagged behind.
    pub fn needs_paid_repair(&self) -> bool {
        self.payment_method == PaymentMethod::Vnpay
            && self.paid
            && self.status != OrderStatus::Completed
    }

    /// Status shown in order history; not persisted.
    pub fn display_status(&self, now: i64) -> OrderStatus {
        if self.payment_method == PaymentMethod::Cod
            && self.status == OrderStatus::Processing
            && now - self.created_at > COD_DISPLAY_COMPLETE_SECS
        {
            return OrderStatus::Completed;
        }
        self.status
    }
}
