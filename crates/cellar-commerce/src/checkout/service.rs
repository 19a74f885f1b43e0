//! Order placement and payment reconciliation.
//!
//! The return callback and the IPN may arrive in any order, more than once,
//! or concurrently. Both funnel into [`CheckoutService::confirm`], whose
//! conditional update lets exactly one caller take stock and clear the cart.

use crate::cart::Cart;
use crate::catalog::{check_stock, Item};
use crate::checkout::{CustomerInfo, Order, OrderLine, OrderStatus, PaymentMethod, Settlement};
use crate::error::CommerceError;
use crate::ids::{ItemId, OrderId, UserId};
use crate::money::{Currency, Money};
use crate::payment::vnpay::RequestContext;
use crate::payment::{IpnAck, PaymentError, PaymentOutcome, VerifiedCallback, VnpayGateway};
use crate::store::{CartStore, ItemStore, OrderStore};
use cellar_db::{Db, Executor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Result of a successful `place_order`.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacedOrder {
    /// Cash on delivery: stock is taken and the cart cleared.
    Cod(Order),
    /// Online payment: send the buyer to `payment_url`.
    Redirect { order: Order, payment_url: String },
}

impl PlacedOrder {
    pub fn order(&self) -> &Order {
        match self {
            PlacedOrder::Cod(order) => order,
            PlacedOrder::Redirect { order, .. } => order,
        }
    }
}

/// What the buyer is told after returning from the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnResult {
    pub signature_valid: bool,
    pub success: bool,
    pub order_id: Option<OrderId>,
    pub message: String,
    pub response_code: Option<String>,
    pub bank_code: Option<String>,
}

impl ReturnResult {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            signature_valid: true,
            success: false,
            order_id: None,
            message: message.into(),
            response_code: None,
            bank_code: None,
        }
    }
}

/// Where a payment confirmation came from. Only used for logging.
#[derive(Debug, Clone, Copy)]
enum Source {
    Return,
    Ipn,
}

impl Source {
    fn as_str(self) -> &'static str {
        match self {
            Source::Return => "return",
            Source::Ipn => "ipn",
        }
    }
}

/// Checkout and order queries over the shared database.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<Db>,
    gateway: Option<Arc<VnpayGateway>>,
}

impl CheckoutService {
    /// `gateway` is `None` when VNPay is not configured; VNPay checkout then
    /// fails with a configuration error.
    pub fn new(db: Arc<Db>, gateway: Option<Arc<VnpayGateway>>) -> Self {
        Self { db, gateway }
    }

    pub fn gateway(&self) -> Option<&VnpayGateway> {
        self.gateway.as_deref()
    }

    fn require_gateway(&self) -> Result<&VnpayGateway, PaymentError> {
        self.gateway()
            .ok_or_else(|| PaymentError::NotConfigured("VNPay credentials are not set".into()))
    }

    /// Turn the user's cart into an order.
    pub fn place_order(
        &self,
        user_id: &UserId,
        customer: CustomerInfo,
        method: PaymentMethod,
        ctx: &RequestContext,
        now: DateTime<Utc>,
    ) -> Result<PlacedOrder, CommerceError> {
        let customer = customer.validated()?;
        let ts = now.timestamp();

        let order = self.db.transaction(|tx| -> Result<Order, CommerceError> {
            let cart = CartStore::new(tx).load(user_id)?;
            if cart.is_empty() {
                return Err(CommerceError::EmptyCart);
            }
            let ids: Vec<ItemId> = cart.lines.iter().map(|l| l.item_id.clone()).collect();
            let items = ItemStore::new(tx).get_map(&ids)?;

            let shortfalls = check_stock(&cart.lines, &items);
            if !shortfalls.is_empty() {
                return Err(CommerceError::OutOfStock(shortfalls));
            }

            let (lines, amount) = price_lines(&cart, &items)?;
            let order = Order {
                id: OrderId::generate_reference(now),
                user_id: user_id.clone(),
                customer,
                lines,
                amount,
                payment_method: method,
                status: match method {
                    PaymentMethod::Cod => OrderStatus::Processing,
                    PaymentMethod::Vnpay => OrderStatus::Pending,
                },
                paid: false,
                paid_at: None,
                payment_info: None,
                created_at: ts,
                updated_at: ts,
            };
            OrderStore::new(tx).insert(&order)?;

            if method == PaymentMethod::Cod {
                take_stock(tx, &order)?;
                CartStore::new(tx).clear(user_id)?;
            }
            Ok(order)
        })?;

        match method {
            PaymentMethod::Cod => {
                tracing::info!(order_id = %order.id, amount = order.amount.amount, "cod order placed");
                Ok(PlacedOrder::Cod(order))
            }
            PaymentMethod::Vnpay => {
                let url = self
                    .require_gateway()
                    .and_then(|gateway| gateway.payment_url(&order.id, order.amount, ctx, now));
                match url {
                    Ok(payment_url) => {
                        tracing::info!(order_id = %order.id, amount = order.amount.amount, "vnpay order placed");
                        Ok(PlacedOrder::Redirect { order, payment_url })
                    }
                    Err(e) => {
                        tracing::warn!(order_id = %order.id, error = %e, "cannot start vnpay payment");
                        OrderStore::new(&*self.db).mark_failed_if_pending(&order.id, None, ts)?;
                        Err(e.into())
                    }
                }
            }
        }
    }

    /// Handle the buyer's browser coming back from the gateway.
    ///
    /// A verified success confirms the order in case the IPN is late or
    /// lost. A decline is reported but left for the IPN to record.
    pub fn handle_return(
        &self,
        params: &BTreeMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<ReturnResult, CommerceError> {
        let callback = match self.require_gateway()?.verify(params) {
            Ok(callback) => callback,
            Err(e) => {
                tracing::warn!(source = "return", error = %e, "rejected vnpay callback");
                return Ok(ReturnResult {
                    signature_valid: false,
                    ..ReturnResult::failure("Invalid signature")
                });
            }
        };

        let mut result = ReturnResult {
            response_code: callback.response_code().map(str::to_string),
            bank_code: callback.bank_code().map(str::to_string),
            ..ReturnResult::failure("")
        };
        let Ok(order_id) = callback.txn_ref() else {
            result.message = "Order not found".into();
            return Ok(result);
        };
        result.order_id = Some(order_id.clone());

        let Some(order) = self.payable_order(&order_id)? else {
            result.message = "Order not found".into();
            return Ok(result);
        };
        if callback.amount() != Some(order.amount) {
            tracing::warn!(source = "return", order_id = %order.id, "amount mismatch");
            result.message = "Amount mismatch".into();
            return Ok(result);
        }

        match order.settle(&callback.outcome()) {
            Settlement::Confirm => {
                self.confirm(&order, &callback, Source::Return, now)?;
                result.success = true;
            }
            Settlement::Reaffirm => {
                OrderStore::new(&*self.db).reaffirm_paid(&order.id, now.timestamp())?;
                result.success = true;
            }
            Settlement::Fail | Settlement::Ignore => {}
        }

        result.message = if result.success {
            "Payment successful".into()
        } else {
            match callback.outcome() {
                PaymentOutcome::Declined { code } => format!("Payment failed (code {code})"),
                PaymentOutcome::Succeeded => "Payment failed".into(),
            }
        };
        Ok(result)
    }

    /// Handle the gateway's server-to-server notification.
    ///
    /// Never fails: every problem is reported to the gateway as a response code.
    pub fn handle_ipn(&self, params: &BTreeMap<String, String>, now: DateTime<Utc>) -> IpnAck {
        let ack = self.try_handle_ipn(params, now).unwrap_or_else(|e| {
            tracing::error!(source = "ipn", error = %e, "ipn handling failed");
            IpnAck::unknown_error()
        });
        tracing::info!(
            source = "ipn",
            order_id = params.get("vnp_TxnRef").map(String::as_str).unwrap_or_default(),
            rsp_code = %ack.rsp_code,
            "ipn answered"
        );
        ack
    }

    fn try_handle_ipn(
        &self,
        params: &BTreeMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<IpnAck, CommerceError> {
        let Some(gateway) = self.gateway() else {
            return Ok(IpnAck::invalid_signature());
        };
        let callback = match gateway.verify(params) {
            Ok(callback) => callback,
            Err(e) => {
                tracing::warn!(source = "ipn", error = %e, "rejected vnpay callback");
                return Ok(IpnAck::invalid_signature());
            }
        };
        let Ok(order_id) = callback.txn_ref() else {
            return Ok(IpnAck::order_not_found());
        };
        let Some(order) = self.payable_order(&order_id)? else {
            return Ok(IpnAck::order_not_found());
        };
        if callback.amount() != Some(order.amount) {
            tracing::warn!(source = "ipn", order_id = %order.id, "amount mismatch");
            return Ok(IpnAck::invalid_amount());
        }

        let ack = match order.settle(&callback.outcome()) {
            Settlement::Confirm => {
                if self.confirm(&order, &callback, Source::Ipn, now)? {
                    IpnAck::success()
                } else {
                    IpnAck::already_confirmed()
                }
            }
            Settlement::Reaffirm => {
                OrderStore::new(&*self.db).reaffirm_paid(&order.id, now.timestamp())?;
                IpnAck::already_confirmed()
            }
            Settlement::Fail => {
                if self.fail(&order, &callback, now)? {
                    IpnAck::success()
                } else {
                    IpnAck::already_confirmed()
                }
            }
            Settlement::Ignore => IpnAck::already_confirmed(),
        };
        Ok(ack)
    }

    /// Online-payment order by reference. COD orders never match a callback.
    fn payable_order(&self, id: &OrderId) -> Result<Option<Order>, CommerceError> {
        Ok(OrderStore::new(&*self.db)
            .get(id)?
            .filter(|order| order.payment_method == PaymentMethod::Vnpay))
    }

    /// Mark the order paid and apply its side effects.
    ///
    /// Returns `false` when another confirmation already won.
    fn confirm(
        &self,
        order: &Order,
        callback: &VerifiedCallback,
        source: Source,
        now: DateTime<Utc>,
    ) -> Result<bool, CommerceError> {
        let info = callback.to_json();
        let won = self.db.transaction(|tx| -> Result<bool, CommerceError> {
            let changed = OrderStore::new(tx).mark_paid_if_unpaid(&order.id, &info, now.timestamp())?;
            if changed == 0 {
                return Ok(false);
            }
            take_stock(tx, order)?;
            CartStore::new(tx).clear(&order.user_id)?;
            Ok(true)
        })?;

        if won {
            tracing::info!(
                source = source.as_str(),
                order_id = %order.id,
                transaction_no = callback.transaction_no().unwrap_or_default(),
                "order paid"
            );
        } else {
            tracing::debug!(source = source.as_str(), order_id = %order.id, "order already paid");
        }
        Ok(won)
    }

    fn fail(
        &self,
        order: &Order,
        callback: &VerifiedCallback,
        now: DateTime<Utc>,
    ) -> Result<bool, CommerceError> {
        let info = callback.to_json();
        let changed = OrderStore::new(&*self.db).mark_failed_if_pending(
            &order.id,
            Some(&info),
            now.timestamp(),
        )?;
        if changed > 0 {
            tracing::info!(
                order_id = %order.id,
                response_code = callback.response_code().unwrap_or_default(),
                "payment declined"
            );
        }
        Ok(changed > 0)
    }

    /// A user's order, with lazy status upkeep applied and persisted.
    pub fn order_detail(
        &self,
        user_id: &UserId,
        id: &OrderId,
        now: DateTime<Utc>,
    ) -> Result<Order, CommerceError> {
        let ts = now.timestamp();
        let store = OrderStore::new(&*self.db);
        let mut order = store
            .get_for_user(user_id, id)?
            .ok_or_else(|| CommerceError::OrderNotFound(id.to_string()))?;

        if order.cod_settled(ts) && store.complete_if_processing(&order.id, ts)? > 0 {
            order.status = OrderStatus::Completed;
            order.updated_at = ts;
        }
        if order.needs_paid_repair() {
            store.reaffirm_paid(&order.id, ts)?;
            order.status = OrderStatus::Completed;
            order.updated_at = ts;
        }
        Ok(order)
    }

    /// A user's orders, newest first, with display statuses.
    pub fn order_history(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Order>, CommerceError> {
        let ts = now.timestamp();
        let mut orders = OrderStore::new(&*self.db).list_for_user(user_id)?;
        for order in &mut orders {
            order.status = order.display_status(ts);
        }
        Ok(orders)
    }

    /// Every order, newest first.
    pub fn all_orders(&self) -> Result<Vec<Order>, CommerceError> {
        OrderStore::new(&*self.db).list_all()
    }
}

/// Snapshot names and prices into order lines and total them.
fn price_lines(
    cart: &Cart,
    items: &HashMap<ItemId, Item>,
) -> Result<(Vec<OrderLine>, Money), CommerceError> {
    let lines = cart
        .lines
        .iter()
        .map(|line| -> Result<OrderLine, CommerceError> {
            let item = items
                .get(&line.item_id)
                .ok_or_else(|| CommerceError::ItemNotFound(line.item_id.to_string()))?;
            Ok(OrderLine {
                item_id: item.id.clone(),
                kind: item.kind,
                name: item.name.clone(),
                quantity: line.quantity,
                unit_price: item.price,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let subtotals = lines
        .iter()
        .map(|l| l.subtotal().ok_or(CommerceError::Overflow))
        .collect::<Result<Vec<_>, _>>()?;
    let amount = Money::try_sum(subtotals.iter(), Currency::VND).ok_or(CommerceError::Overflow)?;
    Ok((lines, amount))
}

fn take_stock<E: Executor>(exec: &E, order: &Order) -> Result<(), CommerceError> {
    ItemStore::new(exec).decrement_stock(order.lines.iter().map(|l| (&l.item_id, l.quantity)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ItemDetails, ItemKind};
    use crate::payment::VnpayConfig;
    use crate::store::migrate;
    use chrono::TimeZone;

    const SECRET: &str = "TESTSECRET";

    struct Fixture {
        service: CheckoutService,
        db: Arc<Db>,
        gateway: Arc<VnpayGateway>,
        user: UserId,
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap()
    }

    fn fixture() -> Fixture {
        let db = Arc::new(Db::open_in_memory().unwrap());
        migrate(&db).unwrap();
        let mut config = VnpayConfig::new("TMN01", SECRET, "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html");
        config.public_base_url = Some("https://shop.example".into());
        let gateway = Arc::new(VnpayGateway::new(config).unwrap());

        let items = ItemStore::new(&*db);
        for (id, stock, price) in [("w1", 5, 300_000), ("g1", 1, 900_000)] {
            items
                .upsert(&Item {
                    id: ItemId::new(id),
                    kind: if id == "w1" { ItemKind::Wine } else { ItemKind::GiftSet },
                    name: id.to_uppercase(),
                    description: String::new(),
                    image_url: None,
                    price: Money::vnd(price),
                    stock,
                    details: ItemDetails::empty(if id == "w1" { ItemKind::Wine } else { ItemKind::GiftSet }),
                    created_at: 0,
                })
                .unwrap();
        }

        let user = UserId::new("u1");
        let mut cart = Cart::new(user.clone());
        cart.add_item(ItemId::new("w1"), ItemKind::Wine, 2).unwrap();
        cart.add_item(ItemId::new("g1"), ItemKind::GiftSet, 1).unwrap();
        CartStore::new(&*db).save(&cart).unwrap();

        Fixture {
            service: CheckoutService::new(db.clone(), Some(gateway.clone())),
            db,
            gateway,
            user,
        }
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Lan".into(),
            phone: "0900000000".into(),
            address: "1 Le Loi".into(),
        }
    }

    fn ctx() -> RequestContext {
        RequestContext {
            client_ip: "203.0.113.9".into(),
            ..RequestContext::default()
        }
    }

    fn callback(f: &Fixture, order: &Order, code: &str) -> BTreeMap<String, String> {
        let mut params: BTreeMap<String, String> = [
            ("vnp_TxnRef", order.id.to_string()),
            ("vnp_Amount", (order.amount.amount * 100).to_string()),
            ("vnp_ResponseCode", code.to_string()),
            ("vnp_TransactionStatus", code.to_string()),
            ("vnp_BankCode", "NCB".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        f.gateway.sign_params(&mut params).unwrap();
        params
    }

    fn stock(f: &Fixture, id: &str) -> i64 {
        ItemStore::new(&*f.db).get(&ItemId::new(id)).unwrap().unwrap().stock
    }

    fn place_vnpay(f: &Fixture) -> Order {
        match f
            .service
            .place_order(&f.user, customer(), PaymentMethod::Vnpay, &ctx(), now())
            .unwrap()
        {
            PlacedOrder::Redirect { order, payment_url } => {
                assert!(payment_url.contains("vnp_SecureHash="));
                order
            }
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[test]
    fn test_cod_order_takes_stock_and_clears_cart() {
        let f = fixture();
        let placed = f
            .service
            .place_order(&f.user, customer(), PaymentMethod::Cod, &ctx(), now())
            .unwrap();
        let order = placed.order();
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.amount, Money::vnd(1_500_000));
        assert_eq!(stock(&f, "w1"), 3);
        assert_eq!(stock(&f, "g1"), 0);
        assert!(CartStore::new(&*f.db).load(&f.user).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_stock_creates_no_order() {
        let f = fixture();
        let mut cart = CartStore::new(&*f.db).load(&f.user).unwrap();
        cart.update_quantity(&ItemId::new("g1"), 4).unwrap();
        CartStore::new(&*f.db).save(&cart).unwrap();

        let err = f
            .service
            .place_order(&f.user, customer(), PaymentMethod::Cod, &ctx(), now())
            .unwrap_err();
        match err {
            CommerceError::OutOfStock(shortfalls) => {
                assert_eq!(shortfalls.len(), 1);
                assert_eq!(shortfalls[0].available, 1);
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(f.service.all_orders().unwrap().is_empty());
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let f = fixture();
        let err = f
            .service
            .place_order(&UserId::new("other"), customer(), PaymentMethod::Cod, &ctx(), now())
            .unwrap_err();
        assert!(matches!(err, CommerceError::EmptyCart));
    }

    #[test]
    fn test_vnpay_order_waits_for_payment() {
        let f = fixture();
        let order = place_vnpay(&f);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(stock(&f, "w1"), 5);
        assert!(!CartStore::new(&*f.db).load(&f.user).unwrap().is_empty());
    }

    #[test]
    fn test_vnpay_without_gateway_marks_order_failed() {
        let f = fixture();
        let service = CheckoutService::new(f.db.clone(), None);
        let err = service
            .place_order(&f.user, customer(), PaymentMethod::Vnpay, &ctx(), now())
            .unwrap_err();
        assert!(matches!(err, CommerceError::Payment(PaymentError::NotConfigured(_))));
        let orders = service.all_orders().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::Failed);
    }

    #[test]
    fn test_ipn_confirms_once() {
        let f = fixture();
        let order = place_vnpay(&f);
        let params = callback(&f, &order, "00");

        assert_eq!(f.service.handle_ipn(&params, now()), IpnAck::success());
        assert_eq!(f.service.handle_ipn(&params, now()), IpnAck::already_confirmed());
        assert_eq!(stock(&f, "w1"), 3);

        let paid = f.service.order_detail(&f.user, &order.id, now()).unwrap();
        assert!(paid.paid);
        assert_eq!(paid.status, OrderStatus::Completed);
        assert_eq!(paid.payment_info.unwrap()["vnp_BankCode"], "NCB");
    }

    #[test]
    fn test_return_then_ipn() {
        let f = fixture();
        let order = place_vnpay(&f);
        let params = callback(&f, &order, "00");

        let result = f.service.handle_return(&params, now()).unwrap();
        assert!(result.success);
        assert_eq!(result.bank_code.as_deref(), Some("NCB"));
        assert_eq!(f.service.handle_ipn(&params, now()), IpnAck::already_confirmed());
        assert_eq!(stock(&f, "w1"), 3);
    }

    #[test]
    fn test_decline_after_success_is_ignored() {
        let f = fixture();
        let order = place_vnpay(&f);
        f.service.handle_ipn(&callback(&f, &order, "00"), now());

        let ack = f.service.handle_ipn(&callback(&f, &order, "24"), now());
        assert_eq!(ack, IpnAck::already_confirmed());
        let stored = f.service.order_detail(&f.user, &order.id, now()).unwrap();
        assert_eq!(stored.status, OrderStatus::Completed);
    }

    #[test]
    fn test_ipn_decline_fails_pending_order() {
        let f = fixture();
        let order = place_vnpay(&f);
        let declined = callback(&f, &order, "24");

        // The return page reports the decline without recording it.
        let result = f.service.handle_return(&declined, now()).unwrap();
        assert!(!result.success);
        assert_eq!(result.message, "Payment failed (code 24)");

        assert_eq!(f.service.handle_ipn(&declined, now()), IpnAck::success());
        assert_eq!(f.service.handle_ipn(&declined, now()), IpnAck::already_confirmed());
        let stored = f.service.order_detail(&f.user, &order.id, now()).unwrap();
        assert_eq!(stored.status, OrderStatus::Failed);
        assert_eq!(stock(&f, "w1"), 5);
    }

    #[test]
    fn test_ipn_rejects_bad_input() {
        let f = fixture();
        let order = place_vnpay(&f);

        let mut tampered = callback(&f, &order, "00");
        tampered.insert("vnp_Amount".into(), "100".into());
        assert_eq!(f.service.handle_ipn(&tampered, now()), IpnAck::invalid_signature());

        let mut wrong_amount = callback(&f, &order, "00");
        wrong_amount.insert("vnp_Amount".into(), "100".into());
        f.gateway.sign_params(&mut wrong_amount).unwrap();
        assert_eq!(f.service.handle_ipn(&wrong_amount, now()), IpnAck::invalid_amount());

        let mut unknown = callback(&f, &order, "00");
        unknown.insert("vnp_TxnRef".into(), "nope".into());
        f.gateway.sign_params(&mut unknown).unwrap();
        assert_eq!(f.service.handle_ipn(&unknown, now()), IpnAck::order_not_found());

        let stored = f.service.order_detail(&f.user, &order.id, now()).unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
    }

    #[test]
    fn test_return_with_bad_signature_changes_nothing() {
        let f = fixture();
        let order = place_vnpay(&f);
        let mut params = callback(&f, &order, "00");
        params.insert("vnp_SecureHash".into(), "00".repeat(64));

        let result = f.service.handle_return(&params, now()).unwrap();
        assert!(!result.signature_valid);
        assert!(!result.success);
        assert_eq!(stock(&f, "w1"), 5);
    }

    #[test]
    fn test_cod_detail_auto_completes() {
        let f = fixture();
        let placed = f
            .service
            .place_order(&f.user, customer(), PaymentMethod::Cod, &ctx(), now())
            .unwrap();
        let id = placed.order().id.clone();

        let soon = now() + chrono::Duration::seconds(5);
        let later = now() + chrono::Duration::seconds(11);
        assert_eq!(
            f.service.order_detail(&f.user, &id, soon).unwrap().status,
            OrderStatus::Processing
        );
        assert_eq!(
            f.service.order_detail(&f.user, &id, later).unwrap().status,
            OrderStatus::Completed
        );
        assert!(matches!(
            f.service.order_detail(&UserId::new("intruder"), &id, later),
            Err(CommerceError::OrderNotFound(_))
        ));
    }

    #[test]
    fn test_history_shows_display_status() {
        let f = fixture();
        f.service
            .place_order(&f.user, customer(), PaymentMethod::Cod, &ctx(), now())
            .unwrap();
        let much_later = now() + chrono::Duration::hours(3);
        let history = f.service.order_history(&f.user, much_later).unwrap();
        assert_eq!(history[0].status, OrderStatus::Completed);

        // Display status is not persisted.
        assert_eq!(f.service.all_orders().unwrap()[0].status, OrderStatus::Processing);
    }
}
