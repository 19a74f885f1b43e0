//! End-to-end API flows through the full router.

use axum::body::Body;
use axum::Router;
use cellar_auth::{AuthError, Role, VerificationNotifier};
use cellar_cache::Cache;
use cellar_commerce::catalog::NewItem;
use cellar_commerce::payment::{VnpayConfig, VnpayGateway};
use cellar_db::Db;
use cellar_server::state::AppState;
use cellar_server::SharedState;
use http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const PAY_URL: &str = "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html";

#[derive(Default)]
struct Outbox(Mutex<Vec<String>>);

impl VerificationNotifier for Outbox {
    fn send_code(&self, _email: &str, code: &str) -> Result<(), AuthError> {
        self.0.lock().unwrap().push(code.to_string());
        Ok(())
    }
}

struct TestApp {
    app: Router,
    state: SharedState,
    gateway: Arc<VnpayGateway>,
    outbox: Arc<Outbox>,
}

fn test_app() -> TestApp {
    let db = Arc::new(Db::open_in_memory().unwrap());
    cellar_server::migrate(&db).unwrap();

    let mut config = VnpayConfig::new("CELLAR01", "APITESTSECRET", PAY_URL);
    config.public_base_url = Some("https://shop.example".into());
    let gateway = Arc::new(VnpayGateway::new(config).unwrap());
    let outbox = Arc::new(Outbox::default());

    let state: SharedState = Arc::new(AppState::new(
        db,
        Arc::new(Cache::in_memory()),
        Some(gateway.clone()),
        outbox.clone(),
    ));

    let catalog: Vec<NewItem> = serde_json::from_value(json!([
        {"id": "barolo", "kind": "product", "name": "Barolo 2019", "price": 1200000, "stock": 5},
        {"id": "opener", "kind": "accessory", "name": "Waiter's friend", "price": 180000, "stock": 1},
        {"id": "duo", "kind": "giftset", "name": "Barolo duo", "price": 2500000, "stock": 2},
    ]))
    .unwrap();
    state.catalog.seed(catalog, 0).unwrap();

    TestApp {
        app: cellar_server::router(state.clone()),
        state,
        gateway,
        outbox,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, http::HeaderMap, Vec<u8>) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body.to_vec())
    }

    async fn json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = self.send(request).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    /// Register, verify and log in; returns the bearer token.
    async fn sign_in(&self, email: &str) -> String {
        let creds = json!({"email": email, "password": "secret1"});
        let (status, _) = self.json(post_json("/register", None, &creds)).await;
        assert_eq!(status, StatusCode::CREATED);

        let code = self.outbox.0.lock().unwrap().last().cloned().unwrap();
        let verify = json!({"email": email, "otp": code});
        let (status, _) = self.json(post_json("/verify-otp", None, &verify)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self.json(post_json("/login", None, &creds)).await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    fn signed_callback(&self, txn_ref: &str, amount: i64, code: &str) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("vnp_TxnRef".to_string(), txn_ref.to_string());
        params.insert("vnp_Amount".to_string(), (amount * 100).to_string());
        params.insert("vnp_ResponseCode".to_string(), code.to_string());
        params.insert("vnp_TransactionStatus".to_string(), code.to_string());
        params.insert("vnp_BankCode".to_string(), "NCB".to_string());
        self.gateway.sign_params(&mut params).unwrap();
        params
    }
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "198.51.100.20");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn query_string(params: &BTreeMap<String, String>) -> String {
    serde_urlencoded::to_string(params).unwrap()
}

#[tokio::test]
async fn test_liveness() {
    let app = test_app();
    let (status, _, body) = app.send(get("/api", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"Cellar API is running");
}

#[tokio::test]
async fn test_cart_requires_login() {
    let app = test_app();
    let (status, body) = app.json(get("/cart/count", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = app.json(get("/cart/count", Some("not-a-session"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_before_verification_is_refused() {
    let app = test_app();
    let creds = json!({"email": "lan@example.vn", "password": "secret1"});
    app.json(post_json("/register", None, &creds)).await;
    let (status, _) = app.json(post_json("/login", None, &creds)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .json(post_json("/verify-otp", None, &json!({"email": "lan@example.vn", "otp": "000000x"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_product_listing() {
    let app = test_app();

    let (status, page) = app.json(get("/products?sort=asc", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["currentPage"], 1);
    assert_eq!(page["totalPages"], 1);
    let ids: Vec<&str> = page["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["opener", "barolo", "duo"]);

    let (_, page) = app
        .json(get("/products?budget=1000000-2000000&brand=barolo", None))
        .await;
    assert_eq!(page["products"].as_array().unwrap().len(), 0);

    let (_, page) = app.json(get("/products?budget=1000000-&search=BAROLO", None)).await;
    assert_eq!(page["total"], 2);

    let (_, page) = app.json(get("/products?page=4", None)).await;
    assert_eq!(page["currentPage"], 4);
    assert_eq!(page["products"], json!([]));

    let (status, found) = app.json(get("/products/category/none", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found, json!([]));
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let app = test_app();

    let (status, page) = app.json(get("/items/detail/product/barolo", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["item"]["name"], "Barolo 2019");
    assert_eq!(page["rating"]["count"], 0);

    let (status, _) = app.json(get("/items/detail/accessory/barolo", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.json(get("/items/detail/cheese/barolo", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, hits) = app.json(get("/items/live-search?q=b", None)).await;
    assert_eq!(hits, json!([]));
    let (_, hits) = app.json(get("/items/live-search?q=barolo", None)).await;
    assert_eq!(hits.as_array().unwrap().len(), 2);
    assert_eq!(hits[0]["kind"], "product");

    let (_, found) = app.json(get("/search?q=FRIEND", None)).await;
    assert_eq!(found[0]["id"], "opener");

    let ids = json!({"ids": ["duo", "missing", "barolo"]});
    let (status, items) = app.json(post_json("/items/cart-details", None, &ids)).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["duo", "barolo"]);
}

#[tokio::test]
async fn test_review_requires_login_and_valid_rating() {
    let app = test_app();
    let review = json!({"name": "Hoa", "rating": 5, "comment": "Superb"});
    let (status, _) = app
        .json(post_json("/items/review/product/barolo", None, &review))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.sign_in("hoa@example.vn").await;
    let (status, created) = app
        .json(post_json("/items/review/product/barolo", Some(&token), &review))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["rating"], 5);

    let bad = json!({"name": "Hoa", "rating": 9, "comment": "Too good"});
    let (status, _) = app
        .json(post_json("/items/review/product/barolo", Some(&token), &bad))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, page) = app.json(get("/items/detail/product/barolo", None)).await;
    assert_eq!(page["reviews"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cart_flow() {
    let app = test_app();
    let token = app.sign_in("minh@example.vn").await;
    let token = Some(token.as_str());

    let add = json!({"itemId": "barolo", "itemType": "Product", "quantity": 2});
    let (status, body) = app.json(post_json("/cart/add", token, &add)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let add = json!({"itemId": "opener", "itemType": "accessory"});
    let (_, body) = app.json(post_json("/cart/add", token, &add)).await;
    assert_eq!(body["count"], 3);

    let wrong_kind = json!({"itemId": "opener", "itemType": "GiftSet"});
    let (status, _) = app.json(post_json("/cart/add", token, &wrong_kind)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, view) = app.json(get("/cart/items", token)).await;
    assert_eq!(view["count"], 3);
    assert_eq!(view["total_amount"]["amount"], 2_580_000);

    let update = json!({"itemId": "barolo", "quantity": 1});
    let (_, body) = app.json(post_json("/cart/update", token, &update)).await;
    assert_eq!(body["count"], 2);

    let remove = json!({"itemId": "opener"});
    let (_, body) = app.json(post_json("/cart/remove", token, &remove)).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_cod_checkout_and_stock_errors() {
    let app = test_app();
    let token = app.sign_in("nga@example.vn").await;
    let token = Some(token.as_str());
    let checkout = json!({
        "paymentMethod": "cod",
        "name": "Nga",
        "phone": "0900000001",
        "address": "12 Le Loi",
    });

    let (status, _) = app.json(post_json("/order/create-payment", token, &checkout)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let add = json!({"itemId": "opener", "itemType": "Accessory", "quantity": 2});
    app.json(post_json("/cart/add", token, &add)).await;
    let (status, body) = app.json(post_json("/order/create-payment", token, &checkout)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["shortfalls"][0]["available"], 1);

    let update = json!({"itemId": "opener", "quantity": 1});
    app.json(post_json("/cart/update", token, &update)).await;
    let (status, order) = app.json(post_json("/order/create-payment", token, &checkout)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "processing");
    assert_eq!(order["payment_method"], "cod");

    let (_, count) = app.json(get("/cart/count", token)).await;
    assert_eq!(count["count"], 0);
    let (_, page) = app.json(get("/items/detail/accessory/opener", None)).await;
    assert_eq!(page["item"]["stock"], 0);

    let (_, history) = app.json(get("/my-orders", token)).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_vnpay_checkout_reconciles_once() {
    let app = test_app();
    let token = app.sign_in("phuc@example.vn").await;
    let token = Some(token.as_str());

    let add = json!({"itemId": "barolo", "itemType": "Product", "quantity": 2});
    app.json(post_json("/cart/add", token, &add)).await;
    let checkout = json!({
        "paymentMethod": "vnpay",
        "name": "Phuc",
        "phone": "0900000002",
        "address": "3 Hai Ba Trung",
    });
    let (status, headers, _) = app
        .send(post_json("/order/create-payment", token, &checkout))
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let location = headers[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with(PAY_URL));
    let (_, query) = location.split_once('?').unwrap();
    let sent: BTreeMap<String, String> = serde_urlencoded::from_str(query).unwrap();
    assert_eq!(sent["vnp_IpAddr"], "198.51.100.20");
    assert_eq!(
        sent["vnp_ReturnUrl"],
        "https://shop.example/order/vnpay_return"
    );
    let txn_ref = sent["vnp_TxnRef"].clone();

    let (_, page) = app.json(get("/items/detail/product/barolo", None)).await;
    assert_eq!(page["item"]["stock"], 5);

    let mut forged = app.signed_callback(&txn_ref, 2_400_000, "00");
    forged.insert("vnp_Amount".into(), "100".into());
    let (status, ack) = app
        .json(get(&format!("/order/vnpay_ipn?{}", query_string(&forged)), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["RspCode"], "97");

    let paid = app.signed_callback(&txn_ref, 2_400_000, "00");
    let form = Request::builder()
        .method("POST")
        .uri("/order/vnpay_ipn")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(query_string(&paid)))
        .unwrap();
    let (status, ack) = app.json(form).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["RspCode"], "00");

    let (_, ack) = app
        .json(get(&format!("/order/vnpay_ipn?{}", query_string(&paid)), None))
        .await;
    assert_eq!(ack["RspCode"], "02");

    let (status, result) = app
        .json(get(&format!("/order/vnpay_return?{}", query_string(&paid)), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["success"], true);
    assert_eq!(result["bank_code"], "NCB");

    let (_, page) = app.json(get("/items/detail/product/barolo", None)).await;
    assert_eq!(page["item"]["stock"], 3);

    let (status, order) = app
        .json(get(&format!("/order/detail/{txn_ref}"), token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["paid"], true);
    assert_eq!(order["status"], "completed");

    let (_, count) = app.json(get("/cart/count", token)).await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn test_unknown_order_ipn_and_foreign_order_detail() {
    let app = test_app();
    let params = app.signed_callback("NOSUCHORDER", 1_000, "00");
    let (status, ack) = app
        .json(get(&format!("/order/vnpay_ipn?{}", query_string(&params)), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["RspCode"], "01");

    let token = app.sign_in("quan@example.vn").await;
    let (status, _) = app
        .json(get("/order/detail/NOSUCHORDER", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_orders_requires_admin_role() {
    let app = test_app();
    let token = app.sign_in("admin@example.vn").await;
    let (status, _) = app.json(get("/admin/orders", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.state
        .accounts
        .set_role("admin@example.vn", Role::Admin)
        .unwrap();
    let creds = json!({"email": "admin@example.vn", "password": "secret1"});
    let (_, login) = app.json(post_json("/login", None, &creds)).await;
    assert_eq!(login["user"]["role"], "admin");

    let admin = login["token"].as_str().unwrap();
    let (status, orders) = app.json(get("/admin/orders", Some(admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = test_app();
    let token = app.sign_in("son@example.vn").await;
    let (status, body) = app.json(post_json("/logout", Some(&token), &json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["logged_out"], true);

    let (status, _) = app.json(get("/cart/count", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
