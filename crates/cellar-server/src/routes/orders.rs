//! Checkout, payment callbacks and order history.

use crate::error::ApiError;
use crate::extract::{AdminUser, ClientContext, CurrentUser};
use crate::state::{blocking, SharedState};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cellar_commerce::checkout::{CustomerInfo, Order, PaymentMethod, PlacedOrder, ReturnResult};
use cellar_commerce::payment::IpnAck;
use cellar_commerce::OrderId;
use chrono::Utc;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;

type Params = BTreeMap<String, String>;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/order/create-payment", post(create_payment))
        .route("/order/vnpay_return", get(vnpay_return))
        .route("/order/vnpay_ipn", get(vnpay_ipn_query).post(vnpay_ipn_body))
        .route("/order/detail/{order_id}", get(detail))
        .route("/my-orders", get(my_orders))
        .route("/admin/orders", get(admin_orders))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

async fn create_payment(
    State(state): State<SharedState>,
    CurrentUser(session): CurrentUser,
    ClientContext(ctx): ClientContext,
    Json(body): Json<CreatePaymentRequest>,
) -> Result<Response, ApiError> {
    let customer = CustomerInfo {
        name: body.name,
        phone: body.phone,
        address: body.address,
    };
    let method = body.payment_method;
    let placed = blocking(&state, move |s| {
        s.checkout
            .place_order(&session.user_id, customer, method, &ctx, Utc::now())
    })
    .await?;

    Ok(match placed {
        PlacedOrder::Cod(order) => (StatusCode::CREATED, Json(order)).into_response(),
        PlacedOrder::Redirect { payment_url, .. } => Redirect::to(&payment_url).into_response(),
    })
}

async fn vnpay_return(
    State(state): State<SharedState>,
    Query(params): Query<Params>,
) -> Result<Json<ReturnResult>, ApiError> {
    let result = blocking(&state, move |s| s.checkout.handle_return(&params, Utc::now())).await?;
    Ok(Json(result))
}

async fn vnpay_ipn_query(
    State(state): State<SharedState>,
    Query(params): Query<Params>,
) -> Json<IpnAck> {
    Json(acknowledge(&state, params).await)
}

/// IPN delivered as a POST: form or JSON body, falling back to the query.
async fn vnpay_ipn_body(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<Params>,
    body: Bytes,
) -> Json<IpnAck> {
    let params = if body.iter().all(u8::is_ascii_whitespace) {
        query
    } else {
        match parse_body(&headers, &body) {
            Ok(params) => params,
            Err(reason) => {
                tracing::warn!(%reason, "unreadable IPN body");
                return Json(IpnAck::unknown_error());
            }
        }
    };
    Json(acknowledge(&state, params).await)
}

async fn acknowledge(state: &SharedState, params: Params) -> IpnAck {
    let acked = blocking(state, move |s| {
        Ok::<_, ApiError>(s.checkout.handle_ipn(&params, Utc::now()))
    })
    .await;
    acked.unwrap_or_else(|e| {
        tracing::error!(error = %e, "IPN handler failed");
        IpnAck::unknown_error()
    })
}

fn parse_body(headers: &HeaderMap, body: &[u8]) -> Result<Params, String> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    if !is_json {
        return serde_urlencoded::from_bytes(body).map_err(|e| e.to_string());
    }

    let values: BTreeMap<String, serde_json::Value> =
        serde_json::from_slice(body).map_err(|e| e.to_string())?;
    Ok(values
        .into_iter()
        .map(|(k, v)| match v {
            serde_json::Value::String(s) => (k, s),
            other => (k, other.to_string()),
        })
        .collect())
}

async fn detail(
    State(state): State<SharedState>,
    CurrentUser(session): CurrentUser,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order = blocking(&state, move |s| {
        s.checkout
            .order_detail(&session.user_id, &OrderId::new(order_id), Utc::now())
    })
    .await?;
    Ok(Json(order))
}

async fn my_orders(
    State(state): State<SharedState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = blocking(&state, move |s| {
        s.checkout.order_history(&session.user_id, Utc::now())
    })
    .await?;
    Ok(Json(orders))
}

async fn admin_orders(
    State(state): State<SharedState>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = blocking(&state, |s| s.checkout.all_orders()).await?;
    Ok(Json(orders))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_form_and_json_bodies() {
        let mut headers = HeaderMap::new();
        let form = parse_body(&headers, b"vnp_TxnRef=241224&vnp_OrderInfo=Thanh+toan").unwrap();
        assert_eq!(form["vnp_OrderInfo"], "Thanh toan");

        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        let json = parse_body(&headers, br#"{"vnp_TxnRef":"241224","vnp_Amount":52000000}"#)
            .unwrap();
        assert_eq!(json["vnp_Amount"], "52000000");

        assert!(parse_body(&headers, b"{not json").is_err());
    }
}
