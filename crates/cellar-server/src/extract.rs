//! Request extractors: bearer sessions and client facts.

use crate::error::ApiError;
use crate::state::SharedState;
use axum::extract::{ConnectInfo, FromRequestParts};
use cellar_auth::{AuthSession, Role};
use cellar_commerce::payment::vnpay::{client_ip, RequestContext};
use http::header::{AUTHORIZATION, HOST};
use http::request::Parts;
use http::HeaderMap;
use std::convert::Infallible;
use std::net::SocketAddr;

/// A signed-in user, from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthSession);

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Login required".into()))?;
        let now = chrono::Utc::now().timestamp();
        let session = state.accounts.authenticate(token, now)?;
        Ok(CurrentUser(session))
    }
}

/// A signed-in admin. Other users get 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthSession);

impl FromRequestParts<SharedState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(session) = CurrentUser::from_request_parts(parts, state).await?;
        session.require(Role::Admin)?;
        Ok(AdminUser(session))
    }
}

/// Buyer IP and forwarding headers, for payment URLs.
#[derive(Debug, Clone)]
pub struct ClientContext(pub RequestContext);

impl<S: Send + Sync> FromRequestParts<S> for ClientContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        let headers = &parts.headers;
        Ok(ClientContext(RequestContext {
            client_ip: client_ip(header(headers, "x-forwarded-for"), peer.as_deref()),
            forwarded_proto: header(headers, "x-forwarded-proto").map(str::to_string),
            host: header(headers, HOST.as_str()).map(str::to_string),
        }))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(
            bearer_token(&headers(&[("authorization", "Bearer abc123")])),
            Some("abc123")
        );
        assert_eq!(
            bearer_token(&headers(&[("authorization", "bearer  abc123 ")])),
            Some("abc123")
        );
        assert_eq!(bearer_token(&headers(&[("authorization", "Basic abc")])), None);
        assert_eq!(bearer_token(&headers(&[("authorization", "Bearer ")])), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_client_context_prefers_forwarded_for() {
        let request = http::Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .header("x-forwarded-proto", "https")
            .header("host", "shop.example")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 1], 4000))));

        let ClientContext(ctx) = ClientContext::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(ctx.client_ip, "203.0.113.9");
        assert_eq!(ctx.forwarded_proto.as_deref(), Some("https"));
        assert_eq!(ctx.host.as_deref(), Some("shop.example"));
    }
}
