//! VNPay hosted-checkout gateway.
//!
//! Outgoing payment URLs and incoming callbacks share one signing scheme:
//! parameters sorted by key, values form-urlencoded (space as `+`), joined
//! as `k=v&k=v`, then HMAC-SHA512 with the merchant secret rendered as
//! lowercase hex in `vnp_SecureHash`.

use crate::ids::{OrderId, VN_OFFSET_HOURS};
use crate::money::{Currency, Money};
use crate::payment::{PaymentError, PaymentOutcome};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use std::collections::BTreeMap;
use std::net::Ipv6Addr;

type HmacSha512 = Hmac<Sha512>;

const VERSION: &str = "2.1.0";
const COMMAND: &str = "pay";
const ORDER_TYPE: &str = "other";
const SECURE_HASH: &str = "vnp_SecureHash";
const SECURE_HASH_TYPE: &str = "vnp_SecureHashType";
const DATE_FORMAT: &str = "%Y%m%d%H%M%S";

/// Default path of the browser return callback.
pub const RETURN_PATH: &str = "/order/vnpay_return";
/// Default path of the server-to-server notification.
pub const IPN_PATH: &str = "/order/vnpay_ipn";

/// Merchant settings.
#[derive(Debug, Clone)]
pub struct VnpayConfig {
    pub tmn_code: String,
    pub hash_secret: String,
    /// Gateway checkout endpoint.
    pub pay_url: String,
    /// Explicit return URL; derived from the request when absent.
    pub return_url: Option<String>,
    /// Explicit IPN URL; only validated, the gateway reads it from the merchant portal.
    pub ipn_url: Option<String>,
    /// Public https origin of this server, used to derive callback URLs.
    pub public_base_url: Option<String>,
    pub locale: String,
    /// How long the buyer has to complete payment.
    pub order_ttl: Duration,
}

impl VnpayConfig {
    pub fn new(
        tmn_code: impl Into<String>,
        hash_secret: impl Into<String>,
        pay_url: impl Into<String>,
    ) -> Self {
        Self {
            tmn_code: tmn_code.into(),
            hash_secret: hash_secret.into(),
            pay_url: pay_url.into(),
            return_url: None,
            ipn_url: None,
            public_base_url: None,
            locale: "vn".to_string(),
            order_ttl: Duration::minutes(15),
        }
    }

    fn validate(&self) -> Result<(), PaymentError> {
        for (name, value) in [
            ("VNPAY_TMNCODE", &self.tmn_code),
            ("VNPAY_HASHSECRET", &self.hash_secret),
            ("VNPAY_URL", &self.pay_url),
        ] {
            if value.trim().is_empty() {
                return Err(PaymentError::NotConfigured(format!("{name} is empty")));
            }
        }
        for (name, value) in [
            ("VNPAY_RETURNURL", &self.return_url),
            ("VNPAY_IPNURL", &self.ipn_url),
            ("PUBLIC_BASE_URL", &self.public_base_url),
        ] {
            if let Some(url) = value.as_deref().filter(|u| !u.trim().is_empty()) {
                ensure_https(url, name)?;
            }
        }
        Ok(())
    }
}

/// Request facts needed to derive callback URLs and the buyer's IP.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub client_ip: String,
    /// First value of `X-Forwarded-Proto`, if any.
    pub forwarded_proto: Option<String>,
    /// `Host` header.
    pub host: Option<String>,
}

/// Signs payment requests and verifies callbacks.
#[derive(Debug, Clone)]
pub struct VnpayGateway {
    config: VnpayConfig,
}

impl VnpayGateway {
    pub fn new(config: VnpayConfig) -> Result<Self, PaymentError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &VnpayConfig {
        &self.config
    }

    /// Return URL for this request.
    pub fn return_url(&self, ctx: &RequestContext) -> Result<String, PaymentError> {
        resolve_callback_url(
            self.config.return_url.as_deref(),
            self.config.public_base_url.as_deref(),
            ctx.forwarded_proto.as_deref(),
            ctx.host.as_deref(),
            RETURN_PATH,
        )
    }

    /// IPN URL for this request.
    pub fn ipn_url(&self, ctx: &RequestContext) -> Result<String, PaymentError> {
        resolve_callback_url(
            self.config.ipn_url.as_deref(),
            self.config.public_base_url.as_deref(),
            ctx.forwarded_proto.as_deref(),
            ctx.host.as_deref(),
            IPN_PATH,
        )
    }

    /// Build the signed checkout URL the buyer is redirected to.
    pub fn payment_url(
        &self,
        txn_ref: &OrderId,
        amount: Money,
        ctx: &RequestContext,
        now: DateTime<Utc>,
    ) -> Result<String, PaymentError> {
        if amount.currency != Currency::VND {
            return Err(PaymentError::UnsupportedAmount(format!(
                "gateway only accepts VND, got {}",
                amount.currency
            )));
        }
        let gateway_amount = amount
            .amount
            .checked_mul(100)
            .filter(|a| *a > 0)
            .ok_or_else(|| PaymentError::UnsupportedAmount(amount.display()))?;

        let return_url = self.return_url(ctx)?;
        let ipn_url = self.ipn_url(ctx)?;
        tracing::debug!(order_id = %txn_ref, %return_url, %ipn_url, "resolved vnpay callbacks");

        let local = now.naive_utc() + Duration::hours(VN_OFFSET_HOURS);
        let expire = local + self.config.order_ttl;

        let mut params = BTreeMap::new();
        params.insert("vnp_Version", VERSION.to_string());
        params.insert("vnp_Command", COMMAND.to_string());
        params.insert("vnp_TmnCode", self.config.tmn_code.clone());
        params.insert("vnp_Locale", self.config.locale.clone());
        params.insert("vnp_CurrCode", Currency::VND.code().to_string());
        params.insert("vnp_TxnRef", txn_ref.to_string());
        params.insert("vnp_OrderInfo", format!("Thanh toan don hang {txn_ref}"));
        params.insert("vnp_OrderType", ORDER_TYPE.to_string());
        params.insert("vnp_Amount", gateway_amount.to_string());
        params.insert("vnp_ReturnUrl", return_url);
        params.insert("vnp_IpAddr", normalize_client_ip(&ctx.client_ip));
        params.insert("vnp_CreateDate", local.format(DATE_FORMAT).to_string());
        params.insert("vnp_ExpireDate", expire.format(DATE_FORMAT).to_string());

        let query = encode(&params)?;
        let signature = sign(&self.config.hash_secret, &query)?;
        let sep = if self.config.pay_url.contains('?') { '&' } else { '?' };
        Ok(format!(
            "{}{sep}{query}&{SECURE_HASH}={signature}",
            self.config.pay_url
        ))
    }

    /// Add `vnp_SecureHash` to a parameter set, as the gateway does for
    /// callbacks. Used by sandbox tooling and callback fixtures.
    pub fn sign_params(&self, params: &mut BTreeMap<String, String>) -> Result<(), PaymentError> {
        params.remove(SECURE_HASH);
        params.remove(SECURE_HASH_TYPE);
        let signature = sign(&self.config.hash_secret, &encode(params)?)?;
        params.insert(SECURE_HASH.to_string(), signature);
        Ok(())
    }

    /// Check a callback's signature.
    ///
    /// `params` are the decoded query (or form) parameters as received.
    pub fn verify(&self, params: &BTreeMap<String, String>) -> Result<VerifiedCallback, PaymentError> {
        let provided = params
            .get(SECURE_HASH)
            .ok_or(PaymentError::InvalidSignature)?;
        let provided = hex::decode(provided.trim()).map_err(|_| PaymentError::InvalidSignature)?;

        let signed: BTreeMap<String, String> = params
            .iter()
            .filter(|(k, _)| k.as_str() != SECURE_HASH && k.as_str() != SECURE_HASH_TYPE)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let data = encode(&signed)?;

        let mut mac = HmacSha512::new_from_slice(self.config.hash_secret.as_bytes())
            .map_err(|e| PaymentError::InvalidConfig {
                name: "VNPAY_HASHSECRET",
                reason: e.to_string(),
            })?;
        mac.update(data.as_bytes());
        mac.verify_slice(&provided)
            .map_err(|_| PaymentError::InvalidSignature)?;

        Ok(VerifiedCallback { params: signed })
    }
}

/// A callback whose signature checked out.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedCallback {
    params: BTreeMap<String, String>,
}

impl VerifiedCallback {
    fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn txn_ref(&self) -> Result<OrderId, PaymentError> {
        self.get("vnp_TxnRef")
            .map(OrderId::new)
            .ok_or(PaymentError::MissingParam("vnp_TxnRef"))
    }

    pub fn response_code(&self) -> Option<&str> {
        self.get("vnp_ResponseCode")
    }

    pub fn transaction_status(&self) -> Option<&str> {
        self.get("vnp_TransactionStatus")
    }

    /// Paid amount converted back from the gateway's x100 format.
    pub fn amount(&self) -> Option<Money> {
        let raw: i64 = self.get("vnp_Amount")?.parse().ok()?;
        (raw % 100 == 0).then(|| Money::vnd(raw / 100))
    }

    pub fn bank_code(&self) -> Option<&str> {
        self.get("vnp_BankCode")
    }

    pub fn transaction_no(&self) -> Option<&str> {
        self.get("vnp_TransactionNo")
    }

    /// Success requires response code `00` and, when present, transaction status `00`.
    pub fn outcome(&self) -> PaymentOutcome {
        let response = self.response_code().unwrap_or_default();
        match (response, self.transaction_status()) {
            ("00", None | Some("00")) => PaymentOutcome::Succeeded,
            ("00", Some(status)) => PaymentOutcome::Declined {
                code: status.to_string(),
            },
            (code, _) => PaymentOutcome::Declined {
                code: if code.is_empty() { "unknown".into() } else { code.to_string() },
            },
        }
    }

    /// All signed parameters, for storing alongside the order.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.params
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }
}

/// Body returned to the gateway's IPN call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpnAck {
    #[serde(rename = "RspCode")]
    pub rsp_code: String,
    #[serde(rename = "Message")]
    pub message: String,
}

impl IpnAck {
    fn new(code: &str, message: &str) -> Self {
        Self {
            rsp_code: code.to_string(),
            message: message.to_string(),
        }
    }

    pub fn success() -> Self {
        Self::new("00", "Success")
    }

    pub fn order_not_found() -> Self {
        Self::new("01", "Order not found")
    }

    pub fn already_confirmed() -> Self {
        Self::new("02", "Order already confirmed")
    }

    pub fn invalid_amount() -> Self {
        Self::new("04", "Invalid amount")
    }

    pub fn invalid_signature() -> Self {
        Self::new("97", "Invalid signature")
    }

    pub fn unknown_error() -> Self {
        Self::new("99", "Unknown error")
    }
}

/// Pick the callback URL: explicit setting, then the public base URL, then
/// the request's own host when it arrived over HTTPS.
pub fn resolve_callback_url(
    explicit: Option<&str>,
    public_base: Option<&str>,
    forwarded_proto: Option<&str>,
    host: Option<&str>,
    path: &str,
) -> Result<String, PaymentError> {
    if let Some(url) = explicit.map(str::trim).filter(|u| !u.is_empty()) {
        return ensure_https(url, path).map(str::to_string);
    }

    if let Some(base) = public_base.map(str::trim).filter(|u| !u.is_empty()) {
        let base = ensure_https(base, "PUBLIC_BASE_URL")?;
        return Ok(format!("{}{path}", origin(base)));
    }

    let host = host
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| PaymentError::CallbackUrl {
            path: path.to_string(),
            reason: "request has no Host header".into(),
        })?;
    let proto = forwarded_proto
        .and_then(|p| p.split(',').next())
        .map(str::trim)
        .unwrap_or("http");
    if !proto.eq_ignore_ascii_case("https") {
        return Err(PaymentError::CallbackUrl {
            path: path.to_string(),
            reason: "HTTPS is required; set an explicit callback URL or PUBLIC_BASE_URL".into(),
        });
    }
    Ok(format!("https://{host}{path}"))
}

/// Normalize a client address for the gateway, which only accepts IPv4.
pub fn normalize_client_ip(raw: &str) -> String {
    let ip = raw.trim();
    if ip.is_empty() || ip == "::1" {
        return "127.0.0.1".to_string();
    }
    if let Some(v4) = ip.strip_prefix("::ffff:") {
        return v4.to_string();
    }
    if ip.parse::<Ipv6Addr>().is_ok() {
        return "127.0.0.1".to_string();
    }
    ip.to_string()
}

/// Client address from `X-Forwarded-For` (first hop) or the socket peer.
pub fn client_ip(forwarded_for: Option<&str>, peer: Option<&str>) -> String {
    let forwarded = forwarded_for
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    normalize_client_ip(forwarded.or(peer).unwrap_or_default())
}

fn ensure_https<'a>(url: &'a str, name: &str) -> Result<&'a str, PaymentError> {
    let starts_https = url
        .get(..8)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"));
    if starts_https {
        Ok(url)
    } else {
        Err(PaymentError::CallbackUrl {
            path: name.to_string(),
            reason: format!("{url} must start with https://"),
        })
    }
}

/// `https://host[:port]` part of an absolute URL.
fn origin(url: &str) -> &str {
    let rest = &url[8..];
    match rest.find('/') {
        Some(i) => &url[..8 + i],
        None => url,
    }
}

fn encode<K: Ord + Serialize>(
    params: &BTreeMap<K, String>,
) -> Result<String, PaymentError> {
    serde_urlencoded::to_string(params).map_err(|e| PaymentError::Encoding(e.to_string()))
}

fn sign(secret: &str, data: &str) -> Result<String, PaymentError> {
    let mut mac =
        HmacSha512::new_from_slice(secret.as_bytes()).map_err(|e| PaymentError::InvalidConfig {
            name: "VNPAY_HASHSECRET",
            reason: e.to_string(),
        })?;
    mac.update(data.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
