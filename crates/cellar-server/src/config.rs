//! Server configuration: `cellar.toml`, then environment overrides.

use crate::telemetry::LogFormat;
use anyhow::{Context, Result};
use cellar_commerce::payment::{VnpayConfig, VnpayGateway};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Config file read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_PATH: &str = "cellar.toml";

const SANDBOX_PAY_URL: &str = "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub log: LogConfig,

    /// VNPay merchant settings. VNPay checkout is unavailable without them.
    #[serde(default)]
    pub vnpay: Option<VnpaySettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Public https origin, used to derive payment callback URLs.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            public_base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/cellar.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,

    /// `EnvFilter` directives; `RUST_LOG` takes precedence.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VnpaySettings {
    #[serde(default)]
    pub tmn_code: String,

    #[serde(default)]
    pub hash_secret: String,

    #[serde(default = "default_pay_url")]
    pub pay_url: String,

    #[serde(default)]
    pub return_url: Option<String>,

    #[serde(default)]
    pub ipn_url: Option<String>,

    #[serde(default = "default_locale")]
    pub locale: String,

    /// Minutes the buyer has to complete payment.
    #[serde(default = "default_order_ttl")]
    pub order_ttl_minutes: i64,
}

fn default_pay_url() -> String {
    SANDBOX_PAY_URL.to_string()
}

fn default_locale() -> String {
    "vn".to_string()
}

fn default_order_ttl() -> i64 {
    15
}

impl Default for VnpaySettings {
    fn default() -> Self {
        Self {
            tmn_code: String::new(),
            hash_secret: String::new(),
            pay_url: default_pay_url(),
            return_url: None,
            ipn_url: None,
            locale: default_locale(),
            order_ttl_minutes: default_order_ttl(),
        }
    }
}

impl Config {
    /// Load `.env`, the config file and environment overrides.
    ///
    /// An explicit `path` must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Override settings from environment variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = var("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port: {port}"))?;
        }
        if let Some(addr) = var("BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(url) = var("PUBLIC_BASE_URL") {
            self.server.public_base_url = Some(url);
        }
        if let Some(path) = var("DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.log.format = format.parse()?;
        }

        let vnpay_vars = [
            "VNPAY_TMNCODE",
            "VNPAY_HASHSECRET",
            "VNPAY_URL",
            "VNPAY_RETURNURL",
            "VNPAY_IPNURL",
        ];
        if vnpay_vars.iter().any(|key| var(key).is_some()) {
            let vnpay = self.vnpay.get_or_insert_with(VnpaySettings::default);
            if let Some(code) = var("VNPAY_TMNCODE") {
                vnpay.tmn_code = code;
            }
            if let Some(secret) = var("VNPAY_HASHSECRET") {
                vnpay.hash_secret = secret;
            }
            if let Some(url) = var("VNPAY_URL") {
                vnpay.pay_url = url;
            }
            if let Some(url) = var("VNPAY_RETURNURL") {
                vnpay.return_url = Some(url);
            }
            if let Some(url) = var("VNPAY_IPNURL") {
                vnpay.ipn_url = Some(url);
            }
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.bind_addr, self.server.port);
        addr.parse()
            .with_context(|| format!("Invalid bind address: {addr}"))
    }

    /// Build the payment gateway. `None` when no merchant code or secret is set.
    pub fn gateway(&self) -> Result<Option<VnpayGateway>> {
        let Some(settings) = &self.vnpay else {
            return Ok(None);
        };
        if settings.tmn_code.trim().is_empty() || settings.hash_secret.trim().is_empty() {
            return Ok(None);
        }

        let mut config = VnpayConfig::new(
            settings.tmn_code.trim(),
            settings.hash_secret.trim(),
            settings.pay_url.trim(),
        );
        config.return_url = settings.return_url.clone();
        config.ipn_url = settings.ipn_url.clone();
        config.public_base_url = self.server.public_base_url.clone();
        config.locale = settings.locale.clone();
        config.order_ttl = chrono::Duration::minutes(settings.order_ttl_minutes);

        let gateway = VnpayGateway::new(config).context("Invalid VNPay configuration")?;
        Ok(Some(gateway))
    }
}
