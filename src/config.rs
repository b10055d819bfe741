//! Command-line and environment configuration for the terminal tracker.
//!
//! Every option can also come from the environment (or a `.env` file loaded
//! by the binary), which is how the hosting environment supplies the base URL.

use crate::clients::SessionContext;
use crate::model::{OrderId, RestaurantId};
use clap::Parser;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Parser)]
#[command(name = "nore-track", version, about = "Follow a Nore Menu order live from the terminal")]
pub struct TrackerArgs {
    /// Identifier of the order to follow
    pub order_id: String,

    /// Base URL of the Order Query Service
    #[arg(long, env = "NORE_API_URL")]
    pub api_url: String,

    /// Base URL of the realtime gateway (defaults to the API URL)
    #[arg(long, env = "NORE_REALTIME_URL")]
    pub realtime_url: Option<String>,

    /// Restaurant whose branding is used for display
    #[arg(long, env = "NORE_RESTAURANT_ID")]
    pub restaurant_id: Option<String>,

    #[arg(long, env = "NORE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    #[arg(long, env = "NORE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Timeout for lookups, in seconds
    #[arg(long, env = "NORE_HTTP_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Do not ring the terminal bell when the order is ready
    #[arg(long)]
    pub silent: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Order id must not be empty")]
    EmptyOrderId,

    #[error("Invalid {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        source: url::ParseError,
    },

    #[error("{field} must be an http(s) URL, got {url}")]
    UnsupportedScheme { field: &'static str, url: String },

    #[error("Timeout must be at least one second")]
    ZeroTimeout,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub order_id: OrderId,
    pub api_url: Url,
    pub realtime_url: Url,
    pub restaurant_id: Option<RestaurantId>,
    pub session: SessionContext,
    pub timeout: Duration,
    pub alert_enabled: bool,
}

impl TryFrom<TrackerArgs> for TrackerConfig {
    type Error = ConfigError;

    fn try_from(args: TrackerArgs) -> Result<Self, Self::Error> {
        let order_id = args.order_id.trim();
        if order_id.is_empty() {
            return Err(ConfigError::EmptyOrderId);
        }
        if args.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let api_url = parse_http_url("api_url", &args.api_url)?;
        let realtime_url = match &args.realtime_url {
            Some(url) => parse_http_url("realtime_url", url)?,
            None => api_url.clone(),
        };

        let mut session = SessionContext::anonymous();
        if let Some(token) = args.access_token.filter(|t| !t.is_empty()) {
            session = session.with_access_token(token);
        }
        if let Some(key) = args.api_key.filter(|k| !k.is_empty()) {
            session = session.with_api_key(key);
        }

        Ok(Self {
            order_id: OrderId::from(order_id),
            api_url,
            realtime_url,
            restaurant_id: args
                .restaurant_id
                .filter(|id| !id.trim().is_empty())
                .map(RestaurantId::from),
            session,
            timeout: Duration::from_secs(args.timeout_secs),
            alert_enabled: !args.silent,
        })
    }
}

fn parse_http_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { field, source })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::UnsupportedScheme {
            field,
            url: raw.to_string(),
        }),
    }
}
