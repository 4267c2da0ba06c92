//! Configuration for the collector and notifier entry points.
//!
//! Both are built from environment-style keys. `from_env` reads the process
//! environment; `from_lookup` takes any key lookup so callers can supply
//! values from elsewhere.

use url::Url;

use crate::{Error, Result};

pub const DEFAULT_LISTING_URL: &str = "https://qiita.com/api/v2/authenticated_user/items";
pub const DEFAULT_API_BASE_URL: &str = "https://qiita.com";
pub const DEFAULT_CHANNEL_URL: &str = "https://notify-api.line.me/api/notify";
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Settings for one collector run.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Bearer token for the listing API
    pub api_token: String,

    /// Listing endpoint, queried with `page` and `per_page`
    pub listing_url: Url,

    /// Items requested per page
    pub page_size: u32,
}

impl CollectorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = required(&lookup, "API_TOKEN")?;
        let listing_url = parse_url(
            "LISTING_URL",
            &lookup("LISTING_URL").unwrap_or_else(|| DEFAULT_LISTING_URL.to_string()),
        )?;
        let page_size = match lookup("PAGE_SIZE") {
            Some(raw) => parse_page_size(&raw)?,
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            api_token,
            listing_url,
            page_size,
        })
    }
}

/// Settings for one notifier invocation.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Bearer token for the likers API
    pub api_token: String,

    /// Bearer token for the push channel
    pub channel_token: String,

    /// Scheme and host serving `/api/v2/items/<id>/likes`
    pub api_base_url: Url,

    /// Push endpoint receiving the form-encoded message
    pub channel_url: Url,
}

impl NotifierConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = required(&lookup, "API_TOKEN")?;
        let channel_token = required(&lookup, "CHANNEL_TOKEN")?;
        let api_base_url = parse_url(
            "API_BASE_URL",
            &lookup("API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        )?;
        let channel_url = parse_url(
            "CHANNEL_URL",
            &lookup("CHANNEL_URL").unwrap_or_else(|| DEFAULT_CHANNEL_URL.to_string()),
        )?;

        Ok(Self {
            api_token,
            channel_token,
            api_base_url,
            channel_url,
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Config(format!("{} must be set", key))),
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::Config(format!("{} is not a valid URL ({}): {}", key, raw, e)))
}

fn parse_page_size(raw: &str) -> Result<u32> {
    match raw.trim().parse::<u32>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(Error::Config(format!(
            "PAGE_SIZE must be a positive integer, got {:?}",
            raw
        ))),
    }
}
