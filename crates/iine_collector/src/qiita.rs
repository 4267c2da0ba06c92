//! HTTP client for the Qiita API v2 endpoints the pipeline reads.

use async_trait::async_trait;
use iine_core::config::{DEFAULT_API_BASE_URL, DEFAULT_LISTING_URL};
use iine_core::{ArticlePage, ArticleRecord, ArticleSource, Error, Liker, Result};
use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const TOTAL_COUNT_HEADER: &str = "Total-Count";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct LikeEntry {
    #[serde(default)]
    user: Option<LikeUser>,
}

#[derive(Debug, Deserialize)]
struct LikeUser {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QiitaClient {
    http: reqwest::Client,
    token: String,
    listing_url: Url,
    api_base_url: Url,
}

impl QiitaClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("iine/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            token: token.into(),
            listing_url: parse_default(DEFAULT_LISTING_URL)?,
            api_base_url: parse_default(DEFAULT_API_BASE_URL)?,
        })
    }

    pub fn with_listing_url(mut self, url: Url) -> Self {
        self.listing_url = url;
        self
    }

    pub fn with_api_base_url(mut self, url: Url) -> Self {
        self.api_base_url = url;
        self
    }

    pub fn likes_url(&self, article_id: &str) -> Result<Url> {
        likes_url(&self.api_base_url, article_id)
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response> {
        let response = self.http.get(url).bearer_auth(&self.token).send().await?;
        ensure_success(response).await
    }
}

fn parse_default(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::Config(format!("Invalid URL {}: {}", raw, e)))
}

/// `<base>/api/v2/items/<id>/likes`, with the id percent-encoded as one segment.
pub fn likes_url(base: &Url, article_id: &str) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("API base URL cannot carry a path: {}", base)))?
        .pop_if_empty()
        .extend(["api", "v2", "items", article_id, "likes"]);
    Ok(url)
}

pub fn listing_page_url(listing_url: &Url, page: u32, per_page: u32) -> Url {
    let mut url = listing_url.clone();
    url.query_pairs_mut()
        .append_pair("page", &page.to_string())
        .append_pair("per_page", &per_page.to_string());
    url
}

pub fn parse_total_count(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(TOTAL_COUNT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

pub fn parse_likers(body: &str) -> Result<Vec<Liker>> {
    let entries: Vec<LikeEntry> = serde_json::from_str(body)?;
    Ok(entries
        .into_iter()
        .map(|entry| Liker {
            user_id: entry.user.and_then(|user| user.id).unwrap_or_default(),
        })
        .collect())
}

pub fn parse_items(body: &str) -> Result<Vec<ArticleRecord>> {
    Ok(serde_json::from_str(body)?)
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::from_status(status.as_u16(), body))
}

#[async_trait]
impl ArticleSource for QiitaClient {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<ArticlePage> {
        let url = listing_page_url(&self.listing_url, page, per_page);
        tracing::debug!(page, per_page, "fetching article listing page");

        let response = self.get(url).await?;
        let total_count = parse_total_count(response.headers());
        let body = response.text().await?;

        Ok(ArticlePage {
            items: parse_items(&body)?,
            total_count,
        })
    }

    async fn fetch_likers(&self, article_id: &str) -> Result<Vec<Liker>> {
        let url = self.likes_url(article_id)?;
        tracing::debug!(article_id, "fetching likers");

        let body = self.get(url).await?.text().await?;
        parse_likers(&body)
    }
}
