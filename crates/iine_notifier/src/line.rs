use async_trait::async_trait;
use iine_core::config::DEFAULT_CHANNEL_URL;
use iine_core::{DeliveryResult, Error, NotificationChannel, Result};
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// LINE Notify client: one form field, bearer token.
#[derive(Debug, Clone)]
pub struct LineNotifyClient {
    http: reqwest::Client,
    token: String,
    endpoint: Url,
}

impl LineNotifyClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let endpoint = Url::parse(DEFAULT_CHANNEL_URL)
            .map_err(|e| Error::Config(format!("Invalid URL {}: {}", DEFAULT_CHANNEL_URL, e)))?;
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            token: token.into(),
            endpoint,
        })
    }

    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }
}

/// Body of the POST: `message=<urlencoded text>`.
pub fn form_body(message: &str) -> [(&'static str, &str); 1] {
    [("message", message)]
}

/// Decodes the endpoint's JSON reply, falling back to the bare status code.
pub fn parse_delivery(status: u16, body: &str) -> DeliveryResult {
    serde_json::from_str(body).unwrap_or(DeliveryResult {
        status,
        message: body.to_string(),
    })
}

#[async_trait]
impl NotificationChannel for LineNotifyClient {
    async fn send(&self, message: &str) -> Result<DeliveryResult> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .form(&form_body(message))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::from_status(status.as_u16(), body));
        }
        Ok(parse_delivery(status.as_u16(), &body))
    }
}
