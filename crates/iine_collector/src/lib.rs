pub mod collector;
pub mod pagination;
pub mod qiita;

use iine_core::{ArticleStore, CollectorConfig, InvocationResult, Result};
use std::sync::Arc;

pub use collector::{CollectReport, Collector};
pub use pagination::fetch_all_articles;
pub use qiita::QiitaClient;

/// Collector entry point: poll the configured listing into `store`.
pub async fn collect(config: &CollectorConfig, store: Arc<dyn ArticleStore>) -> Result<InvocationResult> {
    let client = QiitaClient::new(config.api_token.clone())?.with_listing_url(config.listing_url.clone());
    Collector::new(Arc::new(client), store, config.page_size).run().await
}

pub mod prelude {
    pub use super::{collect, CollectReport, Collector, QiitaClient};
    pub use iine_core::{ArticleRecord, Error, Result};
}
