use async_trait::async_trait;
use crate::types::{ArticlePage, Liker};
use crate::Result;

#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch one page of the authenticated user's articles
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<ArticlePage>;

    /// Fetch everyone who liked an article, most recent first
    async fn fetch_likers(&self, article_id: &str) -> Result<Vec<Liker>>;
}
