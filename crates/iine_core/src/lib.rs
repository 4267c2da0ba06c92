pub mod channel;
pub mod config;
pub mod error;
pub mod logging;
pub mod source;
pub mod storage;
pub mod stream;
pub mod types;

pub use channel::{DeliveryResult, NotificationChannel};
pub use config::{CollectorConfig, NotifierConfig};
pub use error::{Error, Result};
pub use source::ArticleSource;
pub use storage::ArticleStore;
pub use types::{
    ArticlePage, ArticleRecord, ChangeRecord, DiffResult, EventKind, InvocationResult, Liker,
    WriteOutcome,
};
