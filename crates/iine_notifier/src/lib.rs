pub mod formatter;
pub mod line;
pub mod notifier;
pub mod reconciler;

use iine_collector::QiitaClient;
use iine_core::{ChangeRecord, NotifierConfig, Result};
use std::sync::Arc;

pub use formatter::{format_default, format_message, truncate_title};
pub use line::LineNotifyClient;
pub use notifier::{Notifier, NotifierResponse, RecordOutcome};
pub use reconciler::DiffReconciler;

/// Builds the notifier wired to Qiita and LINE Notify from `config`.
pub fn notifier_from_config(config: &NotifierConfig) -> Result<Notifier> {
    let source = QiitaClient::new(config.api_token.clone())?.with_api_base_url(config.api_base_url.clone());
    let channel = LineNotifyClient::new(config.channel_token.clone())?.with_endpoint(config.channel_url.clone());
    Ok(Notifier::new(Arc::new(source), Arc::new(channel)))
}

/// Notifier entry point for one batch of change records.
pub async fn notify(config: &NotifierConfig, batch: &[ChangeRecord]) -> Result<NotifierResponse> {
    let notifier = notifier_from_config(config)?;
    Ok(notifier.handle(batch).await)
}

pub mod prelude {
    pub use super::{notify, Notifier, NotifierResponse, RecordOutcome};
    pub use iine_core::{ChangeRecord, DiffResult, Error, Result};
}
