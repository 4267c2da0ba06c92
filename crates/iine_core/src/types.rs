use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last known state of one article. Missing fields decode to empty/zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleRecord {
    pub id: String,
    pub title: String,
    #[serde(alias = "likes_count")]
    pub like_count: u64,
}

impl ArticleRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, like_count: u64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            like_count,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Insert,
    Modify,
    Remove,
    #[default]
    #[serde(other)]
    Other,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Insert => "INSERT",
            EventKind::Modify => "MODIFY",
            EventKind::Remove => "REMOVE",
            EventKind::Other => "OTHER",
        }
    }

    pub fn parse(kind: &str) -> Self {
        match kind {
            "INSERT" => EventKind::Insert,
            "MODIFY" => EventKind::Modify,
            "REMOVE" => EventKind::Remove,
            _ => EventKind::Other,
        }
    }
}

/// One entry of the store's change feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeRecord {
    pub event_kind: EventKind,
    pub before: Option<ArticleRecord>,
    pub after: Option<ArticleRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl ChangeRecord {
    pub fn insert(after: ArticleRecord) -> Self {
        Self {
            event_kind: EventKind::Insert,
            before: None,
            after: Some(after),
            recorded_at: Some(Utc::now()),
        }
    }

    pub fn modify(before: ArticleRecord, after: ArticleRecord) -> Self {
        Self {
            event_kind: EventKind::Modify,
            before: Some(before),
            after: Some(after),
            recorded_at: Some(Utc::now()),
        }
    }
}

/// Likers observed since the last recorded count of an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub article_id: String,
    pub title: String,
    pub new_likers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liker {
    pub user_id: String,
}

/// One page of the article listing.
#[derive(Debug, Clone, Default)]
pub struct ArticlePage {
    pub items: Vec<ArticleRecord>,
    /// Value of the `Total-Count` header, when the service sent one.
    pub total_count: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    Modified,
}

/// What an entry point hands back to its trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl InvocationResult {
    pub const OK: Self = Self { status_code: 200 };
    pub const FAILED: Self = Self { status_code: 500 };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_record_missing_fields_default() {
        let record: ChangeRecord =
            serde_json::from_str(r#"{"event_kind":"MODIFY","before":{"id":"a1"},"after":{}}"#)
                .unwrap();
        assert_eq!(record.event_kind, EventKind::Modify);
        assert_eq!(record.before.as_ref().unwrap().like_count, 0);
        assert_eq!(record.after.as_ref().unwrap().title, "");
    }

    #[test]
    fn test_unknown_event_kind_decodes_to_other() {
        let record: ChangeRecord = serde_json::from_str(r#"{"event_kind":"TRUNCATE"}"#).unwrap();
        assert_eq!(record.event_kind, EventKind::Other);
        let record: ChangeRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record.event_kind, EventKind::Other);
    }

    #[test]
    fn test_article_record_accepts_api_field_name() {
        let record: ArticleRecord =
            serde_json::from_str(r#"{"id":"a1","title":"Intro","likes_count":4,"body":"..."}"#)
                .unwrap();
        assert_eq!(record, ArticleRecord::new("a1", "Intro", 4));
    }

    #[test]
    fn test_invocation_result_wire_name() {
        let json = serde_json::to_string(&InvocationResult::OK).unwrap();
        assert_eq!(json, r#"{"statusCode":200}"#);
    }
}
