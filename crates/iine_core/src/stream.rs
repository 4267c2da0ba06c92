//! Decoding of change-feed batches handed to the notifier.
//!
//! Two shapes are accepted: a plain JSON array of [`ChangeRecord`]s, and a
//! DynamoDB stream event (`{"Records": [...]}`) whose images use the typed
//! attribute encoding (`{"S": ...}`, `{"N": ...}`). Missing attributes fall
//! back to empty strings and zero.

use serde_json::Value;

use crate::types::{ArticleRecord, ChangeRecord, EventKind};
use crate::Result;

const ID_ATTR: &str = "ids";
const TITLE_ATTR: &str = "title";
const LIKES_ATTR: &str = "iine";

pub fn decode_batch(value: Value) -> Result<Vec<ChangeRecord>> {
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(ref map) if map.contains_key("Records") => Ok(map["Records"]
            .as_array()
            .map(|records| records.iter().map(decode_stream_record).collect())
            .unwrap_or_default()),
        _ => Err(<serde_json::Error as serde::de::Error>::custom(
            "expected an array of change records or an object with a Records array",
        )
        .into()),
    }
}

pub fn decode_stream_record(record: &Value) -> ChangeRecord {
    let event_kind = record
        .get("eventName")
        .and_then(Value::as_str)
        .map(EventKind::parse)
        .unwrap_or_default();
    let images = record.get("dynamodb");
    let image = |name: &str| images.and_then(|d| d.get(name)).map(decode_image);

    ChangeRecord {
        event_kind,
        before: image("OldImage"),
        after: image("NewImage"),
        recorded_at: None,
    }
}

fn decode_image(image: &Value) -> ArticleRecord {
    let string_attr = |name: &str| {
        image
            .get(name)
            .and_then(|attr| attr.get("S"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let like_count = image
        .get(LIKES_ATTR)
        .and_then(|attr| attr.get("N"))
        .and_then(Value::as_str)
        .and_then(|n| n.parse::<u64>().ok())
        .unwrap_or(0);

    ArticleRecord {
        id: string_attr(ID_ATTR),
        title: string_attr(TITLE_ATTR),
        like_count,
    }
}
