//! The delta-to-wire-key mapping shared by both gateway bindings.
//!
//! Both transports encode the same changed-field set from the pairs
//! produced here; neither carries its own field-name table.

use crate::domain::entities::{NewPostPayload, PostChanges, PostField};
use crate::domain::value_objects::ForeignId;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub const AUTHOR: &str = "author";
pub const TITLE: &str = "title";
pub const CONTENT: &str = "content";
pub const EXCERPT: &str = "excerpt";
pub const SLUG: &str = "slug";
pub const PASSWORD: &str = "password";
pub const FORMAT: &str = "format";
pub const STICKY: &str = "sticky";
pub const FEATURED_IMAGE: &str = "featured_image";
pub const CATEGORIES: &str = "categories_by_id";
pub const TAGS: &str = "terms.post_tag";
pub const STATUS: &str = "status";
pub const DATE: &str = "date";
pub const POST_TYPE: &str = "type";
pub const IF_NOT_MODIFIED_SINCE: &str = "if_not_modified_since";
pub const METADATA: &str = "metadata";
pub const FOREIGN_ID_KEY: &str = "wp_jp_foreign_id";

impl PostField {
    pub fn wire_key(self) -> &'static str {
        match self {
            PostField::Author => AUTHOR,
            PostField::Title => TITLE,
            PostField::Content => CONTENT,
            PostField::Excerpt => EXCERPT,
            PostField::Slug => SLUG,
            PostField::Password => PASSWORD,
            PostField::Format => FORMAT,
            PostField::Sticky => STICKY,
            PostField::FeaturedImage => FEATURED_IMAGE,
            PostField::Categories => CATEGORIES,
            PostField::Tags => TAGS,
            PostField::Status => STATUS,
            PostField::Date => DATE,
        }
    }
}

/// A transport-independent wire value.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Time(DateTime<Utc>),
    IntList(Vec<i64>),
    StrList(Vec<String>),
}

/// The idempotency-token metadata entry attached to every creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub operation: String,
    pub value: String,
}

pub fn foreign_id_metadata(foreign_id: &ForeignId) -> MetadataEntry {
    MetadataEntry {
        key: FOREIGN_ID_KEY.to_string(),
        operation: "update".to_string(),
        value: foreign_id.to_string(),
    }
}

/// The wire pairs for a partial update: one entry per changed field,
/// in `PostField::ALL` order.
pub fn change_pairs(changes: &PostChanges) -> Vec<(&'static str, WireValue)> {
    let mut pairs = Vec::new();
    for field in PostField::ALL {
        let value = match field {
            PostField::Author => changes.author.map(WireValue::Int),
            PostField::Title => changes.title.clone().map(WireValue::Str),
            PostField::Content => changes.content.clone().map(WireValue::Str),
            PostField::Excerpt => changes.excerpt.clone().map(WireValue::Str),
            PostField::Slug => changes.slug.clone().map(WireValue::Str),
            PostField::Password => changes.password.clone().map(WireValue::Str),
            PostField::Format => changes.format.clone().map(WireValue::Str),
            PostField::Sticky => changes.sticky.map(WireValue::Bool),
            PostField::FeaturedImage => changes.featured_image.map(WireValue::Int),
            PostField::Categories => changes.categories.clone().map(WireValue::IntList),
            PostField::Tags => changes.tags.clone().map(WireValue::StrList),
            PostField::Status => changes
                .status
                .as_ref()
                .map(|status| WireValue::Str(status.as_wire().to_string())),
            PostField::Date => changes.date.map(WireValue::Time),
        };
        if let Some(value) = value {
            pairs.push((field.wire_key(), value));
        }
    }
    pairs
}

/// The wire pairs for a full creation: the payload's field set plus the
/// constant post type. The metadata entry is attached separately by
/// each binding.
pub fn creation_pairs(payload: &NewPostPayload) -> Vec<(&'static str, WireValue)> {
    let mut pairs = change_pairs(&payload.changes);
    pairs.push((POST_TYPE, WireValue::Str("post".to_string())));
    pairs
}

/// RFC-3339 with a numeric offset, e.g. `2024-03-07T23:00:40+0000`.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%z").to_string()
}

/// Accepts both the numeric-offset form this client emits and the
/// colon/Z forms servers are known to reply with.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(parsed.with_timezone(&Utc));
    }
    None
}

/// XML-RPC `dateTime.iso8601`, e.g. `20240307T23:00:40Z`.
pub fn format_xmlrpc_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y%m%dT%H:%M:%SZ").to_string()
}

pub fn parse_xmlrpc_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y%m%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
