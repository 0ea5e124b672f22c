use crate::application::ports::PostGateway;
use crate::domain::entities::{NewPostPayload, PostChanges, RemotePost};
use crate::domain::value_objects::{PostId, PostStatus};
use crate::infrastructure::remote::wire::{self, WireValue};
use crate::shared::config::{normalize_endpoint, RestConfig};
use crate::shared::error::GatewayError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Structured-field binding: changed fields travel as a JSON object
/// against `sites/{site}/posts/...` endpoints.
pub struct RestGateway {
    client: reqwest::Client,
    endpoint: String,
    site_id: u64,
    auth_token: String,
}

impl RestGateway {
    pub fn new(config: RestConfig) -> Result<Self, GatewayError> {
        let endpoint = normalize_endpoint(&config.endpoint).map_err(GatewayError::Configuration)?;
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            endpoint,
            site_id: config.site_id,
            auth_token: config.auth_token,
        })
    }

    fn posts_url(&self, suffix: &str) -> String {
        format!("{}/sites/{}/posts/{}", self.endpoint, self.site_id, suffix)
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<RemotePost, GatewayError> {
        let response = request.bearer_auth(&self.auth_token).send().await?;
        let status = response.status();
        match status {
            StatusCode::CONFLICT => Err(GatewayError::Conflict),
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                Err(GatewayError::Network(parse_api_error(status, &body)))
            }
            _ => {
                let body = response.text().await?;
                parse_post_body(&body)
            }
        }
    }
}

#[async_trait]
impl PostGateway for RestGateway {
    async fn create(&self, payload: &NewPostPayload) -> Result<RemotePost, GatewayError> {
        let body = create_body(payload);
        debug!(site = self.site_id, "creating post");
        self.execute(self.client.post(self.posts_url("new")).json(&body))
            .await
    }

    async fn update(
        &self,
        id: PostId,
        changes: &PostChanges,
        guard: Option<DateTime<Utc>>,
    ) -> Result<RemotePost, GatewayError> {
        let body = update_body(changes, guard);
        debug!(site = self.site_id, post = %id, "updating post");
        self.execute(self.client.post(self.posts_url(&id.to_string())).json(&body))
            .await
    }

    async fn fetch(&self, id: PostId) -> Result<RemotePost, GatewayError> {
        self.execute(self.client.get(self.posts_url(&id.to_string())))
            .await
    }

    async fn trash(&self, id: PostId) -> Result<RemotePost, GatewayError> {
        self.execute(
            self.client
                .post(self.posts_url(&format!("{id}/delete"))),
        )
        .await
    }
}

fn wire_to_json(value: WireValue) -> Value {
    match value {
        WireValue::Str(value) => Value::String(value),
        WireValue::Int(value) => json!(value),
        WireValue::Bool(value) => Value::Bool(value),
        WireValue::Time(value) => Value::String(wire::format_timestamp(value)),
        WireValue::IntList(values) => json!(values),
        WireValue::StrList(values) => json!(values),
    }
}

fn insert_pair(body: &mut Map<String, Value>, key: &str, value: Value) {
    // dotted keys nest: "terms.post_tag" becomes {"terms": {"post_tag": ...}}
    match key.split_once('.') {
        Some((outer, inner)) => {
            let entry = body
                .entry(outer.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(nested) = entry {
                nested.insert(inner.to_string(), value);
            }
        }
        None => {
            body.insert(key.to_string(), value);
        }
    }
}

fn create_body(payload: &NewPostPayload) -> Value {
    let mut body = Map::new();
    for (key, value) in wire::creation_pairs(payload) {
        insert_pair(&mut body, key, wire_to_json(value));
    }
    let metadata = wire::foreign_id_metadata(&payload.foreign_id);
    body.insert(wire::METADATA.to_string(), json!([metadata]));
    Value::Object(body)
}

fn update_body(changes: &PostChanges, guard: Option<DateTime<Utc>>) -> Value {
    let mut body = Map::new();
    for (key, value) in wire::change_pairs(changes) {
        insert_pair(&mut body, key, wire_to_json(value));
    }
    if let Some(guard) = guard {
        body.insert(
            wire::IF_NOT_MODIFIED_SINCE.to_string(),
            Value::String(wire::format_timestamp(guard)),
        );
    }
    Value::Object(body)
}

#[derive(Debug, Deserialize)]
struct RestPost {
    #[serde(rename = "ID")]
    id: i64,
    date: Option<String>,
    modified: Option<String>,
    author: Option<RestAuthor>,
    title: Option<String>,
    content: Option<String>,
    excerpt: Option<String>,
    slug: Option<String>,
    status: Option<String>,
    sticky: Option<bool>,
    password: Option<String>,
    format: Option<String>,
    post_thumbnail: Option<RestThumbnail>,
    categories: Option<BTreeMap<String, RestTerm>>,
    tags: Option<BTreeMap<String, RestTerm>>,
}

#[derive(Debug, Deserialize)]
struct RestAuthor {
    #[serde(rename = "ID")]
    id: i64,
}

#[derive(Debug, Deserialize)]
struct RestThumbnail {
    #[serde(rename = "ID")]
    id: i64,
}

#[derive(Debug, Deserialize)]
struct RestTerm {
    #[serde(rename = "ID")]
    id: i64,
    name: Option<String>,
}

fn parse_post_body(body: &str) -> Result<RemotePost, GatewayError> {
    let post: RestPost =
        serde_json::from_str(body).map_err(|err| GatewayError::Protocol(err.to_string()))?;
    let date = parse_optional_timestamp(post.date.as_deref())?;
    let modified = parse_optional_timestamp(post.modified.as_deref())?;
    Ok(RemotePost {
        id: PostId::new(post.id),
        date,
        modified,
        author_id: post.author.map(|author| author.id),
        title: post.title,
        content: post.content,
        excerpt: post.excerpt,
        slug: post.slug,
        status: post.status.as_deref().map(PostStatus::from),
        sticky: post.sticky,
        password: post.password,
        format: post.format,
        featured_image: post.post_thumbnail.map(|thumbnail| thumbnail.id),
        categories: post
            .categories
            .map(|terms| terms.values().map(|term| term.id).collect())
            .unwrap_or_default(),
        tags: post
            .tags
            .map(|terms| {
                terms
                    .into_iter()
                    .map(|(key, term)| term.name.unwrap_or(key))
                    .collect()
            })
            .unwrap_or_default(),
    })
}

fn parse_optional_timestamp(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, GatewayError> {
    match raw {
        None => Ok(None),
        Some(raw) => wire::parse_timestamp(raw)
            .map(Some)
            .ok_or_else(|| GatewayError::Protocol(format!("unparseable timestamp {raw:?}"))),
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Post;
    use chrono::TimeZone;

    fn draft_post() -> Post {
        let mut post = Post::new();
        post.author_id = Some(29043);
        post.title = Some("Hello".to_string());
        post.content = Some("content-1".to_string());
        post.date_created = Some(Utc.with_ymd_and_hms(2024, 3, 7, 23, 0, 40).unwrap());
        post
    }

    #[test]
    fn create_body_sends_required_fields_and_metadata() {
        let post = draft_post();
        let payload = NewPostPayload::from_snapshot(&post);
        let body = create_body(&payload);
        assert_eq!(
            body,
            json!({
                "author": 29043,
                "title": "Hello",
                "content": "content-1",
                "status": "draft",
                "date": "2024-03-07T23:00:40+0000",
                "type": "post",
                "metadata": [{
                    "key": "wp_jp_foreign_id",
                    "operation": "update",
                    "value": post.foreign_id.to_string(),
                }],
            })
        );
    }

    #[test]
    fn create_body_includes_optional_fields_only_when_set() {
        let mut post = draft_post();
        post.excerpt = Some("excerpt-a".to_string());
        post.slug = Some("slug-a".to_string());
        post.password = Some("1234".to_string());
        post.format = Some("format-a".to_string());
        post.sticky = true;
        post.featured_image = Some(92);
        post.categories = vec![53];
        post.tags = vec!["tag-1".to_string(), "tag-2 ".to_string()];

        let payload = NewPostPayload::from_snapshot(&post);
        let body = create_body(&payload);
        assert_eq!(
            body,
            json!({
                "author": 29043,
                "title": "Hello",
                "content": "content-1",
                "excerpt": "excerpt-a",
                "slug": "slug-a",
                "password": "1234",
                "format": "format-a",
                "sticky": true,
                "featured_image": 92,
                "categories_by_id": [53],
                "terms": { "post_tag": ["tag-1", "tag-2"] },
                "status": "draft",
                "date": "2024-03-07T23:00:40+0000",
                "type": "post",
                "metadata": [{
                    "key": "wp_jp_foreign_id",
                    "operation": "update",
                    "value": post.foreign_id.to_string(),
                }],
            })
        );
    }

    #[test]
    fn update_body_carries_the_guard_only_when_present() {
        let changes = PostChanges {
            content: Some("content-b".to_string()),
            ..Default::default()
        };
        let guard = Utc.with_ymd_and_hms(2024, 3, 7, 23, 0, 40).unwrap();
        assert_eq!(
            update_body(&changes, Some(guard)),
            json!({
                "content": "content-b",
                "if_not_modified_since": "2024-03-07T23:00:40+0000",
            })
        );
        assert_eq!(
            update_body(&changes, None),
            json!({ "content": "content-b" })
        );
    }

    #[test]
    fn parses_a_remote_post_response() {
        let body = r#"{
            "ID": 974,
            "site_ID": 80511,
            "date": "2024-03-07T23:00:40+0000",
            "modified": "2024-03-07T23:00:45+0000",
            "author": { "ID": 29043, "login": "test" },
            "title": "Hello",
            "content": "content-1",
            "status": "draft",
            "sticky": false,
            "post_thumbnail": { "ID": 92 },
            "tags": { "tag-1": { "ID": 5, "name": "tag-1" } },
            "categories": { "test-category": { "ID": 53, "name": "test-category" } }
        }"#;
        let remote = parse_post_body(body).unwrap();
        assert_eq!(remote.id, PostId::new(974));
        assert_eq!(remote.author_id, Some(29043));
        assert_eq!(remote.status, Some(PostStatus::Draft));
        assert_eq!(
            remote.modified,
            Some(Utc.with_ymd_and_hms(2024, 3, 7, 23, 0, 45).unwrap())
        );
        assert_eq!(remote.featured_image, Some(92));
        assert_eq!(remote.categories, vec![53]);
        assert_eq!(remote.tags, vec!["tag-1".to_string()]);
    }

    #[test]
    fn malformed_responses_are_protocol_errors() {
        let err = parse_post_body("not json").unwrap_err();
        assert!(matches!(err, GatewayError::Protocol(_)));
    }

    #[test]
    fn api_errors_keep_the_server_message() {
        let message = parse_api_error(
            StatusCode::BAD_REQUEST,
            r#"{"error": "invalid_input", "message": "Invalid request"}"#,
        );
        assert_eq!(message, "Invalid request (400)");
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
    }
}
