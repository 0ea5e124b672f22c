use crate::application::ports::PostGateway;
use crate::domain::entities::{NewPostPayload, PostChanges, RemotePost};
use crate::domain::value_objects::{PostId, PostStatus};
use crate::infrastructure::remote::wire::{self, WireValue};
use crate::shared::config::{normalize_endpoint, XmlRpcConfig};
use crate::shared::error::GatewayError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::debug;

/// Remote-procedure binding: the same changed-field set travels as the
/// struct parameter of one positional `methodCall` per operation.
///
/// `wp.editPost` and `wp.deletePost` reply with scalars and
/// `wp.newPost` with the new id, so those calls are followed by a
/// `wp.getPost` to satisfy the gateway contract of returning a full
/// remote snapshot.
pub struct XmlRpcGateway {
    client: reqwest::Client,
    endpoint: String,
    blog_id: u32,
    username: String,
    password: String,
}

impl XmlRpcGateway {
    pub fn new(config: XmlRpcConfig) -> Result<Self, GatewayError> {
        let endpoint = normalize_endpoint(&config.endpoint).map_err(GatewayError::Configuration)?;
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            endpoint,
            blog_id: config.blog_id,
            username: config.username,
            password: config.password,
        })
    }

    fn base_params(&self) -> Vec<XmlValue> {
        vec![
            XmlValue::Int(i64::from(self.blog_id)),
            XmlValue::Str(self.username.clone()),
            XmlValue::Str(self.password.clone()),
        ]
    }

    async fn call(&self, method: &str, params: Vec<XmlValue>) -> Result<XmlValue, GatewayError> {
        let body = encode_method_call(method, &params);
        debug!(%method, "dispatching xml-rpc call");
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "text/xml; charset=utf-8")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Network(format!("HTTP {}", status.as_u16())));
        }
        let text = response.text().await?;
        match parse_method_response(&text)? {
            Reply::Value(value) => Ok(value),
            Reply::Fault { code, message } => Err(map_fault(code, message)),
        }
    }

    async fn get_post(&self, id: PostId) -> Result<RemotePost, GatewayError> {
        let mut params = self.base_params();
        params.push(XmlValue::Int(id.as_i64()));
        let reply = self.call("wp.getPost", params).await?;
        remote_post_from_value(reply)
    }
}

#[async_trait]
impl PostGateway for XmlRpcGateway {
    async fn create(&self, payload: &NewPostPayload) -> Result<RemotePost, GatewayError> {
        let mut params = self.base_params();
        params.push(content_struct(
            wire::creation_pairs(payload),
            None,
            Some(&wire::foreign_id_metadata(&payload.foreign_id)),
        ));
        let reply = self.call("wp.newPost", params).await?;
        let id = match reply {
            XmlValue::Int(id) => id,
            XmlValue::Str(id) => id
                .parse::<i64>()
                .map_err(|_| GatewayError::Protocol(format!("unparseable post id {id:?}")))?,
            other => {
                return Err(GatewayError::Protocol(format!(
                    "unexpected wp.newPost reply: {other:?}"
                )));
            }
        };
        self.get_post(PostId::new(id)).await
    }

    async fn update(
        &self,
        id: PostId,
        changes: &PostChanges,
        guard: Option<DateTime<Utc>>,
    ) -> Result<RemotePost, GatewayError> {
        let mut params = self.base_params();
        params.push(XmlValue::Int(id.as_i64()));
        params.push(content_struct(wire::change_pairs(changes), guard, None));
        self.call("wp.editPost", params).await?;
        self.get_post(id).await
    }

    async fn fetch(&self, id: PostId) -> Result<RemotePost, GatewayError> {
        self.get_post(id).await
    }

    async fn trash(&self, id: PostId) -> Result<RemotePost, GatewayError> {
        let mut params = self.base_params();
        params.push(XmlValue::Int(id.as_i64()));
        self.call("wp.deletePost", params).await?;
        self.get_post(id).await
    }
}

fn map_fault(code: i64, message: String) -> GatewayError {
    match code {
        404 => GatewayError::NotFound,
        409 => GatewayError::Conflict,
        _ => GatewayError::Network(format!("fault {code}: {message}")),
    }
}

/// A decoded XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum XmlValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Time(DateTime<Utc>),
    Array(Vec<XmlValue>),
    Struct(BTreeMap<String, XmlValue>),
}

impl From<WireValue> for XmlValue {
    fn from(value: WireValue) -> Self {
        match value {
            WireValue::Str(value) => XmlValue::Str(value),
            WireValue::Int(value) => XmlValue::Int(value),
            WireValue::Bool(value) => XmlValue::Bool(value),
            WireValue::Time(value) => XmlValue::Time(value),
            WireValue::IntList(values) => {
                XmlValue::Array(values.into_iter().map(XmlValue::Int).collect())
            }
            WireValue::StrList(values) => {
                XmlValue::Array(values.into_iter().map(XmlValue::Str).collect())
            }
        }
    }
}

/// Builds the struct parameter from wire pairs; dotted keys nest the
/// same way the JSON binding nests them.
fn content_struct(
    pairs: Vec<(&'static str, WireValue)>,
    guard: Option<DateTime<Utc>>,
    metadata: Option<&wire::MetadataEntry>,
) -> XmlValue {
    let mut members = BTreeMap::new();
    for (key, value) in pairs {
        match key.split_once('.') {
            Some((outer, inner)) => {
                let nested = members
                    .entry(outer.to_string())
                    .or_insert_with(|| XmlValue::Struct(BTreeMap::new()));
                if let XmlValue::Struct(nested) = nested {
                    nested.insert(inner.to_string(), value.into());
                }
            }
            None => {
                members.insert(key.to_string(), value.into());
            }
        }
    }
    if let Some(guard) = guard {
        members.insert(
            wire::IF_NOT_MODIFIED_SINCE.to_string(),
            XmlValue::Time(guard),
        );
    }
    if let Some(entry) = metadata {
        let mut fields = BTreeMap::new();
        fields.insert("key".to_string(), XmlValue::Str(entry.key.clone()));
        fields.insert(
            "operation".to_string(),
            XmlValue::Str(entry.operation.clone()),
        );
        fields.insert("value".to_string(), XmlValue::Str(entry.value.clone()));
        members.insert(
            wire::METADATA.to_string(),
            XmlValue::Array(vec![XmlValue::Struct(fields)]),
        );
    }
    XmlValue::Struct(members)
}

fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for character in raw.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn encode_value(out: &mut String, value: &XmlValue) {
    out.push_str("<value>");
    match value {
        XmlValue::Str(value) => {
            let _ = write!(out, "<string>{}</string>", escape_xml(value));
        }
        XmlValue::Int(value) => {
            let _ = write!(out, "<i4>{value}</i4>");
        }
        XmlValue::Bool(value) => {
            let _ = write!(out, "<boolean>{}</boolean>", i32::from(*value));
        }
        XmlValue::Time(value) => {
            let _ = write!(
                out,
                "<dateTime.iso8601>{}</dateTime.iso8601>",
                wire::format_xmlrpc_timestamp(*value)
            );
        }
        XmlValue::Array(values) => {
            out.push_str("<array><data>");
            for value in values {
                encode_value(out, value);
            }
            out.push_str("</data></array>");
        }
        XmlValue::Struct(members) => {
            out.push_str("<struct>");
            for (name, value) in members {
                let _ = write!(out, "<member><name>{}</name>", escape_xml(name));
                encode_value(out, value);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

pub(crate) fn encode_method_call(method: &str, params: &[XmlValue]) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<?xml version=\"1.0\"?><methodCall><methodName>{}</methodName><params>",
        escape_xml(method)
    );
    for param in params {
        out.push_str("<param>");
        encode_value(&mut out, param);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

pub(crate) enum Reply {
    Value(XmlValue),
    Fault { code: i64, message: String },
}

/// Pull parser over the `methodResponse` event stream.
struct ResponseReader<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> ResponseReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            reader: Reader::from_str(text),
        }
    }

    /// The next event that is not whitespace-only text.
    fn next_event(&mut self) -> Result<Event<'a>, GatewayError> {
        loop {
            let event = self
                .reader
                .read_event()
                .map_err(|err| GatewayError::Protocol(err.to_string()))?;
            match event {
                Event::Text(ref text) => {
                    let raw = text
                        .unescape()
                        .map_err(|err| GatewayError::Protocol(err.to_string()))?;
                    if raw.trim().is_empty() {
                        continue;
                    }
                    return Ok(event);
                }
                Event::Decl(_) | Event::Comment(_) => continue,
                other => return Ok(other),
            }
        }
    }

    fn text_content(event: &Event<'_>) -> Result<String, GatewayError> {
        match event {
            Event::Text(text) => text
                .unescape()
                .map(|content| content.into_owned())
                .map_err(|err| GatewayError::Protocol(err.to_string())),
            other => Err(GatewayError::Protocol(format!(
                "expected text, found {other:?}"
            ))),
        }
    }

    /// Parses the content of a `<value>` element whose start tag has
    /// already been consumed, including its end tag.
    fn parse_value(&mut self) -> Result<XmlValue, GatewayError> {
        let event = self.next_event()?;
        match event {
            // a bare value with no type element is a string
            Event::Text(_) => {
                let content = Self::text_content(&event)?;
                self.expect_end(b"value")?;
                Ok(XmlValue::Str(content))
            }
            Event::End(ref end) if end.name().as_ref() == b"value" => {
                Ok(XmlValue::Str(String::new()))
            }
            Event::Empty(ref empty) => {
                let value = match empty.name().as_ref() {
                    b"string" => XmlValue::Str(String::new()),
                    b"nil" => XmlValue::Str(String::new()),
                    other => {
                        return Err(GatewayError::Protocol(format!(
                            "unexpected empty element {:?}",
                            String::from_utf8_lossy(other)
                        )));
                    }
                };
                self.expect_end(b"value")?;
                Ok(value)
            }
            Event::Start(ref start) => {
                let name = start.name().as_ref().to_vec();
                let value = match name.as_slice() {
                    b"string" => XmlValue::Str(self.scalar_text(&name)?),
                    b"i4" | b"int" => {
                        let raw = self.scalar_text(&name)?;
                        let parsed = raw.trim().parse::<i64>().map_err(|_| {
                            GatewayError::Protocol(format!("unparseable integer {raw:?}"))
                        })?;
                        XmlValue::Int(parsed)
                    }
                    b"boolean" => {
                        let raw = self.scalar_text(&name)?;
                        XmlValue::Bool(raw.trim() == "1")
                    }
                    b"dateTime.iso8601" => {
                        let raw = self.scalar_text(&name)?;
                        let parsed = wire::parse_xmlrpc_timestamp(&raw).ok_or_else(|| {
                            GatewayError::Protocol(format!("unparseable timestamp {raw:?}"))
                        })?;
                        XmlValue::Time(parsed)
                    }
                    b"double" => {
                        // the engine has no fractional fields; carry it as text
                        XmlValue::Str(self.scalar_text(&name)?)
                    }
                    b"array" => self.parse_array()?,
                    b"struct" => self.parse_struct()?,
                    other => {
                        return Err(GatewayError::Protocol(format!(
                            "unexpected value type {:?}",
                            String::from_utf8_lossy(other)
                        )));
                    }
                };
                self.expect_end(b"value")?;
                Ok(value)
            }
            other => Err(GatewayError::Protocol(format!(
                "unexpected event inside value: {other:?}"
            ))),
        }
    }

    /// Text content of a scalar element, consuming its end tag.
    fn scalar_text(&mut self, name: &[u8]) -> Result<String, GatewayError> {
        let event = self.next_event()?;
        match event {
            Event::End(ref end) if end.name().as_ref() == name => Ok(String::new()),
            _ => {
                let content = Self::text_content(&event)?;
                self.expect_end(name)?;
                Ok(content)
            }
        }
    }

    /// Parses `<data><value>…</value>…</data></array>` after the array
    /// start tag.
    fn parse_array(&mut self) -> Result<XmlValue, GatewayError> {
        self.expect_start(b"data")?;
        let mut values = Vec::new();
        loop {
            let event = self.next_event()?;
            match event {
                Event::Start(ref start) if start.name().as_ref() == b"value" => {
                    values.push(self.parse_value()?);
                }
                Event::End(ref end) if end.name().as_ref() == b"data" => break,
                other => {
                    return Err(GatewayError::Protocol(format!(
                        "unexpected event inside array: {other:?}"
                    )));
                }
            }
        }
        self.expect_end(b"array")?;
        Ok(XmlValue::Array(values))
    }

    /// Parses `<member><name>…</name><value>…</value></member>…` after
    /// the struct start tag.
    fn parse_struct(&mut self) -> Result<XmlValue, GatewayError> {
        let mut members = BTreeMap::new();
        loop {
            let event = self.next_event()?;
            match event {
                Event::Start(ref start) if start.name().as_ref() == b"member" => {
                    self.expect_start(b"name")?;
                    let name = self.scalar_text(b"name")?;
                    self.expect_start(b"value")?;
                    let value = self.parse_value()?;
                    self.expect_end(b"member")?;
                    members.insert(name, value);
                }
                Event::End(ref end) if end.name().as_ref() == b"struct" => break,
                other => {
                    return Err(GatewayError::Protocol(format!(
                        "unexpected event inside struct: {other:?}"
                    )));
                }
            }
        }
        Ok(XmlValue::Struct(members))
    }

    fn expect_start(&mut self, name: &[u8]) -> Result<(), GatewayError> {
        let event = self.next_event()?;
        match event {
            Event::Start(ref start) if start.name().as_ref() == name => Ok(()),
            other => Err(GatewayError::Protocol(format!(
                "expected <{}>, found {other:?}",
                String::from_utf8_lossy(name)
            ))),
        }
    }

    fn expect_end(&mut self, name: &[u8]) -> Result<(), GatewayError> {
        let event = self.next_event()?;
        match event {
            Event::End(ref end) if end.name().as_ref() == name => Ok(()),
            other => Err(GatewayError::Protocol(format!(
                "expected </{}>, found {other:?}",
                String::from_utf8_lossy(name)
            ))),
        }
    }
}

pub(crate) fn parse_method_response(text: &str) -> Result<Reply, GatewayError> {
    let mut reader = ResponseReader::new(text);
    reader.expect_start(b"methodResponse")?;
    let event = reader.next_event()?;
    match event {
        Event::Start(ref start) if start.name().as_ref() == b"params" => {
            reader.expect_start(b"param")?;
            reader.expect_start(b"value")?;
            let value = reader.parse_value()?;
            Ok(Reply::Value(value))
        }
        Event::Start(ref start) if start.name().as_ref() == b"fault" => {
            reader.expect_start(b"value")?;
            let value = reader.parse_value()?;
            let XmlValue::Struct(members) = value else {
                return Err(GatewayError::Protocol(
                    "fault payload is not a struct".to_string(),
                ));
            };
            let code = match members.get("faultCode") {
                Some(XmlValue::Int(code)) => *code,
                _ => 0,
            };
            let message = match members.get("faultString") {
                Some(XmlValue::Str(message)) => message.clone(),
                _ => String::new(),
            };
            Ok(Reply::Fault { code, message })
        }
        other => Err(GatewayError::Protocol(format!(
            "unexpected methodResponse payload: {other:?}"
        ))),
    }
}

fn remote_post_from_value(value: XmlValue) -> Result<RemotePost, GatewayError> {
    let XmlValue::Struct(members) = value else {
        return Err(GatewayError::Protocol(
            "wp.getPost reply is not a struct".to_string(),
        ));
    };

    let id = match members.get("id") {
        Some(XmlValue::Int(id)) => *id,
        Some(XmlValue::Str(id)) => id
            .parse::<i64>()
            .map_err(|_| GatewayError::Protocol(format!("unparseable post id {id:?}")))?,
        _ => {
            return Err(GatewayError::Protocol(
                "wp.getPost reply has no id".to_string(),
            ));
        }
    };

    let string_member = |key: &str| match members.get(key) {
        Some(XmlValue::Str(value)) => Some(value.clone()),
        _ => None,
    };
    let int_member = |key: &str| match members.get(key) {
        Some(XmlValue::Int(value)) => Some(*value),
        Some(XmlValue::Str(value)) => value.parse::<i64>().ok(),
        _ => None,
    };
    let time_member = |key: &str| match members.get(key) {
        Some(XmlValue::Time(value)) => Some(*value),
        _ => None,
    };

    let categories = match members.get(wire::CATEGORIES) {
        Some(XmlValue::Array(values)) => values
            .iter()
            .filter_map(|value| match value {
                XmlValue::Int(id) => Some(*id),
                XmlValue::Str(id) => id.parse::<i64>().ok(),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    let tags = match members.get("terms") {
        Some(XmlValue::Struct(terms)) => match terms.get("post_tag") {
            Some(XmlValue::Array(values)) => values
                .iter()
                .filter_map(|value| match value {
                    XmlValue::Str(tag) => Some(tag.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    Ok(RemotePost {
        id: PostId::new(id),
        date: time_member(wire::DATE),
        modified: time_member("modified"),
        author_id: int_member(wire::AUTHOR),
        title: string_member(wire::TITLE),
        content: string_member(wire::CONTENT),
        excerpt: string_member(wire::EXCERPT),
        slug: string_member(wire::SLUG),
        status: string_member(wire::STATUS)
            .as_deref()
            .map(PostStatus::from),
        sticky: match members.get(wire::STICKY) {
            Some(XmlValue::Bool(sticky)) => Some(*sticky),
            _ => None,
        },
        password: string_member(wire::PASSWORD),
        format: string_member(wire::FORMAT),
        featured_image: int_member(wire::FEATURED_IMAGE),
        categories,
        tags,
    })
}
