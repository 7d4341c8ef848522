//! Message text extraction from request bodies.
//!
//! Clients post messages in whatever shape is convenient for them. The
//! first non-empty field named `message`, `text` or `content` wins:
//!
//! | Content-Type                        | Field lookup        | Fallback                    |
//! |-------------------------------------|---------------------|-----------------------------|
//! | `application/x-www-form-urlencoded` | form fields         | whole form, re-encoded      |
//! | `multipart/form-data`               | non-file parts      | text parts as encoded form  |
//! | `application/json`                  | top-level strings   | raw body                    |
//! | anything else / none                | -                   | raw body                    |

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::{HeaderMap, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use crate::error::AppError;

/// Field names checked, in order.
const FIELD_NAMES: [&str; 3] = ["message", "text", "content"];

/// Message text taken from the request body.
#[derive(Debug)]
pub struct MessageContent(pub String);

impl<S> FromRequest<S> for MessageContent
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content = match media_type(req.headers()).as_deref() {
            Some("application/x-www-form-urlencoded") => {
                let body = Bytes::from_request(req, state)
                    .await
                    .map_err(IntoResponse::into_response)?;
                let fields: Vec<(String, String)> =
                    form_urlencoded::parse(&body).into_owned().collect();
                first_field(&fields).unwrap_or_else(|| encode_form(fields))
            }

            Some("multipart/form-data") => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(IntoResponse::into_response)?;
                let fields = multipart_fields(multipart).await?;
                first_field(&fields).unwrap_or_else(|| encode_form(fields))
            }

            Some("application/json") => {
                let body = Bytes::from_request(req, state)
                    .await
                    .map_err(IntoResponse::into_response)?;
                let object: Map<String, Value> = serde_json::from_slice(&body)
                    .map_err(|_| unreadable("Request body is not a JSON object"))?;
                match json_field(&object) {
                    Some(text) => text.to_string(),
                    None => utf8(body)?,
                }
            }

            _ => {
                let body = Bytes::from_request(req, state)
                    .await
                    .map_err(IntoResponse::into_response)?;
                utf8(body)?
            }
        };

        Ok(MessageContent(content))
    }
}

/// Lowercased media type without parameters, if the header is usable.
fn media_type(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let essence = value.split(';').next()?.trim();

    (!essence.is_empty()).then(|| essence.to_ascii_lowercase())
}

fn first_field(fields: &[(String, String)]) -> Option<String> {
    FIELD_NAMES.iter().find_map(|name| {
        fields
            .iter()
            .find(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.clone())
    })
}

fn json_field(object: &Map<String, Value>) -> Option<&str> {
    FIELD_NAMES
        .iter()
        .filter_map(|name| object.get(*name).and_then(Value::as_str))
        .find(|text| !text.is_empty())
}

/// Re-encodes fields as `application/x-www-form-urlencoded`, sorted by key.
fn encode_form(mut fields: Vec<(String, String)>) -> String {
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish()
}

async fn multipart_fields(mut multipart: Multipart) -> Result<Vec<(String, String)>, Response> {
    let mut fields = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(IntoResponse::into_response)?
    {
        if field.file_name().is_some() {
            continue;
        }
        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.map_err(IntoResponse::into_response)?;
        fields.push((name, value));
    }

    Ok(fields)
}

fn utf8(body: Bytes) -> Result<String, Response> {
    String::from_utf8(body.to_vec()).map_err(|_| unreadable("Message must be valid UTF-8"))
}

fn unreadable(msg: &str) -> Response {
    AppError::Validation(msg.to_string()).into_response()
}
