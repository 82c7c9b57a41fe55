//! Non-destructive request payload capture
//!
//! The body is buffered once and the request is rebuilt around the same
//! bytes, so the downstream handler still reads the full payload. Bodies
//! whose size is unknown or above the capture limit are left alone; that
//! limit is the only cap applied, multipart included.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
};
use http_body::Body as _;
use http_body_util::BodyExt;
use serde_json::{json, map::Entry, Value as JsonValue};
use tracing::{debug, warn};

use super::models::Snapshot;

#[derive(Debug, thiserror::Error)]
enum BodyParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid multipart body: {0}")]
    Multipart(#[from] multer::Error),
}

/// Payload encodings the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Json,
    UrlEncoded,
    Multipart,
}

impl Encoding {
    fn from_content_type(value: &HeaderValue) -> Option<Self> {
        let essence = value.to_str().ok()?.split(';').next()?.trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/json" => Some(Self::Json),
            "application/x-www-form-urlencoded" => Some(Self::UrlEncoded),
            "multipart/form-data" => Some(Self::Multipart),
            _ => None,
        }
    }
}

/// Read the payload of a POST/PUT request into a key/value map
///
/// With `should_clone` set, the returned request carries the same bytes as
/// the original. Without it, the payload is consumed and the returned
/// request has an empty body. Anything that cannot be captured yields `None`.
pub async fn extract(request: Request, should_clone: bool, limit: usize) -> (Request, Option<Snapshot>) {
    if !matches!(*request.method(), Method::POST | Method::PUT) {
        return (request, None);
    }

    let Some(content_type) = request.headers().get(CONTENT_TYPE).cloned() else {
        return (request, None);
    };
    let Some(encoding) = Encoding::from_content_type(&content_type) else {
        debug!(content_type = ?content_type, "Unsupported content type, skipping body capture");
        return (request, None);
    };

    match request.body().size_hint().upper() {
        Some(size) if size <= limit as u64 => {},
        size => {
            debug!(size = ?size, limit, "Body size unknown or above capture limit");
            return (request, None);
        },
    }

    let (parts, body) = request.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(error = %e, "Failed to buffer request body");
            return (Request::from_parts(parts, Body::empty()), None);
        },
    };

    let rebuilt = if should_clone {
        Request::from_parts(parts, Body::from(bytes.clone()))
    } else {
        Request::from_parts(parts, Body::empty())
    };

    match parse(encoding, &content_type, bytes).await {
        Ok(data) => (rebuilt, data),
        Err(e) => {
            warn!(error = %e, "Failed to parse request body for audit");
            (rebuilt, None)
        },
    }
}

async fn parse(
    encoding: Encoding,
    content_type: &HeaderValue,
    bytes: Bytes,
) -> Result<Option<Snapshot>, BodyParseError> {
    match encoding {
        Encoding::Json => match serde_json::from_slice::<JsonValue>(&bytes)? {
            JsonValue::Object(map) => Ok(Some(map)),
            _ => Ok(None),
        },
        Encoding::UrlEncoded => {
            let mut data = Snapshot::new();
            for (key, value) in url::form_urlencoded::parse(&bytes) {
                insert_field(&mut data, key.into_owned(), JsonValue::String(value.into_owned()));
            }
            Ok(Some(data))
        },
        Encoding::Multipart => parse_multipart(content_type, bytes).await.map(Some),
    }
}

async fn parse_multipart(content_type: &HeaderValue, bytes: Bytes) -> Result<Snapshot, BodyParseError> {
    let boundary = multer::parse_boundary(content_type.to_str().unwrap_or_default())?;
    let mut multipart = multer::Multipart::new(Body::from(bytes).into_data_stream(), boundary);

    let mut data = Snapshot::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        let value = match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let mime_type = field
                    .content_type()
                    .map(|mime| mime.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let size = field.bytes().await?.len();
                json!({
                    "name": file_name,
                    "size": size,
                    "mimeType": mime_type,
                    "isFile": true,
                })
            },
            None => JsonValue::String(field.text().await?),
        };

        insert_field(&mut data, name, value);
    }

    Ok(data)
}

/// Repeated keys fold into an array in arrival order
fn insert_field(data: &mut Snapshot, key: String, value: JsonValue) {
    match data.entry(key) {
        Entry::Vacant(entry) => {
            entry.insert(value);
        },
        Entry::Occupied(mut entry) => match entry.get_mut() {
            JsonValue::Array(values) => values.push(value),
            existing => {
                let first = existing.take();
                *existing = JsonValue::Array(vec![first, value]);
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 1024 * 1024;

    fn post(content_type: &str, body: impl Into<Body>) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/admin/redirects/new")
            .header(CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap()
    }

    async fn body_text(request: Request) -> String {
        let bytes = request.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_urlencoded_form_is_cloned() {
        let form = "slug=abc&targetUrl=https%3A%2F%2Fx.com&tags=a&tags=b";
        let (request, data) =
            extract(post("application/x-www-form-urlencoded", form), true, LIMIT).await;

        let data = data.unwrap();
        assert_eq!(data["slug"], "abc");
        assert_eq!(data["targetUrl"], "https://x.com");
        assert_eq!(data["tags"], json!(["a", "b"]));
        assert_eq!(body_text(request).await, form);
    }

    #[tokio::test]
    async fn test_without_clone_body_is_consumed() {
        let (request, data) =
            extract(post("application/x-www-form-urlencoded", "a=1"), false, LIMIT).await;
        assert_eq!(data.unwrap()["a"], "1");
        assert_eq!(body_text(request).await, "");
    }

    #[tokio::test]
    async fn test_json_object() {
        let body = r#"{"categoryName":"python","iconifyId":"logos:python"}"#;
        let (request, data) = extract(post("application/json; charset=utf-8", body), true, LIMIT).await;
        assert_eq!(data.unwrap()["iconifyId"], "logos:python");
        assert_eq!(body_text(request).await, body);
    }

    #[tokio::test]
    async fn test_json_non_object_is_none() {
        let (_, data) = extract(post("application/json", "[1,2,3]"), true, LIMIT).await;
        assert!(data.is_none());
    }

    #[tokio::test]
    async fn test_invalid_json_keeps_body() {
        let (request, data) = extract(post("application/json", "{not json"), true, LIMIT).await;
        assert!(data.is_none());
        assert_eq!(body_text(request).await, "{not json");
    }

    #[tokio::test]
    async fn test_multipart_file_becomes_descriptor() {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nIntro\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"x.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\nJPEGDATA\r\n--{b}--\r\n",
            b = boundary
        );
        let content_type = format!("multipart/form-data; boundary={boundary}");

        let (request, data) = extract(post(&content_type, body.clone()), true, LIMIT).await;

        let data = data.unwrap();
        assert_eq!(data["title"], "Intro");
        assert_eq!(
            data["photo"],
            json!({ "name": "x.jpg", "size": 8, "mimeType": "image/jpeg", "isFile": true })
        );
        assert_eq!(body_text(request).await, body);
    }

    #[tokio::test]
    async fn test_large_upload_is_described_up_to_capture_limit() {
        let boundary = "XBOUNDARY";
        let photo = vec![0xAB_u8; 3 * 1024 * 1024];
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nFall kickoff\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"kickoff.png\"\r\n\
             Content-Type: image/png\r\n\r\n",
            b = boundary
        )
        .into_bytes();
        body.extend_from_slice(&photo);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        let sent = body.len();
        let content_type = format!("multipart/form-data; boundary={boundary}");

        let (request, data) = extract(post(&content_type, body), true, 10 * 1024 * 1024).await;

        let data = data.unwrap();
        assert_eq!(data["title"], "Fall kickoff");
        assert_eq!(
            data["photo"],
            json!({ "name": "kickoff.png", "size": photo.len(), "mimeType": "image/png", "isFile": true })
        );
        let forwarded = request.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(forwarded.len(), sent);
    }

    #[tokio::test]
    async fn test_oversized_body_is_not_buffered() {
        let (request, data) =
            extract(post("application/x-www-form-urlencoded", "slug=abc"), true, 4).await;
        assert!(data.is_none());
        assert_eq!(body_text(request).await, "slug=abc");
    }

    #[tokio::test]
    async fn test_unsupported_method_and_type() {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/admin/meetings/42")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        assert!(extract(request, true, LIMIT).await.1.is_none());

        let (request, data) = extract(post("text/plain", "hello"), true, LIMIT).await;
        assert!(data.is_none());
        assert_eq!(body_text(request).await, "hello");
    }
}
