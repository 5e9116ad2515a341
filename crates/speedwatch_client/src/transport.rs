use std::time::Duration;

pub use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use speedwatch_core::SourceFile;
use speedwatch_logging::{watch_debug, watch_trace};
use url::Url;

use crate::error::{extract_server_message, ApiError, NetworkFailure};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// `None` leaves requests unbounded; processing a video can take minutes.
    pub request_timeout: Option<Duration>,
    /// Path under the base URL where processed artifacts are served.
    pub results_path: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            results_path: "results".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// Multipart form with a single file field.
    Multipart {
        field: &'static str,
        file: SourceFile,
    },
}

/// Issues requests against one backend origin and returns the parsed body.
///
/// Empty bodies come back as `Value::Null`, non-JSON bodies as `Value::String`.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<Value, ApiError>;

    fn base_url(&self) -> &Url;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    base_url: Url,
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(settings: &ClientSettings) -> Result<Self, ApiError> {
        let base_url = parse_base_url(&settings.base_url)?;
        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| ApiError::Setup(err.to_string()))?;
        Ok(Self { base_url, http })
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::Setup(format!("bad request path {path:?}: {err}")))
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<Value, ApiError> {
        let url = self.url(path)?;
        watch_debug!("{} {}", method, url);

        let builder = self.http.request(method, url);
        let builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart { field, file } => {
                builder.multipart(Form::new().part(field, file_part(&file)))
            }
        };

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(ApiError::Transport {
                status: status.as_u16(),
                message: extract_server_message(&raw),
                raw,
            });
        }

        let text = response.text().await.map_err(map_reqwest_error)?;
        watch_trace!("{} response body: {} bytes", status, text.len());
        Ok(parse_body(text))
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }
}

/// Parses the configured origin; a trailing slash is added so joins append.
fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash)
        .map_err(|err| ApiError::Setup(format!("invalid base url {raw:?}: {err}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::Setup(format!(
            "base url must be an http(s) origin: {raw:?}"
        )));
    }
    Ok(url)
}

fn file_part(file: &SourceFile) -> Part {
    let part = || Part::bytes(file.bytes.to_vec()).file_name(file.name.clone());
    // An unparsable media type is left to the server to sniff.
    part().mime_str(&file.media_type).unwrap_or_else(|_| part())
}

fn parse_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::network(NetworkFailure::Timeout, err.to_string());
    }
    if err.is_connect() {
        return ApiError::network(NetworkFailure::Connect, err.to_string());
    }
    ApiError::network(NetworkFailure::Other, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = parse_base_url("http://localhost:5000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/");
        assert_eq!(url.join("stats").unwrap().as_str(), "http://localhost:5000/api/stats");
    }

    #[test]
    fn base_url_must_be_http() {
        assert!(matches!(
            parse_base_url("ftp://example.com"),
            Err(ApiError::Setup(_))
        ));
        assert!(matches!(parse_base_url("not a url"), Err(ApiError::Setup(_))));
    }

    #[test]
    fn body_parsing_keeps_non_json_text() {
        assert_eq!(parse_body(String::new()), Value::Null);
        assert_eq!(parse_body("  \n".to_string()), Value::Null);
        assert_eq!(parse_body("[1]".to_string()), serde_json::json!([1]));
        assert_eq!(
            parse_body("OK".to_string()),
            Value::String("OK".to_string())
        );
    }
}
