use std::env;
use std::pin::Pin;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, HISTORY_FAILURES,
    HISTORY_LOADS,
};
use crate::types::{ChatRequest, HealthStatus, HistoryResponse, Message};

/// Base URL used when neither an explicit value nor the environment provides one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment variable consulted for the base URL.
pub const BASE_URL_ENV: &str = "RAGCHAT_API_URL";

/// The body of a streamed chat response, chunk by chunk.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// The service operations the controller depends on.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Fetch the stored transcript for `session_id`.
    async fn history(&self, session_id: &str) -> Result<Vec<Message>>;

    /// Send one user message and open the streamed reply.
    ///
    /// `Ok(None)` means the response carried no body at all.
    async fn chat(&self, request: &ChatRequest) -> Result<Option<ByteStream>>;
}

/// Resolve the base URL: explicit value, then environment value, then
/// [`DEFAULT_BASE_URL`]. Blank values are skipped and trailing slashes trimmed.
pub fn resolve_base_url(explicit: Option<String>, from_env: Option<String>) -> String {
    let chosen = explicit
        .filter(|s| !s.trim().is_empty())
        .or_else(|| from_env.filter(|s| !s.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    chosen.trim().trim_end_matches('/').to_string()
}

/// HTTP client for the RAG chat service.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Option<Duration>,
}

impl ChatClient {
    /// Create a new client.
    ///
    /// The base URL is read from the `RAGCHAT_API_URL` environment variable,
    /// falling back to `http://localhost:8000`. No timeout is applied.
    pub fn new() -> Result<Self> {
        Self::with_options(None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = resolve_base_url(base_url, env::var(BASE_URL_ENV).ok());
        let base_url = Url::parse(&base_url)
            .map_err(|e| Error::url(format!("Invalid base URL {base_url:?}: {e}"), Some(e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::url(
                format!("Base URL {base_url} cannot carry a path"),
                None,
            ));
        }

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {e}"),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// The request timeout, if one was configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::url(format!("Base URL {} cannot carry a path", self.base_url), None))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn default_headers(accept: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(accept));
        headers
    }

    fn request_error(&self, err: reqwest::Error) -> Error {
        CLIENT_REQUEST_ERRORS.click();
        Error::from_request(err, self.timeout.map(|t| t.as_secs_f64()))
    }

    /// Convert a non-success response into an [`Error::Api`].
    ///
    /// FastAPI-style `{"detail": ...}` bodies are unwrapped; anything else is
    /// carried verbatim.
    async fn process_error_response(response: Response) -> Error {
        CLIENT_REQUEST_ERRORS.click();
        let status = response.status().as_u16();

        #[derive(Deserialize)]
        struct ErrorResponse {
            detail: serde_json::Value,
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let message = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(ErrorResponse {
                detail: serde_json::Value::String(detail),
            }) => detail,
            Ok(ErrorResponse { detail }) => detail.to_string(),
            Err(_) => body.trim().to_string(),
        };
        Error::api(status, message)
    }

    /// Fetch the stored transcript for a session.
    pub async fn history(&self, session_id: &str) -> Result<Vec<Message>> {
        let url = self.endpoint(&["chat", "history", session_id])?;
        CLIENT_REQUESTS.click();
        HISTORY_LOADS.click();
        tracing::debug!(%url, "fetching chat history");

        let response = self
            .client
            .get(url)
            .headers(Self::default_headers("application/json"))
            .send()
            .await
            .map_err(|e| {
                HISTORY_FAILURES.click();
                self.request_error(e)
            })?;

        if !response.status().is_success() {
            HISTORY_FAILURES.click();
            return Err(Self::process_error_response(response).await);
        }

        let body = response.json::<HistoryResponse>().await.map_err(|e| {
            HISTORY_FAILURES.click();
            Error::serialization(
                format!("Failed to parse history response: {e}"),
                Some(Box::new(e)),
            )
        })?;
        if let Some(error) = &body.error {
            tracing::warn!(%error, "service reported a history error");
        }
        Ok(body.messages)
    }

    /// Send a chat message and return the raw streamed body.
    ///
    /// Returns `Ok(None)` for statuses that never carry a body (204, 205).
    /// Any other status, error statuses included, yields its body: whatever
    /// the service wrote is the reply.
    pub async fn chat(&self, request: &ChatRequest) -> Result<Option<ByteStream>> {
        let url = self.endpoint(&["chat"])?;
        CLIENT_REQUESTS.click();
        tracing::debug!(%url, session_id = %request.session_id, "posting chat message");

        let start = Instant::now();
        let response = self
            .client
            .post(url)
            .headers(Self::default_headers("text/plain"))
            .json(request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let status = response.status();
        if matches!(status, StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT) {
            return Ok(None);
        }
        if !status.is_success() {
            CLIENT_REQUEST_ERRORS.click();
            tracing::warn!(
                status = status.as_u16(),
                "chat service answered with an error status; streaming its body as the reply"
            );
        }

        let stream = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| {
                Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e)))
            })
        });
        Ok(Some(Box::pin(stream)))
    }

    /// Probe `GET /health`.
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = self.endpoint(&["health"])?;
        CLIENT_REQUESTS.click();

        let response = self
            .client
            .get(url)
            .headers(Self::default_headers("application/json"))
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response.json::<HealthStatus>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse health response: {e}"),
                Some(Box::new(e)),
            )
        })
    }
}

#[async_trait::async_trait]
impl ChatBackend for ChatClient {
    async fn history(&self, session_id: &str) -> Result<Vec<Message>> {
        ChatClient::history(self, session_id).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<Option<ByteStream>> {
        ChatClient::chat(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_precedence() {
        assert_eq!(resolve_base_url(None, None), DEFAULT_BASE_URL);
        assert_eq!(
            resolve_base_url(None, Some("http://rag.internal:9000".to_string())),
            "http://rag.internal:9000"
        );
        assert_eq!(
            resolve_base_url(
                Some("https://chat.example.com/".to_string()),
                Some("http://rag.internal:9000".to_string())
            ),
            "https://chat.example.com"
        );
        assert_eq!(
            resolve_base_url(Some("  ".to_string()), Some(String::new())),
            DEFAULT_BASE_URL
        );
    }

    #[test]
    fn client_creation() {
        let client = ChatClient::with_options(
            Some("https://chat.example.com/".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url(), "https://chat.example.com");
        assert_eq!(client.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn invalid_base_url_rejected() {
        let err = ChatClient::with_options(Some("not a url".to_string()), None).unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn endpoints_keep_base_path() {
        let client =
            ChatClient::with_options(Some("http://localhost:8000/api".to_string()), None).unwrap();
        assert_eq!(
            client.endpoint(&["chat", "history", "abc"]).unwrap().as_str(),
            "http://localhost:8000/api/chat/history/abc"
        );

        let client = ChatClient::with_options(Some(DEFAULT_BASE_URL.to_string()), None).unwrap();
        assert_eq!(
            client.endpoint(&["chat"]).unwrap().as_str(),
            "http://localhost:8000/chat"
        );
    }

    #[test]
    fn session_id_is_escaped_as_one_segment() {
        let client = ChatClient::with_options(Some(DEFAULT_BASE_URL.to_string()), None).unwrap();
        assert_eq!(
            client.endpoint(&["chat", "history", "a/b c"]).unwrap().as_str(),
            "http://localhost:8000/chat/history/a%2Fb%20c"
        );
    }
}
