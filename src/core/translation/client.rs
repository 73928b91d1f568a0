use std::sync::RwLock;
use std::time::{Duration, Instant};
use async_trait::async_trait;
use chrono::Local;
use reqwest::{Client, StatusCode};
use tokio::sync::watch;
use unicode_segmentation::UnicodeSegmentation;
use url::Url;

use super::TranslationService;
use crate::shared::error::TranslationError;
use crate::shared::types::{
    ConnectionStatus, Language, TranslationRequest, TranslationResponse, TranslationResult,
};

/// Longest accepted input, in grapheme clusters
pub const MAX_TEXT_LENGTH: usize = 5000;

pub const CONNECTION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

const MCP_PATH: &str = "mcp";

/// HTTP client for the local translation server.
///
/// Owns the connection status: it is the only writer, and every public call
/// leaves the status at its terminal value for that call before returning.
pub struct TranslationClient {
    http: Client,
    endpoint: RwLock<Url>,
    status: watch::Sender<ConnectionStatus>,
}

impl TranslationClient {
    pub fn new(endpoint: Url) -> Result<Self, TranslationError> {
        let http = Client::builder()
            .user_agent(concat!("selection-translator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TranslationError::InvalidConfiguration(e.to_string()))?;

        let (status, _) = watch::channel(ConnectionStatus::Disconnected);

        Ok(Self {
            http,
            endpoint: RwLock::new(endpoint),
            status,
        })
    }

    pub fn endpoint(&self) -> Url {
        match self.endpoint.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Point the client at a new server. Status drops to disconnected until the
    /// next check or call; calls already in flight keep their old endpoint.
    pub fn update_endpoint(&self, endpoint: Url) {
        tracing::info!("[Translator] Endpoint changed to {}", endpoint);
        match self.endpoint.write() {
            Ok(mut guard) => *guard = endpoint,
            Err(poisoned) => *poisoned.into_inner() = endpoint,
        }
        self.set_status(ConnectionStatus::Disconnected);
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    /// Receive every status change
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    fn set_status(&self, status: ConnectionStatus) {
        let previous = self.status.send_replace(status.clone());
        if previous != status {
            tracing::debug!("[Translator] Status: {} -> {}", previous, status);
        }
    }

    fn transport_failure(&self, err: reqwest::Error) -> TranslationError {
        self.set_status(ConnectionStatus::Error("Network error".to_string()));

        if err.is_connect() {
            tracing::warn!("[Translator] Cannot reach server: {}", err);
            TranslationError::ServerUnavailable
        } else {
            tracing::warn!("[Translator] Request failed: {}", err);
            TranslationError::Network(err)
        }
    }

    pub async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<TranslationResult, TranslationError> {
        let started = Instant::now();

        validate_text(text)?;
        let url = mcp_url(&self.endpoint())?;

        self.set_status(ConnectionStatus::Connecting);
        tracing::info!("[Translator] {} -> {} ({} bytes)", source, target, text.len());

        let request = TranslationRequest::new(text, source, target);
        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_failure(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(if status == StatusCode::NOT_FOUND || status.as_u16() >= 500 {
                tracing::warn!("[Translator] Server unavailable: {}", status);
                self.set_status(ConnectionStatus::Error("Server unavailable".to_string()));
                TranslationError::ServerUnavailable
            } else {
                tracing::warn!("[Translator] Unexpected status: {}", status);
                self.set_status(ConnectionStatus::Error(format!("HTTP {}", status.as_u16())));
                TranslationError::InvalidResponse
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_failure(e))?;

        let parsed: TranslationResponse = serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!("[Translator] Failed to parse response: {}", e);
            self.set_status(ConnectionStatus::Error("Invalid response format".to_string()));
            TranslationError::InvalidResponse
        })?;

        self.set_status(ConnectionStatus::Connected);

        let elapsed = started.elapsed();
        if let Some(server_time) = parsed.processing_time {
            tracing::debug!("[Translator] Server processing time: {:.3}s", server_time);
        }
        tracing::info!("[Translator] Done in {:?}", elapsed);

        Ok(TranslationResult {
            original_text: text.to_string(),
            translated_text: parsed.translated_text,
            source_language: source,
            target_language: target,
            timestamp: Local::now(),
            elapsed,
        })
    }

    pub async fn check_connection(&self) -> bool {
        let url = match mcp_url(&self.endpoint()) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("[Translator] {}", e);
                self.set_status(ConnectionStatus::Disconnected);
                return false;
            }
        };

        let connected = match self
            .http
            .get(url)
            .timeout(CONNECTION_CHECK_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().as_u16() < 500,
            Err(e) => {
                tracing::debug!("[Translator] Connection check failed: {}", e);
                false
            }
        };

        self.set_status(if connected {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        });
        connected
    }
}

#[async_trait]
impl TranslationService for TranslationClient {
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<TranslationResult, TranslationError> {
        TranslationClient::translate(self, text, source, target).await
    }

    async fn check_connection(&self) -> bool {
        TranslationClient::check_connection(self).await
    }

    fn connection_status(&self) -> ConnectionStatus {
        self.status()
    }
}

fn validate_text(text: &str) -> Result<(), TranslationError> {
    if text.trim().is_empty() {
        return Err(TranslationError::NoTextSelected);
    }
    if text.graphemes(true).count() > MAX_TEXT_LENGTH {
        return Err(TranslationError::TextTooLong);
    }
    Ok(())
}

/// `<endpoint>/mcp`, tolerating a trailing slash on the endpoint
fn mcp_url(endpoint: &Url) -> Result<Url, TranslationError> {
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(TranslationError::InvalidConfiguration(format!(
            "Unsupported endpoint scheme: {}",
            endpoint
        )));
    }

    let mut url = endpoint.clone();
    {
        let mut segments = url.path_segments_mut().map_err(|_| {
            TranslationError::InvalidConfiguration(format!("Endpoint cannot carry a path: {}", endpoint))
        })?;
        segments.pop_if_empty().push(MCP_PATH);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode as MockStatus;
    use axum::routing::{any, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn spawn_server(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{}", addr)).unwrap()
    }

    /// An address nothing listens on
    async fn dead_endpoint() -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        Url::parse(&format!("http://{}", addr)).unwrap()
    }

    fn counting_server(hits: Arc<AtomicUsize>) -> Router {
        Router::new().route(
            "/mcp",
            post(move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"translated_text": "x"}))
                }
            }),
        )
    }

    fn status_server(status: MockStatus) -> Router {
        Router::new().route("/mcp", any(move || async move { (status, "nope") }))
    }

    #[test]
    fn test_mcp_url_joins_path() {
        let plain = Url::parse("http://127.0.0.1:30000").unwrap();
        assert_eq!(mcp_url(&plain).unwrap().as_str(), "http://127.0.0.1:30000/mcp");

        let nested = Url::parse("http://localhost:8080/api/").unwrap();
        assert_eq!(mcp_url(&nested).unwrap().as_str(), "http://localhost:8080/api/mcp");

        let mail = Url::parse("mailto:someone@example.com").unwrap();
        assert!(matches!(mcp_url(&mail), Err(TranslationError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_length_counts_graphemes() {
        assert!(validate_text(&"a".repeat(MAX_TEXT_LENGTH)).is_ok());
        // Each family emoji is one grapheme but several scalars
        assert!(validate_text(&"👨‍👩‍👧".repeat(MAX_TEXT_LENGTH)).is_ok());
        assert!(matches!(
            validate_text(&"a".repeat(MAX_TEXT_LENGTH + 1)),
            Err(TranslationError::TextTooLong)
        ));
    }

    #[tokio::test]
    async fn test_blank_text_rejected_without_network() {
        let hits = Arc::new(AtomicUsize::new(0));
        let endpoint = spawn_server(counting_server(hits.clone())).await;
        let client = TranslationClient::new(endpoint).unwrap();

        for text in ["", "   ", "\n\t "] {
            let err = client
                .translate(text, Language::English, Language::Japanese)
                .await
                .unwrap_err();
            assert!(matches!(err, TranslationError::NoTextSelected));
        }

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(client.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_too_long_text_rejected_without_network() {
        let hits = Arc::new(AtomicUsize::new(0));
        let endpoint = spawn_server(counting_server(hits.clone())).await;
        let client = TranslationClient::new(endpoint).unwrap();

        let text = "a".repeat(5001);
        let err = client
            .translate(&text, Language::English, Language::Japanese)
            .await
            .unwrap_err();

        assert!(matches!(err, TranslationError::TextTooLong));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_composite_target_is_forwarded_to_server() {
        let router = Router::new().route(
            "/mcp",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["source_language"], "English");
                assert_eq!(body["target_language"], "English|Japanese");
                Json(json!({"translated_text": "hello"}))
            }),
        );
        let client = TranslationClient::new(spawn_server(router).await).unwrap();

        let result = client
            .translate("hello", Language::English, Language::EnglishJapanese)
            .await
            .unwrap();

        assert_eq!(result.target_language, Language::EnglishJapanese);
        assert_eq!(client.status(), ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn test_successful_translation() {
        let router = Router::new().route(
            "/mcp",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["messages"][0]["content"], "hello");
                Json(json!({"translated_text": "こんにちは"}))
            }),
        );
        let client = TranslationClient::new(spawn_server(router).await).unwrap();

        let result = client
            .translate("hello", Language::English, Language::Japanese)
            .await
            .unwrap();

        assert_eq!(result.original_text, "hello");
        assert_eq!(result.translated_text, "こんにちは");
        assert_eq!(result.source_language, Language::English);
        assert_eq!(result.target_language, Language::Japanese);
        assert!(result.elapsed >= Duration::ZERO);
        assert_eq!(client.status(), ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn test_request_body_shape() {
        // Echo the received body back so the test can inspect it
        let router = Router::new().route(
            "/mcp",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "translated_text": body.to_string(),
                    "source_language": "ignored",
                    "target_language": "ignored",
                    "processing_time": 0.1,
                }))
            }),
        );
        let client = TranslationClient::new(spawn_server(router).await).unwrap();

        let result = client
            .translate("  keep  spacing ", Language::EnglishJapanese, Language::JapaneseEasy)
            .await
            .unwrap();

        let sent: Value = serde_json::from_str(&result.translated_text).unwrap();
        assert_eq!(
            sent,
            json!({
                "messages": [{"role": "user", "content": "  keep  spacing "}],
                "source_language": "English|Japanese",
                "target_language": "Japanese(easy)",
            })
        );
        // Requested languages are reported, not the echoed ones
        assert_eq!(result.source_language, Language::EnglishJapanese);
        assert_eq!(result.target_language, Language::JapaneseEasy);
    }

    #[tokio::test]
    async fn test_unparseable_body_is_invalid_response() {
        let router = Router::new().route("/mcp", post(|| async { "definitely not json" }));
        let client = TranslationClient::new(spawn_server(router).await).unwrap();

        let err = client
            .translate("hello", Language::English, Language::Japanese)
            .await
            .unwrap_err();

        assert!(matches!(err, TranslationError::InvalidResponse));
        assert_eq!(
            client.status(),
            ConnectionStatus::Error("Invalid response format".to_string())
        );
    }

    #[tokio::test]
    async fn test_404_and_5xx_are_server_unavailable() {
        for status in [MockStatus::NOT_FOUND, MockStatus::SERVICE_UNAVAILABLE, MockStatus::INTERNAL_SERVER_ERROR] {
            let client = TranslationClient::new(spawn_server(status_server(status)).await).unwrap();

            let err = client
                .translate("hello", Language::English, Language::Japanese)
                .await
                .unwrap_err();

            assert!(matches!(err, TranslationError::ServerUnavailable), "status {}", status);
            assert_eq!(
                client.status(),
                ConnectionStatus::Error("Server unavailable".to_string())
            );
        }
    }

    #[tokio::test]
    async fn test_other_statuses_are_invalid_response() {
        for (status, code) in [(MockStatus::BAD_REQUEST, 400), (MockStatus::CREATED, 201)] {
            let client = TranslationClient::new(spawn_server(status_server(status)).await).unwrap();

            let err = client
                .translate("hello", Language::English, Language::Japanese)
                .await
                .unwrap_err();

            assert!(matches!(err, TranslationError::InvalidResponse));
            assert_eq!(client.status(), ConnectionStatus::Error(format!("HTTP {}", code)));
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_server_unavailable() {
        let client = TranslationClient::new(dead_endpoint().await).unwrap();

        let err = client
            .translate("hello", Language::English, Language::Japanese)
            .await
            .unwrap_err();

        assert!(matches!(err, TranslationError::ServerUnavailable));
        assert_eq!(client.status(), ConnectionStatus::Error("Network error".to_string()));
    }

    #[tokio::test]
    async fn test_check_connection_below_500_is_connected() {
        for status in [MockStatus::OK, MockStatus::METHOD_NOT_ALLOWED, MockStatus::NOT_FOUND, MockStatus::IM_A_TEAPOT] {
            let client = TranslationClient::new(spawn_server(status_server(status)).await).unwrap();

            assert!(client.check_connection().await, "status {}", status);
            assert_eq!(client.status(), ConnectionStatus::Connected);
        }
    }

    #[tokio::test]
    async fn test_check_connection_failures_are_disconnected() {
        let client = TranslationClient::new(
            spawn_server(status_server(MockStatus::BAD_GATEWAY)).await,
        )
        .unwrap();
        client.set_status(ConnectionStatus::Connected);
        assert!(!client.check_connection().await);
        assert_eq!(client.status(), ConnectionStatus::Disconnected);

        let dead = TranslationClient::new(dead_endpoint().await).unwrap();
        dead.set_status(ConnectionStatus::Connected);
        assert!(!dead.check_connection().await);
        assert_eq!(dead.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_update_endpoint_resets_status() {
        let client = TranslationClient::new(
            spawn_server(status_server(MockStatus::OK)).await,
        )
        .unwrap();
        assert!(client.check_connection().await);

        let mut rx = client.subscribe();
        let next = Url::parse("http://127.0.0.1:1").unwrap();
        client.update_endpoint(next.clone());

        assert_eq!(client.status(), ConnectionStatus::Disconnected);
        assert_eq!(client.endpoint(), next);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_in_flight_call_keeps_its_endpoint() {
        let router = Router::new().route(
            "/mcp",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Json(json!({"translated_text": "late"}))
            }),
        );
        let client = Arc::new(TranslationClient::new(spawn_server(router).await).unwrap());

        let in_flight = {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .translate("hello", Language::English, Language::Japanese)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        client.update_endpoint(dead_endpoint().await);

        let result = in_flight.await.unwrap().unwrap();
        assert_eq!(result.translated_text, "late");
    }
}
