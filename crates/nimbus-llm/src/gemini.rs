//! Gemini `generateContent` backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::backend::LlmBackend;
use crate::error::{LlmError, Result};
use crate::types::{Content, FunctionDeclaration, GenerateRequest, GenerateResponse, Part};

/// Default Gemini API base URL.
pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";

/// Default timeout for requests.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key, sent as the `key` query parameter.
    pub api_key: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Model to use.
    pub model: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Create a new config with default model and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_GEMINI_BASE.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gemini Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Google Gemini API backend.
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    /// Create a new Gemini backend with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Config("Gemini API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Build the generateContent endpoint URL.
    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Handle a successful response.
    async fn handle_response(response: Response) -> Result<GenerateResponse> {
        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        let body = response.text().await?;
        let parsed: GeminiResponse = serde_json::from_str(&body)?;
        parsed.into_response()
    }

    /// Handle an error response.
    async fn handle_error_response(response: Response) -> LlmError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<GeminiErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

        match status.as_u16() {
            400 => LlmError::InvalidRequest(message),
            401 | 403 => LlmError::Auth(message),
            429 => LlmError::RateLimit(message),
            500..=599 => LlmError::Backend(format!("Server error: {}", message)),
            _ => LlmError::Backend(message),
        }
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let body = GeminiRequest::from(request);

        tracing::debug!(
            model = %self.config.model,
            turns = body.contents.len(),
            functions = body
                .tools
                .iter()
                .flatten()
                .map(|t| t.function_declarations.len())
                .sum::<usize>(),
            "Sending Gemini request"
        );

        let response = self
            .client
            .post(self.generate_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Create a shared Gemini backend.
pub fn create_shared_backend(config: GeminiConfig) -> Result<Arc<dyn LlmBackend>> {
    Ok(Arc::new(GeminiBackend::new(config)?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Gemini API Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<FunctionDeclaration>,
}

impl From<GenerateRequest> for GeminiRequest {
    fn from(request: GenerateRequest) -> Self {
        Self {
            contents: request.contents,
            system_instruction: request.system.map(|text| GeminiSystemInstruction {
                parts: vec![Part::text(text)],
            }),
            tools: if request.functions.is_empty() {
                None
            } else {
                Some(vec![GeminiTool {
                    function_declarations: request.functions,
                }])
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

impl GeminiResponse {
    fn into_response(self) -> Result<GenerateResponse> {
        let content = self
            .candidates
            .into_iter()
            .find_map(|c| c.content)
            .ok_or_else(|| {
                match self.prompt_feedback.and_then(|f| f.block_reason) {
                    Some(reason) => LlmError::Blocked(reason),
                    None => LlmError::Backend("Gemini returned no candidates".to_string()),
                }
            })?;

        Ok(GenerateResponse { content })
    }
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_config_builder() {
        let config = GeminiConfig::new("key")
            .with_model("gemini-2.0-flash")
            .with_base_url("http://localhost:9999/v1beta/")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.timeout, Duration::from_secs(5));

        let backend = GeminiBackend::new(config).unwrap();
        assert_eq!(
            backend.generate_url(),
            "http://localhost:9999/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(backend.model(), "gemini-2.0-flash");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            GeminiBackend::new(GeminiConfig::new("")),
            Err(LlmError::Config(_))
        ));
    }

    #[test]
    fn test_request_wire_format() {
        let request = GenerateRequest::new("Weather in Chicago?")
            .with_system("Be brief.")
            .with_functions(vec![FunctionDeclaration::new(
                "get_forecast",
                "Get forecast",
                json!({"type": "object", "properties": {}}),
            )]);

        let value = serde_json::to_value(GeminiRequest::from(request)).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "Weather in Chicago?"}]}],
                "systemInstruction": {"parts": [{"text": "Be brief."}]},
                "tools": [{"functionDeclarations": [{
                    "name": "get_forecast",
                    "description": "Get forecast",
                    "parameters": {"type": "object", "properties": {}}
                }]}]
            })
        );
    }

    #[test]
    fn test_request_without_tools() {
        let value = serde_json::to_value(GeminiRequest::from(GenerateRequest::new("hi"))).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_parse_function_call_response() {
        let body = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"functionCall": {"name": "get_alerts", "args": {"state": "CA"}}}]
                },
                "finishReason": "STOP"
            }]
        });
        let parsed: GeminiResponse = serde_json::from_value(body).unwrap();
        let response = parsed.into_response().unwrap();

        assert_eq!(response.content.role, Some(Role::Model));
        let call = response.function_call_request().unwrap();
        assert_eq!(call.name, "get_alerts");
        assert_eq!(call.args, json!({"state": "CA"}));
    }

    #[test]
    fn test_parse_blocked_response() {
        let body = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let parsed: GeminiResponse = serde_json::from_value(body).unwrap();
        let err = parsed.into_response().unwrap_err();
        assert!(matches!(err, LlmError::Blocked(ref reason) if reason == "SAFETY"));

        let parsed: GeminiResponse = serde_json::from_value(json!({"candidates": []})).unwrap();
        assert!(matches!(
            parsed.into_response().unwrap_err(),
            LlmError::Backend(_)
        ));
    }

    /// Serve one canned HTTP response and return the request that was received.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/v1beta", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                received.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&received).to_string();
                if let Some(idx) = text.find("\r\n\r\n") {
                    let length = text[..idx]
                        .lines()
                        .find_map(|l| {
                            l.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if received.len() >= idx + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&received).to_string()
        });

        (base, handle)
    }

    #[tokio::test]
    async fn test_generate_over_http() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Sunny all week."}]}}]}"#,
        )
        .await;

        let backend = GeminiBackend::new(GeminiConfig::new("test-key").with_base_url(base)).unwrap();
        let response = backend
            .generate(GenerateRequest::new("Weather in Phoenix?"))
            .await
            .unwrap();
        assert_eq!(response.text(), "Sunny all week.");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1beta/models/gemini-1.5-pro:generateContent?key=test-key"));
        assert!(request.contains("Weather in Phoenix?"));
    }

    #[tokio::test]
    async fn test_generate_auth_error() {
        let (base, server) = serve_once(
            "403 Forbidden",
            r#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#,
        )
        .await;

        let backend = GeminiBackend::new(GeminiConfig::new("bad-key").with_base_url(base)).unwrap();
        let err = backend
            .generate(GenerateRequest::new("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Auth(ref msg) if msg == "API key not valid"));
        server.await.unwrap();
    }
}
