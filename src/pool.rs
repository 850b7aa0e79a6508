//! Backend pool abstraction and implementations
//!
//! Provides the BackendPool trait and two implementations:
//! - OllamaPool: HTTP client for an Ollama-style model server
//! - StaticPool: in-process stub for tests and demos
//!
//! The pool is an external collaborator: it lists which models are loaded
//! and dispatches chat calls. The router only depends on the trait, so a
//! different serving stack can be slotted in without touching routing.
//!
//! ## Environment Variables
//!
//! - `OLLAMA_URL`: pool server URL (default: http://localhost:11434)

use crate::routing::AvailabilityProbe;
use crate::RouterError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// One chat-style message sent to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role: `user`, `assistant`, or `system`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Build a user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Trait for model pool clients
///
/// Implementations must be thread-safe (Send + Sync) for use across tasks.
/// The trait is object-safe to allow dynamic dispatch via Arc<dyn BackendPool>.
#[async_trait]
pub trait BackendPool: Send + Sync {
    /// List the model identifiers the pool currently serves.
    async fn list_models(&self) -> Result<Vec<String>, RouterError>;

    /// Dispatch a chat call to the given model and return the reply text.
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, RouterError>;
}

// ============================================================================
// Ollama Pool
// ============================================================================

/// Ollama tags response
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Ollama chat request payload
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// Ollama chat response
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaChatMessage {
    content: String,
}

/// HTTP client for an Ollama-style model server.
///
/// Server URL can be set via the OLLAMA_URL environment variable or
/// defaults to http://localhost:11434.
///
/// ## Example
///
/// ```no_run
/// use tokio_model_router::pool::OllamaPool;
/// use std::sync::Arc;
///
/// let pool = Arc::new(
///     OllamaPool::new()
///         .with_base_url("http://localhost:11434")
///         .with_timeout(std::time::Duration::from_secs(30))
/// );
/// ```
pub struct OllamaPool {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    probe_timeout: Duration,
}

impl OllamaPool {
    /// Create a new pool client.
    ///
    /// Reads the server URL from the OLLAMA_URL environment variable,
    /// or defaults to http://localhost:11434.
    pub fn new() -> Self {
        let base_url =
            std::env::var("OLLAMA_URL").unwrap_or_else(|_| "http://localhost:11434".to_string());

        Self {
            client: reqwest::Client::new(),
            base_url,
            timeout: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(5),
        }
    }

    /// Build a pool client from a routing config (endpoint + probe timeout).
    pub fn from_config(config: &crate::routing::RoutingConfig) -> Self {
        Self::new()
            .with_base_url(config.pool_url.clone())
            .with_probe_timeout(config.probe_timeout())
    }

    /// Set the server base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the dispatch timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the availability probe timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}

impl Default for OllamaPool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendPool for OllamaPool {
    async fn list_models(&self) -> Result<Vec<String>, RouterError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RouterError::Pool(format!("model listing failed: {e}")))?;

        if !response.status().is_success() {
            return Err(RouterError::Pool(format!(
                "model listing returned {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| RouterError::Pool(format!("failed to parse tags response: {e}")))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, RouterError> {
        let request = OllamaChatRequest {
            model,
            messages,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| RouterError::Inference(format!("chat request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RouterError::Inference(format!(
                "chat call returned {status}: {error_text}"
            )));
        }

        let reply: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| RouterError::Inference(format!("failed to parse chat response: {e}")))?;

        Ok(reply.message.content)
    }
}

#[async_trait]
impl AvailabilityProbe for OllamaPool {
    /// Minimal synthetic chat call bounded by the probe timeout.
    ///
    /// Every failure mode (timeout, refused connection, non-success
    /// status) reports `false`; the probe never errors.
    async fn probe(&self, backend_id: &str) -> bool {
        let ping = [ChatMessage::user("ping")];
        let request = OllamaChatRequest {
            model: backend_id,
            messages: &ping,
            stream: false,
        };

        let result = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .timeout(self.probe_timeout)
            .json(&request)
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(backend = %backend_id, error = %e, "availability probe failed");
                false
            }
        }
    }
}

// ============================================================================
// Static Pool (Testing)
// ============================================================================

/// In-process pool stub serving a fixed model list.
///
/// Chat calls echo the last user message back after a small simulated
/// delay. Useful for routing tests and demos without a real server.
pub struct StaticPool {
    models: Vec<String>,
    listing_fails: bool,
    /// Simulated dispatch delay
    pub delay_ms: u64,
}

impl StaticPool {
    /// A pool that lists exactly the given models.
    pub fn serving(models: Vec<String>) -> Self {
        Self {
            models,
            listing_fails: false,
            delay_ms: 5,
        }
    }

    /// A pool whose listing endpoint always errors.
    pub fn unreachable() -> Self {
        Self {
            models: Vec::new(),
            listing_fails: true,
            delay_ms: 5,
        }
    }
}

#[async_trait]
impl BackendPool for StaticPool {
    async fn list_models(&self) -> Result<Vec<String>, RouterError> {
        if self.listing_fails {
            return Err(RouterError::Pool("listing unavailable".to_string()));
        }
        Ok(self.models.clone())
    }

    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, RouterError> {
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;

        if !self.models.contains(&model.to_string()) {
            return Err(RouterError::Inference(format!("unknown model: {model}")));
        }

        let last = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        Ok(format!("[{model}] {last}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_pool_lists_configured_models() {
        let pool = StaticPool::serving(vec!["a".to_string(), "b".to_string()]);
        let models = pool.list_models().await.unwrap();
        assert_eq!(models, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unreachable_pool_listing_errors() {
        let pool = StaticPool::unreachable();
        assert!(pool.list_models().await.is_err());
    }

    #[tokio::test]
    async fn test_static_pool_chat_echoes_last_user_message() {
        let pool = StaticPool::serving(vec!["m".to_string()]);
        let reply = pool
            .chat("m", &[ChatMessage::user("hello there")])
            .await
            .unwrap();
        assert_eq!(reply, "[m] hello there");
    }

    #[tokio::test]
    async fn test_static_pool_chat_rejects_unknown_model() {
        let pool = StaticPool::serving(vec!["m".to_string()]);
        let result = pool.chat("other", &[ChatMessage::user("hi")]).await;
        assert!(matches!(result, Err(RouterError::Inference(_))));
    }

    #[test]
    fn test_chat_message_serde_shape() {
        let message = ChatMessage::user("ping");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "ping");
    }
}
