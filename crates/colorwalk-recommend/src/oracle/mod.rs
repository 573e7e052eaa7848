//! Oracle seam: anything that turns a prompt into free text
//!
//! The engine never sees this trait. The service calls it, and on any error
//! hands the engine an empty string so the result degrades to fallback fill.

use async_trait::async_trait;

#[cfg(feature = "gemini")]
pub mod gemini;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Oracle returned no text")]
    EmptyResponse,
    #[error("Oracle not configured: {0}")]
    NotConfigured(String),
}

/// Text-generation oracle
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, OracleError>;

    /// Short label for logs
    fn name(&self) -> &str;
}

/// Replays fixed text, or a fixed failure
#[derive(Debug, Clone)]
pub struct StaticOracle {
    reply: Result<String, OracleError>,
}

impl StaticOracle {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
        }
    }

    pub fn failing(error: OracleError) -> Self {
        Self { reply: Err(error) }
    }
}

#[async_trait]
impl Oracle for StaticOracle {
    async fn generate(&self, _prompt: &str) -> Result<String, OracleError> {
        self.reply.clone()
    }

    fn name(&self) -> &str {
        "static"
    }
}
