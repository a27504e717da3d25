use async_trait::async_trait;

use super::prompt::GenerationRequest;

/// Failure talking to a generation provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("provider is not configured: {0}")]
    NotConfigured(String),
}

/// A text-completion backend that accepts an instruction plus an output
/// schema and returns the raw completion text.
///
/// Called once per generation; no retries happen at this layer.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Short identifier used in logs (e.g. `"gemini"`).
    fn name(&self) -> &str;

    async fn complete(&self, request: &GenerationRequest) -> Result<String, ProviderError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn GenerationProvider) {}
};
