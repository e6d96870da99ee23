//! The chat provider trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderError;

use super::{ChatRequest, ChatResponse};

/// A chat completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Stable identifier of the provider, used as its registry key.
    fn id(&self) -> &str;

    /// Run one chat completion.
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError>;

    /// Run a completion whose output must be a JSON value conforming to
    /// the given schema.
    ///
    /// The default implementation delegates to [`complete`](Self::complete)
    /// and parses the reply as JSON, failing with
    /// [`ProviderError::InvalidResponse`] when the reply is not valid JSON.
    /// Backends with native structured output support override this to
    /// pass the schema through to the model.
    async fn complete_structured(
        &self,
        _schema: Value,
        request: ChatRequest,
    ) -> Result<Value, ProviderError> {
        let response = self.complete(request).await?;
        serde_json::from_str(&response.text)
            .map_err(|e| ProviderError::InvalidResponse(format!("reply is not JSON: {e}")))
    }
}
