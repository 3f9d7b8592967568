use crate::{
    client::Client,
    config::Config,
    error::KimiError,
    types::chat::{ChatCompletionRequest, ChatCompletionResponse},
};

/// API resource for the `/v1/chat/completions` endpoint
pub struct Chat<'c, C: Config> {
    client: &'c Client<C>,
}

impl<'c, C: Config> Chat<'c, C> {
    /// Creates a new Chat resource
    #[must_use]
    pub const fn new(client: &'c Client<C>) -> Self {
        Self { client }
    }

    /// Create a chat completion
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No credential is configured
    /// - The request fails to send (after retries on transient statuses)
    /// - The API returns an error
    pub async fn create(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, KimiError> {
        self.client.post("/v1/chat/completions", req).await
    }
}

// Add to client
impl<C: Config> crate::Client<C> {
    /// Returns the Chat API resource
    #[must_use]
    pub const fn chat(&self) -> Chat<'_, C> {
        Chat::new(self)
    }
}
