#![deny(missing_docs)]

//! # `kimi-async`
//!
//! An async client for the Moonshot AI ("Kimi") chat-completions API.
//!
//! The wire format is OpenAI-compatible: requests go to
//! `/v1/chat/completions` with a list of role-tagged messages and optional
//! function tools; responses carry choices whose messages contain text
//! content and/or tool calls.
//!
//! ## Quick Start
//!
//! ```no_run
//! use kimi_async::{Client, types::chat::*};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new();
//!
//! let req = ChatCompletionRequest {
//!     model: "kimi-k2-0905-preview".into(),
//!     messages: vec![ChatMessage::user("Hello!")],
//!     temperature: Some(0.7),
//!     top_p: None,
//!     max_tokens: Some(256),
//!     tools: None,
//!     tool_choice: None,
//! };
//!
//! let response = client.chat().create(req).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Authentication
//!
//! Bearer token authentication via the `MOONSHOT_API_KEY` environment
//! variable, or explicitly through [`KimiConfig::with_api_key`].

/// HTTP client implementation
pub mod client;
/// Configuration types for the client
pub mod config;
/// Error types
pub mod error;
/// API resource implementations
pub mod resources;
/// Retry logic utilities
pub mod retry;
/// Request and response types
pub mod types;

pub use crate::client::Client;
pub use crate::config::{KimiAuth, KimiConfig};
pub use crate::error::{ApiErrorObject, KimiError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::types::chat::*;
    pub use crate::types::tools::*;
    pub use crate::{Client, KimiConfig};
}
