//! Text-generation provider abstraction.
//!
//! The recommendation pipeline only needs "prompt in, free text out"; the
//! trait keeps the remote vendor swappable and lets tests substitute a mock.

use crate::error::AppResult;

pub mod dashscope;

pub use dashscope::DashScopeProvider;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TextGenProvider: Send + Sync {
    /// Sends one prompt and returns the model's raw text reply.
    ///
    /// Implementations surface transport failures and unrecognized response
    /// envelopes as `ExternalApi` errors; they never invent a reply.
    async fn generate(&self, prompt: &str) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
