use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Finite, single-pass sequence of generated text fragments.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    async fn stream_chat(&self, system_prompt: &str, user_message: &str) -> Result<TextStream>;

    async fn get_model_info(&self) -> Result<String>;
}
