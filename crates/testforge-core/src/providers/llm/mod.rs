use async_trait::async_trait;

/// Text-generation capability used by the case synthesizer.
///
/// Implementations may fail; the synthesizer's generative strategy converts
/// any failure into fallback text, so retry/fallback policy lives in exactly
/// one place.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, model: Option<&str>) -> anyhow::Result<String>;
    fn provider_name(&self) -> &'static str;
}

pub mod canned;
pub mod openai;
