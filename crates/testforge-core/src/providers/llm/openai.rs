use super::TextGenerator;
use async_trait::async_trait;
use serde_json::json;

pub struct OpenAiGenerator {
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub client: reqwest::Client,
}

impl OpenAiGenerator {
    pub fn new(model: String, api_key: String) -> Self {
        Self {
            model,
            api_key,
            temperature: 0.2,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str, model: Option<&str>) -> anyhow::Result<String> {
        let url = "https://api.openai.com/v1/chat/completions";
        let model_name = model.unwrap_or(&self.model);

        let body = json!({
            "model": model_name,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
        });

        let resp = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI chat API error: {}", error_text);
        }

        let json: serde_json::Value = resp.json().await?;

        let text = json
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("OpenAI API response missing content"))?
            .to_string();

        Ok(text)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
