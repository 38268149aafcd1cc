use super::TextGenerator;
use async_trait::async_trait;

const SAMPLE_CASES: &str = r#"{ "test_cases": [
{ "id": "REQ-1", "title": "Sample login", "steps": ["Go to /login", "Enter user", "Enter pass", "Click Login"], "expected": "Dashboard" },
{ "id": "REQ-2", "title": "Sample logout", "steps": ["Click profile", "Click Logout"], "expected": "Login page" }
] }"#;

/// Deterministic provider for local/dev environments: always returns the
/// same synthetic payload regardless of the prompt.
pub struct CannedGenerator {
    text: String,
}

impl CannedGenerator {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for CannedGenerator {
    fn default() -> Self {
        Self::new(SAMPLE_CASES)
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _prompt: &str, _model: Option<&str>) -> anyhow::Result<String> {
        Ok(self.text.clone())
    }

    fn provider_name(&self) -> &'static str {
        "canned"
    }
}
