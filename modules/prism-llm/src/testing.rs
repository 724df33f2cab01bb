use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{LlmError, Result};
use crate::provider::Provider;

/// A scripted provider for tests: returns queued responses in order and
/// records every prompt it was called with.
pub struct FakeProvider {
    generate_responses: Mutex<Vec<Result<String>>>,
    embed_responses: Mutex<Vec<Result<Vec<f32>>>>,
    prompts_seen: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            generate_responses: Mutex::new(Vec::new()),
            embed_responses: Mutex::new(Vec::new()),
            prompts_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_generate_response(self, response: impl Into<String>) -> Self {
        self.generate_responses
            .lock()
            .unwrap()
            .push(Ok(response.into()));
        self
    }

    pub fn with_generate_error(self, err: LlmError) -> Self {
        self.generate_responses.lock().unwrap().push(Err(err));
        self
    }

    pub fn with_embed_response(self, response: Vec<f32>) -> Self {
        self.embed_responses.lock().unwrap().push(Ok(response));
        self
    }

    pub fn prompts_seen(&self) -> Vec<String> {
        self.prompts_seen.lock().unwrap().clone()
    }
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn generate(&self, _client: &reqwest::Client, prompt: &str) -> Result<String> {
        self.prompts_seen.lock().unwrap().push(prompt.to_string());
        let mut responses = self.generate_responses.lock().unwrap();
        if responses.is_empty() {
            return Err(LlmError::ResponseUnparseable(
                "FakeProvider ran out of scripted generate responses".to_string(),
            ));
        }
        responses.remove(0)
    }

    async fn embed(&self, _client: &reqwest::Client, text: &str) -> Result<Vec<f32>> {
        self.prompts_seen.lock().unwrap().push(text.to_string());
        let mut responses = self.embed_responses.lock().unwrap();
        if responses.is_empty() {
            return Err(LlmError::ResponseUnparseable(
                "FakeProvider ran out of scripted embed responses".to_string(),
            ));
        }
        responses.remove(0)
    }
}
