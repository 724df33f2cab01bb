use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::{LlmError, Result};

/// A single LLM backend capable of both free-text generation and
/// embeddings. Tagged-variant, not a trait-object hierarchy: the process
/// picks exactly one of these at startup and never falls back across
/// providers mid-operation.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn generate(&self, client: &reqwest::Client, prompt: &str) -> Result<String>;
    async fn embed(&self, client: &reqwest::Client, text: &str) -> Result<Vec<f32>>;
}

/// Ollama-shaped local provider: `/api/generate` and `/api/embeddings`.
pub struct LocalProvider {
    pub base_url: String,
    pub generate_model: String,
    pub embed_model: String,
}

#[derive(Deserialize)]
struct LocalGenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct LocalEmbedResponse {
    embedding: Vec<f32>,
}

#[async_trait]
impl Provider for LocalProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn generate(&self, client: &reqwest::Client, prompt: &str) -> Result<String> {
        let resp = client
            .post(format!("{}/api/generate", self.base_url))
            .json(&json!({
                "model": self.generate_model,
                "prompt": prompt,
                "stream": false,
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(status_to_error(resp.status()));
        }
        let body: LocalGenerateResponse = resp.json().await?;
        Ok(body.response)
    }

    async fn embed(&self, client: &reqwest::Client, text: &str) -> Result<Vec<f32>> {
        let resp = client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&json!({
                "model": self.embed_model,
                "prompt": text,
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(status_to_error(resp.status()));
        }
        let body: LocalEmbedResponse = resp.json().await?;
        Ok(body.embedding)
    }
}

/// OpenAI-chat-completions-shaped remote provider ("remote A").
pub struct RemoteAProvider {
    pub api_key: String,
    pub model: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[async_trait]
impl Provider for RemoteAProvider {
    fn name(&self) -> &'static str {
        "remote_a"
    }

    async fn generate(&self, client: &reqwest::Client, prompt: &str) -> Result<String> {
        let resp = client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "temperature": 0.2,
                "messages": [{"role": "user", "content": prompt}],
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(status_to_error(resp.status()));
        }
        let body: ChatCompletionResponse = resp.json().await?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::ResponseUnparseable("no choices in response".to_string()))
    }

    async fn embed(&self, client: &reqwest::Client, text: &str) -> Result<Vec<f32>> {
        let resp = client
            .post("https://api.openai.com/v1/embeddings")
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "input": text,
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(status_to_error(resp.status()));
        }
        let body: EmbeddingResponse = resp.json().await?;
        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::ResponseUnparseable("no embedding in response".to_string()))
    }
}

/// Anthropic-messages-shaped remote provider ("remote B"). Has no
/// embeddings endpoint of its own; embedding calls against it are a
/// configuration error the caller should have routed to the local provider
/// instead, so they fail with `ResponseUnparseable`.
pub struct RemoteBProvider {
    pub api_key: String,
    pub model: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

#[async_trait]
impl Provider for RemoteBProvider {
    fn name(&self) -> &'static str {
        "remote_b"
    }

    async fn generate(&self, client: &reqwest::Client, prompt: &str) -> Result<String> {
        let resp = client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&json!({
                "model": self.model,
                "max_tokens": 2048,
                "temperature": 0.2,
                "messages": [{"role": "user", "content": prompt}],
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(status_to_error(resp.status()));
        }
        let body: MessagesResponse = resp.json().await?;
        body.content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| LlmError::ResponseUnparseable("no content in response".to_string()))
    }

    async fn embed(&self, _client: &reqwest::Client, _text: &str) -> Result<Vec<f32>> {
        Err(LlmError::ResponseUnparseable(
            "remote_b has no embeddings endpoint".to_string(),
        ))
    }
}

fn status_to_error(status: reqwest::StatusCode) -> LlmError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        LlmError::ProviderRateLimited
    } else if status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status == reqwest::StatusCode::GATEWAY_TIMEOUT
    {
        LlmError::ProviderTimeout
    } else {
        LlmError::ResponseUnparseable(format!("provider returned status {status}"))
    }
}

/// Probe the local provider's `/api/tags` endpoint for the required model
/// names, used only as the last fallback in provider selection.
pub async fn probe_local(
    client: &reqwest::Client,
    base_url: &str,
    required_models: &[&str],
) -> bool {
    #[derive(Deserialize)]
    struct TagsResponse {
        models: Vec<TagEntry>,
    }
    #[derive(Deserialize)]
    struct TagEntry {
        name: String,
    }

    let Ok(resp) = client.get(format!("{base_url}/api/tags")).send().await else {
        return false;
    };
    if !resp.status().is_success() {
        return false;
    }
    let Ok(body) = resp.json::<TagsResponse>().await else {
        return false;
    };
    required_models
        .iter()
        .all(|wanted| body.models.iter().any(|m| &m.name == wanted))
}
