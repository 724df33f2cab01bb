use std::sync::Arc;
use std::time::Duration;

use prism_common::Config;
use tokio::sync::OnceCell;
use tokio::time::timeout;

use crate::budget::BudgetGuard;
use crate::error::{LlmError, Result};
use crate::provider::{probe_local, LocalProvider, Provider, RemoteAProvider, RemoteBProvider};
use crate::types::{
    reconcile_bias_response, BiasAnalysisArticle, BiasAnalysisResult, RawBiasAnalysisResponse,
    SimilarityJudgment,
};
use crate::util::{extract_balanced_json, strip_code_blocks};

const CALL_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;
/// Flat per-call cost estimate used by the budget guard. The provider
/// contract doesn't expose token-level pricing, so every call — generate or
/// embed — is charged the same nominal amount.
const CALL_COST_CENTS: u64 = 1;

/// Process-wide LLM client. Provider selection happens once, lazily, on
/// first use and is never revisited — if the selected provider starts
/// failing mid-run, calls surface that failure rather than silently
/// switching providers.
pub struct LlmClient {
    http: reqwest::Client,
    config: Config,
    provider: OnceCell<Arc<dyn Provider>>,
    /// Embeddings always go through this provider, never through
    /// `self.provider()`'s cascade-selected choice: `remote_b` has no
    /// embeddings endpoint at all, and routing by whichever provider won
    /// generation would change vector spaces out from under existing
    /// embeddings whenever the selected provider changed. Built once at
    /// construction from the local-provider config, regardless of which
    /// remote credentials are present.
    embed_provider: Arc<dyn Provider>,
    budget: Option<BudgetGuard>,
}

impl LlmClient {
    pub fn new(config: Config) -> Self {
        let budget = if config.daily_budget_cents > 0 {
            Some(BudgetGuard::new(config.daily_budget_cents))
        } else {
            None
        };
        let embed_provider: Arc<dyn Provider> = Arc::new(LocalProvider {
            base_url: config.local_provider_base_url.clone(),
            generate_model: config.local_generate_model.clone(),
            embed_model: config.local_embed_model.clone(),
        });
        Self {
            http: reqwest::Client::new(),
            config,
            provider: OnceCell::new(),
            embed_provider,
            budget,
        }
    }

    pub fn budget(&self) -> Option<&BudgetGuard> {
        self.budget.as_ref()
    }

    /// Build a client around a pre-selected provider, skipping the
    /// env-credential/probe dance entirely, and routing embeds to that same
    /// provider. Used by tests to inject a fake provider.
    pub fn with_provider(config: Config, provider: Arc<dyn Provider>) -> Self {
        let mut client = Self::new(config);
        client.embed_provider = Arc::clone(&provider);
        client
            .provider
            .set(provider)
            .unwrap_or_else(|_| unreachable!("provider cell is freshly constructed"));
        client
    }

    async fn provider(&self) -> Result<&Arc<dyn Provider>> {
        self.provider
            .get_or_try_init(|| async { self.select_provider().await })
            .await
    }

    /// Remote-A credential first, else remote-B, else probe the local
    /// provider for the required model tags, else fail outright.
    async fn select_provider(&self) -> Result<Arc<dyn Provider>> {
        if let Some(key) = &self.config.remote_a_api_key {
            tracing::info!("selected remote_a LLM provider");
            return Ok(Arc::new(RemoteAProvider {
                api_key: key.clone(),
                model: self.config.remote_a_model.clone(),
            }));
        }
        if let Some(key) = &self.config.remote_b_api_key {
            tracing::info!("selected remote_b LLM provider");
            return Ok(Arc::new(RemoteBProvider {
                api_key: key.clone(),
                model: self.config.remote_b_model.clone(),
            }));
        }
        let required = [
            self.config.local_generate_model.as_str(),
            self.config.local_embed_model.as_str(),
        ];
        if probe_local(&self.http, &self.config.local_provider_base_url, &required).await {
            tracing::info!("selected local LLM provider");
            return Ok(Arc::new(LocalProvider {
                base_url: self.config.local_provider_base_url.clone(),
                generate_model: self.config.local_generate_model.clone(),
                embed_model: self.config.local_embed_model.clone(),
            }));
        }
        Err(LlmError::NoProviderAvailable)
    }

    fn charge(&self) -> Result<()> {
        match &self.budget {
            Some(guard) => guard.charge(CALL_COST_CENTS),
            None => Ok(()),
        }
    }

    /// Call `generate` with a 30s timeout and up to 3 attempts, 1s * attempt
    /// linear backoff between retries.
    async fn generate_with_retry(&self, prompt: &str) -> Result<String> {
        self.charge()?;
        let provider = self.provider().await?;
        let mut last_err = LlmError::NoProviderAvailable;
        for attempt in 1..=MAX_RETRIES {
            match timeout(CALL_TIMEOUT, provider.generate(&self.http, prompt)).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(err)) => {
                    tracing::warn!(attempt, provider = provider.name(), %err, "generate call failed");
                    last_err = err;
                }
                Err(_) => {
                    tracing::warn!(attempt, provider = provider.name(), "generate call timed out");
                    last_err = LlmError::ProviderTimeout;
                }
            }
            if attempt < MAX_RETRIES {
                tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
            }
        }
        Err(last_err)
    }

    async fn embed_with_retry(&self, text: &str) -> Result<Vec<f32>> {
        self.charge()?;
        let provider = &self.embed_provider;
        let mut last_err = LlmError::NoProviderAvailable;
        for attempt in 1..=MAX_RETRIES {
            match timeout(CALL_TIMEOUT, provider.embed(&self.http, text)).await {
                Ok(Ok(vec)) => return Ok(vec),
                Ok(Err(err)) => {
                    tracing::warn!(attempt, provider = provider.name(), %err, "embed call failed");
                    last_err = err;
                }
                Err(_) => {
                    tracing::warn!(attempt, provider = provider.name(), "embed call timed out");
                    last_err = LlmError::ProviderTimeout;
                }
            }
            if attempt < MAX_RETRIES {
                tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
            }
        }
        Err(last_err)
    }

    fn parse_json_response<T: serde::de::DeserializeOwned>(&self, raw: &str) -> Result<T> {
        let unfenced = strip_code_blocks(raw);
        let json_str = extract_balanced_json(&unfenced).ok_or_else(|| {
            LlmError::ResponseUnparseable("no balanced JSON object found".to_string())
        })?;
        serde_json::from_str(json_str)
            .map_err(|e| LlmError::ResponseUnparseable(format!("{e}: {json_str}")))
    }

    /// Analyse bias across one cluster's articles, returning a validated
    /// result with every score clamped and every article accounted for.
    pub async fn analyze_bias(
        &self,
        articles: &[BiasAnalysisArticle],
    ) -> Result<BiasAnalysisResult> {
        let prompt = bias_analysis_prompt(articles);
        let raw_text = self.generate_with_retry(&prompt).await?;
        let raw: RawBiasAnalysisResponse = self.parse_json_response(&raw_text)?;
        Ok(reconcile_bias_response(articles, raw))
    }

    /// Judge whether two articles describe the same underlying story. Used
    /// as the final, most expensive stage of the clustering cascade.
    pub async fn judge_similarity(
        &self,
        title_a: &str,
        content_a: &str,
        title_b: &str,
        content_b: &str,
    ) -> Result<SimilarityJudgment> {
        let prompt = similarity_prompt(title_a, content_a, title_b, content_b);
        let raw_text = self.generate_with_retry(&prompt).await?;
        self.parse_json_response(&raw_text)
    }

    /// Embed free text via the local provider only, regardless of which
    /// provider `self.provider()` selected for generation.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_with_retry(text).await
    }

    /// Whether a provider was successfully selected. Callers that can
    /// degrade gracefully (the Clustering Engine skipping LLM verification,
    /// the Bias Analyzer skipping a sweep) check this once up front instead
    /// of treating every call's `NoProviderAvailable` as a per-item failure.
    pub async fn is_available(&self) -> bool {
        self.provider().await.is_ok()
    }
}

fn bias_analysis_prompt(articles: &[BiasAnalysisArticle]) -> String {
    let mut prompt = String::from(
        "You are a media bias analyst. For each article below, score biasScore, \
         leftBias, rightBias and sensationalism on a 0-10 scale, give a short \
         reasoning, identify the mostUnbiasedArticleId, and write a neutralSummary \
         covering the shared facts. Respond with exactly one JSON object shaped as \
         {\"mostUnbiasedArticleId\": string, \"neutralSummary\": string, \"articles\": \
         [{\"articleId\": string, \"biasScore\": number, \"leftBias\": number, \
         \"rightBias\": number, \"sensationalism\": number, \"reasoning\": string}]}.\n\n",
    );
    for article in articles {
        prompt.push_str(&format!(
            "Article {} ({}): {}\n{}\n\n",
            article.article_id, article.source_name, article.title, article.summary
        ));
    }
    prompt
}

fn similarity_prompt(title_a: &str, content_a: &str, title_b: &str, content_b: &str) -> String {
    format!(
        "Do these two articles describe the same underlying news story? Respond \
         with exactly one JSON object shaped as {{\"similarity\": number between 0 \
         and 1, \"isMatch\": boolean, \"reasoning\": string}}.\n\n\
         Article A: {title_a}\n{content_a}\n\nArticle B: {title_b}\n{content_b}\n"
    )
}
