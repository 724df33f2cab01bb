use std::env;

/// Application configuration loaded from environment variables.
///
/// One `Config` struct with several `*_from_env()` constructors — each
/// binary only requires the env vars it actually touches, rather than a
/// single monolithic required-everything loader.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub search_index_url: String,
    pub search_index_key: String,
    pub search_index_name: String,

    pub local_provider_base_url: String,
    pub local_generate_model: String,
    pub local_embed_model: String,

    pub remote_a_api_key: Option<String>,
    pub remote_a_model: String,
    pub remote_b_api_key: Option<String>,
    pub remote_b_model: String,

    pub api_host: String,
    pub api_port: u16,

    /// `T_ingest` override, in minutes.
    pub ingest_interval_minutes: u64,

    /// Development cap on articles processed per run. -1 = no cap.
    pub dev_article_cap: i64,

    /// Daily LLM budget in cents. 0 = unlimited.
    pub daily_budget_cents: u64,
}

impl Config {
    /// Load the full configuration (used by `prism-cli`, which needs every
    /// subsystem: store, index, and all three LLM provider slots).
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            search_index_url: required_env("SEARCH_INDEX_URL"),
            search_index_key: env::var("SEARCH_INDEX_KEY").unwrap_or_default(),
            search_index_name: env::var("SEARCH_INDEX_NAME")
                .unwrap_or_else(|_| "articles".to_string()),
            local_provider_base_url: env::var("LOCAL_PROVIDER_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            local_generate_model: env::var("LOCAL_GENERATE_MODEL")
                .unwrap_or_else(|_| "llama3".to_string()),
            local_embed_model: env::var("LOCAL_EMBED_MODEL")
                .unwrap_or_else(|_| "nomic-embed-text".to_string()),
            remote_a_api_key: env::var("OPENAI_API_KEY").ok(),
            remote_a_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            remote_b_api_key: env::var("ANTHROPIC_API_KEY").ok(),
            remote_b_model: env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-3-5-haiku-latest".to_string()),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("API_PORT must be a number"),
            ingest_interval_minutes: env::var("T_INGEST_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            dev_article_cap: env::var("DEV_ARTICLE_CAP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(-1),
            daily_budget_cents: env::var("DAILY_BUDGET_CENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        }
    }

    /// Load config for the read API (no LLM provider keys required — the
    /// API never calls the LLM client directly).
    pub fn api_from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            search_index_url: required_env("SEARCH_INDEX_URL"),
            search_index_key: env::var("SEARCH_INDEX_KEY").unwrap_or_default(),
            search_index_name: env::var("SEARCH_INDEX_NAME")
                .unwrap_or_else(|_| "articles".to_string()),
            local_provider_base_url: String::new(),
            local_generate_model: String::new(),
            local_embed_model: String::new(),
            remote_a_api_key: None,
            remote_a_model: String::new(),
            remote_b_api_key: None,
            remote_b_model: String::new(),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("API_PORT must be a number"),
            ingest_interval_minutes: 30,
            dev_article_cap: -1,
            daily_budget_cents: 0,
        }
    }

    /// Log redacted configuration: char-counts of secrets, never the values.
    pub fn log_redacted(&self) {
        let secrets = [
            ("SEARCH_INDEX_KEY", &self.search_index_key),
            (
                "OPENAI_API_KEY",
                self.remote_a_api_key.as_deref().unwrap_or(""),
            ),
            (
                "ANTHROPIC_API_KEY",
                self.remote_b_api_key.as_deref().unwrap_or(""),
            ),
        ];
        for (name, value) in secrets {
            if value.is_empty() {
                tracing::info!("{name} = (empty)");
            } else {
                tracing::info!("{name} = ({} chars)", value.len());
            }
        }
        tracing::info!(
            database_url_set = !self.database_url.is_empty(),
            search_index_url = %self.search_index_url,
            "config loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
