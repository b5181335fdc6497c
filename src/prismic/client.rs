use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::error::{ApiError, ApiResult};
use super::{query_param, ApiDocument, ContentApi, Predicate, QueryOptions, SearchResponse};
use crate::config::ApiConfig;

#[derive(Debug, Deserialize)]
struct ApiRootDto {
    #[serde(default)]
    refs: Vec<RefDto>,
}

#[derive(Debug, Deserialize)]
struct RefDto {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

#[derive(Debug)]
/// HTTP client for a Prismic repository.
pub struct PrismicClient {
    endpoint: String,
    access_token: Option<String>,
    client: Client,
    master_ref: OnceCell<String>,
}

impl PrismicClient {
    /// Build a client for the repository described by `config`.
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            client,
            master_ref: OnceCell::new(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn search_url(&self) -> String {
        format!("{}/documents/search", self.endpoint)
    }

    fn token_param(&self) -> Vec<(&'static str, String)> {
        self.access_token
            .iter()
            .map(|token| ("access_token", token.clone()))
            .collect()
    }

    /// Query string of a search request
    fn search_params(
        &self,
        reference: &str,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![("ref", reference.to_string()), ("q", query_param(predicates))];
        if let Some(page_size) = options.page_size {
            params.push(("pageSize", page_size.to_string()));
        }
        if !options.fetch.is_empty() {
            params.push(("fetch", options.fetch.join(",")));
        }
        params.extend(self.token_param());
        params
    }

    /// Ref of the published content, resolved once per client
    async fn master_ref(&self) -> ApiResult<&str> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let root: ApiRootDto = self.get_json(&self.endpoint, &self.token_param()).await?;
                let master = root
                    .refs
                    .into_iter()
                    .find(|r| r.is_master_ref)
                    .ok_or(ApiError::NoMasterRef)?;
                tracing::debug!("Resolved master ref {}", master.reference);
                Ok::<_, ApiError>(master.reference)
            })
            .await?;
        Ok(reference.as_str())
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        params: &[(&'static str, String)],
    ) -> ApiResult<T> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_http_status(status, url));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn search(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> ApiResult<SearchResponse<Value>> {
        let reference = self.master_ref().await?.to_string();
        let params = self.search_params(&reference, predicates, options);
        self.get_json(&self.search_url(), &params).await
    }
}

#[async_trait]
impl ContentApi for PrismicClient {
    async fn query(
        &self,
        predicate: &Predicate,
        options: &QueryOptions,
    ) -> ApiResult<SearchResponse<Value>> {
        self.search(std::slice::from_ref(predicate), options).await
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> ApiResult<ApiDocument<Value>> {
        let options = QueryOptions {
            page_size: Some(1),
            fetch: Vec::new(),
        };
        let response = self
            .search(&[Predicate::uid(document_type, uid)], &options)
            .await?;

        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(format!("{}/{}", document_type, uid)))
    }

    async fn fetch_page(&self, url: &str) -> ApiResult<SearchResponse<Value>> {
        self.get_json(url, &[]).await
    }
}
