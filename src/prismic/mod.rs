//! Content API access (Prismic REST API v2)
//!
//! [`ContentApi`] is the seam between page builders and the network.
//! Responses travel as `serde_json::Value` documents and are narrowed to
//! typed fields by the page that consumes them, so every field a page does
//! not name is dropped at that point.

mod client;
mod error;
#[cfg(test)]
pub(crate) mod fake;

pub use client::PrismicClient;
pub use error::{ApiError, ApiResult};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A query predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `path` equals `value`
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::At {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Document type equals `document_type`
    pub fn document_type(document_type: &str) -> Self {
        Self::at("document.type", document_type)
    }

    /// Document of type `document_type` with the given uid
    pub fn uid(document_type: &str, uid: &str) -> Self {
        Self::at(format!("my.{}.uid", document_type), uid)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At { path, value } => {
                let value = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "[at({}, \"{}\")]", path, value)
            }
        }
    }
}

/// Render predicates as the `q` query parameter
pub fn query_param(predicates: &[Predicate]) -> String {
    let inner: String = predicates.iter().map(|p| p.to_string()).collect();
    format!("[{}]", inner)
}

/// Options of a search query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub page_size: Option<u32>,
    /// Restricts returned fields, e.g. `post.title`
    pub fetch: Vec<String>,
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse<T> {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results_per_page: u32,
    #[serde(default)]
    pub total_results_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub prev_page: Option<String>,
    pub results: Vec<ApiDocument<T>>,
}

/// A document and its metadata; `data` holds the custom type's fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDocument<T> {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type", default)]
    pub document_type: String,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    pub data: T,
}

impl ApiDocument<serde_json::Value> {
    /// Narrow `data` to the fields of `T`
    pub fn decode<T: DeserializeOwned>(self) -> ApiResult<ApiDocument<T>> {
        Ok(ApiDocument {
            id: self.id,
            uid: self.uid,
            document_type: self.document_type,
            first_publication_date: self.first_publication_date,
            last_publication_date: self.last_publication_date,
            data: serde_json::from_value(self.data)?,
        })
    }
}

impl SearchResponse<serde_json::Value> {
    /// Narrow every result's `data` to the fields of `T`
    pub fn decode<T: DeserializeOwned>(self) -> ApiResult<SearchResponse<T>> {
        let results = self
            .results
            .into_iter()
            .map(ApiDocument::decode)
            .collect::<ApiResult<Vec<_>>>()?;

        Ok(SearchResponse {
            page: self.page,
            results_per_page: self.results_per_page,
            total_results_size: self.total_results_size,
            total_pages: self.total_pages,
            next_page: self.next_page,
            prev_page: self.prev_page,
            results,
        })
    }
}

/// Read access to the headless CMS
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Search documents matching `predicate`
    async fn query(
        &self,
        predicate: &Predicate,
        options: &QueryOptions,
    ) -> ApiResult<SearchResponse<serde_json::Value>>;

    /// Fetch a single document of `document_type` by uid
    async fn get_by_uid(
        &self,
        document_type: &str,
        uid: &str,
    ) -> ApiResult<ApiDocument<serde_json::Value>>;

    /// Fetch a page by the fully qualified URL found in `next_page`
    async fn fetch_page(&self, url: &str) -> ApiResult<SearchResponse<serde_json::Value>>;
}
