//! In-memory content API for tests

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

use super::{ApiDocument, ApiError, ApiResult, ContentApi, Predicate, QueryOptions, SearchResponse};

pub(crate) const ENDPOINT: &str = "https://spacetraveling.cdn.prismic.io/api/v2";

/// Canned responses keyed by predicate, uid and page URL
#[derive(Default)]
pub(crate) struct FakeApi {
    queries: HashMap<String, SearchResponse<Value>>,
    documents: HashMap<String, ApiDocument<Value>>,
    pages: HashMap<String, SearchResponse<Value>>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer queries on `document.type == document_type`
    pub(crate) fn with_query(mut self, document_type: &str, response: SearchResponse<Value>) -> Self {
        self.queries
            .insert(Predicate::document_type(document_type).to_string(), response);
        self
    }

    pub(crate) fn with_document(mut self, document: ApiDocument<Value>) -> Self {
        let uid = document.uid.clone().unwrap_or_default();
        self.documents.insert(uid, document);
        self
    }

    pub(crate) fn with_page(mut self, url: &str, response: SearchResponse<Value>) -> Self {
        self.pages.insert(url.to_string(), response);
        self
    }

    /// Every call made so far, e.g. `query [at(document.type, "posts")]`
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl ContentApi for FakeApi {
    async fn query(
        &self,
        predicate: &Predicate,
        options: &QueryOptions,
    ) -> ApiResult<SearchResponse<Value>> {
        self.record(format!("query {} {:?} {:?}", predicate, options.page_size, options.fetch));
        self.queries
            .get(&predicate.to_string())
            .cloned()
            .ok_or_else(|| ApiError::NotFound(predicate.to_string()))
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> ApiResult<ApiDocument<Value>> {
        self.record(format!("get_by_uid {} {}", document_type, uid));
        self.documents
            .get(uid)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("{}/{}", document_type, uid)))
    }

    async fn fetch_page(&self, url: &str) -> ApiResult<SearchResponse<Value>> {
        self.record(format!("fetch_page {}", url));
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(url.to_string()))
    }
}

pub(crate) fn page_url(page: u32) -> String {
    format!("{}/documents/search?ref=master&page={}", ENDPOINT, page)
}

pub(crate) fn search_page(
    results: Vec<ApiDocument<Value>>,
    next_page: Option<String>,
) -> SearchResponse<Value> {
    SearchResponse {
        page: 1,
        results_per_page: results.len() as u32,
        total_results_size: results.len() as u32,
        total_pages: 1,
        next_page,
        prev_page: None,
        results,
    }
}

pub(crate) fn summary_doc(uid: &str, date: &str, title: &str) -> ApiDocument<Value> {
    document(
        uid,
        date,
        json!({
            "title": title,
            "subtitle": format!("{} subtitle", title),
            "author": "Joseph Oliveira",
        }),
    )
}

pub(crate) fn detail_doc(uid: &str, date: &str, title: &str) -> ApiDocument<Value> {
    document(
        uid,
        date,
        json!({
            "title": title,
            "subtitle": "Tudo sobre como criar a sua primeira aplicação",
            "author": "Joseph Oliveira",
            "banner": {
                "url": "https://images.prismic.io/spacetraveling/banner.png",
                "alt": null,
                "dimensions": { "width": 1440, "height": 400 }
            },
            "content": [
                {
                    "heading": "Proin et varius",
                    "body": [
                        { "type": "paragraph", "text": "Lorem ipsum dolor sit amet.", "spans": [
                            { "start": 0, "end": 5, "type": "strong" }
                        ]}
                    ]
                },
                {
                    "heading": "Cras laoreet mi",
                    "body": [
                        { "type": "paragraph", "text": "Nulla auctor sit amet quam vitae.", "spans": [] }
                    ]
                }
            ],
            "slices": []
        }),
    )
}

fn document(uid: &str, date: &str, data: Value) -> ApiDocument<Value> {
    ApiDocument {
        id: format!("id-{}", uid),
        uid: Some(uid.to_string()),
        document_type: "posts".to_string(),
        first_publication_date: Some(date.to_string()),
        last_publication_date: Some(date.to_string()),
        data,
    }
}
