//! Post page: path selection, fetching, reading time and rendering

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{DetailConfig, SiteConfig};
use crate::content::de::null_as_default;
use crate::content::{reading_time, Banner, ContentBlock, PostDetail};
use crate::prismic::{ApiResult, ContentApi, Predicate, QueryOptions};
use crate::templates::{base_context, TemplateRenderer};

/// Fields of a post document we keep
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DetailFields {
    #[serde(deserialize_with = "null_as_default")]
    title: String,
    #[serde(deserialize_with = "null_as_default")]
    subtitle: String,
    #[serde(deserialize_with = "null_as_default")]
    banner: BannerFields,
    #[serde(deserialize_with = "null_as_default")]
    author: String,
    #[serde(deserialize_with = "null_as_default")]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BannerFields {
    url: Option<String>,
}

/// Uids of the posts to pre-build
pub async fn static_paths(api: &dyn ContentApi, config: &DetailConfig) -> ApiResult<Vec<String>> {
    let predicate = Predicate::document_type(&config.paths_document_type);
    let options = QueryOptions {
        page_size: Some(config.prebuild_limit),
        fetch: config.paths_fetch.clone(),
    };

    let response = api.query(&predicate, &options).await?;
    let uids: Vec<String> = response
        .results
        .into_iter()
        .filter_map(|doc| {
            if doc.uid.is_none() {
                tracing::warn!("Skipping document {} without uid", doc.id);
            }
            doc.uid
        })
        .collect();

    tracing::info!("Pre-building {} post pages", uids.len());
    Ok(uids)
}

/// Fetch one post by uid
pub async fn build_detail(api: &dyn ContentApi, config: &DetailConfig, uid: &str) -> ApiResult<PostDetail> {
    let document = api
        .get_by_uid(&config.document_type, uid)
        .await?
        .decode::<DetailFields>()?;

    Ok(PostDetail {
        uid: document.uid.unwrap_or_else(|| uid.to_string()),
        first_publication_date: document.first_publication_date,
        title: document.data.title,
        subtitle: document.data.subtitle,
        banner: Banner {
            url: document.data.banner.url.unwrap_or_default(),
        },
        author: document.data.author,
        content: document.data.content,
    })
}

/// Reading time cached for the post it was computed from
#[derive(Debug)]
pub struct ReadingTimeMemo {
    words_per_minute: u32,
    cached: Option<(Arc<PostDetail>, u32)>,
    computations: usize,
}

impl ReadingTimeMemo {
    pub fn new(words_per_minute: u32) -> Self {
        Self {
            words_per_minute,
            cached: None,
            computations: 0,
        }
    }

    /// Reading time of `post`, recomputed only when handed a different post
    pub fn get(&mut self, post: &Arc<PostDetail>) -> u32 {
        if let Some((cached, minutes)) = &self.cached {
            if Arc::ptr_eq(cached, post) {
                return *minutes;
            }
        }

        let minutes = reading_time(&post.content, self.words_per_minute);
        self.cached = Some((Arc::clone(post), minutes));
        self.computations += 1;
        minutes
    }

    /// How many times the estimate was computed
    pub fn computations(&self) -> usize {
        self.computations
    }
}

/// What the post page shows
#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    /// Data not resolved yet
    Fallback,
    Ready {
        post: Arc<PostDetail>,
        reading_time: u32,
    },
}

/// State of one post page
#[derive(Debug)]
pub struct DetailPage {
    post: Option<Arc<PostDetail>>,
    memo: ReadingTimeMemo,
}

impl DetailPage {
    /// A page still waiting for its data
    pub fn pending(config: &DetailConfig) -> Self {
        Self {
            post: None,
            memo: ReadingTimeMemo::new(config.words_per_minute),
        }
    }

    pub fn with_post(config: &DetailConfig, post: PostDetail) -> Self {
        let mut page = Self::pending(config);
        page.set_post(Arc::new(post));
        page
    }

    pub fn set_post(&mut self, post: Arc<PostDetail>) {
        self.post = Some(post);
    }

    pub fn is_fallback(&self) -> bool {
        self.post.is_none()
    }

    pub fn view(&mut self) -> DetailView {
        match &self.post {
            None => DetailView::Fallback,
            Some(post) => DetailView::Ready {
                post: Arc::clone(post),
                reading_time: self.memo.get(post),
            },
        }
    }

    /// Render the current view
    pub fn render(&mut self, renderer: &TemplateRenderer, config: &SiteConfig) -> Result<String> {
        match self.view() {
            DetailView::Fallback => render_fallback(renderer, config),
            DetailView::Ready { post, reading_time } => {
                let mut context = base_context(config);
                context.insert("post", &PostView::new(&post, reading_time));
                renderer.render("post.html", &context)
            }
        }
    }
}

/// Render the loading placeholder
pub fn render_fallback(renderer: &TemplateRenderer, config: &SiteConfig) -> Result<String> {
    let mut context = base_context(config);
    context.insert("refresh_secs", &config.detail.fallback_refresh_secs);
    renderer.render("fallback.html", &context)
}

#[derive(Debug, Serialize)]
struct PostView {
    title: String,
    banner_url: String,
    date: Option<String>,
    author: String,
    reading_time: u32,
    blocks: Vec<BlockView>,
}

#[derive(Debug, Serialize)]
struct BlockView {
    heading: String,
    html: String,
}

impl PostView {
    fn new(post: &PostDetail, reading_time: u32) -> Self {
        Self {
            title: post.title.clone(),
            banner_url: if crate::helpers::is_safe_url(&post.banner.url) {
                post.banner.url.clone()
            } else {
                String::new()
            },
            date: post.first_publication_date.clone(),
            author: post.author.clone(),
            reading_time,
            blocks: post
                .content
                .iter()
                .map(|block| BlockView {
                    heading: block.heading.clone(),
                    html: block.body.as_html(),
                })
                .collect(),
        }
    }
}
