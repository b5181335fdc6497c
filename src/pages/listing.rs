//! Home page: the first page of posts and "load more" pagination

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::{ListingConfig, SiteConfig};
use crate::content::de::null_as_default;
use crate::content::{PostPagination, PostSummary};
use crate::helpers::{format_date_with, post_url};
use crate::prismic::{ApiDocument, ApiResult, ContentApi, Predicate, QueryOptions, SearchResponse};
use crate::templates::{base_context, TemplateRenderer};

/// Fields of a listing document we keep
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SummaryFields {
    #[serde(deserialize_with = "null_as_default")]
    title: String,
    #[serde(deserialize_with = "null_as_default")]
    subtitle: String,
    #[serde(deserialize_with = "null_as_default")]
    author: String,
}

fn to_summary(doc: ApiDocument<SummaryFields>, first_publication_date: Option<String>) -> PostSummary {
    PostSummary {
        uid: doc.uid.unwrap_or_default(),
        first_publication_date,
        title: doc.data.title,
        subtitle: doc.data.subtitle,
        author: doc.data.author,
    }
}

fn to_pagination<F>(response: SearchResponse<serde_json::Value>, date: F) -> ApiResult<PostPagination>
where
    F: Fn(Option<String>) -> Option<String>,
{
    let response = response.decode::<SummaryFields>()?;
    let results = response
        .results
        .into_iter()
        .map(|doc| {
            let published = date(doc.first_publication_date.clone());
            to_summary(doc, published)
        })
        .collect();

    Ok(PostPagination {
        next_page: response.next_page,
        results,
    })
}

/// Fetch the first page of posts at build time, keeping raw dates
pub async fn build_listing(api: &dyn ContentApi, config: &ListingConfig) -> ApiResult<PostPagination> {
    let predicate = Predicate::document_type(&config.document_type);
    let options = QueryOptions {
        page_size: Some(config.page_size),
        fetch: config.fetch.clone(),
    };

    let response = api.query(&predicate, &options).await?;
    let pagination = to_pagination(response, |date| date)?;
    tracing::info!(
        "Fetched {} posts (more pages: {})",
        pagination.results.len(),
        pagination.has_more()
    );
    Ok(pagination)
}

/// Fetch the page behind a `next_page` cursor, formatting dates up front
pub async fn fetch_more(
    api: &dyn ContentApi,
    url: &str,
    zone: Option<&chrono_tz::Tz>,
) -> ApiResult<PostPagination> {
    let response = api.fetch_page(url).await?;
    to_pagination(response, |date| {
        date.map(|d| format_date_with(&d, zone))
    })
}

/// Outcome of [`ListingState::load_more`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMore {
    /// This many posts were appended
    Appended(usize),
    /// There was no cursor; nothing was fetched
    Exhausted,
}

/// Posts shown so far and the cursor to the next page
#[derive(Debug, Clone, Default)]
pub struct ListingState {
    posts: Vec<PostSummary>,
    next_page: Option<String>,
    zone: Option<chrono_tz::Tz>,
}

impl ListingState {
    pub fn new(pagination: PostPagination) -> Self {
        Self {
            posts: pagination.results,
            next_page: pagination.next_page,
            zone: None,
        }
    }

    /// Timezone used when pre-formatting dates of loaded pages
    pub fn with_zone(mut self, zone: Option<chrono_tz::Tz>) -> Self {
        self.zone = zone;
        self
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    pub fn can_load_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Append the next page to the list and advance the cursor
    ///
    /// A failed fetch leaves the state untouched.
    pub async fn load_more(&mut self, api: &dyn ContentApi) -> ApiResult<LoadMore> {
        let Some(url) = self.next_page.clone() else {
            tracing::info!("There are no more posts to be loaded");
            return Ok(LoadMore::Exhausted);
        };

        let page = fetch_more(api, &url, self.zone.as_ref()).await?;
        let appended = page.results.len();
        self.posts.extend(page.results);
        self.next_page = page.next_page;

        tracing::debug!(
            "Loaded {} more posts, {} total",
            appended,
            self.posts.len()
        );
        Ok(LoadMore::Appended(appended))
    }
}

/// A post as handed to the card template
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub href: String,
    pub title: String,
    pub subtitle: String,
    pub date: Option<String>,
    pub author: String,
}

impl PostCard {
    pub fn new(config: &SiteConfig, post: &PostSummary) -> Self {
        Self {
            href: post_url(config, &post.uid),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            date: post.first_publication_date.clone(),
            author: post.author.clone(),
        }
    }
}

fn cards(config: &SiteConfig, posts: &[PostSummary]) -> Vec<PostCard> {
    posts.iter().map(|p| PostCard::new(config, p)).collect()
}

/// Render the home page
pub fn render(renderer: &TemplateRenderer, config: &SiteConfig, state: &ListingState) -> Result<String> {
    let mut context = base_context(config);
    context.insert("posts", &cards(config, state.posts()));
    context.insert("next_page", &state.next_page());
    context.insert("more_url", &crate::helpers::url_for(config, "api/more"));
    renderer.render("index.html", &context)
}

/// Render the cards of a page fetched by "load more"
pub fn render_more(renderer: &TemplateRenderer, config: &SiteConfig, page: &PostPagination) -> Result<String> {
    let mut context = base_context(config);
    context.insert("posts", &cards(config, &page.results));
    renderer.render("more.html", &context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prismic::fake::{page_url, search_page, summary_doc, FakeApi};

    fn api() -> FakeApi {
        FakeApi::new()
            .with_query(
                "posts",
                search_page(
                    vec![summary_doc("primeiro", "2021-03-15T19:25:28+0000", "Primeiro")],
                    Some(page_url(2)),
                ),
            )
            .with_page(
                &page_url(2),
                search_page(
                    vec![
                        summary_doc("segundo", "2021-03-25T12:00:00+0000", "Segundo"),
                        summary_doc("terceiro", "2021-04-01T12:00:00+0000", "Terceiro"),
                    ],
                    Some(page_url(3)),
                ),
            )
            .with_page(
                &page_url(3),
                search_page(
                    vec![summary_doc("quarto", "2021-05-09T12:00:00+0000", "Quarto")],
                    None,
                ),
            )
    }

    fn uids(state: &ListingState) -> Vec<&str> {
        state.posts().iter().map(|p| p.uid.as_str()).collect()
    }

    #[tokio::test]
    async fn test_build_listing_queries_first_page() {
        let api = api();
        let pagination = build_listing(&api, &ListingConfig::default()).await.unwrap();

        assert_eq!(
            api.calls(),
            vec![r#"query [at(document.type, "posts")] Some(1) ["post.title", "post.subtitle", "post.author"]"#]
        );
        assert_eq!(pagination.next_page, Some(page_url(2)));
        assert_eq!(
            pagination.results,
            vec![PostSummary {
                uid: "primeiro".to_string(),
                first_publication_date: Some("2021-03-15T19:25:28+0000".to_string()),
                title: "Primeiro".to_string(),
                subtitle: "Primeiro subtitle".to_string(),
                author: "Joseph Oliveira".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_load_more_appends_in_order() {
        let api = api();
        let first = build_listing(&api, &ListingConfig::default()).await.unwrap();
        let mut state = ListingState::new(first).with_zone(Some(chrono_tz::UTC));

        assert_eq!(state.load_more(&api).await.unwrap(), LoadMore::Appended(2));
        assert_eq!(uids(&state), vec!["primeiro", "segundo", "terceiro"]);
        assert_eq!(state.next_page(), Some(page_url(3).as_str()));

        assert_eq!(state.load_more(&api).await.unwrap(), LoadMore::Appended(1));
        assert_eq!(uids(&state), vec!["primeiro", "segundo", "terceiro", "quarto"]);
        assert!(!state.can_load_more());
    }

    #[tokio::test]
    async fn test_loaded_dates_are_preformatted() {
        let api = api();
        let first = build_listing(&api, &ListingConfig::default()).await.unwrap();
        let mut state = ListingState::new(first).with_zone(Some(chrono_tz::UTC));
        state.load_more(&api).await.unwrap();

        let dates: Vec<_> = state
            .posts()
            .iter()
            .map(|p| p.first_publication_date.as_deref())
            .collect();
        assert_eq!(
            dates,
            vec![
                Some("2021-03-15T19:25:28+0000"),
                Some("25 mar 2021"),
                Some("1 abr 2021")
            ]
        );
    }

    #[tokio::test]
    async fn test_load_more_without_cursor_is_a_noop() {
        let api = api();
        let mut state = ListingState::new(PostPagination {
            next_page: None,
            results: vec![],
        });

        assert_eq!(state.load_more(&api).await.unwrap(), LoadMore::Exhausted);
        assert!(state.posts().is_empty());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_state() {
        let api = FakeApi::new();
        let cursor = page_url(9);
        let mut state = ListingState::new(PostPagination {
            next_page: Some(cursor.clone()),
            results: vec![],
        });

        assert!(state.load_more(&api).await.is_err());
        assert_eq!(state.next_page(), Some(cursor.as_str()));
        assert!(state.posts().is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_fields_render_blank() {
        let mut doc = summary_doc("vazio", "2021-03-15T19:25:28+0000", "Vazio");
        doc.data["subtitle"] = serde_json::Value::Null;
        doc.data["author"] = serde_json::Value::Null;
        let api = FakeApi::new().with_query("posts", search_page(vec![doc], None));

        let pagination = build_listing(&api, &ListingConfig::default()).await.unwrap();
        let post = &pagination.results[0];
        assert_eq!(post.title, "Vazio");
        assert_eq!(post.subtitle, "");
        assert_eq!(post.author, "");
    }

    #[tokio::test]
    async fn test_render_listing() {
        let api = api();
        let config = SiteConfig::default();
        let renderer = TemplateRenderer::new(Some(chrono_tz::UTC)).unwrap();
        let first = build_listing(&api, &config.listing).await.unwrap();
        let mut state = ListingState::new(first).with_zone(Some(chrono_tz::UTC));

        let html = render(&renderer, &config, &state).unwrap();
        assert!(html.contains("<title>spacetraveling</title>"));
        assert!(html.contains(r#"href="/post/primeiro""#));
        assert!(html.contains("15 mar 2021"));
        assert!(html.contains("Joseph Oliveira"));
        assert!(html.contains("Carregar mais posts"));
        assert!(html.contains("/api/more"));

        state.load_more(&api).await.unwrap();
        state.load_more(&api).await.unwrap();
        let html = render(&renderer, &config, &state).unwrap();
        assert!(html.contains("9 mai 2021"));
        assert!(!html.contains("Carregar mais posts"));
    }

    #[tokio::test]
    async fn test_render_more_fragment() {
        let api = api();
        let config = SiteConfig::default();
        let renderer = TemplateRenderer::new(Some(chrono_tz::UTC)).unwrap();
        let page = fetch_more(&api, &page_url(2), Some(&chrono_tz::UTC)).await.unwrap();

        let html = render_more(&renderer, &config, &page).unwrap();
        assert!(!html.contains("<html"));
        assert!(html.contains(r#"href="/post/segundo""#));
        assert!(html.contains("25 mar 2021"));
        assert!(html.find("segundo") < html.find("terceiro"));
    }
}
