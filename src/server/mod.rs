//! Preview server for the generated site
//!
//! Pre-built files are served from `public/`. Post pages that were not
//! pre-built are generated on first request, and the listing page's
//! "load more" control is answered from `/api/more`.

mod error;
mod on_demand;

pub use error::{ServerError, ServerResult};
pub use on_demand::{OnDemand, PostResponse};

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::SiteConfig;
use crate::generator::Generator;
use crate::pages::listing;
use crate::prismic::ContentApi;
use crate::Site;

/// Server state
struct ServerState {
    config: SiteConfig,
    zone: Option<chrono_tz::Tz>,
    generator: Arc<Generator>,
    api: Arc<dyn ContentApi>,
    on_demand: OnDemand,
}

/// Start the preview server
pub async fn start(
    site: &Site,
    api: Arc<dyn ContentApi>,
    ip: &str,
    port: u16,
    open: bool,
) -> Result<()> {
    let app = router(site, api)?;

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router for `site`
pub fn router(site: &Site, api: Arc<dyn ContentApi>) -> Result<Router> {
    let state = Arc::new(new_state(site, api)?);
    let static_files = ServeDir::new(&site.public_dir).append_index_html_on_directories(true);

    Ok(Router::new()
        .route("/post/:slug", get(post_handler))
        .route("/post/:slug/", get(post_handler))
        .route("/api/more", get(more_handler))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

fn new_state(site: &Site, api: Arc<dyn ContentApi>) -> Result<ServerState> {
    let generator = Arc::new(Generator::new(site)?);
    Ok(ServerState {
        config: site.config.clone(),
        zone: site.config.zone()?,
        on_demand: OnDemand::new(Arc::clone(&api), Arc::clone(&generator)),
        generator,
        api,
    })
}

/// Serve a post page, generating it on demand
async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> ServerResult<Response> {
    match state.on_demand.request(&slug).await? {
        PostResponse::Ready(html) | PostResponse::Loading(html) => Ok(Html(html).into_response()),
        PostResponse::Missing => Err(ServerError::NotFound),
    }
}

#[derive(Debug, Deserialize)]
struct MoreParams {
    cursor: String,
}

/// Body of a `/api/more` response
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MoreResponse {
    /// Rendered post cards to append to the list
    pub html: String,
    /// Cursor for the following page
    pub next_page: Option<String>,
}

/// Fetch the page behind a cursor and render its post cards
async fn more_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<MoreParams>,
) -> ServerResult<Json<MoreResponse>> {
    if !is_api_url(&state.config.api.endpoint, &params.cursor) {
        return Err(ServerError::BadRequest(
            "cursor must point at the content API".to_string(),
        ));
    }

    let page = listing::fetch_more(state.api.as_ref(), &params.cursor, state.zone.as_ref()).await?;
    let html = listing::render_more(state.generator.renderer(), &state.config, &page)?;
    tracing::debug!("Served {} more posts", page.results.len());

    Ok(Json(MoreResponse {
        html,
        next_page: page.next_page,
    }))
}

/// Whether `url` lives under the configured API endpoint
fn is_api_url(endpoint: &str, url: &str) -> bool {
    let prefix = format!("{}/", endpoint.trim_end_matches('/'));
    url.starts_with(&prefix)
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
