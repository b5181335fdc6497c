//! On-demand generation of post pages that were not pre-built
//!
//! The first request for an unknown slug starts a background fetch and gets
//! the loading placeholder. Requests arriving while that fetch runs get the
//! placeholder too, without starting another fetch. Once the page is on
//! disk it is served like any pre-built page.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::generator::Generator;
use crate::prismic::{ApiError, ContentApi};

/// How long a slug the API does not know keeps answering 404
pub const MISSING_TTL: Duration = Duration::from_secs(60);

/// Answer to a post page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostResponse {
    /// The generated page
    Ready(String),
    /// The loading placeholder; the page is being generated
    Loading(String),
    /// The content API has no such post
    Missing,
}

/// A running generation task, tagged so it only ever removes itself
struct Task {
    generation: u64,
    handle: JoinHandle<()>,
}

type InFlight = Arc<Mutex<HashMap<String, Task>>>;
type MissingSince = Arc<Mutex<HashMap<String, Instant>>>;

pub struct OnDemand {
    api: Arc<dyn ContentApi>,
    generator: Arc<Generator>,
    in_flight: InFlight,
    missing: MissingSince,
    missing_ttl: Duration,
    next_generation: AtomicU64,
}

impl OnDemand {
    pub fn new(api: Arc<dyn ContentApi>, generator: Arc<Generator>) -> Self {
        Self {
            api,
            generator,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            missing: Arc::new(Mutex::new(HashMap::new())),
            missing_ttl: MISSING_TTL,
            next_generation: AtomicU64::new(0),
        }
    }

    /// Forget missing slugs after `ttl` instead of [`MISSING_TTL`]
    pub fn with_missing_ttl(mut self, ttl: Duration) -> Self {
        self.missing_ttl = ttl;
        self
    }

    /// Serve the page of `slug`, starting its generation if needed
    pub async fn request(&self, slug: &str) -> Result<PostResponse> {
        let Some(path) = self.generator.post_output_path(slug) else {
            return Ok(PostResponse::Missing);
        };

        if let Ok(html) = tokio::fs::read_to_string(&path).await {
            return Ok(PostResponse::Ready(html));
        }

        if self.is_missing(slug).await {
            return Ok(PostResponse::Missing);
        }

        let mut in_flight = self.in_flight.lock().await;
        let running = in_flight
            .get(slug)
            .map(|task| !task.handle.is_finished())
            .unwrap_or(false);

        if !running {
            tracing::info!("Generating post {} on demand", slug);
            let generation = self
                .next_generation
                .fetch_add(1, Ordering::Relaxed);
            let handle = self.spawn(slug.to_string(), generation);
            in_flight.insert(slug.to_string(), Task { generation, handle });
        }

        Ok(PostResponse::Loading(self.generator.render_fallback()?))
    }

    async fn is_missing(&self, slug: &str) -> bool {
        let mut missing = self.missing.lock().await;
        match missing.get(slug) {
            Some(since) if since.elapsed() < self.missing_ttl => true,
            Some(_) => {
                missing.remove(slug);
                false
            }
            None => false,
        }
    }

    fn spawn(&self, slug: String, generation: u64) -> JoinHandle<()> {
        let api = Arc::clone(&self.api);
        let generator = Arc::clone(&self.generator);
        let in_flight = Arc::clone(&self.in_flight);
        let missing = Arc::clone(&self.missing);
        let missing_ttl = self.missing_ttl;

        tokio::spawn(async move {
            match generator.generate_post(api.as_ref(), &slug).await {
                Ok(path) => tracing::info!("Generated on demand: {:?}", path),
                Err(e) if is_not_found(&e) => {
                    tracing::warn!("Post {} does not exist", slug);
                    let mut missing = missing.lock().await;
                    missing.retain(|_, since| since.elapsed() < missing_ttl);
                    missing.insert(slug.clone(), Instant::now());
                }
                // Left retryable: the next request spawns a new attempt
                Err(e) => tracing::error!("On-demand generation of {} failed: {}", slug, e),
            }

            let mut in_flight = in_flight.lock().await;
            if in_flight.get(&slug).map(|task| task.generation) == Some(generation) {
                in_flight.remove(&slug);
            }
        })
    }

    /// Wait for the generation of `slug` to finish, if one is running
    pub async fn settle(&self, slug: &str) {
        let task = self.in_flight.lock().await.remove(slug);
        if let Some(task) = task {
            if let Err(e) = task.handle.await {
                tracing::error!("On-demand task for {} panicked: {}", slug, e);
            }
        }
    }

    #[cfg(test)]
    async fn in_flight_count(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ApiError>()
        .map(ApiError::is_not_found)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::prismic::fake::{detail_doc, FakeApi};
    use crate::Site;
    use tempfile::TempDir;

    fn on_demand(dir: &TempDir) -> (OnDemand, Arc<FakeApi>) {
        let site = Site::with_config(dir.path(), SiteConfig::default());
        let generator = Arc::new(Generator::new(&site).unwrap());
        let api = Arc::new(FakeApi::new().with_document(detail_doc(
            "tarde",
            "2021-03-25T12:00:00+0000",
            "Gerado sob demanda",
        )));
        (OnDemand::new(api.clone(), generator), api)
    }

    #[tokio::test]
    async fn test_fallback_then_full_page() {
        let dir = TempDir::new().unwrap();
        let (on_demand, api) = on_demand(&dir);

        match on_demand.request("tarde").await.unwrap() {
            PostResponse::Loading(html) => assert!(html.contains("Carregando...")),
            other => panic!("expected placeholder, got {:?}", other),
        }

        on_demand.settle("tarde").await;

        match on_demand.request("tarde").await.unwrap() {
            PostResponse::Ready(html) => {
                assert!(html.contains("Gerado sob demanda - spacetraveling"));
                assert!(!html.contains("Carregando..."));
            }
            other => panic!("expected page, got {:?}", other),
        }
        assert_eq!(api.calls(), vec!["get_by_uid posts tarde"]);
    }

    #[tokio::test]
    async fn test_unknown_post_becomes_missing() {
        let dir = TempDir::new().unwrap();
        let (on_demand, _) = on_demand(&dir);

        assert!(matches!(
            on_demand.request("nada").await.unwrap(),
            PostResponse::Loading(_)
        ));
        on_demand.settle("nada").await;
        assert_eq!(on_demand.request("nada").await.unwrap(), PostResponse::Missing);
    }

    #[tokio::test]
    async fn test_missing_post_is_retried_after_ttl() {
        let dir = TempDir::new().unwrap();
        let (on_demand, api) = on_demand(&dir);
        let on_demand = on_demand.with_missing_ttl(Duration::ZERO);

        on_demand.request("nada").await.unwrap();
        on_demand.settle("nada").await;

        assert!(matches!(
            on_demand.request("nada").await.unwrap(),
            PostResponse::Loading(_)
        ));
        on_demand.settle("nada").await;
        assert_eq!(
            api.calls(),
            vec!["get_by_uid posts nada", "get_by_uid posts nada"]
        );
        assert!(on_demand.missing.lock().await.len() <= 1);
    }

    #[tokio::test]
    async fn test_finished_tasks_are_dropped() {
        let dir = TempDir::new().unwrap();
        let (on_demand, _) = on_demand(&dir);

        on_demand.request("tarde").await.unwrap();
        on_demand.request("nada").await.unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while on_demand.in_flight_count().await > 0 {
            assert!(Instant::now() < deadline, "tasks never finished");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(matches!(
            on_demand.request("tarde").await.unwrap(),
            PostResponse::Ready(_)
        ));
    }

    #[tokio::test]
    async fn test_unusable_slug_is_missing() {
        let dir = TempDir::new().unwrap();
        let (on_demand, api) = on_demand(&dir);
        assert_eq!(on_demand.request("..").await.unwrap(), PostResponse::Missing);
        assert!(api.calls().is_empty());
    }
}
