//! Generator module - writes the static site from content API data

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::content::PostDetail;
use crate::helpers::post_slug;
use crate::pages::{build_detail, build_listing, detail, listing, static_paths, DetailPage, ListingState};
use crate::prismic::ContentApi;
use crate::templates::TemplateRenderer;
use crate::Site;

/// Name of the pre-built paths manifest inside `public/post/`
pub const MANIFEST_FILE: &str = "index.json";

/// Summary of a generation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerateReport {
    pub listed_posts: usize,
    pub has_more: bool,
    pub prebuilt: Vec<String>,
}

/// Static site generator using Tera templates
pub struct Generator {
    site: Site,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site) -> Result<Self> {
        let renderer = TemplateRenderer::new(site.config.zone()?)?;

        Ok(Self {
            site: site.clone(),
            renderer,
        })
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    /// Generate the entire site
    pub async fn generate(&self, api: &dyn ContentApi) -> Result<GenerateReport> {
        let config = &self.site.config;
        fs::create_dir_all(&self.site.public_dir)?;

        // Home page with the first page of posts
        let first_page = build_listing(api, &config.listing).await?;
        let state = ListingState::new(first_page).with_zone(config.zone()?);
        let html = listing::render(&self.renderer, config, &state)?;
        let index_path = self.site.public_dir.join("index.html");
        write_atomic(&index_path, &html)?;
        tracing::debug!("Generated: {:?}", index_path);

        // Pre-built post pages; the rest are generated on first request
        let mut prebuilt = Vec::new();
        for uid in static_paths(api, &config.detail).await? {
            let post = build_detail(api, &config.detail, &uid).await?;
            self.write_post(&post)?;
            prebuilt.push(uid);
        }

        let report = GenerateReport {
            listed_posts: state.posts().len(),
            has_more: state.can_load_more(),
            prebuilt,
        };
        self.write_manifest(&report)?;

        Ok(report)
    }

    /// Fetch and write a single post page
    pub async fn generate_post(&self, api: &dyn ContentApi, uid: &str) -> Result<PathBuf> {
        let post = build_detail(api, &self.site.config.detail, uid).await?;
        self.write_post(&post)
    }

    /// Render and write a post page
    pub fn write_post(&self, post: &PostDetail) -> Result<PathBuf> {
        let output_path = self
            .post_output_path(&post.uid)
            .ok_or_else(|| anyhow!("Post uid {:?} cannot be used as a path", post.uid))?;

        let mut page = DetailPage::with_post(&self.site.config.detail, post.clone());
        let html = page.render(&self.renderer, &self.site.config)?;

        write_atomic(&output_path, &html)?;
        tracing::debug!("Generated post: {:?}", output_path);

        Ok(output_path)
    }

    /// Where the page of `uid` lives, or `None` if the uid has no usable slug
    pub fn post_output_path(&self, uid: &str) -> Option<PathBuf> {
        let segment = post_slug(uid);
        if segment.is_empty() {
            return None;
        }
        Some(
            self.site
                .public_dir
                .join("post")
                .join(segment)
                .join("index.html"),
        )
    }

    /// Render the loading placeholder of a post page
    pub fn render_fallback(&self) -> Result<String> {
        detail::render_fallback(&self.renderer, &self.site.config)
    }

    fn write_manifest(&self, report: &GenerateReport) -> Result<()> {
        let path = self.site.public_dir.join("post").join(MANIFEST_FILE);
        write_atomic(&path, &serde_json::to_string_pretty(report)?)?;
        tracing::debug!("Generated: {:?}", path);
        Ok(())
    }
}

/// Write `contents` to `path` through a sibling temp file and a rename,
/// so readers see either the old file or the complete new one
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("{:?} has no parent directory", path))?;
    fs::create_dir_all(parent).map_err(|e| anyhow!("Failed to create dir {:?}: {}", parent, e))?;

    let mut file = tempfile::NamedTempFile::new_in(parent)?;
    file.write_all(contents.as_bytes())?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file().set_permissions(fs::Permissions::from_mode(0o644))?;
    }
    file.persist(path)
        .map_err(|e| anyhow!("Failed to write {:?}: {}", path, e.error))?;
    Ok(())
}
