//! spacetraveling: a static blog generator backed by the Prismic content API
//!
//! Posts are fetched at build time and rendered with embedded Tera
//! templates. The development server generates post pages that were not
//! pre-built on first request and answers "load more" requests of the home
//! page.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod pages;
pub mod prismic;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// The blog being built
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Site {
    /// Load the site in `base_dir`, reading `_config.yml` and the environment
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No _config.yml in {:?}, using defaults", base_dir);
            config::SiteConfig::default()
        };
        config.apply_env();
        // Surface a bad timezone before any network work starts
        config.zone()?;

        Ok(Self::with_config(base_dir, config))
    }

    /// Build a site from an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            public_dir,
        }
    }

    /// Client for the configured content API
    pub fn api(&self) -> Result<prismic::PrismicClient> {
        Ok(prismic::PrismicClient::new(&self.config.api)?)
    }

    /// Generate the static site
    pub async fn generate(&self, api: &dyn prismic::ContentApi) -> Result<generator::GenerateReport> {
        commands::generate::run(self, api).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
