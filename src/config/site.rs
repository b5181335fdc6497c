//! Site configuration (_config.yml)

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding `api.endpoint`
pub const ENDPOINT_ENV: &str = "PRISMIC_API_ENDPOINT";
/// Environment variable overriding `api.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    /// IANA zone used to display dates, local time when empty
    pub timezone: String,

    // URL
    pub root: String,

    // Directory
    pub public_dir: String,

    // Content API
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub detail: DetailConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            language: "pt-BR".to_string(),
            timezone: String::new(),

            root: "/".to_string(),

            public_dir: "public".to_string(),

            api: ApiConfig::default(),
            listing: ListingConfig::default(),
            detail: DetailConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = var(ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
            tracing::debug!("API endpoint overridden by {}", ENDPOINT_ENV);
            self.api.endpoint = endpoint.trim().to_string();
        }
        if let Some(token) = var(ACCESS_TOKEN_ENV).filter(|v| !v.trim().is_empty()) {
            tracing::debug!("Access token overridden by {}", ACCESS_TOKEN_ENV);
            self.api.access_token = Some(token.trim().to_string());
        }
    }

    /// Timezone used to display dates
    pub fn zone(&self) -> Result<Option<chrono_tz::Tz>> {
        let name = self.timezone.trim();
        if name.is_empty() {
            return Ok(None);
        }
        name.parse::<chrono_tz::Tz>()
            .map(Some)
            .map_err(|e| anyhow!("Invalid timezone {:?}: {}", name, e))
    }
}

/// Prismic repository access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Repository API root, e.g. `https://spacetraveling.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            connect_timeout_secs: 5,
            timeout_secs: 15,
        }
    }
}

/// Home page query
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub document_type: String,
    pub page_size: u32,
    pub fetch: Vec<String>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            document_type: "posts".to_string(),
            page_size: 1,
            fetch: vec![
                "post.title".to_string(),
                "post.subtitle".to_string(),
                "post.author".to_string(),
            ],
        }
    }
}

/// Post page queries and rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailConfig {
    /// Custom type queried by uid
    pub document_type: String,
    /// Custom type queried when choosing paths to pre-build
    pub paths_document_type: String,
    pub prebuild_limit: u32,
    pub paths_fetch: Vec<String>,
    pub words_per_minute: u32,
    /// Re-poll interval of the loading placeholder
    pub fallback_refresh_secs: u32,
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            document_type: "posts".to_string(),
            paths_document_type: "post".to_string(),
            prebuild_limit: 5,
            paths_fetch: vec!["post.uid".to_string()],
            words_per_minute: 200,
            fallback_refresh_secs: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "spacetraveling");
        assert_eq!(config.listing.document_type, "posts");
        assert_eq!(config.listing.page_size, 1);
        assert_eq!(config.detail.paths_document_type, "post");
        assert_eq!(config.detail.prebuild_limit, 5);
        assert_eq!(config.detail.words_per_minute, 200);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
timezone: America/Sao_Paulo
api:
  endpoint: https://myrepo.cdn.prismic.io/api/v2
listing:
  page_size: 5
detail:
  prebuild_limit: 10
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.api.endpoint, "https://myrepo.cdn.prismic.io/api/v2");
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.listing.page_size, 5);
        assert_eq!(config.listing.document_type, "posts");
        assert_eq!(config.detail.prebuild_limit, 10);
        assert_eq!(config.detail.words_per_minute, 200);
        assert_eq!(config.zone().unwrap(), Some(chrono_tz::America::Sao_Paulo));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let yaml = "title: Blog\ndescription: old hexo key\nurl: https://example.com\n";
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "Blog");
        assert_eq!(config.root, "/");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SiteConfig::default();
        config.apply_overrides(|key| match key {
            ENDPOINT_ENV => Some("https://other.cdn.prismic.io/api/v2".to_string()),
            ACCESS_TOKEN_ENV => Some(" secret ".to_string()),
            _ => None,
        });
        assert_eq!(config.api.endpoint, "https://other.cdn.prismic.io/api/v2");
        assert_eq!(config.api.access_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let mut config = SiteConfig::default();
        config.apply_overrides(|_| Some("  ".to_string()));
        assert_eq!(config.api, ApiConfig::default());
    }

    #[test]
    fn test_invalid_timezone() {
        let config = SiteConfig {
            timezone: "Mars/Olympus".to_string(),
            ..SiteConfig::default()
        };
        assert!(config.zone().is_err());
        assert_eq!(SiteConfig::default().zone().unwrap(), None);
    }
}
