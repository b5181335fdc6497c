//! Built-in spacetraveling templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping stays on for every
//! `.html` template; pre-rendered rich text is the only value marked safe.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::helpers::{format_date_with, html_escape, url_for};

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer; `zone` is used by the `pt_date` filter
    pub fn new(zone: Option<chrono_tz::Tz>) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("index.html", include_str!("spacetraveling/index.html")),
            ("more.html", include_str!("spacetraveling/more.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            ("fallback.html", include_str!("spacetraveling/fallback.html")),
            // Partials
            (
                "partials/post_card.html",
                include_str!("spacetraveling/partials/post_card.html"),
            ),
        ])?;

        // Tera's default escaper also rewrites '/', which breaks URLs
        tera.set_escape_fn(html_escape);
        tera.register_filter("pt_date", PtDateFilter { zone });

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: format a publication date as "5 jan 2021"
struct PtDateFilter {
    zone: Option<chrono_tz::Tz>,
}

impl tera::Filter for PtDateFilter {
    fn filter(
        &self,
        value: &tera::Value,
        _args: &HashMap<String, tera::Value>,
    ) -> tera::Result<tera::Value> {
        let s = tera::try_get_value!("pt_date", "value", String, value);
        Ok(tera::Value::String(format_date_with(&s, self.zone.as_ref())))
    }
}

/// Site-wide values available to every template
#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub language: String,
    pub root: String,
}

impl SiteData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            language: config.language.clone(),
            root: url_for(config, "/"),
        }
    }
}

/// Create a context holding the site data
pub fn base_context(config: &SiteConfig) -> Context {
    let mut context = Context::new();
    context.insert("site", &SiteData::from_config(config));
    context
}
