//! Generate static files

use anyhow::Result;
use std::time::Instant;

use crate::generator::{GenerateReport, Generator};
use crate::prismic::ContentApi;
use crate::Site;

/// Generate the static site from the content API
pub async fn run(site: &Site, api: &dyn ContentApi) -> Result<GenerateReport> {
    let start = Instant::now();

    let generator = Generator::new(site)?;
    let report = generator.generate(api).await?;

    tracing::info!(
        "Home page lists {} posts{}, {} post pages pre-built",
        report.listed_posts,
        if report.has_more { " (more available)" } else { "" },
        report.prebuilt.len()
    );
    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(report)
}
