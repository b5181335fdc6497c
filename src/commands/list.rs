//! List posts from the content API

use anyhow::Result;

use crate::content::PostSummary;
use crate::helpers::format_date_with;
use crate::pages::{build_listing, ListingState, LoadMore};
use crate::prismic::ContentApi;
use crate::Site;

/// Collect the first page of posts, or every page when `all` is set
pub async fn collect(site: &Site, api: &dyn ContentApi, all: bool) -> Result<ListingState> {
    let first_page = build_listing(api, &site.config.listing).await?;
    let mut state = ListingState::new(first_page).with_zone(site.config.zone()?);

    if all {
        while let LoadMore::Appended(count) = state.load_more(api).await? {
            tracing::debug!("Fetched {} more posts", count);
        }
    }

    Ok(state)
}

/// Print posts
pub async fn run(site: &Site, api: &dyn ContentApi, all: bool) -> Result<()> {
    let state = collect(site, api, all).await?;
    let zone = site.config.zone()?;

    println!("Posts ({}):", state.posts().len());
    for post in state.posts() {
        println!("  {}", describe(post, zone.as_ref()));
    }
    if state.can_load_more() {
        println!("More posts available (use --all to list them)");
    }

    Ok(())
}

fn describe(post: &PostSummary, zone: Option<&chrono_tz::Tz>) -> String {
    let date = post
        .first_publication_date
        .as_deref()
        .map(|d| format_date_with(d, zone))
        .unwrap_or_else(|| "-".to_string());
    format!("{} - {} by {} [{}]", date, post.title, post.author, post.uid)
}
