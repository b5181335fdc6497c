//! Page components: data fetching, client state and rendering

pub mod detail;
pub mod listing;

pub use detail::{build_detail, static_paths, DetailPage, DetailView, ReadingTimeMemo};
pub use listing::{build_listing, fetch_more, ListingState, LoadMore};
