//! Helper functions shared by templates and page renderers

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
