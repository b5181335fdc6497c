//! Post models

use serde::{Deserialize, Serialize};

use super::de::null_as_default;
use super::RichText;

/// A post as shown on the home page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Unique identifier, also the URL slug
    pub uid: String,

    /// Publication date; raw from the API, or already formatted when the
    /// summary was fetched by "load more"
    pub first_publication_date: Option<String>,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A full post as shown on its own page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub banner: Banner,
    pub author: String,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub url: String,
}

/// A section of a post: a heading followed by rich text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default, deserialize_with = "null_as_default")]
    pub heading: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: RichText,
}

/// One page of summaries plus the cursor to the next page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostPagination {
    /// Fully qualified URL of the next page, absent on the last page
    pub next_page: Option<String>,
    pub results: Vec<PostSummary>,
}

impl PostPagination {
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }
}
