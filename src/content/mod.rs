//! Content module - post models, rich text and reading time

pub(crate) mod de;
mod post;
pub mod reading_time;
mod rich_text;

pub use post::{Banner, ContentBlock, PostDetail, PostPagination, PostSummary};
pub use reading_time::reading_time;
pub use rich_text::{
    EmbedBlock, ImageBlock, LinkData, OEmbed, RichText, RichTextNode, Span, SpanData, SpanKind,
    TextBlock,
};
