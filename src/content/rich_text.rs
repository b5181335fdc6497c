//! Structured text as delivered by the content API
//!
//! A body is a list of typed nodes. Text nodes carry inline spans whose
//! offsets count UTF-16 code units, the way the API computes them. Nodes
//! convert to plain text (reading time) and to HTML (post pages). Every
//! piece of text and every attribute goes through [`html_escape`], and
//! third-party embed markup is never copied into the page.

use serde::{Deserialize, Serialize};

use crate::helpers::{html_escape, image_tag, is_safe_url, link_to, post_slug};

/// An ordered sequence of rich text nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<RichTextNode>);

/// A single block of rich text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RichTextNode {
    #[serde(rename = "paragraph")]
    Paragraph(TextBlock),
    #[serde(rename = "preformatted")]
    Preformatted(TextBlock),
    #[serde(rename = "heading1")]
    Heading1(TextBlock),
    #[serde(rename = "heading2")]
    Heading2(TextBlock),
    #[serde(rename = "heading3")]
    Heading3(TextBlock),
    #[serde(rename = "heading4")]
    Heading4(TextBlock),
    #[serde(rename = "heading5")]
    Heading5(TextBlock),
    #[serde(rename = "heading6")]
    Heading6(TextBlock),
    #[serde(rename = "list-item")]
    ListItem(TextBlock),
    #[serde(rename = "o-list-item")]
    OrderedListItem(TextBlock),
    #[serde(rename = "image")]
    Image(ImageBlock),
    #[serde(rename = "embed")]
    Embed(EmbedBlock),
    /// Node kinds this renderer does not know; they render as nothing
    #[serde(other)]
    Unknown,
}

/// Text with inline formatting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
}

/// Inline formatting over `[start, end)` in UTF-16 code units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Unknown,
}

/// Payload of hyperlink and label spans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(flatten)]
    pub link: LinkData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A link to the web, a media file or another document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl LinkData {
    /// Resolve the link target; document links point at their post page
    pub fn resolve(&self) -> Option<String> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            return Some(url.to_string());
        }
        match (self.link_type.as_deref(), self.uid.as_deref()) {
            (Some("Document"), Some(uid)) if !post_slug(uid).is_empty() => {
                Some(format!("/post/{}", post_slug(uid)))
            }
            _ => None,
        }
    }

    fn opens_new_tab(&self) -> bool {
        self.target.as_deref() == Some("_blank")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(
        default,
        rename = "linkTo",
        skip_serializing_if = "Option::is_none"
    )]
    pub link_to: Option<LinkData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedBlock {
    #[serde(default)]
    pub oembed: OEmbed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OEmbed {
    #[serde(default)]
    pub embed_url: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl RichTextNode {
    /// The text block of text-bearing nodes
    pub fn text_block(&self) -> Option<&TextBlock> {
        match self {
            Self::Paragraph(b)
            | Self::Preformatted(b)
            | Self::Heading1(b)
            | Self::Heading2(b)
            | Self::Heading3(b)
            | Self::Heading4(b)
            | Self::Heading5(b)
            | Self::Heading6(b)
            | Self::ListItem(b)
            | Self::OrderedListItem(b) => Some(b),
            Self::Image(_) | Self::Embed(_) | Self::Unknown => None,
        }
    }

    fn list_tag(&self) -> Option<&'static str> {
        match self {
            Self::ListItem(_) => Some("ul"),
            Self::OrderedListItem(_) => Some("ol"),
            _ => None,
        }
    }

    fn to_html(&self) -> String {
        match self {
            Self::Paragraph(b) => format!("<p>{}</p>", render_spans(&b.text, &b.spans)),
            Self::Preformatted(b) => format!("<pre>{}</pre>", render_spans(&b.text, &b.spans)),
            Self::Heading1(b) => format!("<h1>{}</h1>", render_spans(&b.text, &b.spans)),
            Self::Heading2(b) => format!("<h2>{}</h2>", render_spans(&b.text, &b.spans)),
            Self::Heading3(b) => format!("<h3>{}</h3>", render_spans(&b.text, &b.spans)),
            Self::Heading4(b) => format!("<h4>{}</h4>", render_spans(&b.text, &b.spans)),
            Self::Heading5(b) => format!("<h5>{}</h5>", render_spans(&b.text, &b.spans)),
            Self::Heading6(b) => format!("<h6>{}</h6>", render_spans(&b.text, &b.spans)),
            Self::ListItem(b) | Self::OrderedListItem(b) => {
                format!("<li>{}</li>", render_spans(&b.text, &b.spans))
            }
            Self::Image(image) => {
                let img = image_tag(&image.url, image.alt.as_deref());
                if img.is_empty() {
                    return String::new();
                }
                let inner = match image.link_to.as_ref().and_then(|l| l.resolve()) {
                    Some(href) if is_safe_url(&href) => {
                        format!(r#"<a href="{}">{}</a>"#, html_escape(&href), img)
                    }
                    _ => img,
                };
                format!(r#"<p class="block-img">{}</p>"#, inner)
            }
            Self::Embed(embed) => {
                let oembed = &embed.oembed;
                if oembed.embed_url.is_empty() {
                    return String::new();
                }
                let text = oembed.title.as_deref().unwrap_or(&oembed.embed_url);
                format!(
                    r#"<div class="block-embed" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
                    html_escape(oembed.kind.as_deref().unwrap_or("")),
                    html_escape(oembed.provider_name.as_deref().unwrap_or("")),
                    link_to(&oembed.embed_url, text, true)
                )
            }
            Self::Unknown => String::new(),
        }
    }
}

impl RichText {
    /// Concatenate the text of all text-bearing nodes, separated by spaces
    pub fn as_text(&self) -> String {
        self.0
            .iter()
            .filter_map(|node| node.text_block())
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Render to escaped HTML, grouping consecutive list items into lists
    pub fn as_html(&self) -> String {
        let mut html = String::new();
        let mut open_list: Option<&'static str> = None;

        for node in &self.0 {
            let list = node.list_tag();
            if open_list != list {
                if let Some(tag) = open_list {
                    html.push_str(&format!("</{}>", tag));
                }
                if let Some(tag) = list {
                    html.push_str(&format!("<{}>", tag));
                }
                open_list = list;
            }
            html.push_str(&node.to_html());
        }

        if let Some(tag) = open_list {
            html.push_str(&format!("</{}>", tag));
        }

        html
    }
}

/// A span resolved to byte offsets with its markup
struct Markup {
    start: usize,
    end: usize,
    open: String,
    close: &'static str,
}

impl Markup {
    fn from_span(span: &Span, text: &str, offsets: &Utf16Offsets) -> Option<Self> {
        let start = offsets.byte_offset(span.start);
        let end = offsets.byte_offset(span.end);
        if start >= end || start >= text.len() {
            return None;
        }

        let (open, close) = match span.kind {
            SpanKind::Strong => ("<strong>".to_string(), "</strong>"),
            SpanKind::Em => ("<em>".to_string(), "</em>"),
            SpanKind::Label => {
                let label = span.data.as_ref()?.label.as_deref()?;
                (format!(r#"<span class="{}">"#, html_escape(label)), "</span>")
            }
            SpanKind::Hyperlink => {
                let link = &span.data.as_ref()?.link;
                let href = link.resolve().filter(|h| is_safe_url(h))?;
                let open = if link.opens_new_tab() {
                    format!(
                        r#"<a href="{}" target="_blank" rel="noopener">"#,
                        html_escape(&href)
                    )
                } else {
                    format!(r#"<a href="{}">"#, html_escape(&href))
                };
                (open, "</a>")
            }
            SpanKind::Unknown => return None,
        };

        Some(Self {
            start,
            end,
            open,
            close,
        })
    }
}

/// Maps UTF-16 code unit positions onto byte positions of a `str`
struct Utf16Offsets {
    /// `(utf16_position, byte_position)` at every char boundary
    boundaries: Vec<(usize, usize)>,
}

impl Utf16Offsets {
    fn new(text: &str) -> Self {
        let mut boundaries = Vec::with_capacity(text.len() + 1);
        let mut utf16 = 0;
        for (byte, c) in text.char_indices() {
            boundaries.push((utf16, byte));
            utf16 += c.len_utf16();
        }
        boundaries.push((utf16, text.len()));
        Self { boundaries }
    }

    /// Byte offset of the first char boundary at or after `utf16`
    fn byte_offset(&self, utf16: usize) -> usize {
        let idx = self.boundaries.partition_point(|(u, _)| *u < utf16);
        self.boundaries
            .get(idx)
            .or_else(|| self.boundaries.last())
            .map(|(_, byte)| *byte)
            .unwrap_or(0)
    }
}

/// Render text with its spans as properly nested, escaped HTML
fn render_spans(text: &str, spans: &[Span]) -> String {
    let offsets = Utf16Offsets::new(text);
    let mut markups: Vec<Markup> = spans
        .iter()
        .filter_map(|span| Markup::from_span(span, text, &offsets))
        .collect();
    // Outer spans first: earlier start, then longer extent
    markups.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut cuts: Vec<usize> = vec![0, text.len()];
    for m in &markups {
        cuts.push(m.start);
        cuts.push(m.end.min(text.len()));
    }
    cuts.sort_unstable();
    cuts.dedup();

    let mut html = String::with_capacity(text.len() + 16);
    let mut stack: Vec<usize> = Vec::new();

    for window in cuts.windows(2) {
        let (from, to) = (window[0], window[1]);
        let active: Vec<usize> = markups
            .iter()
            .enumerate()
            .filter(|(_, m)| m.start <= from && m.end >= to)
            .map(|(i, _)| i)
            .collect();

        let common = stack
            .iter()
            .zip(active.iter())
            .take_while(|(a, b)| a == b)
            .count();
        while stack.len() > common {
            if let Some(i) = stack.pop() {
                html.push_str(markups[i].close);
            }
        }
        for &i in &active[common..] {
            html.push_str(&markups[i].open);
            stack.push(i);
        }

        html.push_str(&escape_text(&text[from..to]));
    }

    while let Some(i) = stack.pop() {
        html.push_str(markups[i].close);
    }

    html
}

fn escape_text(s: &str) -> String {
    html_escape(s).replace('\n', "<br />")
}
