//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Whether a link target is safe to place in an `href` or `src` attribute
///
/// Only absolute http(s), mailto, tel and site-relative targets pass.
pub fn is_safe_url(url: &str) -> bool {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();

    lower.starts_with("https://")
        || lower.starts_with("http://")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || (url.starts_with('/') && !url.starts_with("//"))
        || url.starts_with('#')
}

/// Generate an anchor tag with escaped text and target
///
/// Unsafe targets render the text without a link.
pub fn link_to(href: &str, text: &str, external: bool) -> String {
    if !is_safe_url(href) {
        return html_escape(text);
    }

    if external {
        format!(
            r#"<a href="{}" target="_blank" rel="noopener">{}</a>"#,
            html_escape(href.trim()),
            html_escape(text)
        )
    } else {
        format!(
            r#"<a href="{}">{}</a>"#,
            html_escape(href.trim()),
            html_escape(text)
        )
    }
}

/// Generate an image tag, or nothing when the source is unsafe
pub fn image_tag(src: &str, alt: Option<&str>) -> String {
    if !is_safe_url(src) {
        return String::new();
    }

    format!(
        r#"<img src="{}" alt="{}" />"#,
        html_escape(src.trim()),
        html_escape(alt.unwrap_or(""))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<script>alert("x" & 'y')</script>"#),
            "&lt;script&gt;alert(&quot;x&quot; &amp; &#39;y&#39;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_is_safe_url() {
        assert!(is_safe_url("https://images.prismic.io/banner.png"));
        assert!(is_safe_url("/post/hello"));
        assert!(is_safe_url("mailto:me@example.com"));
        assert!(!is_safe_url("javascript:alert(1)"));
        assert!(!is_safe_url(" JavaScript:alert(1)"));
        assert!(!is_safe_url("//evil.example.com"));
        assert!(!is_safe_url("data:text/html;base64,xx"));
    }

    #[test]
    fn test_link_to() {
        assert_eq!(
            link_to("https://example.com/?a=1&b=2", "Ex", true),
            r#"<a href="https://example.com/?a=1&amp;b=2" target="_blank" rel="noopener">Ex</a>"#
        );
        assert_eq!(link_to("javascript:void(0)", "<b>x</b>", false), "&lt;b&gt;x&lt;/b&gt;");
    }

    #[test]
    fn test_image_tag() {
        assert_eq!(
            image_tag("https://cdn.example.com/a.png", Some("A \"quoted\" alt")),
            r#"<img src="https://cdn.example.com/a.png" alt="A &quot;quoted&quot; alt" />"#
        );
        assert_eq!(image_tag("javascript:x", None), "");
    }
}
