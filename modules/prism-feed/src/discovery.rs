/// Scan an arbitrary HTML page for `<link type="application/rss+xml">` /
/// `atom+xml` tags and return the candidate feed URLs, resolved against
/// `base_url`. Not on the ingestion hot path — an operator convenience for
/// onboarding a new outlet (`prism-cli sources discover <url>`).
pub fn discover_feed_urls(html: &str, base_url: &str) -> Vec<String> {
    let mut feeds = Vec::new();
    let pattern = regex::Regex::new(
        r#"<link[^>]+type\s*=\s*["']application/(rss\+xml|atom\+xml)["'][^>]*>"#,
    )
    .expect("invalid feed-link regex");
    let href_pattern =
        regex::Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).expect("invalid href regex");

    for cap in pattern.captures_iter(html) {
        let tag = cap.get(0).map(|m| m.as_str()).unwrap_or("");
        let Some(href_cap) = href_pattern.captures(tag) else {
            continue;
        };
        let Some(href) = href_cap.get(1) else {
            continue;
        };
        let href_str = href.as_str();

        let full_url = if href_str.starts_with("http") {
            href_str.to_string()
        } else if href_str.starts_with('/') {
            match url::Url::parse(base_url) {
                Ok(base) => format!(
                    "{}://{}{}",
                    base.scheme(),
                    base.host_str().unwrap_or(""),
                    href_str
                ),
                Err(_) => continue,
            }
        } else {
            continue;
        };
        feeds.push(full_url);
    }

    feeds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_absolute_and_relative_feed_links() {
        let html = r#"
            <link rel="alternate" type="application/rss+xml" href="https://example.com/feed.xml">
            <link rel="alternate" type="application/atom+xml" href="/atom.xml">
            <link rel="stylesheet" type="text/css" href="/style.css">
        "#;
        let urls = discover_feed_urls(html, "https://example.com/news");
        assert_eq!(
            urls,
            vec![
                "https://example.com/feed.xml".to_string(),
                "https://example.com/atom.xml".to_string(),
            ]
        );
    }

    #[test]
    fn no_feed_links_returns_empty() {
        assert!(discover_feed_urls("<html></html>", "https://example.com").is_empty());
    }
}
