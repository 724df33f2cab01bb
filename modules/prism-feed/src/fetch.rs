use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use tracing::{info, warn};

use prism_common::{IngestStats, Source};
use prism_store::{NewArticle, StoreGateway};

use crate::error::{FeedError, Result};

const MIN_TITLE_LEN: usize = 5;
const MAX_SUMMARY_LEN: usize = 1000;
const TRANSPORT_RETRIES: u32 = 3;

pub struct FeedReader {
    client: reqwest::Client,
    store: StoreGateway,
}

impl FeedReader {
    pub fn new(store: StoreGateway) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to build feed HTTP client");
        Self { client, store }
    }

    /// Fetch a single eligible source: retries the transport layer up to
    /// `TRANSPORT_RETRIES` times with linear backoff, parses entries,
    /// dedupes by canonical link, and inserts new articles. Never propagates
    /// to the caller — a per-source failure is logged and skipped.
    pub async fn fetch_source(&self, source: &Source) -> IngestStats {
        let mut stats = IngestStats::default();

        if !source.is_eligible() {
            return stats;
        }

        let bytes = match self.fetch_bytes_with_retry(&source.feed_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(source = %source.name, error = %e, "feed fetch failed after retries");
                return stats;
            }
        };

        let feed = match feed_rs::parser::parse(&bytes[..]) {
            Ok(feed) => feed,
            Err(e) => {
                warn!(source = %source.name, error = %e, "feed parse failed");
                return stats;
            }
        };

        let fetched_at = Utc::now();
        let top_level_image = feed.logo.or(feed.icon);
        for entry in feed.entries {
            stats.fetched += 1;
            match self
                .accept_entry(source, entry, fetched_at, top_level_image.as_ref())
                .await
            {
                Ok(true) => stats.inserted += 1,
                Ok(false) => stats.skipped_duplicate += 1,
                Err(e) => {
                    warn!(source = %source.name, error = %e, "entry rejected");
                    stats.skipped_invalid += 1;
                }
            }
        }

        info!(
            source = %source.name,
            fetched = stats.fetched,
            inserted = stats.inserted,
            "feed processed"
        );
        stats
    }

    async fn fetch_bytes_with_retry(&self, feed_url: &str) -> Result<bytes::Bytes> {
        let mut last_err = None;
        for attempt in 1..=TRANSPORT_RETRIES {
            match self
                .client
                .get(feed_url)
                .header("User-Agent", "prism-feed/0.1")
                .send()
                .await
            {
                Ok(resp) => match resp.error_for_status() {
                    Ok(resp) => match resp.bytes().await {
                        Ok(bytes) => return Ok(bytes),
                        Err(e) => last_err = Some(e.to_string()),
                    },
                    Err(e) => last_err = Some(e.to_string()),
                },
                Err(e) => last_err = Some(e.to_string()),
            }
            if attempt < TRANSPORT_RETRIES {
                tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
            }
        }
        Err(FeedError::Unavailable(
            last_err.unwrap_or_else(|| "unknown transport error".to_string()),
        ))
    }

    /// Returns `Ok(true)` if a new article was inserted, `Ok(false)` if it
    /// was a duplicate, `Err` if the entry was rejected outright.
    async fn accept_entry(
        &self,
        source: &Source,
        entry: Entry,
        fetched_at: DateTime<Utc>,
        top_level_image: Option<&feed_rs::model::Image>,
    ) -> Result<bool> {
        let canonical_link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .filter(|href| !href.is_empty())
            .ok_or_else(|| FeedError::Unavailable("entry has no link".to_string()))?;

        let title = entry
            .title
            .map(|t| t.content)
            .unwrap_or_default();
        if title.chars().count() < MIN_TITLE_LEN {
            return Err(FeedError::Unavailable("title too short".to_string()));
        }

        let image_url = extract_image_url(&entry.media, &entry.links, top_level_image);
        let summary = extract_summary(entry.summary.as_ref(), entry.content.as_ref());
        let published_at = entry.published.or(entry.updated).map(|dt| dt.with_timezone(&Utc)).unwrap_or(fetched_at);

        let new_article = NewArticle {
            source_id: source.id,
            title,
            canonical_link,
            summary,
            published_at,
            image_url,
            bias: source.bias,
        };

        let inserted = self
            .store
            .insert_article_if_new(new_article, fetched_at)
            .await
            .map_err(FeedError::Store)?;

        Ok(inserted.is_some())
    }
}

/// Enumerated, fixed-order attempt at an entry's image: enclosure (image
/// MIME) -> iTunes image -> top-level (feed) image -> media thumbnail ->
/// first media content -> none. Never a dynamic field lookup.
///
/// feed_rs normalises both `<itunes:image>` and `<media:thumbnail>` into the
/// same `MediaObject.thumbnails` field, with no namespace tag preserved. The
/// two are told apart here by shape: an `<itunes:image>` object carries only
/// a thumbnail with no accompanying `<media:content>`, while Yahoo Media RSS
/// conventionally pairs a thumbnail with content entries on the same object.
fn extract_image_url(
    media: &[feed_rs::model::MediaObject],
    links: &[feed_rs::model::Link],
    top_level_image: Option<&feed_rs::model::Image>,
) -> Option<String> {
    if let Some(enclosure) = links.iter().find(|l| {
        l.rel.as_deref() == Some("enclosure")
            && l.media_type
                .as_deref()
                .map(|mt| mt.starts_with("image"))
                .unwrap_or(false)
    }) {
        return Some(enclosure.href.clone());
    }

    if let Some(thumb) = media
        .iter()
        .find(|object| object.content.is_empty())
        .and_then(|object| object.thumbnails.first())
    {
        return Some(thumb.image.uri.clone());
    }

    if let Some(image) = top_level_image {
        return Some(image.uri.clone());
    }

    for object in media {
        if let Some(thumb) = object.thumbnails.first() {
            return Some(thumb.image.uri.clone());
        }
    }

    for object in media {
        if let Some(content) = object.content.first() {
            if let Some(url) = &content.url {
                return Some(url.to_string());
            }
        }
    }

    None
}

/// Content-snippet -> description -> summary, stripped of markup,
/// whitespace-normalised, truncated to `MAX_SUMMARY_LEN` characters.
fn extract_summary(
    summary: Option<&feed_rs::model::Text>,
    content: Option<&feed_rs::model::Content>,
) -> Option<String> {
    let raw = content
        .and_then(|c| c.body.clone())
        .or_else(|| summary.map(|s| s.content.clone()))?;

    let stripped = ammonia::clean_text(&raw);
    let normalized = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return None;
    }
    Some(normalized.chars().take(MAX_SUMMARY_LEN).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_rs::model::Text;

    fn text(s: &str) -> Text {
        Text {
            content_type: mime::TEXT_PLAIN,
            src: None,
            content: s.to_string(),
        }
    }

    #[test]
    fn extract_summary_strips_markup_and_truncates() {
        let long_body = "<p>".to_string() + &"word ".repeat(400) + "</p>";
        let content = feed_rs::model::Content {
            body: Some(long_body),
            content_type: mime::TEXT_HTML,
            length: None,
            src: None,
        };
        let result = extract_summary(None, Some(&content)).unwrap();
        assert!(result.len() <= MAX_SUMMARY_LEN);
        assert!(!result.contains('<'));
    }

    #[test]
    fn extract_summary_falls_back_to_description() {
        let summary = text("A plain description.");
        let result = extract_summary(Some(&summary), None).unwrap();
        assert_eq!(result, "A plain description.");
    }

    #[test]
    fn extract_summary_none_when_both_missing() {
        assert!(extract_summary(None, None).is_none());
    }

    fn link(href: &str, rel: Option<&str>, media_type: Option<&str>) -> feed_rs::model::Link {
        feed_rs::model::Link {
            href: href.to_string(),
            rel: rel.map(str::to_string),
            media_type: media_type.map(str::to_string),
            ..Default::default()
        }
    }

    fn thumbnail(uri: &str) -> feed_rs::model::MediaThumbnail {
        feed_rs::model::MediaThumbnail {
            image: feed_rs::model::Image {
                uri: uri.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn media_content(url: &str) -> feed_rs::model::MediaContent {
        feed_rs::model::MediaContent {
            url: Some(url::Url::parse(url).unwrap()),
            ..Default::default()
        }
    }

    fn top_level_image(uri: &str) -> feed_rs::model::Image {
        feed_rs::model::Image {
            uri: uri.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn image_prefers_the_enclosure_link() {
        let links = vec![link(
            "https://example.com/enclosure.jpg",
            Some("enclosure"),
            Some("image/jpeg"),
        )];
        let media = vec![feed_rs::model::MediaObject {
            thumbnails: vec![thumbnail("https://example.com/itunes.jpg")],
            ..Default::default()
        }];
        let result = extract_image_url(&media, &links, Some(&top_level_image("https://example.com/top.jpg")));
        assert_eq!(result.as_deref(), Some("https://example.com/enclosure.jpg"));
    }

    #[test]
    fn image_falls_back_to_an_itunes_style_thumbnail() {
        let media = vec![feed_rs::model::MediaObject {
            thumbnails: vec![thumbnail("https://example.com/itunes.jpg")],
            ..Default::default()
        }];
        let result = extract_image_url(&media, &[], Some(&top_level_image("https://example.com/top.jpg")));
        assert_eq!(result.as_deref(), Some("https://example.com/itunes.jpg"));
    }

    #[test]
    fn image_falls_back_to_the_top_level_feed_image() {
        let result = extract_image_url(&[], &[], Some(&top_level_image("https://example.com/top.jpg")));
        assert_eq!(result.as_deref(), Some("https://example.com/top.jpg"));
    }

    #[test]
    fn image_falls_back_to_a_media_thumbnail_paired_with_content() {
        let media = vec![feed_rs::model::MediaObject {
            thumbnails: vec![thumbnail("https://example.com/mrss-thumb.jpg")],
            content: vec![media_content("https://example.com/mrss-content.jpg")],
            ..Default::default()
        }];
        let result = extract_image_url(&media, &[], None);
        assert_eq!(result.as_deref(), Some("https://example.com/mrss-thumb.jpg"));
    }

    #[test]
    fn image_falls_back_to_first_media_content() {
        let media = vec![feed_rs::model::MediaObject {
            content: vec![media_content("https://example.com/content-only.jpg")],
            ..Default::default()
        }];
        let result = extract_image_url(&media, &[], None);
        assert_eq!(result.as_deref(), Some("https://example.com/content-only.jpg"));
    }

    #[test]
    fn image_none_when_nothing_available() {
        assert!(extract_image_url(&[], &[], None).is_none());
    }
}
