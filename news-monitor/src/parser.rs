use crate::error::FetchError;
use crate::normalizer::parse_published;
use crate::types::{RawEntry, RawLink};
use feed_rs::parser;
use tracing::debug;

pub struct FeedParser;

impl FeedParser {
    /// Decodes an RSS or Atom document into at most `max_entries` raw entries,
    /// keeping the order the feed lists them in.
    pub fn parse_entries(content: &[u8], max_entries: usize) -> Result<Vec<RawEntry>, FetchError> {
        debug!("Parsing feed content ({} bytes)", content.len());

        // feed-rs drops dates its own parser cannot read, so hand it ours
        let feed = parser::Builder::new()
            .timestamp_parser(parse_published)
            .build()
            .parse(content)
            .map_err(|e| FetchError::Parse(format!("Failed to parse feed: {}", e)))?;

        let total = feed.entries.len();
        let entries: Vec<RawEntry> = feed
            .entries
            .into_iter()
            .take(max_entries)
            .map(Self::raw_entry)
            .collect();

        debug!("Parsed feed with {} entries, kept {}", total, entries.len());
        Ok(entries)
    }

    fn raw_entry(entry: feed_rs::model::Entry) -> RawEntry {
        let title = entry.title.map(|t| t.content);

        // Prefer the summary; fall back to inline content the way Atom feeds
        // without <summary> expect readers to.
        let summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body));

        let link = entry
            .links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| entry.links.first())
            .map(|l| l.href.clone());

        let published = entry.published.map(|dt| dt.to_rfc3339());

        let mut media_thumbnails = Vec::new();
        let mut media_contents = Vec::new();
        for media in &entry.media {
            media_thumbnails.extend(media.thumbnails.iter().map(|t| t.image.uri.clone()));
            media_contents.extend(
                media
                    .content
                    .iter()
                    .filter_map(|c| c.url.as_ref().map(|u| u.to_string())),
            );
        }

        let links = entry
            .links
            .into_iter()
            .map(|l| RawLink {
                href: l.href,
                rel: l.rel,
                media_type: l.media_type,
            })
            .collect();

        RawEntry {
            title,
            summary,
            link,
            published,
            media_thumbnails,
            media_contents,
            links,
        }
    }
}
