mod common;

use common::utc;
use news_monitor::normalizer::resolve_thumbnail;
use news_monitor::{normalize, RawEntry, RawLink};

fn enclosure(href: &str, media_type: &str) -> RawLink {
    RawLink {
        href: href.to_string(),
        rel: Some("enclosure".to_string()),
        media_type: Some(media_type.to_string()),
    }
}

#[test]
fn empty_entry_yields_populated_record() {
    let fetch_time = utc(2024, 6, 1, 9);
    let record = normalize(&RawEntry::default(), "Reuters", fetch_time);

    assert_eq!(record.timestamp, fetch_time);
    assert_eq!(record.title, "");
    assert_eq!(record.summary, "");
    assert_eq!(record.url, "");
    assert_eq!(record.source_name, "Reuters");
    assert_eq!(record.thumbnail_url, "");
    assert_eq!(record.matched_query, "");
}

#[test]
fn fields_are_copied_and_trimmed() {
    let raw = RawEntry {
        title: Some("  Wagner leaves Mali \n".to_string()),
        summary: Some("Summary text".to_string()),
        link: Some(" https://example.com/story ".to_string()),
        published: Some("Tue, 04 Jun 2024 10:00:00 GMT".to_string()),
        ..RawEntry::default()
    };
    let record = normalize(&raw, "AP", utc(2024, 6, 10, 0));

    assert_eq!(record.title, "Wagner leaves Mali");
    assert_eq!(record.summary, "Summary text");
    assert_eq!(record.url, "https://example.com/story");
    assert_eq!(record.timestamp, utc(2024, 6, 4, 10));
}

#[test]
fn unparseable_date_falls_back_to_fetch_time() {
    let fetch_time = utc(2024, 6, 1, 9);
    for published in ["", "last Tuesday", "32/13/2024", "Mon, 99 Foo 2024"] {
        let raw = RawEntry {
            published: Some(published.to_string()),
            ..RawEntry::default()
        };
        assert_eq!(normalize(&raw, "src", fetch_time).timestamp, fetch_time, "date {published:?}");
    }
}

#[test]
fn media_thumbnail_wins_over_other_shapes() {
    let raw = RawEntry {
        media_thumbnails: vec!["https://img.example.com/thumb.jpg".to_string()],
        media_contents: vec!["https://img.example.com/full.jpg".to_string()],
        links: vec![enclosure("https://img.example.com/enclosure.jpg", "image/jpeg")],
        ..RawEntry::default()
    };
    let record = normalize(&raw, "src", utc(2024, 6, 1, 0));
    assert_eq!(record.thumbnail_url, "https://img.example.com/thumb.jpg");
}

#[test]
fn media_content_beats_enclosure() {
    let raw = RawEntry {
        media_contents: vec!["https://img.example.com/full.jpg".to_string()],
        links: vec![enclosure("https://img.example.com/enclosure.jpg", "image/jpeg")],
        ..RawEntry::default()
    };
    assert_eq!(
        resolve_thumbnail(&raw).as_deref(),
        Some("https://img.example.com/full.jpg")
    );
}

#[test]
fn only_image_enclosures_count() {
    let raw = RawEntry {
        links: vec![
            RawLink {
                href: "https://example.com/story".to_string(),
                rel: Some("alternate".to_string()),
                media_type: Some("text/html".to_string()),
            },
            enclosure("https://cdn.example.com/podcast.mp3", "audio/mpeg"),
            enclosure("https://cdn.example.com/photo.png", "image/png"),
        ],
        ..RawEntry::default()
    };
    assert_eq!(
        resolve_thumbnail(&raw).as_deref(),
        Some("https://cdn.example.com/photo.png")
    );

    let audio_only = RawEntry {
        links: vec![enclosure("https://cdn.example.com/podcast.mp3", "audio/mpeg")],
        ..RawEntry::default()
    };
    assert_eq!(normalize(&audio_only, "src", utc(2024, 6, 1, 0)).thumbnail_url, "");
}

#[test]
fn blank_thumbnail_candidates_are_skipped() {
    let raw = RawEntry {
        media_thumbnails: vec!["  ".to_string()],
        media_contents: vec!["https://img.example.com/full.jpg".to_string()],
        ..RawEntry::default()
    };
    assert_eq!(
        resolve_thumbnail(&raw).as_deref(),
        Some("https://img.example.com/full.jpg")
    );
}

#[test]
fn normalizing_twice_gives_identical_records() {
    let fetch_time = utc(2024, 6, 1, 9);
    let raw = RawEntry {
        title: Some("Title".to_string()),
        summary: None,
        link: Some("https://example.com".to_string()),
        published: Some("garbage".to_string()),
        media_contents: vec!["https://img.example.com/a.jpg".to_string()],
        ..RawEntry::default()
    };
    assert_eq!(normalize(&raw, "src", fetch_time), normalize(&raw, "src", fetch_time));
}
