//! The single boundary where loosely-shaped CMS records become strict types.
//!
//! Missing text fields become `""`; `uid` and the publication timestamp pass
//! through unmodified. Listing records without a `uid` cannot be linked to
//! and are dropped here. Nothing past this module deals with
//! `Option<String>` for display text.

use super::model::{
    Banner, ContentBlock, FeedPage, Paragraph, PostDetail, PostSummary, RawContentBlock,
    RawDocument, RawPage,
};

/// `None` when the record has no `uid`.
pub fn normalize_summary(raw: RawDocument) -> Option<PostSummary> {
    let uid = raw.uid?;
    let data = raw.data.unwrap_or_default();

    Some(PostSummary {
        uid,
        published_at: raw.first_publication_date,
        title: data.title.unwrap_or_default(),
        subtitle: data.subtitle.unwrap_or_default(),
        author: data.author.unwrap_or_default(),
    })
}

/// A detail record is always fetched by its UID, so a missing one becomes `""`.
pub fn normalize_detail(raw: RawDocument) -> PostDetail {
    let data = raw.data.unwrap_or_default();

    PostDetail {
        uid: raw.uid.unwrap_or_default(),
        published_at: raw.first_publication_date,
        title: data.title.unwrap_or_default(),
        subtitle: data.subtitle.unwrap_or_default(),
        author: data.author.unwrap_or_default(),
        banner: Banner {
            url: data.banner.and_then(|b| b.url).unwrap_or_default(),
        },
        content: data
            .content
            .unwrap_or_default()
            .into_iter()
            .map(normalize_block)
            .collect(),
    }
}

/// Normalizes every result in order and keeps the continuation token.
///
/// Records without a `uid` are skipped with a warning; the rest of the page
/// is kept. A blank token is treated the same as a missing one.
pub fn normalize_page(raw: RawPage) -> FeedPage {
    let raw_results = raw.results.unwrap_or_default();
    let received = raw_results.len();
    let results: Vec<PostSummary> = raw_results
        .into_iter()
        .filter_map(normalize_summary)
        .collect();

    let skipped = received - results.len();
    if skipped > 0 {
        tracing::warn!(
            skipped = skipped,
            page = ?raw.page,
            "Documents without uid skipped"
        );
    }

    FeedPage {
        results,
        next_page_token: raw.next_page.filter(|token| !token.trim().is_empty()),
    }
}

fn normalize_block(raw: RawContentBlock) -> ContentBlock {
    ContentBlock {
        heading: raw.heading.unwrap_or_default(),
        body: raw
            .body
            .unwrap_or_default()
            .into_iter()
            .map(|p| Paragraph {
                text: p.text.unwrap_or_default(),
            })
            .collect(),
    }
}
