use serde::{Deserialize, Serialize};

use crate::util::estimate_reading_time;

// ============================================================================
// Raw CMS Records
// ============================================================================

/// A document as the CMS search API returns it.
///
/// Only the fields this crate reads are declared; everything else in the
/// payload is ignored. Any field may be missing or `null`; documents of a
/// type without a UID field come back with `"uid": null`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub data: Option<RawPostData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPostData {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub banner: Option<RawBanner>,
    pub content: Option<Vec<RawContentBlock>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawBanner {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawContentBlock {
    pub heading: Option<String>,
    pub body: Option<Vec<RawParagraph>>,
}

/// One rich-text node. Spans and node type are a renderer concern and are
/// not read here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawParagraph {
    pub text: Option<String>,
}

/// One page of search results.
///
/// `next_page` is the continuation URL for the following page; `null`, absent
/// or empty means the listing is exhausted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPage {
    pub results: Option<Vec<RawDocument>>,
    pub next_page: Option<String>,
    pub page: Option<u32>,
    pub total_pages: Option<u32>,
    pub results_size: Option<u32>,
    pub total_results_size: Option<u32>,
}

// ============================================================================
// Normalized Records
// ============================================================================

/// A post as shown in the listing.
///
/// `title`, `subtitle` and `author` are never absent: missing values are
/// normalized to `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    pub uid: String,
    pub published_at: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub url: String,
}

/// A titled section of a post. Paragraph order is the source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub heading: String,
    pub body: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
}

/// A full post for the detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,
    pub published_at: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner: Banner,
    pub content: Vec<ContentBlock>,
}

impl PostDetail {
    /// Estimated minutes to read [`PostDetail::content`].
    pub fn reading_time(&self) -> usize {
        estimate_reading_time(&self.content)
    }
}

/// A normalized page of post summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPage {
    pub results: Vec<PostSummary>,
    pub next_page_token: Option<String>,
}
