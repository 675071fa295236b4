use serde::Serialize;

use super::model::{PostDetail, PostSummary};
use crate::util::format_date_or;

/// Listing entry: the summary plus its display date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCard {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub published: String,
}

impl PostCard {
    pub fn from_summary(post: &PostSummary, date_placeholder: &str) -> Self {
        Self {
            uid: post.uid.clone(),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            published: format_date_or(post.published_at.as_deref(), date_placeholder),
        }
    }
}

/// Detail page header: display date and reading time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostHeader {
    pub title: String,
    pub author: String,
    pub banner_url: String,
    pub published: String,
    pub reading_minutes: usize,
}

impl PostHeader {
    pub fn from_detail(post: &PostDetail, date_placeholder: &str) -> Self {
        Self {
            title: post.title.clone(),
            author: post.author.clone(),
            banner_url: post.banner.url.clone(),
            published: format_date_or(post.published_at.as_deref(), date_placeholder),
            reading_minutes: post.reading_time(),
        }
    }

    /// `"4 min"`. Zero is shown as `"0 min"`, never hidden.
    pub fn reading_time_label(&self) -> String {
        format!("{} min", self.reading_minutes)
    }
}
