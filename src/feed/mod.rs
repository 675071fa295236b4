//! Post feed pipeline: raw CMS records in, listing and detail views out.
//!
//! - [`model`] - raw CMS shapes and the strict post types
//! - [`normalize`] - the one place raw records become strict types
//! - [`aggregator`] - the paginated listing and its "load more" operation
//! - [`view`] - display metadata (formatted dates, reading time)
//!
//! # Example
//!
//! ```ignore
//! use spacetraveling::content::CmsClient;
//! use spacetraveling::feed::{normalize_page, FeedAggregator};
//!
//! let first = normalize_page(client.get_by_type("posts").await?);
//! let feed = FeedAggregator::new(first);
//! while feed.has_more() {
//!     feed.load_next(&client).await?;
//! }
//! ```

mod aggregator;
mod model;
mod normalize;
mod view;

pub use aggregator::{
    initialize, load_all, load_next, FeedAggregator, FeedError, FeedState, PageSource,
};
pub use model::{
    Banner, ContentBlock, FeedPage, Paragraph, PostDetail, PostSummary, RawBanner,
    RawContentBlock, RawDocument, RawPage, RawParagraph, RawPostData,
};
pub use normalize::{normalize_detail, normalize_page, normalize_summary};
pub use view::{PostCard, PostHeader};
