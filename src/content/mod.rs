//! Content source: the CMS document search API.
//!
//! [`CmsClient`] covers the three requests the blog needs: the first page of
//! a document type, a single document by UID, and the page behind a
//! continuation token. It also implements [`crate::feed::PageSource`] so it
//! can drive the listing's "load more" directly.

mod client;

pub use client::{CmsClient, FetchError};
