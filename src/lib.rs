//! Blog feed core for a headless CMS.
//!
//! Fetches posts from the CMS search API, accumulates the paginated listing
//! behind a "load more" action, and computes the display metadata the blog
//! shows: `dd MMM yyyy` publish dates in pt-BR and whole-minute reading times.

pub mod config;
pub mod content;
pub mod feed;
pub mod util;
