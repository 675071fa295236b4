//! Pure helpers used at render time.
//!
//! This module provides reusable utilities for:
//!
//! - **Date formatting**: ISO-8601 timestamps to `dd MMM yyyy` in pt-BR
//! - **Reading time**: whole-minute estimates over a post's content blocks
//! - **Text processing**: whitespace word counting and terminal-safe output
//!
//! # Examples
//!
//! ```
//! use spacetraveling::util::{format_date, word_count};
//!
//! assert_eq!(format_date("2021-01-15T00:00:00Z").unwrap(), "15 jan 2021");
//! assert_eq!(word_count("  Como utilizar   Hooks "), 3);
//! ```

mod date;
mod reading_time;
mod text;

pub use date::{format_date, format_date_or, DateFormatError};
pub use reading_time::{estimate_reading_time, WORDS_PER_MINUTE};
pub use text::{strip_control_chars, word_count};
