use crate::feed::ContentBlock;

use super::text::word_count;

/// Fixed reading speed used by [`estimate_reading_time`].
pub const WORDS_PER_MINUTE: usize = 200;

/// Estimates whole minutes needed to read a post body.
///
/// Sums the whitespace-token count of every block heading and every body
/// paragraph, in order, and rounds `total / 200` up. An empty body reads in
/// 0 minutes; callers show "0 min" rather than hiding the field.
///
/// # Examples
///
/// ```
/// use spacetraveling::feed::{ContentBlock, Paragraph};
/// use spacetraveling::util::estimate_reading_time;
///
/// let content = vec![ContentBlock {
///     heading: "Introdução".to_string(),
///     body: vec![Paragraph { text: "Um texto curto.".to_string() }],
/// }];
/// assert_eq!(estimate_reading_time(&content), 1);
/// assert_eq!(estimate_reading_time(&[]), 0);
/// ```
pub fn estimate_reading_time(content: &[ContentBlock]) -> usize {
    let total_words: usize = content
        .iter()
        .map(|block| {
            word_count(&block.heading)
                + block
                    .body
                    .iter()
                    .map(|p| word_count(&p.text))
                    .sum::<usize>()
        })
        .sum();

    total_words.div_ceil(WORDS_PER_MINUTE)
}
