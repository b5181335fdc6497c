//! Reading time estimate

use lazy_static::lazy_static;
use regex::Regex;

use super::ContentBlock;

/// Default reading speed
pub const WORDS_PER_MINUTE: u32 = 200;

lazy_static! {
    static ref WORD_SEPARATOR: Regex = Regex::new(r"[\s.]+").expect("static regex");
}

/// Count the pieces of `text` split on runs of whitespace and periods
///
/// Empty pieces count too, so `""` is one token and `"Hello world."` three.
pub fn count_words(text: &str) -> usize {
    WORD_SEPARATOR.split(text).count()
}

/// Count the words of every heading and body
pub fn word_count(content: &[ContentBlock]) -> usize {
    content
        .iter()
        .map(|block| count_words(&block.heading) + count_words(&block.body.as_text()))
        .sum()
}

/// Minutes needed to read `content`, never less than one
pub fn reading_time(content: &[ContentBlock], words_per_minute: u32) -> u32 {
    let words = word_count(content) as u64;
    let wpm = u64::from(words_per_minute.max(1));
    (words / wpm) as u32 + 1
}
