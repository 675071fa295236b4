use std::borrow::Cow;
use std::iter::Peekable;
use std::str::Chars;

/// Counts whitespace-separated tokens in `s`.
///
/// This is an approximation, not a linguistic word counter: punctuation is
/// never split off and scripts written without spaces count as one word per
/// run.
///
/// # Examples
///
/// ```
/// use spacetraveling::util::word_count;
///
/// assert_eq!(word_count("Olá, mundo!"), 2);
/// assert_eq!(word_count(""), 0);
/// assert_eq!(word_count("a\tb\nc"), 3);
/// ```
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Strip terminal control characters and ANSI escape sequences from text.
///
/// Post titles and authors come straight from the CMS and are printed by the
/// CLI, so anything that could drive the terminal is dropped.
///
/// Strips C0 controls (except tab, newline and carriage return), DEL and the
/// C1 range `U+0080..=U+009F`. CSI sequences (`ESC [` or `U+009B`, up to a
/// final byte in `0x40..=0x7E`) and OSC sequences (`ESC ]` or `U+009D`, up to
/// BEL, `ESC \` or `U+009C`) are removed whole.
///
/// Returns `Cow::Borrowed` when nothing needs stripping.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_stripped) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\u{1b}' => match chars.peek() {
                Some('[') => {
                    chars.next();
                    skip_csi(&mut chars);
                }
                Some(']') => {
                    chars.next();
                    skip_osc(&mut chars);
                }
                _ => {}
            },
            '\u{9b}' => skip_csi(&mut chars),
            '\u{9d}' => skip_osc(&mut chars),
            c if is_stripped(c) => {}
            c => out.push(c),
        }
    }

    Cow::Owned(out)
}

fn is_stripped(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => false,
        '\u{0}'..='\u{1f}' | '\u{7f}'..='\u{9f}' => true,
        _ => false,
    }
}

fn skip_csi(chars: &mut Peekable<Chars<'_>>) {
    for c in chars.by_ref() {
        if ('\u{40}'..='\u{7e}').contains(&c) {
            break;
        }
    }
}

fn skip_osc(chars: &mut Peekable<Chars<'_>>) {
    while let Some(c) = chars.next() {
        match c {
            '\u{07}' | '\u{9c}' => break,
            '\u{1b}' if chars.peek() == Some(&'\\') => {
                chars.next();
                break;
            }
            _ => {}
        }
    }
}
