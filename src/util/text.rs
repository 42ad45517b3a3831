use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: char = '…';

/// Width of `s` in terminal columns (CJK and emoji count as two).
///
/// ```
/// use taskflow::util::display_width;
///
/// assert_eq!(display_width("Todo"), 4);
/// assert_eq!(display_width("任务"), 4);
/// ```
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate `s` to at most `max_width` columns, ending in `…` when cut.
///
/// Never splits a wide character; the result may be one column narrower
/// than `max_width` when a wide character would straddle the edge.
///
/// ```
/// use taskflow::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Review PR", 20), "Review PR");
/// assert_eq!(truncate_to_width("Review PR", 6), "Revie…");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    let budget = max_width - 1;
    let mut used = 0;
    let mut out = String::with_capacity(max_width + ELLIPSIS.len_utf8());
    for c in s.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push(ELLIPSIS);
    Cow::Owned(out)
}

fn is_stripped(c: char) -> bool {
    c.is_control() && !matches!(c, '\t' | '\n' | '\r')
}

/// Remove control characters and ANSI escape sequences from user text.
///
/// Tab, newline and carriage return are kept. Input without anything to
/// strip is returned borrowed.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_stripped) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            if !is_stripped(c) {
                out.push(c);
            }
            continue;
        }
        match chars.peek() {
            // CSI: parameters until a final byte in @..~
            Some('[') => {
                chars.next();
                for c in chars.by_ref() {
                    if ('@'..='~').contains(&c) {
                        break;
                    }
                }
            }
            // OSC: until BEL or ESC \
            Some(']') => {
                chars.next();
                while let Some(c) = chars.next() {
                    if c == '\x07' {
                        break;
                    }
                    if c == '\x1b' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    Cow::Owned(out)
}

/// Collapse line breaks and runs of whitespace into single spaces.
pub fn single_line(s: &str) -> Cow<'_, str> {
    if !s.contains(['\n', '\r', '\t']) && !s.contains("  ") {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.split_whitespace().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_width_mixed() {
        assert_eq!(display_width(""), 0);
        assert_eq!(display_width("Hi 世界"), 7);
    }

    #[test]
    fn test_truncate_fits_is_borrowed() {
        assert!(matches!(truncate_to_width("short", 5), Cow::Borrowed("short")));
    }

    #[test]
    fn test_truncate_adds_ellipsis() {
        assert_eq!(truncate_to_width("Design TaskFlow", 8), "Design …");
        assert_eq!(truncate_to_width("abc", 1), "…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn test_truncate_does_not_split_wide_chars() {
        let out = truncate_to_width("世界世界", 4);
        assert_eq!(out, "世…");
        assert!(display_width(&out) <= 4);
    }

    #[test]
    fn test_strip_plain_text_is_borrowed() {
        assert!(matches!(strip_control_chars("Work\tstuff\n"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_control_and_ansi() {
        assert_eq!(strip_control_chars("a\x07b\x00c"), "abc");
        assert_eq!(strip_control_chars("\x1b[31mred\x1b[0m"), "red");
        assert_eq!(strip_control_chars("\x1b]0;title\x07text"), "text");
        assert_eq!(strip_control_chars("\x1b]8;;url\x1b\\link"), "link");
        assert_eq!(strip_control_chars("bare\x1bX"), "bareX");
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("one\ntwo  three"), "one two three");
        assert!(matches!(single_line("fine as is"), Cow::Borrowed(_)));
    }
}
