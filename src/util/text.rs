use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Ellipsis string used for truncation
const ELLIPSIS: &str = "...";
/// Display width of the ellipsis (3 columns for ASCII "...")
const ELLIPSIS_WIDTH: usize = 3;

/// Truncates a string to fit within a maximum display width.
///
/// If truncation is necessary, appends "..." to indicate text was cut off.
/// Width-aware rather than byte- or char-aware, so CJK characters and emoji
/// (2 columns each) don't overshoot the limit.
///
/// For widths of 3 columns or less there is no room for text plus an
/// ellipsis, so the result is just as many characters as fit.
///
/// Returns `Cow::Borrowed` when the input already fits — the common case
/// for entry titles, which costs no allocation.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if UnicodeWidthStr::width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let (target_width, ellipsis) = if max_width <= ELLIPSIS_WIDTH {
        (max_width, "")
    } else {
        (max_width - ELLIPSIS_WIDTH, ELLIPSIS)
    };

    let mut byte_end = 0;
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        let char_width = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + char_width > target_width {
            break;
        }
        used += char_width;
        byte_end = idx + c.len_utf8();
    }

    let mut out = s[..byte_end].to_string();
    out.push_str(ellipsis);
    Cow::Owned(out)
}
