//! Platform text adjustment applied before chunking

use std::borrow::Cow;

use encoding_rs::SHIFT_JIS;
use unicode_normalization::UnicodeNormalization;

/// Adjust a string on platforms where the legacy Japanese codepage matters.
///
/// On Windows this is Unicode NFC composition followed by removal of
/// characters cp932 cannot represent; elsewhere the text passes through
/// unchanged.
pub fn adjust_string(s: &str) -> Cow<'_, str> {
    if cfg!(windows) {
        Cow::Owned(normalize_for_cp932(s))
    } else {
        Cow::Borrowed(s)
    }
}

/// NFC-compose, then drop characters with no cp932 representation.
pub fn normalize_for_cp932(s: &str) -> String {
    let composed: String = s.nfc().collect();
    let mut out = String::with_capacity(composed.len());
    let mut buf = [0u8; 4];
    for ch in composed.chars() {
        let (_, _, had_errors) = SHIFT_JIS.encode(ch.encode_utf8(&mut buf));
        if !had_errors {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_and_japanese_pass_through() {
        assert_eq!(normalize_for_cp932("Work ends on the 30th."), "Work ends on the 30th.");
        assert_eq!(normalize_for_cp932("工事は30日に終わります。"), "工事は30日に終わります。");
    }

    #[test]
    fn decomposed_kana_is_composed() {
        // か + combining dakuten composes to が, which cp932 can represent.
        assert_eq!(normalize_for_cp932("か\u{3099}"), "が");
    }

    #[test]
    fn unrepresentable_characters_are_dropped() {
        assert_eq!(normalize_for_cp932("done \u{1F3D7} today"), "done  today");
    }
}
