//! Hanzi → Hanyu Pinyin (tone diacritics, space-separated), copy non-Chinese as-is.
//!
//! Used to fill word bank entries that come without pinyin.
//!
//! Example:
//!   输入: "你好！"
//!   输出: "nǐ hǎo！"
use pinyin::ToPinyin;

/// Convert Chinese text into Hanyu Pinyin with tone diacritics, space-separated.
/// Non-Chinese characters are copied as-is.
///
/// Per-character conversion (no word segmentation), so polyphonic characters
/// get their default reading.
pub fn to_pinyin_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);

    // Insert spaces only between consecutive Hanzi syllables.
    let mut last_was_hanzi = false;

    for ch in text.chars() {
        if let Some(py) = ch.to_pinyin() {
            if last_was_hanzi {
                out.push(' ');
            }
            out.push_str(py.with_tone());
            last_was_hanzi = true;
        } else {
            out.push(ch);
            last_was_hanzi = false;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_with_tone_marks() {
        assert_eq!(to_pinyin_diacritics("你好"), "nǐ hǎo");
    }

    #[test]
    fn keeps_non_chinese_text() {
        assert_eq!(to_pinyin_diacritics("水 2"), "shuǐ 2");
    }
}
