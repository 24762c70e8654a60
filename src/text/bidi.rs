use unicode_bidi::BidiInfo;

use crate::text::script::{Script, is_arabic};

/// Rewrite right-to-left text into visual order for a renderer that draws strictly left to right.
///
/// Arabic is first reshaped into contextual presentation forms so joined letters survive the
/// reordering. Non-RTL text is returned unchanged.
pub fn to_visual(text: &str) -> String {
    if Script::classify(text) != Script::Rtl {
        return text.to_string();
    }

    let shaped = if text.chars().any(is_arabic) {
        ar_reshaper::reshape_line(text)
    } else {
        text.to_string()
    };

    let info = BidiInfo::new(&shaped, None);
    let mut out = String::with_capacity(shaped.len());
    for para in &info.paragraphs {
        out.push_str(&info.reorder_line(para, para.range.clone()));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/text/bidi.rs"]
mod tests;
