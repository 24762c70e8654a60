/// Writing-system class of a text slot, used to pick fonts and bidi handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    Latin,
    Cjk,
    Rtl,
}

pub(crate) fn is_arabic(c: char) -> bool {
    ('\u{0600}'..='\u{06FF}').contains(&c)
}

pub(crate) fn is_hebrew(c: char) -> bool {
    ('\u{0590}'..='\u{05FE}').contains(&c)
}

fn is_cjk(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
        || ('\u{3040}'..='\u{30FF}').contains(&c)
        || ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

impl Script {
    /// Classify `text`. Any Arabic or Hebrew character makes the whole slot right-to-left.
    pub fn classify(text: &str) -> Self {
        if text.chars().any(|c| is_arabic(c) || is_hebrew(c)) {
            Self::Rtl
        } else if text.chars().any(is_cjk) {
            Self::Cjk
        } else {
            Self::Latin
        }
    }

    pub fn font_set(self) -> &'static dyn FontSet {
        match self {
            Self::Latin => &LatinFonts,
            Self::Cjk => &CjkFonts,
            Self::Rtl => &RtlFonts,
        }
    }
}

/// Families tried after the script-specific ones, in order.
pub const FALLBACK_FAMILIES: &[&str] = &["Noto Emoji", "Symbola", "Unifont"];

/// Font selection for one script class.
pub trait FontSet: Send + Sync {
    /// Preferred families, most specific first. [`FALLBACK_FAMILIES`] are appended by [`FontSet::font_stack`].
    fn families(&self) -> &'static [&'static str];

    /// Weight used for the emphasized (title) slot.
    fn emphasis_weight(&self) -> f32 {
        600.0
    }

    fn regular_weight(&self) -> f32 {
        400.0
    }

    /// CSS-style font stack source string.
    fn font_stack(&self) -> String {
        self.families()
            .iter()
            .chain(FALLBACK_FAMILIES)
            .map(|f| format!("\"{f}\""))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub struct LatinFonts;

impl FontSet for LatinFonts {
    fn families(&self) -> &'static [&'static str] {
        &["Noto Sans"]
    }
}

pub struct CjkFonts;

impl FontSet for CjkFonts {
    fn families(&self) -> &'static [&'static str] {
        &[
            "Noto Sans JP",
            "Noto Sans KR",
            "Noto Sans SC",
            "Noto Sans TC",
            "Noto Sans HK",
            "Noto Sans",
        ]
    }

    // The CJK families ship Medium rather than SemiBold.
    fn emphasis_weight(&self) -> f32 {
        500.0
    }
}

pub struct RtlFonts;

impl FontSet for RtlFonts {
    fn families(&self) -> &'static [&'static str] {
        &["Noto Sans Arabic", "Heebo", "Noto Sans"]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/script.rs"]
mod tests;
