use crate::text::{bidi, script::Script};

/// Font size used for every slot on the card.
pub const FONT_SIZE_PX: f32 = 19.0;

const ELLIPSIS: &str = "...";
const ELLIPSIS_CHARS: usize = 3;

/// One of the three text regions on a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    Title,
    Artist,
    Album,
}

impl Slot {
    pub const ALL: [Self; 3] = [Self::Title, Self::Artist, Self::Album];

    pub fn max_width_px(self) -> f32 {
        match self {
            Self::Title => 350.0,
            Self::Artist => 312.0,
            Self::Album => 280.0,
        }
    }

    pub fn line_cap(self) -> usize {
        match self {
            Self::Title | Self::Album => 2,
            Self::Artist => 1,
        }
    }

    /// Whether the slot is drawn in the emphasized weight.
    pub fn emphasized(self) -> bool {
        self == Self::Title
    }
}

/// Everything a measurer needs besides the string itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub script: Script,
    pub emphasized: bool,
}

impl TextStyle {
    pub fn for_slot(slot: Slot, script: Script, font_size: f32) -> Self {
        Self {
            font_size,
            script,
            emphasized: slot.emphasized(),
        }
    }
}

/// Rendered advance width of a single line of text, in pixels.
pub trait TextMeasure: Send + Sync {
    fn measure(&self, text: &str, style: &TextStyle) -> f32;
}

/// Wrapped, possibly truncated text for one slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutText {
    /// Lines in display order; RTL lines are already in visual order.
    pub lines: Vec<String>,
    /// True iff the last kept line had its tail replaced with `...`.
    pub truncated: bool,
    pub script: Script,
}

/// Laid-out text for all three slots of a card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardLayouts {
    pub title: LayoutText,
    pub artist: LayoutText,
    pub album: LayoutText,
}

/// Greedy word wrap. A word joins the current line only while the joined line stays strictly
/// narrower than `max_width_px`; a lone word wider than the limit still gets its own line.
pub fn wrap_words(text: &str, max_width_px: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{line} {word}");
        if measure(&candidate) < max_width_px {
            line = candidate;
        } else {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Keep at most `cap` lines; when lines are dropped, the last kept line ends in `...`.
pub fn truncate_lines(mut lines: Vec<String>, cap: usize) -> (Vec<String>, bool) {
    if lines.len() <= cap {
        return (lines, false);
    }
    lines.truncate(cap);
    if let Some(last) = lines.last_mut() {
        let n = last.chars().count();
        *last = if n < ELLIPSIS_CHARS {
            ELLIPSIS.to_string()
        } else {
            let keep: String = last.chars().take(n - ELLIPSIS_CHARS).collect();
            format!("{keep}{ELLIPSIS}")
        };
    }
    (lines, true)
}

/// Script-aware wrapping and truncation for the card's text slots.
pub struct TextLayoutEngine<'a> {
    measure: &'a dyn TextMeasure,
}

impl<'a> TextLayoutEngine<'a> {
    pub fn new(measure: &'a dyn TextMeasure) -> Self {
        Self { measure }
    }

    /// Lay out `text` for `slot` with an explicit width limit and font size.
    pub fn layout(&self, text: &str, slot: Slot, max_width_px: f32, font_size: f32) -> LayoutText {
        let script = Script::classify(text);
        let visual = bidi::to_visual(text);
        let style = TextStyle::for_slot(slot, script, font_size);

        let wrapped = wrap_words(&visual, max_width_px, |s| self.measure.measure(s, &style));
        let (lines, truncated) = truncate_lines(wrapped, slot.line_cap());
        if truncated {
            tracing::debug!(?slot, ?script, "slot text truncated");
        }
        LayoutText {
            lines,
            truncated,
            script,
        }
    }

    /// Lay out `text` with the slot's default width and [`FONT_SIZE_PX`].
    pub fn layout_slot(&self, text: &str, slot: Slot) -> LayoutText {
        self.layout(text, slot, slot.max_width_px(), FONT_SIZE_PX)
    }

    pub fn layout_card(&self, title: &str, artist: &str, album: &str) -> CardLayouts {
        CardLayouts {
            title: self.layout_slot(title, Slot::Title),
            artist: self.layout_slot(artist, Slot::Artist),
            album: self.layout_slot(album, Slot::Album),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
