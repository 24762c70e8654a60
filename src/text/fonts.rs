use std::{
    borrow::Cow,
    path::Path,
    sync::{Mutex, MutexGuard},
};

use crate::{
    foundation::error::{FmiError, FmiResult},
    text::{
        layout::{TextMeasure, TextStyle},
        script::Script,
    },
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color carried through Parley layouts.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl TextBrushRgba8 {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

struct Contexts {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

/// Fonts registered from disk plus the Parley contexts used to shape against them.
///
/// Only explicitly registered fonts are visible; system fonts are never consulted, so the same
/// font directory always shapes text the same way.
pub struct FontBook {
    contexts: Mutex<Contexts>,
    families: Vec<String>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("families", &self.families)
            .finish()
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::empty()
    }
}

impl FontBook {
    /// A book with no fonts. Every measurement is zero and nothing can be drawn.
    pub fn empty() -> Self {
        Self {
            contexts: Mutex::new(Contexts {
                font_ctx: parley::FontContext::default(),
                layout_ctx: parley::LayoutContext::new(),
            }),
            families: Vec::new(),
        }
    }

    /// Register every `.ttf`, `.otf` and `.ttc` file directly inside `dir`.
    ///
    /// Unreadable or unparsable files are skipped with a warning. A missing directory yields an
    /// empty book.
    pub fn load_dir(dir: &Path) -> Self {
        let mut book = Self::empty();
        let Ok(rd) = std::fs::read_dir(dir) else {
            tracing::warn!(dir = %dir.display(), "font directory not readable");
            return book;
        };

        let mut paths: Vec<_> = rd
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        for path in paths {
            match std::fs::read(&path) {
                Ok(bytes) => {
                    if book.register(bytes) == 0 {
                        tracing::warn!(path = %path.display(), "no font families found in file");
                    }
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to read font"),
            }
        }

        tracing::info!(
            dir = %dir.display(),
            families = book.families.len(),
            "font book loaded"
        );
        book
    }

    /// Register raw font bytes; returns how many families they contributed.
    pub fn register(&mut self, font_bytes: Vec<u8>) -> usize {
        let contexts = self
            .contexts
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let families = contexts
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes), None);

        let mut added = 0;
        for (id, _) in &families {
            if let Some(name) = contexts.font_ctx.collection.family_name(*id) {
                if !self.families.iter().any(|f| f == name) {
                    self.families.push(name.to_string());
                }
                added += 1;
            }
        }
        added
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Names of all registered families, in registration order.
    pub fn family_names(&self) -> &[String] {
        &self.families
    }

    fn lock(&self) -> MutexGuard<'_, Contexts> {
        self.contexts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Shape `text` as a single unbroken line in `style`.
    pub fn layout_line(
        &self,
        text: &str,
        style: &TextStyle,
        brush: TextBrushRgba8,
    ) -> FmiResult<parley::Layout<TextBrushRgba8>> {
        if !style.font_size.is_finite() || style.font_size <= 0.0 {
            return Err(FmiError::validation(
                "text font_size must be finite and > 0",
            ));
        }

        let set = style.script.font_set();
        let weight = if style.emphasized {
            set.emphasis_weight()
        } else {
            set.regular_weight()
        };

        // Text is already in visual order; an LTR override keeps Parley from reordering it again.
        let text: Cow<'_, str> = if style.script == Script::Rtl {
            Cow::Owned(format!("\u{202D}{text}\u{202C}"))
        } else {
            Cow::Borrowed(text)
        };

        let mut guard = self.lock();
        let Contexts {
            font_ctx,
            layout_ctx,
        } = &mut *guard;

        let mut builder = layout_ctx.ranged_builder(font_ctx, &text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(set.font_stack())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.font_size));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(weight),
        ));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(&text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

impl TextMeasure for FontBook {
    fn measure(&self, text: &str, style: &TextStyle) -> f32 {
        if self.is_empty() || text.is_empty() {
            return 0.0;
        }
        match self.layout_line(text, style, TextBrushRgba8::default()) {
            Ok(layout) => layout.width(),
            Err(e) => {
                tracing::debug!(error = %e, "measure failed");
                0.0
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/fonts.rs"]
mod tests;
