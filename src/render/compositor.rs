use anyhow::Context;
use image::imageops::FilterType;

use crate::{
    analysis::palette::Palette,
    foundation::{
        core::{BezPath, Point, Rgb8},
        error::{FmiError, FmiResult},
    },
    render::canvas::{Canvas, PreparedImage},
    text::{
        fonts::{FontBook, TextBrushRgba8},
        layout::{CardLayouts, FONT_SIZE_PX, LayoutText, Slot, TextStyle},
    },
};

const ART_ORIGIN: Point = Point::new(12.0, 12.0);
const ART_EDGE: u32 = 124;
const AVATAR_ORIGIN: Point = Point::new(473.0, 73.0);
const AVATAR_EDGE: u32 = 64;
const ACCENT_TRIANGLE: [(f64, f64); 3] = [(548.0, 0.0), (401.0, 147.0), (548.0, 147.0)];

/// Extra vertical gap between wrapped lines of one slot.
const LINE_SPACING_PX: f64 = 4.0;

fn slot_origin(slot: Slot) -> Point {
    match slot {
        Slot::Title => Point::new(146.0, 24.0),
        Slot::Artist => Point::new(146.0, 73.0),
        Slot::Album => Point::new(146.0, 96.0),
    }
}

/// Black text on light backgrounds, white otherwise, judged by the raw channel sum.
pub fn text_color(primary: Rgb8) -> Rgb8 {
    if primary.channel_sum() > 250 {
        Rgb8::BLACK
    } else {
        Rgb8::WHITE
    }
}

/// Decode artwork and scale it to the card's art square.
pub fn prepare_artwork(bytes: &[u8]) -> FmiResult<PreparedImage> {
    let img = image::load_from_memory(bytes)
        .context("decode artwork")
        .map_err(|e| FmiError::artwork(format!("{e:#}")))?;
    let resized = image::imageops::resize(&img.to_rgba8(), ART_EDGE, ART_EDGE, FilterType::Lanczos3);
    Ok(PreparedImage::from_rgba(resized))
}

/// Decode an avatar, cut it to the ellipse inscribed in its bounds and scale it down.
pub fn prepare_avatar(bytes: &[u8]) -> FmiResult<PreparedImage> {
    let rgb = image::load_from_memory(bytes)
        .context("decode avatar")
        .map_err(|e| FmiError::avatar(format!("{e:#}")))?
        .to_rgb8();
    let (w, h) = rgb.dimensions();
    let (cx, cy) = (f64::from(w) / 2.0, f64::from(h) / 2.0);

    let masked = image::RgbaImage::from_fn(w, h, |x, y| {
        let p = rgb.get_pixel(x, y);
        let dx = (f64::from(x) + 0.5 - cx) / cx;
        let dy = (f64::from(y) + 0.5 - cy) / cy;
        let a = if dx * dx + dy * dy <= 1.0 { 255 } else { 0 };
        image::Rgba([p[0], p[1], p[2], a])
    });
    let resized = image::imageops::resize(&masked, AVATAR_EDGE, AVATAR_EDGE, FilterType::Lanczos3);
    Ok(PreparedImage::from_rgba(resized))
}

fn accent_triangle() -> BezPath {
    let mut path = BezPath::new();
    path.move_to(ACCENT_TRIANGLE[0]);
    path.line_to(ACCENT_TRIANGLE[1]);
    path.line_to(ACCENT_TRIANGLE[2]);
    path.close_path();
    path
}

fn draw_slot(
    canvas: &mut Canvas,
    fonts: &FontBook,
    slot: Slot,
    text: &LayoutText,
    brush: TextBrushRgba8,
) -> FmiResult<()> {
    let style = TextStyle::for_slot(slot, text.script, FONT_SIZE_PX);
    let mut origin = slot_origin(slot);
    for line in &text.lines {
        let layout = fonts.layout_line(line, &style, brush)?;
        canvas.draw_layout(&layout, origin);
        origin.y += f64::from(layout.height()) + LINE_SPACING_PX;
    }
    Ok(())
}

/// Draw a complete card and encode it as PNG. Performs no I/O.
pub fn compose(
    artwork_bytes: &[u8],
    avatar_bytes: &[u8],
    palette: Palette,
    layouts: &CardLayouts,
    fonts: &FontBook,
) -> FmiResult<Vec<u8>> {
    let artwork = prepare_artwork(artwork_bytes)?;
    let avatar = prepare_avatar(avatar_bytes)?;

    let mut canvas = Canvas::new(palette.primary);
    canvas.draw_image(&artwork, ART_ORIGIN)?;
    canvas.fill_path(&accent_triangle(), palette.secondary);
    canvas.draw_image(&avatar, AVATAR_ORIGIN)?;

    if fonts.is_empty() {
        tracing::warn!("no fonts loaded; card rendered without text");
    } else {
        let c = text_color(palette.primary);
        let brush = TextBrushRgba8::opaque(c.r, c.g, c.b);
        draw_slot(&mut canvas, fonts, Slot::Title, &layouts.title, brush)?;
        draw_slot(&mut canvas, fonts, Slot::Artist, &layouts.artist, brush)?;
        draw_slot(&mut canvas, fonts, Slot::Album, &layouts.album, brush)?;
    }

    canvas.finalize()
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
