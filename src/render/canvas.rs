use std::{collections::HashMap, io::Cursor, sync::Arc};

use anyhow::Context;

use crate::{
    foundation::{
        core::{BezPath, Point, Rgb8, Size},
        error::{FmiError, FmiResult},
        math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place},
    },
    text::fonts::TextBrushRgba8,
};

/// Fixed card size in pixels.
pub const CARD_SIZE: Size = Size::new(548, 147);

/// Decoded image in premultiplied RGBA8, ready to paint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Vec<u8>,
}

impl PreparedImage {
    /// Take ownership of a straight-alpha RGBA image and premultiply it.
    pub fn from_rgba(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut rgba8_premul = img.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);
        Self {
            width,
            height,
            rgba8_premul,
        }
    }

    fn to_pixmap(&self) -> FmiResult<vello_cpu::Pixmap> {
        let w: u16 = self
            .width
            .try_into()
            .map_err(|_| FmiError::validation("image width exceeds u16"))?;
        let h: u16 = self
            .height
            .try_into()
            .map_err(|_| FmiError::validation("image height exceeds u16"))?;
        if self.rgba8_premul.len() != self.width as usize * self.height as usize * 4 {
            return Err(FmiError::validation("prepared image byte length mismatch"));
        }

        let mut may_have_opacities = false;
        let mut pixels = Vec::with_capacity(self.width as usize * self.height as usize);
        for px in self.rgba8_premul.chunks_exact(4) {
            let a = px[3];
            may_have_opacities |= a != 255;
            pixels.push(vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a,
            });
        }

        Ok(vello_cpu::Pixmap::from_parts_with_opacity(
            pixels,
            w,
            h,
            may_have_opacities,
        ))
    }
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn translate(p: Point) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::translate((p.x, p.y))
}

fn color(c: Rgb8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, 255)
}

/// The card surface. Drawing calls queue paint operations; [`Canvas::finalize`] rasterizes them
/// and consumes the canvas, so nothing can be drawn after encoding.
pub struct Canvas {
    ctx: vello_cpu::RenderContext,
    size: Size,
    font_cache: HashMap<(u64, u32), vello_cpu::peniko::FontData>,
}

impl Canvas {
    /// A card-sized canvas filled with `background`.
    pub fn new(background: Rgb8) -> Self {
        Self::with_size(CARD_SIZE, background)
    }

    pub(crate) fn with_size(size: Size, background: Rgb8) -> Self {
        let w = size.width as u16;
        let h = size.height as u16;
        let mut ctx = vello_cpu::RenderContext::new(w, h);
        ctx.set_paint(color(background));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(w),
            f64::from(h),
        ));
        Self {
            ctx,
            size,
            font_cache: HashMap::new(),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn fill_path(&mut self, path: &BezPath, fill: Rgb8) {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(color(fill));
        self.ctx.fill_path(&bezpath_to_cpu(path));
    }

    /// Paint `img` with its top-left corner at `origin`, honoring its alpha.
    pub fn draw_image(&mut self, img: &PreparedImage, origin: Point) -> FmiResult<()> {
        let pixmap = img.to_pixmap()?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        self.ctx.set_transform(translate(origin));
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(img.width),
            f64::from(img.height),
        ));
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }

    /// Paint every glyph run of `layout` with the layout's top-left corner at `origin`.
    pub fn draw_layout(&mut self, layout: &parley::Layout<TextBrushRgba8>, origin: Point) {
        self.ctx.set_transform(translate(origin));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));

                let font = run.run().font();
                let font = self
                    .font_cache
                    .entry((font.data.id(), font.index))
                    .or_insert_with(|| {
                        vello_cpu::peniko::FontData::new(
                            vello_cpu::peniko::Blob::from(font.data.data().to_vec()),
                            font.index,
                        )
                    })
                    .clone();

                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }

        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }

    /// Rasterize everything drawn so far into straight-alpha RGBA8 rows.
    pub(crate) fn rasterize(mut self) -> Vec<u8> {
        let mut pixmap =
            vello_cpu::Pixmap::new(self.size.width as u16, self.size.height as u16);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);

        let mut rgba = pixmap.data_as_u8_slice().to_vec();
        unpremultiply_rgba8_in_place(&mut rgba);
        rgba
    }

    /// Rasterize and encode as PNG.
    pub fn finalize(self) -> FmiResult<Vec<u8>> {
        let size = self.size;
        let rgba = self.rasterize();
        let img = image::RgbaImage::from_raw(size.width, size.height, rgba)
            .context("pixmap size does not match canvas")?;

        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .context("encode card png")?;
        Ok(out.into_inner())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
