use std::io::Cursor;

use anyhow::Context;

use crate::foundation::error::FmiResult;

pub fn is_gif(bytes: &[u8]) -> bool {
    bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a")
}

/// Make fetched artwork safe to cache and draw: GIFs (possibly animated) become a single PNG
/// frame of the same size, other images pass through untouched.
///
/// Bytes that do not decode as an image are an error, so error pages and truncated
/// downloads never reach the cache.
pub fn normalize_artwork(bytes: Vec<u8>) -> FmiResult<Vec<u8>> {
    if !is_gif(&bytes) {
        image::load_from_memory(&bytes).context("decode fetched artwork")?;
        return Ok(bytes);
    }

    let first = image::load_from_memory_with_format(&bytes, image::ImageFormat::Gif)
        .context("decode gif artwork")?;
    let mut out = Cursor::new(Vec::new());
    first
        .write_to(&mut out, image::ImageFormat::Png)
        .context("re-encode gif artwork as png")?;
    tracing::debug!(
        width = first.width(),
        height = first.height(),
        "normalized gif artwork to png"
    );
    Ok(out.into_inner())
}

#[cfg(test)]
#[path = "../../tests/unit/artwork/normalize.rs"]
mod tests;
