//! `fmi` renders "now playing" cards: a 548×147 PNG showing a listener's most recent scrobble
//! with its album artwork, a two-color palette taken from that artwork, and the listener's avatar.
//!
//! # Pipeline overview
//!
//! 1. **Lookup**: platform user → Last.fm username ([`UserRegistry`]) → newest [`Scrobble`]
//!    ([`ScrobbleSource`]).
//! 2. **Resolve**: [`AlbumArtResolver`] walks cache → catalog identifier + art archive → the
//!    scrobble's own art URL, memoizing results in the [`ArtworkCache`]. The avatar is fetched
//!    concurrently.
//! 3. **Analyze**: [`extract_palette`] clusters the artwork in L*a*b* and picks a primary and a
//!    perceptually distinct secondary color.
//! 4. **Lay out**: [`TextLayoutEngine`] reshapes/reorders RTL text and wraps and truncates title,
//!    artist and album into their slots.
//! 5. **Compose**: [`compose`] draws everything onto a [`Canvas`] and encodes PNG.
//!
//! Steps 3–5 are pure CPU work with no I/O; [`CardService`] runs them on a blocking worker.
#![forbid(unsafe_code)]

mod analysis;
mod artwork;
mod foundation;
mod render;
mod text;

/// Runtime configuration loaded from JSON and `FMI_*` environment variables.
pub mod config;
/// Linked-account storage.
pub mod registry;
/// Scrobble records and the Last.fm client.
pub mod scrobble;
/// End-to-end request orchestration.
pub mod service;

pub use analysis::color::{Lab, delta_e_ciede2000, lab_to_srgb, srgb_to_lab};
pub use analysis::palette::{DEFAULT_CLUSTERS, DISTINCT_DELTA_E, Palette, extract_palette};
pub use artwork::cache::{ArtworkCache, CacheBudgets, CacheKey, CacheNamespace, CacheStats};
pub use artwork::catalog::{CatalogEndpoints, parse_release_id, release_query};
pub use artwork::fetch::{
    FetchError, FetchRequest, FetchResponse, HttpFetch, ReqwestFetcher, fetch_bounded,
};
pub use artwork::normalize::{is_gif, normalize_artwork};
pub use artwork::resolver::{AlbumArtResolver, ArtworkOrigin, ResolvedArtwork};
pub use config::AppConfig;
pub use foundation::core::{Rgb8, Size};
pub use foundation::error::{FmiError, FmiResult, ScrobbleFailure};
pub use registry::{JsonFileRegistry, UserRegistry};
pub use render::canvas::{CARD_SIZE, Canvas, PreparedImage};
pub use render::compositor::{compose, prepare_artwork, prepare_avatar, text_color};
pub use scrobble::{LastFmClient, LastFmConfig, Scrobble, ScrobbleSource, parse_recent_tracks};
pub use service::{AvatarSource, CARD_FILENAME, CardService, RenderedCard, report_failure};
pub use text::bidi::to_visual;
pub use text::fonts::{FontBook, TextBrushRgba8};
pub use text::layout::{
    CardLayouts, FONT_SIZE_PX, LayoutText, Slot, TextLayoutEngine, TextMeasure, TextStyle,
    truncate_lines, wrap_words,
};
pub use text::script::{CjkFonts, FontSet, LatinFonts, RtlFonts, Script};
