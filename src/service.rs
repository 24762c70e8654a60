use std::{sync::Arc, time::Duration};

use anyhow::Context;

use crate::{
    analysis::palette::{DEFAULT_CLUSTERS, Palette, extract_palette},
    artwork::{
        fetch::{FetchRequest, HttpFetch, fetch_bounded},
        resolver::{AlbumArtResolver, ArtworkOrigin},
    },
    foundation::error::{FmiError, FmiResult},
    registry::UserRegistry,
    render::compositor::compose,
    scrobble::{Scrobble, ScrobbleSource},
    text::{fonts::FontBook, layout::TextLayoutEngine},
};

/// File name the card is delivered under.
pub const CARD_FILENAME: &str = "fmi.png";

/// Where the requesting user's avatar comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AvatarSource {
    Url(String),
    Bytes(Vec<u8>),
}

/// A finished card plus what went into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedCard {
    pub png: Vec<u8>,
    pub filename: &'static str,
    pub origin: ArtworkOrigin,
    pub palette: Palette,
}

/// End-to-end card rendering: account lookup, scrobble, artwork + avatar, then drawing.
pub struct CardService<F, S, R> {
    fetcher: Arc<F>,
    resolver: AlbumArtResolver<F>,
    scrobbles: S,
    registry: R,
    fonts: Arc<FontBook>,
    timeout: Duration,
}

impl<F, S, R> CardService<F, S, R>
where
    F: HttpFetch,
    S: ScrobbleSource,
    R: UserRegistry,
{
    pub fn new(
        fetcher: Arc<F>,
        resolver: AlbumArtResolver<F>,
        scrobbles: S,
        registry: R,
        fonts: Arc<FontBook>,
        timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            resolver,
            scrobbles,
            registry,
            fonts,
            timeout,
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Render the card for a platform user whose account was linked earlier.
    ///
    /// `display_name` only feeds the "not linked" message.
    #[tracing::instrument(skip(self, avatar))]
    pub async fn render_for_user(
        &self,
        user_id: &str,
        display_name: &str,
        avatar: AvatarSource,
    ) -> FmiResult<RenderedCard> {
        let username = self
            .registry
            .find(user_id)?
            .ok_or_else(|| FmiError::UserNotLinked(display_name.to_string()))?;
        self.render_for_username(&username, avatar).await
    }

    #[tracing::instrument(skip(self, avatar))]
    pub async fn render_for_username(
        &self,
        username: &str,
        avatar: AvatarSource,
    ) -> FmiResult<RenderedCard> {
        let scrobble = self.scrobbles.recent(username).await?;
        self.render_scrobble(&scrobble, avatar).await
    }

    /// Resolve artwork and avatar concurrently, then draw on a blocking worker.
    pub async fn render_scrobble(
        &self,
        scrobble: &Scrobble,
        avatar: AvatarSource,
    ) -> FmiResult<RenderedCard> {
        let (artwork, avatar_bytes) = tokio::try_join!(
            self.resolver.resolve(
                scrobble.artist(),
                scrobble.album(),
                scrobble.art_hint_url()
            ),
            self.avatar_bytes(avatar),
        )?;

        let fonts = self.fonts.clone();
        let scrobble = scrobble.clone();
        let origin = artwork.origin;
        let (png, palette) = tokio::task::spawn_blocking(move || -> FmiResult<_> {
            let palette = extract_palette(&artwork.bytes, DEFAULT_CLUSTERS)?;
            let engine = TextLayoutEngine::new(fonts.as_ref());
            let layouts =
                engine.layout_card(scrobble.title(), scrobble.artist(), scrobble.album());
            let png = compose(&artwork.bytes, &avatar_bytes, palette, &layouts, &fonts)?;
            Ok((png, palette))
        })
        .await
        .context("card render worker failed")??;

        tracing::info!(%origin, bytes = png.len(), "card rendered");
        Ok(RenderedCard {
            png,
            filename: CARD_FILENAME,
            origin,
            palette,
        })
    }

    async fn avatar_bytes(&self, avatar: AvatarSource) -> FmiResult<Vec<u8>> {
        let url = match avatar {
            AvatarSource::Bytes(bytes) => return Ok(bytes),
            AvatarSource::Url(url) => url,
        };
        let resp = fetch_bounded(self.fetcher.as_ref(), FetchRequest::get(&url), self.timeout)
            .await
            .map_err(|e| FmiError::avatar(e.to_string()))?;
        if !resp.is_success() {
            return Err(FmiError::avatar(format!(
                "avatar request to {url} returned {}",
                resp.status
            )));
        }
        Ok(resp.body)
    }
}

/// Log a request failure with full context and return the caller-facing message.
pub fn report_failure(err: &FmiError) -> String {
    match err {
        FmiError::Other(inner) => tracing::error!(error = ?inner, "card request failed"),
        other => tracing::warn!(error = %other, transient = other.is_transient(), "card request failed"),
    }
    err.user_message()
}

#[cfg(test)]
#[path = "../tests/unit/service.rs"]
mod tests;
