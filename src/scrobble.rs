use std::{future::Future, sync::Arc, time::Duration};

use anyhow::Context;

use crate::{
    artwork::fetch::{FetchRequest, HttpFetch, fetch_bounded},
    foundation::error::{FmiError, FmiResult, ScrobbleFailure},
};

/// The most recent track of an account. All four fields are non-empty.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Scrobble {
    title: String,
    artist: String,
    album: String,
    art_hint_url: String,
}

impl Scrobble {
    /// Build a scrobble, failing with [`FmiError::ScrobbleIncomplete`] on the first empty field.
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        art_hint_url: impl Into<String>,
    ) -> FmiResult<Self> {
        let s = Self {
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            art_hint_url: art_hint_url.into(),
        };
        for (field, value) in [
            ("title", &s.title),
            ("artist", &s.artist),
            ("album", &s.album),
            ("artwork link", &s.art_hint_url),
        ] {
            if value.trim().is_empty() {
                return Err(FmiError::ScrobbleIncomplete(field));
            }
        }
        Ok(s)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn album(&self) -> &str {
        &self.album
    }

    pub fn art_hint_url(&self) -> &str {
        &self.art_hint_url
    }
}

/// Looks up what an account listened to last.
pub trait ScrobbleSource: Send + Sync {
    fn recent(&self, username: &str) -> impl Future<Output = FmiResult<Scrobble>> + Send;
}

/// Last.fm API error code for an unknown user.
const LASTFM_USER_NOT_FOUND: i64 = 6;

/// Index of the "large" entry in Last.fm's image list.
const LASTFM_IMAGE_LARGE: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LastFmConfig {
    pub api_key: String,
    pub endpoint: String,
}

impl Default for LastFmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://ws.audioscrobbler.com/2.0/".to_string(),
        }
    }
}

#[derive(serde::Deserialize)]
struct ApiError {
    error: i64,
    #[serde(default)]
    message: String,
}

#[derive(serde::Deserialize)]
struct RecentTracksEnvelope {
    recenttracks: RecentTracks,
}

#[derive(serde::Deserialize)]
struct RecentTracks {
    #[serde(default)]
    track: OneOrMany<TrackDto>,
}

/// Last.fm collapses single-element arrays into a bare object.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_first(self) -> Option<T> {
        match self {
            Self::Many(v) => v.into_iter().next(),
            Self::One(t) => Some(t),
        }
    }
}

#[derive(serde::Deserialize, Default)]
#[serde(default)]
struct TextField {
    #[serde(rename = "#text")]
    text: String,
}

#[derive(serde::Deserialize)]
struct TrackDto {
    #[serde(default)]
    name: String,
    #[serde(default)]
    artist: TextField,
    #[serde(default)]
    album: TextField,
    #[serde(default)]
    image: Vec<TextField>,
}

/// Parse a `user.getrecenttracks` JSON body into the newest scrobble.
pub fn parse_recent_tracks(body: &[u8]) -> FmiResult<Scrobble> {
    if let Ok(err) = serde_json::from_slice::<ApiError>(body) {
        tracing::warn!(code = err.error, message = %err.message, "last.fm api error");
        let reason = if err.error == LASTFM_USER_NOT_FOUND {
            ScrobbleFailure::AccountNotFound
        } else {
            ScrobbleFailure::ServiceUnreachable
        };
        return Err(FmiError::ScrobbleUnavailable(reason));
    }

    let envelope: RecentTracksEnvelope = serde_json::from_slice(body)
        .context("parse last.fm recent tracks")
        .map_err(|e| {
            tracing::warn!(error = %format!("{e:#}"), "unexpected last.fm response");
            FmiError::ScrobbleUnavailable(ScrobbleFailure::ServiceUnreachable)
        })?;

    let track = envelope
        .recenttracks
        .track
        .into_first()
        .ok_or(FmiError::ScrobbleUnavailable(ScrobbleFailure::NoRecentActivity))?;
    let art = track
        .image
        .into_iter()
        .nth(LASTFM_IMAGE_LARGE)
        .map(|i| i.text)
        .unwrap_or_default();

    Scrobble::new(track.name, track.artist.text, track.album.text, art)
}

/// [`ScrobbleSource`] backed by the Last.fm web API.
pub struct LastFmClient<F> {
    fetcher: Arc<F>,
    config: LastFmConfig,
    timeout: Duration,
}

impl<F: HttpFetch> LastFmClient<F> {
    pub fn new(fetcher: Arc<F>, config: LastFmConfig, timeout: Duration) -> FmiResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(FmiError::validation(
                "a Last.fm api key is required (lastfm.api_key or FMI_LASTFM_API_KEY)",
            ));
        }
        Ok(Self {
            fetcher,
            config,
            timeout,
        })
    }

    fn request_url(&self, username: &str) -> FmiResult<String> {
        let url = url::Url::parse_with_params(
            &self.config.endpoint,
            &[
                ("method", "user.getrecenttracks"),
                ("user", username),
                ("api_key", self.config.api_key.as_str()),
                ("format", "json"),
            ],
        )
        .with_context(|| format!("invalid last.fm endpoint '{}'", self.config.endpoint))?;
        Ok(url.into())
    }
}

impl<F: HttpFetch> ScrobbleSource for LastFmClient<F> {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn recent(&self, username: &str) -> FmiResult<Scrobble> {
        let url = self.request_url(username)?;
        let resp = fetch_bounded(self.fetcher.as_ref(), FetchRequest::get(url), self.timeout)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "last.fm request failed");
                FmiError::ScrobbleUnavailable(ScrobbleFailure::ServiceUnreachable)
            })?;

        if resp.is_not_found() {
            return Err(FmiError::ScrobbleUnavailable(ScrobbleFailure::AccountNotFound));
        }
        if !resp.is_success() {
            // Error bodies still carry the API error code.
            return match parse_recent_tracks(&resp.body) {
                Err(e @ FmiError::ScrobbleUnavailable(ScrobbleFailure::AccountNotFound)) => Err(e),
                _ => {
                    tracing::warn!(status = resp.status, "last.fm returned non-success");
                    Err(FmiError::ScrobbleUnavailable(ScrobbleFailure::ServiceUnreachable))
                }
            };
        }

        parse_recent_tracks(&resp.body)
    }
}

#[cfg(test)]
#[path = "../tests/unit/scrobble.rs"]
mod tests;
