use anyhow::Context;

use crate::foundation::error::{FmiError, FmiResult};

/// Release search and cover-art endpoints.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CatalogEndpoints {
    /// MusicBrainz-compatible release search endpoint.
    pub search_url: String,
    /// Cover Art Archive-compatible base URL.
    pub art_url: String,
}

impl Default for CatalogEndpoints {
    fn default() -> Self {
        Self {
            search_url: "https://musicbrainz.org/ws/2/release/".to_string(),
            art_url: "https://coverartarchive.org".to_string(),
        }
    }
}

fn quote_term(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Lucene query matching a release by artist and title.
pub fn release_query(artist: &str, album: &str) -> String {
    format!(
        "artist:{} AND release:{}",
        quote_term(artist),
        quote_term(album)
    )
}

impl CatalogEndpoints {
    /// Search URL asking for the single best release match as JSON.
    pub fn search(&self, artist: &str, album: &str) -> FmiResult<String> {
        let query = release_query(artist, album);
        let url = url::Url::parse_with_params(
            &self.search_url,
            &[("query", query.as_str()), ("limit", "1"), ("fmt", "json")],
        )
        .with_context(|| format!("invalid catalog search url '{}'", self.search_url))?;
        Ok(url.into())
    }

    /// Front-cover URL for a release identifier.
    pub fn front_cover(&self, release_id: &str) -> String {
        format!(
            "{}/release/{release_id}/front",
            self.art_url.trim_end_matches('/')
        )
    }

    pub fn validate(&self) -> FmiResult<()> {
        for (name, value) in [("search_url", &self.search_url), ("art_url", &self.art_url)] {
            url::Url::parse(value)
                .map_err(|e| FmiError::validation(format!("catalog.{name} '{value}': {e}")))?;
        }
        Ok(())
    }
}

#[derive(serde::Deserialize)]
struct SearchResponse {
    #[serde(default)]
    releases: Vec<ReleaseHit>,
}

#[derive(serde::Deserialize)]
struct ReleaseHit {
    id: String,
}

/// Identifier of the first release in a search response, `None` for an empty result list.
pub fn parse_release_id(body: &[u8]) -> FmiResult<Option<String>> {
    let resp: SearchResponse =
        serde_json::from_slice(body).context("parse catalog search response")?;
    Ok(resp
        .releases
        .into_iter()
        .map(|r| r.id)
        .find(|id| !id.is_empty()))
}

#[cfg(test)]
#[path = "../../tests/unit/artwork/catalog.rs"]
mod tests;
