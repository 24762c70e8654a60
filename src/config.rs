use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;

use crate::{
    artwork::{cache::CacheBudgets, catalog::CatalogEndpoints},
    foundation::error::{FmiError, FmiResult},
    scrobble::LastFmConfig,
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Per-request timeout, applied to every outbound fetch.
    pub timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("fmi/{}", env!("CARGO_PKG_VERSION")),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root; defaults to the platform cache directory.
    pub root: Option<PathBuf>,
    #[serde(flatten)]
    pub budgets: CacheBudgets,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FontsConfig {
    pub dir: PathBuf,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("fonts"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// JSON file of linked accounts; defaults to the platform data directory.
    pub path: Option<PathBuf>,
}

/// Process configuration. Every field has a default, so `{}` is a valid config file.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub lastfm: LastFmConfig,
    pub catalog: CatalogEndpoints,
    pub cache: CacheConfig,
    pub fonts: FontsConfig,
    pub registry: RegistryConfig,
}

const APP_DIR: &str = "fmi";

impl AppConfig {
    pub fn from_json_str(s: &str) -> FmiResult<Self> {
        let cfg: Self = serde_json::from_str(s).context("parse config JSON")?;
        Ok(cfg)
    }

    /// Read the config file (if any), apply environment overrides, and validate.
    pub fn load(path: Option<&Path>) -> FmiResult<Self> {
        let mut cfg = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .with_context(|| format!("read config '{}'", p.display()))?;
                Self::from_json_str(&text)?
            }
            None => Self::default(),
        };
        cfg.apply_overrides(|name| std::env::var(name).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `FMI_*` overrides; `lookup` returns the value of an environment variable.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(v) = get("FMI_LASTFM_API_KEY") {
            self.lastfm.api_key = v;
        }
        if let Some(v) = get("FMI_USER_AGENT") {
            self.http.user_agent = v;
        }
        if let Some(v) = get("FMI_CACHE_DIR") {
            self.cache.root = Some(PathBuf::from(v));
        }
        if let Some(v) = get("FMI_FONTS_DIR") {
            self.fonts.dir = PathBuf::from(v);
        }
    }

    pub fn validate(&self) -> FmiResult<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(FmiError::validation("http.user_agent must be non-empty"));
        }
        if self.http.timeout_ms == 0 {
            return Err(FmiError::validation("http.timeout_ms must be > 0"));
        }
        if self.cache.budgets.art_bytes == 0 || self.cache.budgets.identifier_bytes == 0 {
            return Err(FmiError::validation("cache budgets must be > 0"));
        }
        url::Url::parse(&self.lastfm.endpoint).map_err(|e| {
            FmiError::validation(format!("lastfm.endpoint '{}': {e}", self.lastfm.endpoint))
        })?;
        self.catalog.validate()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.http.timeout_ms)
    }

    pub fn cache_root(&self) -> FmiResult<PathBuf> {
        match &self.cache.root {
            Some(p) => Ok(p.clone()),
            None => dirs::cache_dir()
                .map(|d| d.join(APP_DIR))
                .ok_or_else(|| FmiError::validation("no platform cache dir; set cache.root")),
        }
    }

    pub fn registry_path(&self) -> FmiResult<PathBuf> {
        match &self.registry.path {
            Some(p) => Ok(p.clone()),
            None => dirs::data_dir()
                .map(|d| d.join(APP_DIR).join("users.json"))
                .ok_or_else(|| FmiError::validation("no platform data dir; set registry.path")),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
