use std::{future::Future, time::Duration};

use anyhow::Context;

use crate::foundation::error::FmiResult;

/// A GET request with optional extra headers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Status and full body of a completed request. Non-success statuses are still responses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// Failure to obtain any response at all.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("request to {url} failed: {detail}")]
    Transport { url: String, detail: String },
}

/// Outbound HTTP GET, shared by every request in the process.
pub trait HttpFetch: Send + Sync {
    fn get(
        &self,
        request: FetchRequest,
    ) -> impl Future<Output = Result<FetchResponse, FetchError>> + Send;
}

/// Run `fetcher.get` with an upper bound on wall time; expiry becomes [`FetchError::Timeout`].
pub async fn fetch_bounded<F: HttpFetch + ?Sized>(
    fetcher: &F,
    request: FetchRequest,
    timeout: Duration,
) -> Result<FetchResponse, FetchError> {
    let url = request.url.clone();
    match tokio::time::timeout(timeout, fetcher.get(request)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout { url, timeout }),
    }
}

/// [`HttpFetch`] backed by a shared `reqwest` client.
#[derive(Clone, Debug)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> FmiResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self { client, timeout })
    }
}

impl HttpFetch for ReqwestFetcher {
    async fn get(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let transport = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: request.url.clone(),
                    timeout: self.timeout,
                }
            } else {
                FetchError::Transport {
                    url: request.url.clone(),
                    detail: e.to_string(),
                }
            }
        };

        let mut builder = self.client.get(&request.url).timeout(self.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let resp = builder.send().await.map_err(transport)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(transport)?;
        tracing::trace!(url = %request.url, status, bytes = body.len(), "http get");
        Ok(FetchResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/artwork/fetch.rs"]
mod tests;
