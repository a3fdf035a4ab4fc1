use anyhow::Context;
use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    StatusCode,
};
use url::Url;

use crate::{catalog::PageTarget, config::ScraperConfig};

const SEC_FETCH_SITE: &str = "sec-fetch-site";

/// A failed page request.  The run skips the page and goes on.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Server returned {status} for {url}")]
    Status { url: Url, status: StatusCode },
}

/// HTTP client carrying the configured headers and cookies on every request.
pub struct RankingClient {
    client: reqwest::Client,
    cookie: Option<HeaderValue>,
}

impl RankingClient {
    pub fn new(config: &ScraperConfig) -> anyhow::Result<Self> {
        let headers = config
            .headers
            .iter()
            .map(|(name, value)| {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .with_context(|| format!("Invalid header name: {name:?}"))?;
                let value = HeaderValue::from_str(value)
                    .with_context(|| format!("Invalid value for header {name}: {value:?}"))?;
                anyhow::Ok((name, value))
            })
            .collect::<anyhow::Result<HeaderMap>>()?;
        let cookie = config
            .cookie_header()
            .map(|cookie| HeaderValue::from_str(&cookie))
            .transpose()
            .context("Cookies contain characters not allowed in a header")?;
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .connection_verbose(true)
            .build()?;
        Ok(Self { client, cookie })
    }

    /// GETs one page and returns its body.  Any non-2xx status is an error.
    pub async fn fetch(&self, page: &PageTarget) -> Result<String, FetchError> {
        let mut request = self.client.get(page.url().clone());
        request = match page.referer() {
            Some(referer) => request
                .header(header::REFERER, referer.as_str())
                .header(SEC_FETCH_SITE, "same-origin"),
            None => request.header(SEC_FETCH_SITE, "none"),
        };
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie.clone());
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: page.url().clone(),
                status,
            });
        }
        Ok(response.text().await?)
    }
}
