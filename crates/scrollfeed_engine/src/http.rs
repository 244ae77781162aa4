use std::time::Duration;

use scrollfeed_core::{FetchResult, LoadError, ProviderError, ProviderFailure, ShapeError};
use serde::{Deserialize, Serialize};

use crate::{decode_fetch_result, ContentProvider};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Query parameter carrying the page size (`page_size`, `limit`, ...).
    pub page_size_param: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    #[serde(skip_serializing)]
    pub bearer_token: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            page_size_param: "page_size".to_string(),
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            bearer_token: None,
        }
    }
}

/// Content provider backed by a paginated JSON endpoint.
#[derive(Debug, Clone)]
pub struct HttpContentProvider {
    base_url: reqwest::Url,
    client: reqwest::Client,
    settings: HttpSettings,
}

impl HttpContentProvider {
    pub fn new(base_url: &str, settings: HttpSettings) -> Result<Self, ProviderError> {
        let base_url = reqwest::Url::parse(base_url)
            .map_err(|err| ProviderError::new(ProviderFailure::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()
            .map_err(|err| ProviderError::new(ProviderFailure::Network, err.to_string()))?;
        Ok(Self {
            base_url,
            client,
            settings,
        })
    }

    pub fn page_url(&self, page: u32, page_size: usize) -> reqwest::Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair(&self.settings.page_size_param, &page_size.to_string());
        url
    }
}

#[async_trait::async_trait]
impl ContentProvider for HttpContentProvider {
    async fn fetch_page(&self, page: u32, page_size: usize) -> Result<FetchResult, LoadError> {
        let mut request = self.client.get(self.page_url(page, page_size));
        if let Some(token) = &self.settings.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::new(
                ProviderFailure::HttpStatus(status.as_u16()),
                status.to_string(),
            )
            .into());
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        decode_fetch_result(&body).map_err(|err: ShapeError| err.into())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        return ProviderError::new(ProviderFailure::Timeout, err.to_string());
    }
    ProviderError::new(ProviderFailure::Network, err.to_string())
}
