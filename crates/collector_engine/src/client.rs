use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::params::Variant;
use crate::{CallError, CallFailureKind, ProviderConfig};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 32 * 1024 * 1024,
        }
    }
}

/// Raw provider response: transport succeeded and the status was 2xx.
#[derive(Debug, Clone)]
pub struct CallResponse {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub final_url: String,
}

#[async_trait::async_trait]
pub trait ProviderClient: Send + Sync {
    async fn call(
        &self,
        provider: &ProviderConfig,
        variant: &Variant,
        page: u32,
    ) -> Result<CallResponse, CallError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestProviderClient {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestProviderClient {
    pub fn new(settings: ClientSettings) -> Result<Self, CallError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| CallError::new(CallFailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn build_url(
        provider: &ProviderConfig,
        variant: &Variant,
        page: u32,
    ) -> Result<Url, CallError> {
        let mut url = Url::parse(&provider.base_url)
            .map_err(|err| CallError::new(CallFailureKind::InvalidUrl, err.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in variant.params() {
                pairs.append_pair(name, value);
            }
            pairs.append_pair(&provider.page_param, &page.to_string());
            pairs.append_pair(&provider.size_param, &provider.page_size.to_string());
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl ProviderClient for ReqwestProviderClient {
    async fn call(
        &self,
        provider: &ProviderConfig,
        variant: &Variant,
        page: u32,
    ) -> Result<CallResponse, CallError> {
        let url = Self::build_url(provider, variant, page)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallError::new(
                CallFailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(CallError::new(
                    CallFailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(CallError::new(
                    CallFailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(CallResponse {
            status: status.as_u16(),
            bytes,
            content_type,
            final_url,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> CallError {
    if err.is_timeout() {
        return CallError::new(CallFailureKind::Timeout, err.to_string());
    }
    CallError::new(CallFailureKind::Network, err.to_string())
}
