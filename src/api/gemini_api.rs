use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::RelayError;
use crate::types::{ApiVersion, GenerateContentRequest};

/// Status and raw body of one upstream exchange.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: String,
}

impl UpstreamReply {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// The two calls the router makes against the generative-language API.
///
/// Non-success statuses are returned as replies; only transport failures are errors.
#[async_trait]
pub trait GeminiUpstream: Send + Sync {
    async fn list_models(
        &self,
        api_key: &str,
        version: ApiVersion,
    ) -> Result<UpstreamReply, RelayError>;

    async fn generate_content(
        &self,
        api_key: &str,
        version: ApiVersion,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<UpstreamReply, RelayError>;
}

/// reqwest-backed client for `{endpoint}/{version}/models...`.
///
/// The key travels in the query string, so request URLs are stripped from errors.
#[derive(Debug, Clone)]
pub struct GeminiApi {
    client: reqwest::Client,
    endpoint: Url,
}

impl GeminiApi {
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// Build the shared client with the configured timeout and optional proxy.
    pub fn from_config(cfg: &Config) -> Result<Self, RelayError> {
        let mut builder = reqwest::Client::builder().timeout(cfg.request_timeout());
        if let Some(proxy) = cfg.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
        }
        Ok(Self::new(builder.build()?, cfg.endpoint_url()?))
    }

    fn models_url(
        &self,
        api_key: &str,
        version: ApiVersion,
        rpc: Option<String>,
    ) -> Result<Url, RelayError> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
            segments.pop_if_empty().push(version.as_str()).push("models");
            if let Some(rpc) = rpc.as_deref() {
                segments.push(rpc);
            }
        }
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }

    async fn read_reply(resp: reqwest::Response) -> UpstreamReply {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        UpstreamReply { status, body }
    }
}

#[async_trait]
impl GeminiUpstream for GeminiApi {
    async fn list_models(
        &self,
        api_key: &str,
        version: ApiVersion,
    ) -> Result<UpstreamReply, RelayError> {
        let url = self.models_url(api_key, version, None)?;
        debug!(%version, "listing upstream models");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        Ok(Self::read_reply(resp).await)
    }

    async fn generate_content(
        &self,
        api_key: &str,
        version: ApiVersion,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<UpstreamReply, RelayError> {
        let url = self.models_url(api_key, version, Some(format!("{model}:generateContent")))?;
        debug!(%version, model, "calling generateContent");
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        Ok(Self::read_reply(resp).await)
    }
}
