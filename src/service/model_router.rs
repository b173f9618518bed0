use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::api::{GeminiApi, GeminiUpstream, UpstreamReply};
use crate::config::Config;
use crate::error::{
    AVAILABLE_SAMPLE_LIMIT, GeminiError, LastAttempt, RelayError, UpstreamFailure, excerpt,
};
use crate::service::resolver::{AvailableModels, model_for_version, plan_candidates};
use crate::types::{
    ApiVersion, GeminiModelList, GenerateContentRequest, GenerateContentResponse, Generation,
    Health, RawListing,
};

/// Router knobs taken from [`Config`].
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub api_key: Option<String>,
    pub default_model: String,
    pub fallback_models: Vec<String>,
    pub dynamic_listing: bool,
}

impl From<&Config> for RouterSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            api_key: cfg.api_key.clone(),
            default_model: cfg.default_model.clone(),
            fallback_models: cfg.fallback_models.clone(),
            dynamic_listing: cfg.dynamic_listing,
        }
    }
}

/// Resolves a model hint into candidates and walks them until one answers.
#[derive(Clone)]
pub struct ModelRouter {
    upstream: Arc<dyn GeminiUpstream>,
    settings: Arc<RouterSettings>,
}

enum Attempt {
    Success(String),
    NotFound { status: StatusCode, body: String },
    Fatal { status: StatusCode, message: String, body: String },
}

impl ModelRouter {
    pub fn new(upstream: Arc<dyn GeminiUpstream>, settings: RouterSettings) -> Self {
        Self {
            upstream,
            settings: Arc::new(settings),
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, RelayError> {
        let api = GeminiApi::from_config(cfg)?;
        Ok(Self::new(Arc::new(api), cfg.into()))
    }

    fn api_key(&self) -> Result<&str, RelayError> {
        self.settings
            .api_key
            .as_deref()
            .ok_or(RelayError::MissingApiKey)
    }

    /// Generate a reply for `prompt`, falling back across models and API versions.
    ///
    /// Only not-found answers move on to the next attempt; any other upstream
    /// failure ends the call.
    pub async fn generate(
        &self,
        prompt: &str,
        model_hint: Option<&str>,
    ) -> Result<Generation, RelayError> {
        if prompt.trim().is_empty() {
            return Err(RelayError::EmptyPrompt);
        }
        let api_key = self.api_key()?;

        let requested = model_hint
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.settings.default_model.as_str());

        let available = if self.settings.dynamic_listing {
            self.available_models(api_key).await
        } else {
            AvailableModels::empty()
        };
        let plan = plan_candidates(requested, &available, &self.settings.fallback_models);
        debug!(
            requested,
            available = available.len(),
            narrowing = ?plan.narrowing,
            candidates = ?plan.candidates,
            "resolved model candidates"
        );

        let body = GenerateContentRequest::from_prompt(prompt);
        let mut last = None;

        for candidate in &plan.candidates {
            for version in ApiVersion::ORDER {
                let model = model_for_version(candidate, version);
                let reply = self
                    .upstream
                    .generate_content(api_key, version, model, &body)
                    .await?;

                match classify(reply) {
                    Attempt::Success(text) => {
                        info!(model, %version, "generation succeeded");
                        return Ok(Generation {
                            text,
                            model_used: model.to_string(),
                            version_used: version,
                        });
                    }
                    Attempt::NotFound { status, body } => {
                        debug!(model, %version, status = status.as_u16(), "model not found, trying next");
                        last = Some(LastAttempt {
                            status: status.as_u16(),
                            body: excerpt(&body),
                            candidate: model.to_string(),
                            version,
                        });
                    }
                    Attempt::Fatal {
                        status,
                        message,
                        body,
                    } => {
                        warn!(model, %version, status = status.as_u16(), %message, "upstream rejected request");
                        return Err(RelayError::Upstream(Box::new(UpstreamFailure {
                            status,
                            message,
                            detail: excerpt(&body),
                            model: model.to_string(),
                            version,
                        })));
                    }
                }
            }
        }

        warn!(
            tried = plan.candidates.len(),
            last_candidate = last.as_ref().map(|l| l.candidate.as_str()),
            "all candidate models exhausted"
        );
        Err(RelayError::Exhausted {
            last,
            available_sample: available.sample(AVAILABLE_SAMPLE_LIMIT),
        })
    }

    /// Generate-capable models from both API versions, fetched concurrently.
    ///
    /// Never fails: a version that cannot be listed contributes nothing.
    pub async fn available_models(&self, api_key: &str) -> AvailableModels {
        let (v1, v1beta) = futures::join!(
            self.fetch_listing(api_key, ApiVersion::V1),
            self.fetch_listing(api_key, ApiVersion::V1beta)
        );
        AvailableModels::from_listings([&v1, &v1beta].into_iter().flatten())
    }

    async fn fetch_listing(&self, api_key: &str, version: ApiVersion) -> Option<GeminiModelList> {
        match self.upstream.list_models(api_key, version).await {
            Ok(reply) if reply.status.is_success() => {
                serde_json::from_str(&reply.body)
                    .inspect_err(|e| warn!(%version, error = %e, "unparseable model listing"))
                    .ok()
            }
            Ok(reply) => {
                warn!(%version, status = reply.status.as_u16(), "model listing rejected");
                None
            }
            Err(e) => {
                warn!(%version, error = %e, "model listing unavailable");
                None
            }
        }
    }

    /// Raw listings from both versions, for diagnostics.
    pub async fn list_models(&self) -> Result<RawListing, RelayError> {
        let api_key = self.api_key()?;
        let (v1, v1beta) = futures::try_join!(
            self.upstream.list_models(api_key, ApiVersion::V1),
            self.upstream.list_models(api_key, ApiVersion::V1beta)
        )?;
        Ok(RawListing {
            v1: parse_or_empty(&v1.body),
            v1beta: parse_or_empty(&v1beta.body),
        })
    }

    pub fn health(&self) -> Health {
        Health {
            ok: true,
            has_key: self.settings.api_key.is_some(),
            model: self.settings.default_model.clone(),
        }
    }
}

fn classify(reply: UpstreamReply) -> Attempt {
    let UpstreamReply { status, body } = reply;
    if status.is_success() {
        return Attempt::Success(GenerateContentResponse::parse_lenient(&body).into_reply_text());
    }

    let err = GeminiError::parse_lenient(&body);
    if status == StatusCode::NOT_FOUND || err.is_not_found() {
        return Attempt::NotFound { status, body };
    }

    let message = err
        .error
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            )
            .trim_end()
            .to_string()
        });
    Attempt::Fatal {
        status,
        message,
        body,
    }
}

fn parse_or_empty(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| json!({}))
}
