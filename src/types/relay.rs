use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiVersion;

/// Inbound body of `POST /api/gemini`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateBody {
    pub prompt: String,
    pub model: Option<String>,
}

impl GenerateBody {
    /// A missing or non-JSON body reads as empty; non-string fields read as absent.
    pub fn from_slice_lenient(bytes: &[u8]) -> Self {
        let value: Value = serde_json::from_slice(bytes).unwrap_or_default();
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            prompt: text("prompt").unwrap_or_default(),
            model: text("model"),
        }
    }
}

/// `?model=` override accepted next to the body.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ModelQuery {
    pub model: Option<String>,
}

/// Prompt and resolved hint handed to the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model_hint: Option<String>,
}

impl GenerationRequest {
    /// Body `model` wins over `?model=`; blank values are ignored.
    pub fn merge(body: GenerateBody, query: ModelQuery) -> Self {
        let nonblank = |m: &String| !m.trim().is_empty();
        Self {
            prompt: body.prompt,
            model_hint: body.model.filter(nonblank).or(query.model.filter(nonblank)),
        }
    }
}

/// Successful outcome of the fallback loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub model_used: String,
    pub version_used: ApiVersion,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateReply {
    pub reply: String,
    pub model: String,
    #[serde(rename = "versionUsed")]
    pub version_used: ApiVersion,
}

impl From<Generation> for GenerateReply {
    fn from(value: Generation) -> Self {
        Self {
            reply: value.text,
            model: value.model_used,
            version_used: value.version_used,
        }
    }
}

/// Raw upstream listings, passed through for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct RawListing {
    pub v1: Value,
    pub v1beta: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub ok: bool,
    pub has_key: bool,
    pub model: String,
}
