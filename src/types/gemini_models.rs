use serde::{Deserialize, Serialize};

pub const GENERATE_CONTENT_METHOD: &str = "generateContent";

/// Body of `GET /{version}/models`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GeminiModelList {
    #[serde(default)]
    pub models: Vec<GeminiModel>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeminiModel {
    #[serde(default)]
    pub name: String,
    pub version: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub input_token_limit: Option<u64>,
    pub output_token_limit: Option<u64>,
    pub supported_generation_methods: Option<Vec<String>>,
}

impl GeminiModel {
    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .as_deref()
            .is_some_and(|methods| methods.iter().any(|m| m == GENERATE_CONTENT_METHOD))
    }
}

impl GeminiModelList {
    /// Names of entries that accept `generateContent`, still namespaced.
    pub fn generate_capable(&self) -> impl Iterator<Item = &str> {
        self.models
            .iter()
            .filter(|m| !m.name.is_empty() && m.supports_generate_content())
            .map(|m| m.name.as_str())
    }
}
