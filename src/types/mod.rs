mod api_version;
mod gemini_models;
mod generate_content;
mod relay;

pub use api_version::ApiVersion;
pub use gemini_models::{GeminiModel, GeminiModelList};
pub use generate_content::{
    Content, GenerateContentRequest, GenerateContentResponse, NO_RESPONSE_PLACEHOLDER, Part,
};
pub use relay::{GenerateBody, GenerateReply, Generation, GenerationRequest, Health, ModelQuery, RawListing};
