pub mod generation_request;

pub use generation_request::GenerationPreprocess;
