pub mod model_router;
pub mod resolver;

pub use model_router::{ModelRouter, RouterSettings};
pub use resolver::{AvailableModels, CandidatePlan, Narrowing};
