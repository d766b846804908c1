// Public modules
pub mod api_error;
pub mod content;
pub mod generate_content_request;
pub mod generate_content_response;
pub mod model;

// Re-exports
pub use api_error::{ApiErrorBody, ApiErrorResponse};
pub use content::{Content, Part, Role};
pub use generate_content_request::{GenerateContentRequest, GenerationConfig};
pub use generate_content_response::{
    Candidate, FinishReason, GenerateContentResponse, PromptFeedback, UsageMetadata,
};
pub use model::{KnownModel, Model};
