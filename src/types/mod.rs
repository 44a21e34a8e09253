// Public modules
pub mod chat_request;
pub mod health_status;
pub mod history_response;
pub mod message;
pub mod phase;

// Re-exports
pub use chat_request::ChatRequest;
pub use health_status::HealthStatus;
pub use history_response::HistoryResponse;
pub use message::{Message, MessageRole};
pub use phase::{Phase, Status};
