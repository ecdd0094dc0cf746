pub mod openai;
pub mod provider;
pub mod types;

pub use openai::OpenAiClient;
pub use provider::{CompletionProvider, EmbeddingProvider};
pub use types::{ChatMessage, CompletionRequest};
