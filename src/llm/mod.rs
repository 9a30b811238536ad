pub mod gateway;
pub mod profile;
pub mod provider;
pub mod types;

pub use gateway::InferenceGateway;
pub use profile::{ProviderKind, ProviderProfile};
pub use provider::InferenceClient;
pub use types::{ChatMessage, EmbeddingVector};
