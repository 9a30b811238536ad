//! Semantic matching of lost-item queries against "found" posts, and the
//! indexing that makes those posts searchable.

pub mod embedding;
pub mod indexing;
pub mod normalizer;
pub mod orchestrator;
pub mod retriever;
pub mod synthesizer;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use embedding::EmbeddingProducer;
pub use indexing::IndexingPipeline;
pub use normalizer::IntentNormalizer;
pub use orchestrator::{AskStage, MatchingOrchestrator};
pub use retriever::CandidateRetriever;
pub use synthesizer::ReplySynthesizer;
pub use types::{Admitted, AskResult, IndexOutcome, MatchCandidate, SearchQuery};
