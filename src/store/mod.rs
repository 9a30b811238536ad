//! Contracts for the hosted database and auth service.
//!
//! The service never owns post data; it reads posts, runs the store's
//! nearest-neighbour RPC and writes back embeddings through these traits.

pub mod supabase;

use async_trait::async_trait;

use crate::core::errors::ApiError;
use crate::llm::EmbeddingVector;
use crate::matching::types::{IndexJob, MatchCandidate};

pub use supabase::SupabaseStore;

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Nearest "found" posts to `embedding`, best first, at most `match_count`.
    ///
    /// Failures surface as [`ApiError::Retrieval`].
    async fn match_found_posts(
        &self,
        embedding: &EmbeddingVector,
        match_count: usize,
    ) -> Result<Vec<MatchCandidate>, ApiError>;

    /// `Ok(None)` when no post has this id.
    async fn get_post(&self, post_id: &str) -> Result<Option<IndexJob>, ApiError>;

    /// Failures surface as [`ApiError::Persistence`].
    async fn update_embedding(
        &self,
        post_id: &str,
        embedding: &EmbeddingVector,
    ) -> Result<(), ApiError>;
}

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolves a bearer token to a user id; `Ok(None)` for a rejected token.
    async fn resolve_user(&self, token: &str) -> Result<Option<String>, ApiError>;
}
