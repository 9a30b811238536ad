//! In-process fakes for the inference and store seams.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::errors::ApiError;
use crate::llm::{EmbeddingVector, InferenceClient};
use crate::matching::types::{IndexJob, MatchCandidate, PostStatus};
use crate::store::PostStore;

pub fn candidate(id: &str, score: f64) -> MatchCandidate {
    MatchCandidate {
        id: id.to_string(),
        title: "黑色保温杯".to_string(),
        description: "在图书馆三楼靠窗座位捡到".to_string(),
        location: Some("图书馆".to_string()),
        image_urls: None,
        score,
    }
}

pub fn post(id: &str, owner: &str, status: PostStatus) -> IndexJob {
    IndexJob {
        post_id: id.to_string(),
        owner_user_id: owner.to_string(),
        title: "黑色保温杯".to_string(),
        description: "在图书馆三楼捡到".to_string(),
        location: None,
        status: Some(status),
    }
}

#[derive(Debug, Clone)]
pub struct CompletionCall {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// Replays queued results in order; an empty queue answers with an empty
/// completion or a small fixed vector.
#[derive(Default)]
pub struct ScriptedClient {
    completions: Mutex<VecDeque<Result<String, ApiError>>>,
    embeddings: Mutex<VecDeque<Result<Vec<f32>, ApiError>>>,
    completion_calls: Mutex<Vec<CompletionCall>>,
    embed_inputs: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_completion(self, result: Result<&str, ApiError>) -> Self {
        self.completions
            .lock()
            .unwrap()
            .push_back(result.map(str::to_string));
        self
    }

    pub fn with_embedding(self, result: Result<Vec<f32>, ApiError>) -> Self {
        self.embeddings.lock().unwrap().push_back(result);
        self
    }

    pub fn completions(&self) -> Vec<CompletionCall> {
        self.completion_calls.lock().unwrap().clone()
    }

    pub fn embed_inputs(&self) -> Vec<String> {
        self.embed_inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceClient for ScriptedClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, ApiError> {
        self.completion_calls.lock().unwrap().push(CompletionCall {
            system: system_prompt.to_string(),
            user: user_prompt.to_string(),
            temperature,
        });
        self.completions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingVector, ApiError> {
        self.embed_inputs.lock().unwrap().push(text.to_string());
        let values = self
            .embeddings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![0.5; 8]))?;
        EmbeddingVector::new(values)
            .ok_or_else(|| ApiError::EmptyResult("Embedding response is empty".to_string()))
    }
}

#[derive(Default)]
pub struct FakeStore {
    matches: Vec<MatchCandidate>,
    posts: HashMap<String, IndexJob>,
    match_error: Mutex<Option<ApiError>>,
    persist_error: Mutex<Option<ApiError>>,
    match_counts: Mutex<Vec<usize>>,
    updates: Mutex<Vec<(String, usize)>>,
}

impl FakeStore {
    pub fn with_matches(matches: Vec<MatchCandidate>) -> Self {
        Self {
            matches,
            ..Self::default()
        }
    }

    pub fn with_posts(posts: Vec<IndexJob>) -> Self {
        Self {
            posts: posts
                .into_iter()
                .map(|post| (post.post_id.clone(), post))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing_match(err: ApiError) -> Self {
        Self {
            match_error: Mutex::new(Some(err)),
            ..Self::default()
        }
    }

    pub fn fail_next_persist(&self, err: ApiError) {
        *self.persist_error.lock().unwrap() = Some(err);
    }

    pub fn match_counts(&self) -> Vec<usize> {
        self.match_counts.lock().unwrap().clone()
    }

    /// `(post id, vector dimension)` for every persisted embedding.
    pub fn updates(&self) -> Vec<(String, usize)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostStore for FakeStore {
    async fn match_found_posts(
        &self,
        _embedding: &EmbeddingVector,
        match_count: usize,
    ) -> Result<Vec<MatchCandidate>, ApiError> {
        self.match_counts.lock().unwrap().push(match_count);
        if let Some(err) = self.match_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.matches.clone())
    }

    async fn get_post(&self, post_id: &str) -> Result<Option<IndexJob>, ApiError> {
        Ok(self.posts.get(post_id).cloned())
    }

    async fn update_embedding(
        &self,
        post_id: &str,
        embedding: &EmbeddingVector,
    ) -> Result<(), ApiError> {
        if let Some(err) = self.persist_error.lock().unwrap().take() {
            return Err(err);
        }
        self.updates
            .lock()
            .unwrap()
            .push((post_id.to_string(), embedding.dimension()));
        Ok(())
    }
}
