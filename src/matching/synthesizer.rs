use std::sync::Arc;

use serde::Serialize;

use crate::llm::InferenceClient;
use crate::matching::types::MatchCandidate;

pub const SYNTHESIZE_SYSTEM_PROMPT: &str = "你是‘AI智能找物助手’。请基于召回结果，给用户简洁建议：先给最可能匹配结论，再列出1-3条下一步行动建议。";
pub const FALLBACK_REPLY: &str =
    "我找到了若干可能匹配的招领信息，建议优先联系相似度最高的发布者确认细节。";
const SYNTHESIZE_TEMPERATURE: f32 = 0.2;
const SUMMARY_DESCRIPTION_CHARS: usize = 80;

/// What the model is allowed to see about a candidate. Ids and owners stay out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSummary {
    pub title: String,
    pub description: String,
    pub location: String,
    pub score: f64,
}

impl From<&MatchCandidate> for CandidateSummary {
    fn from(candidate: &MatchCandidate) -> Self {
        Self {
            title: candidate.title.clone(),
            description: brief(&candidate.description, SUMMARY_DESCRIPTION_CHARS),
            location: candidate.location.clone().unwrap_or_default(),
            score: (candidate.score * 1000.0).round() / 1000.0,
        }
    }
}

#[derive(Serialize)]
struct SynthesisPrompt<'a> {
    query: &'a str,
    matches: &'a [CandidateSummary],
}

/// Truncates to `max` characters, marking the cut with `…`.
pub fn brief(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push('…');
    cut
}

#[derive(Clone)]
pub struct ReplySynthesizer {
    client: Arc<dyn InferenceClient>,
}

impl ReplySynthesizer {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    /// Never fails: an error or blank completion yields [`FALLBACK_REPLY`].
    pub async fn synthesize(&self, query: &str, candidates: &[MatchCandidate]) -> String {
        let summaries: Vec<CandidateSummary> =
            candidates.iter().map(CandidateSummary::from).collect();
        let prompt = SynthesisPrompt {
            query,
            matches: &summaries,
        };
        let user_prompt = match serde_json::to_string(&prompt) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("Failed to encode synthesis prompt: {}", err);
                return FALLBACK_REPLY.to_string();
            }
        };

        match self
            .client
            .complete(SYNTHESIZE_SYSTEM_PROMPT, &user_prompt, SYNTHESIZE_TEMPERATURE)
            .await
        {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                tracing::warn!("Synthesizer returned empty text; using fallback reply");
                FALLBACK_REPLY.to_string()
            }
            Err(err) => {
                tracing::warn!("Synthesizer unavailable, using fallback reply: {}", err);
                FALLBACK_REPLY.to_string()
            }
        }
    }
}
