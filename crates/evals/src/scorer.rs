//! Transcript scorers
//!
//! The pipeline talks to scorers through the [`Scorer`] trait. [`LlmScorer`]
//! is the production implementation: it renders a prompt template, asks the
//! LLM for a JSON assessment and validates the reply.

use anyhow::{Context, Result};
use async_trait::async_trait;
use llm::LlmClient;
use serde::{Deserialize, Serialize};

use crate::dimension::ScoreCard;
use crate::prompts::PromptTemplate;

/// Canned SPIN assessment served by the mock LLM provider
pub const MOCK_ASSESSMENT: &str = r#"{
  "scores": {
    "situation": 3,
    "problem": 3,
    "implication": 3,
    "need_payoff": 3,
    "flow": 3,
    "tone": 3,
    "engagement": 3
  },
  "coaching": {
    "summary": "Mock assessment for testing purposes.",
    "wins": ["Maintained professional tone", "Asked clarifying questions"],
    "gaps": ["Could explore implications more deeply"],
    "next_actions": ["Practice SPIN framework", "Review recording"]
  }
}"#;

/// Coaching feedback attached to an assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coaching {
    pub summary: String,
    pub wins: Vec<String>,
    pub gaps: Vec<String>,
    pub next_actions: Vec<String>,
}

/// A scorer's verdict on one transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTranscript {
    pub scores: ScoreCard,
    #[serde(default)]
    pub coaching: Option<Coaching>,
    /// Model that produced the scores
    pub model_name: String,
    /// Prompt template version used
    pub prompt_version: String,
}

/// Anything that can score a transcript on the SPIN rubric
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(&self, transcript: &str) -> Result<ScoredTranscript>;
}

/// Scores transcripts by prompting an LLM
pub struct LlmScorer {
    client: LlmClient,
    template: PromptTemplate,
}

impl LlmScorer {
    pub fn new(client: LlmClient, template: PromptTemplate) -> Self {
        Self { client, template }
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }
}

#[async_trait]
impl Scorer for LlmScorer {
    async fn score(&self, transcript: &str) -> Result<ScoredTranscript> {
        let (system, user) = self.template.render(transcript)?;

        let response = self
            .client
            .complete_json(&system, &user)
            .await
            .context("LLM scoring call failed")?;

        let assessment = parse_assessment(&response)?;

        Ok(ScoredTranscript {
            scores: assessment.scores,
            coaching: Some(assessment.coaching),
            model_name: self.client.model().to_string(),
            prompt_version: self.template.version.clone(),
        })
    }
}

/// Validated LLM reply
#[derive(Debug, Deserialize)]
pub struct Assessment {
    pub scores: ScoreCard,
    pub coaching: Coaching,
}

/// Parse an LLM reply, tolerating a markdown code fence around the JSON
///
/// The trimmed reply is parsed as-is first; fences are only stripped when
/// that fails, so backticks inside string values survive. Fails unless every
/// dimension is present with an integer score in range and the coaching
/// block has all of its fields.
pub fn parse_assessment(response: &str) -> Result<Assessment> {
    let trimmed = response.trim();
    serde_json::from_str(trimmed)
        .or_else(|_| serde_json::from_str(strip_code_fence(trimmed)))
        .with_context(|| {
            let preview: String = response.chars().take(120).collect();
            format!("Failed to parse assessment response: {}", preview)
        })
}

/// Body of a ```` ```json ```` (or bare ```` ``` ````) block spanning the
/// whole reply; otherwise the reply with stray backticks trimmed off its ends
fn strip_code_fence(reply: &str) -> &str {
    match reply
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    {
        Some(body) => body.strip_prefix("json").unwrap_or(body).trim(),
        None => reply.trim_matches('`').trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::{Dimension, Score};
    use llm::LlmConfig;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("`{\"a\": 1}`"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_mock_assessment() {
        let assessment = parse_assessment(MOCK_ASSESSMENT).unwrap();
        assert_eq!(assessment.scores, ScoreCard::uniform(Score::new(3).unwrap()));
        assert_eq!(assessment.coaching.wins.len(), 2);
    }

    #[test]
    fn test_parse_fenced_assessment() {
        let fenced = format!("```json\n{}\n```", MOCK_ASSESSMENT);
        assert!(parse_assessment(&fenced).is_ok());
    }

    #[test]
    fn test_parse_keeps_backticks_inside_strings() {
        let reply = MOCK_ASSESSMENT.replace(
            "Mock assessment for testing purposes.",
            "Rep pasted ```pricing``` into chat",
        );
        let assessment = parse_assessment(&reply).unwrap();
        assert_eq!(assessment.coaching.summary, "Rep pasted ```pricing``` into chat");

        let fenced = format!("```json\n{}\n```", reply);
        let assessment = parse_assessment(&fenced).unwrap();
        assert!(assessment.coaching.summary.contains("```pricing```"));
    }

    #[test]
    fn test_parse_rejects_out_of_range_score() {
        let bad = MOCK_ASSESSMENT.replace("\"tone\": 3", "\"tone\": 6");
        assert!(parse_assessment(&bad).is_err());

        let fractional = MOCK_ASSESSMENT.replace("\"flow\": 3", "\"flow\": 3.5");
        assert!(parse_assessment(&fractional).is_err());
    }

    #[test]
    fn test_parse_rejects_missing_keys() {
        let no_engagement = MOCK_ASSESSMENT.replace(",\n    \"engagement\": 3", "");
        assert!(parse_assessment(&no_engagement).is_err());

        let no_coaching = r#"{"scores": {"situation": 3, "problem": 3, "implication": 3, "need_payoff": 3, "flow": 3, "tone": 3, "engagement": 3}}"#;
        assert!(parse_assessment(no_coaching).is_err());

        let partial_coaching = MOCK_ASSESSMENT.replace(
            ",\n    \"next_actions\": [\"Practice SPIN framework\", \"Review recording\"]",
            "",
        );
        assert!(parse_assessment(&partial_coaching).is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_assessment("not json at all").unwrap_err();
        assert!(err.to_string().contains("Failed to parse assessment response"));
    }

    #[tokio::test]
    async fn test_llm_scorer_with_mock_provider() {
        let scorer = LlmScorer::new(
            LlmClient::new(LlmConfig::mock(MOCK_ASSESSMENT)),
            PromptTemplate::default(),
        );

        let scored = scorer.score("Rep: Hi\nBuyer: Hello").await.unwrap();
        assert_eq!(scored.scores.get(Dimension::Implication).value(), 3);
        assert_eq!(scored.model_name, "mock");
        assert_eq!(scored.prompt_version, "spin_v1");
        assert!(scored.coaching.is_some());
    }

    #[tokio::test]
    async fn test_llm_scorer_fails_on_bad_reply() {
        let scorer = LlmScorer::new(
            LlmClient::new(LlmConfig::mock(r#"{"scores": {}}"#)),
            PromptTemplate::default(),
        );
        assert!(scorer.score("Rep: Hi").await.is_err());
    }

    #[tokio::test]
    async fn test_llm_scorer_rejects_blank_transcript() {
        let scorer = LlmScorer::new(
            LlmClient::new(LlmConfig::mock(MOCK_ASSESSMENT)),
            PromptTemplate::default(),
        );
        assert!(scorer.score("  ").await.is_err());
    }
}
