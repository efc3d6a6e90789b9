//! Prompt templates for SPIN scoring
//!
//! A template is a system prompt plus a user prompt containing a
//! `{transcript}` placeholder. Templates carry a version string that is
//! recorded on every report so runs with different prompts stay comparable.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Placeholder replaced by the transcript text
pub const TRANSCRIPT_PLACEHOLDER: &str = "{transcript}";

/// Version of the built-in template
pub const DEFAULT_PROMPT_VERSION: &str = "spin_v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub version: String,
    pub system_prompt: String,
    pub user_template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            version: DEFAULT_PROMPT_VERSION.to_string(),
            system_prompt: SPIN_SYSTEM_PROMPT.to_string(),
            user_template: SPIN_USER_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Load a template from a TOML file with `version`, `system_prompt`
    /// and `user_template` keys
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt template: {}", path.display()))?;
        let template: PromptTemplate = toml::from_str(&content)
            .with_context(|| format!("Failed to parse prompt template: {}", path.display()))?;
        template.validate()?;
        Ok(template)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            anyhow::bail!("Prompt template version cannot be empty");
        }
        if !self.user_template.contains(TRANSCRIPT_PLACEHOLDER) {
            anyhow::bail!(
                "Prompt template '{}' has no {} placeholder",
                self.version,
                TRANSCRIPT_PLACEHOLDER
            );
        }
        Ok(())
    }

    /// Build the `(system, user)` prompt pair for one transcript
    ///
    /// Deterministic: the same transcript always yields the same prompts.
    pub fn render(&self, transcript: &str) -> Result<(String, String)> {
        if transcript.trim().is_empty() {
            anyhow::bail!("Transcript cannot be empty");
        }
        let user = self.user_template.replace(TRANSCRIPT_PLACEHOLDER, transcript);
        Ok((self.system_prompt.clone(), user))
    }
}

const SPIN_SYSTEM_PROMPT: &str = r#"You are a senior sales coach specializing in the SPIN (Situation, Problem, Implication, Need-Payoff) selling methodology.

Your task is to evaluate sales conversations and provide scoring and coaching feedback.

CRITICAL INSTRUCTIONS:
- Return STRICT JSON that exactly matches the provided JSON Schema
- Do NOT include any extra keys beyond those specified in the schema
- Do NOT wrap your response in markdown code blocks
- Ensure all scores are integers between 1 and 5 (inclusive)
- Base your assessment on evidence from the conversation transcript"#;

const SPIN_USER_TEMPLATE: &str = r#"Evaluate the following sales conversation using the SPIN framework.

SCORING RUBRIC (1-5 scale):

**situation** (1-5): Quality of situation questions
- 1: No situation questions; jumps to pitch
- 2: Minimal context gathering; superficial questions
- 3: Adequate situation questions covering basic context
- 4: Good situation questions establishing clear current state
- 5: Excellent situation questions; thorough understanding of buyer's environment

**problem** (1-5): Quality of problem questions
- 1: No problem identification; ignores pain points
- 2: Weak problem exploration; misses key issues
- 3: Identifies some problems but lacks depth
- 4: Good problem identification with clear pain points
- 5: Exceptional problem discovery; uncovers hidden issues

**implication** (1-5): Quality of implication questions
- 1: No exploration of consequences; stays surface-level
- 2: Minimal urgency building; weak consequence exploration
- 3: Some implication questions but lacks impact
- 4: Good implication development building urgency
- 5: Outstanding implication questions creating compelling urgency

**need_payoff** (1-5): Quality of need-payoff questions
- 1: No connection between solution and buyer value
- 2: Weak value proposition; generic benefits
- 3: Adequate need-payoff with some value connection
- 4: Strong need-payoff linking solution to specific pains
- 5: Exceptional need-payoff; buyer articulates own value

**flow** (1-5): Adherence to SPIN sequence (S -> P -> I -> N)
- 1: Random questioning; no discernible structure
- 2: Poor flow; jumps between stages inconsistently
- 3: Follows SPIN loosely; some stage mixing
- 4: Good SPIN sequence with clear progression
- 5: Excellent SPIN flow; natural and purposeful transitions

**tone** (1-5): Professional, empathetic, confident, adaptive communication
- 1: Pitchy, monologue-style; ignores buyer cues
- 2: Inconsistent tone; occasional empathy gaps
- 3: Mixed empathy and clarity; adequate professionalism
- 4: Strong tone; professional, warm, and responsive
- 5: Exceptional tone; adaptive, empathetic, confident, concise

**engagement** (1-5): Active listening, reflection, buyer talk-time
- 1: Dominates conversation; no active listening
- 2: Limited listening; minimal buyer participation
- 3: Adequate engagement; balanced talk-time
- 4: Good engagement; actively listens and reflects
- 5: Outstanding engagement; buyer-led insights and high talk-time

Respond with JSON only:
{
  "scores": {
    "situation": <1-5>,
    "problem": <1-5>,
    "implication": <1-5>,
    "need_payoff": <1-5>,
    "flow": <1-5>,
    "tone": <1-5>,
    "engagement": <1-5>
  },
  "coaching": {
    "summary": "High-level coaching summary",
    "wins": ["Things done well"],
    "gaps": ["Areas for improvement"],
    "next_actions": ["Specific action items"]
  }
}

CONVERSATION TRANSCRIPT:
{transcript}

Provide your assessment as valid JSON matching the format above."#;
