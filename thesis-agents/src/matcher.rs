//! Matcher Agent
//!
//! Scores each parsed posting against the resume profile and returns the
//! best `top_k` as a ranked JSON array.

use async_trait::async_trait;
use tracing::{info, warn};

use thesis_core::{extract_matches, MATCH_KEYS};

use crate::{AgentBase, AgentError, AgentSpec, CrewAgent, SharedBackend, StageData, StageOutput, TaskPrompt};

/// Matcher agent - ranks postings for the candidate
pub struct MatcherAgent {
    base: AgentBase,
}

impl MatcherAgent {
    pub fn new(spec: AgentSpec, backend: SharedBackend) -> Self {
        Self {
            base: AgentBase::new(spec, backend),
        }
    }

    fn format_hint(top_k: usize) -> String {
        format!(
            "Reply with a JSON array of at most {} objects ordered by rank, each with the keys {}. \
             fit_score is an integer from 0 to 100.",
            top_k,
            MATCH_KEYS.join(", ")
        )
    }
}

#[async_trait]
impl CrewAgent for MatcherAgent {
    fn id(&self) -> &str {
        &self.base.spec().id
    }

    fn role(&self) -> &str {
        &self.base.spec().role
    }

    async fn execute(&self, prompt: &TaskPrompt) -> Result<StageOutput, AgentError> {
        let user = self.base.task_prompt(
            prompt,
            &[("Output format", Self::format_hint(prompt.inputs.top_k))],
        );

        let raw = self.base.complete(&prompt.inputs, &user).await?;
        let matches = extract_matches(&raw);

        if matches.is_empty() {
            warn!("Matcher output held no match records");
            return Ok(StageOutput::text(raw));
        }

        let incomplete = matches.iter().filter(|m| !m.has_required_keys()).count();
        if incomplete > 0 {
            warn!("{} of {} matches lack some expected keys", incomplete, matches.len());
        }
        if matches.len() > prompt.inputs.top_k {
            warn!(
                "Matcher returned {} matches, more than the {} requested",
                matches.len(),
                prompt.inputs.top_k
            );
        }

        info!("Matcher ranked {} postings", matches.len());
        Ok(StageOutput {
            raw,
            data: StageData::Matches(matches),
        })
    }
}
