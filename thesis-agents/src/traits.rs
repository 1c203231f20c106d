//! Common traits and types for crew agents

use async_trait::async_trait;
use thesis_core::{JobPosting, MatchRecord, ResumeProfile, SearchInputs};
use thiserror::Error;

use crate::LlmError;

/// Errors from agent operations
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Knowledge error: {0}")]
    Knowledge(String),
}

/// Typed result of a stage, next to its raw text
#[derive(Debug, Clone, PartialEq)]
pub enum StageData {
    Postings(Vec<JobPosting>),
    Resume(ResumeProfile),
    Matches(Vec<MatchRecord>),
    /// Output that did not parse into the stage's structure
    Text,
}

impl StageData {
    /// Render for use as context of a later task.
    ///
    /// Structured data is passed on as JSON so later stages do not have
    /// to re-derive it from prose.
    pub fn render(&self, raw: &str) -> String {
        let json = match self {
            StageData::Postings(postings) => serde_json::to_string_pretty(postings),
            StageData::Resume(profile) => serde_json::to_string_pretty(profile),
            StageData::Matches(matches) => serde_json::to_string_pretty(matches),
            StageData::Text => return raw.trim().to_string(),
        };
        json.unwrap_or_else(|_| raw.trim().to_string())
    }

    pub fn is_structured(&self) -> bool {
        !matches!(self, StageData::Text)
    }
}

/// What an agent produced for one task
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub raw: String,
    pub data: StageData,
}

impl StageOutput {
    pub fn text(raw: String) -> Self {
        Self {
            raw,
            data: StageData::Text,
        }
    }
}

/// A task with its templates rendered against the kickoff inputs
#[derive(Debug, Clone)]
pub struct TaskPrompt {
    pub task: String,
    pub description: String,
    pub expected_output: String,
    /// Outputs of earlier tasks, already formatted
    pub context: String,
    pub inputs: SearchInputs,
}

/// Common interface for all crew agents
#[async_trait]
pub trait CrewAgent: Send + Sync {
    /// Agent id as used by task definitions
    fn id(&self) -> &str;

    /// Human-readable role (unrendered)
    fn role(&self) -> &str;

    /// Perform one task
    async fn execute(&self, prompt: &TaskPrompt) -> Result<StageOutput, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_structured() {
        let data = StageData::Postings(vec![JobPosting {
            title: "ML thesis".to_string(),
            url: "https://x.fi".to_string(),
            ..Default::default()
        }]);
        let rendered = data.render("ignored prose");
        assert!(rendered.starts_with('['));
        assert!(rendered.contains("\"title\": \"ML thesis\""));
        assert!(data.is_structured());
    }

    #[test]
    fn test_render_text() {
        let rendered = StageData::Text.render("  plain findings \n");
        assert_eq!(rendered, "plain findings");
    }
}
