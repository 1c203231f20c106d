//! Job Parser Agent
//!
//! Turns the searcher's findings into structured postings.

use async_trait::async_trait;
use tracing::{info, warn};

use thesis_core::{extract_list, JobPosting};

use crate::{AgentBase, AgentError, AgentSpec, CrewAgent, SharedBackend, StageData, StageOutput, TaskPrompt};

const FORMAT_HINT: &str = "Reply with a JSON array. Each element has the keys \
title, company_or_institution, location, url, description, requirements (array of strings) \
and deadline. Use null for an unknown location or deadline and [] for unknown requirements.";

/// Job parser agent - structures raw posting text
pub struct JobParserAgent {
    base: AgentBase,
}

impl JobParserAgent {
    pub fn new(spec: AgentSpec, backend: SharedBackend) -> Self {
        Self {
            base: AgentBase::new(spec, backend),
        }
    }
}

#[async_trait]
impl CrewAgent for JobParserAgent {
    fn id(&self) -> &str {
        &self.base.spec().id
    }

    fn role(&self) -> &str {
        &self.base.spec().role
    }

    async fn execute(&self, prompt: &TaskPrompt) -> Result<StageOutput, AgentError> {
        let user = self
            .base
            .task_prompt(prompt, &[("Output format", FORMAT_HINT.to_string())]);

        let raw = self.base.complete(&prompt.inputs, &user).await?;
        let postings: Vec<JobPosting> = extract_list(&raw);

        if postings.is_empty() {
            warn!("Job parser output held no postings, passing text on");
            return Ok(StageOutput::text(raw));
        }

        info!("Parsed {} postings", postings.len());
        Ok(StageOutput {
            raw,
            data: StageData::Postings(postings),
        })
    }
}
