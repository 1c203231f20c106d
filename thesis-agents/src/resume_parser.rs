//! Resume Parser Agent
//!
//! Builds a candidate profile from the resume knowledge source. Only the
//! chunks most relevant to the task are put in front of the model.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use thesis_core::{extract_object, KnowledgeSource, ResumeProfile};

use crate::{AgentBase, AgentError, AgentSpec, CrewAgent, SharedBackend, StageData, StageOutput, TaskPrompt};

/// Chunks retrieved per task
pub const DEFAULT_KNOWLEDGE_CHUNKS: usize = 5;

/// Resume parser agent - reads the resume knowledge source
pub struct ResumeParserAgent {
    base: AgentBase,
    knowledge: Option<Arc<KnowledgeSource>>,
}

impl ResumeParserAgent {
    pub fn new(spec: AgentSpec, backend: SharedBackend) -> Self {
        Self {
            base: AgentBase::new(spec, backend),
            knowledge: None,
        }
    }

    pub fn with_knowledge(mut self, knowledge: Arc<KnowledgeSource>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    fn knowledge_section(&self, prompt: &TaskPrompt) -> Result<String, AgentError> {
        let knowledge = self
            .knowledge
            .as_ref()
            .ok_or_else(|| AgentError::Knowledge("no resume attached".to_string()))?;

        if knowledge.is_empty() {
            return Err(AgentError::Knowledge(format!(
                "resume {} contains no text",
                knowledge.source()
            )));
        }

        let query = format!(
            "{} {} skills education experience projects",
            prompt.description, prompt.inputs.field
        );
        let chunks = knowledge.query(&query, DEFAULT_KNOWLEDGE_CHUNKS);
        debug!(
            "Using {} of {} resume chunks from {}",
            chunks.len(),
            knowledge.len(),
            knowledge.source()
        );

        Ok(chunks
            .iter()
            .map(|c| c.text.trim())
            .collect::<Vec<_>>()
            .join("\n---\n"))
    }
}

#[async_trait]
impl CrewAgent for ResumeParserAgent {
    fn id(&self) -> &str {
        &self.base.spec().id
    }

    fn role(&self) -> &str {
        &self.base.spec().role
    }

    async fn execute(&self, prompt: &TaskPrompt) -> Result<StageOutput, AgentError> {
        let resume = self.knowledge_section(prompt)?;
        let user = self.base.task_prompt(prompt, &[("Resume", resume)]);

        let raw = self.base.complete(&prompt.inputs, &user).await?;

        match extract_object::<ResumeProfile>(&raw) {
            Some(profile) if !profile.is_empty() => {
                info!(
                    "Resume profile: {} skills, {} education entries",
                    profile.skills.len(),
                    profile.education.len()
                );
                Ok(StageOutput {
                    raw,
                    data: StageData::Resume(profile),
                })
            }
            _ => {
                warn!("Resume parser output held no profile, passing text on");
                Ok(StageOutput::text(raw))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::test_support::{prompt, spec, ScriptedBackend};
    use thesis_core::ChunkConfig;

    fn resume() -> Arc<KnowledgeSource> {
        let text = "Jane Doe. MSc student in Machine Learning at Aalto University. \
                    Skills: Python, PyTorch, statistics. Languages: English, Finnish.";
        Arc::new(
            KnowledgeSource::from_text("resume.txt", text, ChunkConfig { size: 60, overlap: 10 }).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_profile_from_knowledge() {
        let backend = ScriptedBackend::new(&[
            r#"{"name": "Jane Doe", "education": ["MSc Machine Learning, Aalto"], "skills": ["Python", "PyTorch"], "languages": ["English", "Finnish"]}"#,
        ]);
        let agent = ResumeParserAgent::new(spec("resume_parser"), backend.clone()).with_knowledge(resume());

        let output = agent.execute(&prompt("parse_resume_task", "")).await.unwrap();

        let StageData::Resume(profile) = &output.data else {
            panic!("expected resume, got {:?}", output.data);
        };
        assert_eq!(profile.name.as_deref(), Some("Jane Doe"));
        assert_eq!(profile.skills, vec!["Python", "PyTorch"]);

        let user = &backend.user_prompts()[0];
        assert!(user.contains("# Resume"));
        assert!(user.contains("Aalto"));
    }

    #[tokio::test]
    async fn test_missing_knowledge_is_an_error() {
        let backend = ScriptedBackend::new(&["{}"]);
        let agent = ResumeParserAgent::new(spec("resume_parser"), backend.clone());

        let err = agent.execute(&prompt("parse_resume_task", "")).await.unwrap_err();
        assert!(matches!(err, AgentError::Knowledge(_)));
        assert!(backend.user_prompts().is_empty());
    }

    #[tokio::test]
    async fn test_empty_profile_stays_text() {
        let backend = ScriptedBackend::new(&["{\"skills\": []}"]);
        let agent = ResumeParserAgent::new(spec("resume_parser"), backend).with_knowledge(resume());

        let output = agent.execute(&prompt("parse_resume_task", "")).await.unwrap();
        assert_eq!(output.data, StageData::Text);
    }
}
