//! Prompt assembly shared by all agents

use tracing::debug;

use thesis_core::SearchInputs;

use crate::{AgentError, AgentSpec, SharedBackend, TaskPrompt};

/// An agent's configured persona bound to an LLM backend
pub struct AgentBase {
    spec: AgentSpec,
    backend: SharedBackend,
}

impl AgentBase {
    pub fn new(spec: AgentSpec, backend: SharedBackend) -> Self {
        Self { spec, backend }
    }

    pub fn spec(&self) -> &AgentSpec {
        &self.spec
    }

    /// System prompt built from role, backstory and goal
    pub fn system_prompt(&self, inputs: &SearchInputs) -> String {
        format!(
            "You are {}.\n{}\n\nYour personal goal is: {}\n\n\
             Stick to the facts you are given or find. When asked for JSON, \
             reply with valid JSON only.",
            inputs.render(self.spec.role.trim()),
            inputs.render(self.spec.backstory.trim()),
            inputs.render(self.spec.goal.trim()),
        )
    }

    /// User prompt for a task, followed by any agent-specific material
    pub fn task_prompt(&self, prompt: &TaskPrompt, sections: &[(&str, String)]) -> String {
        let mut out = format!(
            "Current task: {}\n\nExpected output: {}\n\n\
             Return the complete content as your final answer, not a summary of it.\n",
            prompt.description.trim(),
            prompt.expected_output.trim(),
        );

        if !prompt.context.trim().is_empty() {
            out.push_str("\n# Context from previous tasks\n\n");
            out.push_str(prompt.context.trim());
            out.push('\n');
        }

        for (heading, body) in sections {
            if body.trim().is_empty() {
                continue;
            }
            out.push_str(&format!("\n# {}\n\n{}\n", heading, body.trim()));
        }

        out
    }

    /// Run one completion with this agent's persona
    pub async fn complete(&self, inputs: &SearchInputs, user: &str) -> Result<String, AgentError> {
        let system = self.system_prompt(inputs);
        debug!(
            "Agent {} calling {} ({} chars)",
            self.spec.id,
            self.backend.model_name(),
            user.len()
        );
        Ok(self.backend.generate(&system, user).await?)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    use crate::{AgentSpec, LlmBackend, LlmError, TaskPrompt};
    use thesis_core::SearchInputs;

    /// Backend that replays canned replies and records prompts
    pub struct ScriptedBackend {
        replies: Mutex<Vec<String>>,
        pub calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedBackend {
        pub fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn user_prompts(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(_, u)| u.clone()).collect()
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
            self.replies.lock().unwrap().pop().ok_or(LlmError::EmptyResponse)
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    pub fn spec(id: &str) -> AgentSpec {
        AgentSpec {
            id: id.to_string(),
            role: format!("{} for {{field}}", id),
            goal: "Help with {field} in {location}".to_string(),
            backstory: "Experienced".to_string(),
            tools: Vec::new(),
            knowledge: false,
        }
    }

    pub fn prompt(task: &str, context: &str) -> TaskPrompt {
        TaskPrompt {
            task: task.to_string(),
            description: format!("Do {}", task),
            expected_output: "JSON".to_string(),
            context: context.to_string(),
            inputs: SearchInputs::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::LlmError;

    #[test]
    fn test_system_prompt_renders_inputs() {
        let base = AgentBase::new(spec("matcher"), ScriptedBackend::new(&[]));
        let system = base.system_prompt(&SearchInputs::new("Robotics", "Norway", 3));
        assert!(system.starts_with("You are matcher for Robotics."));
        assert!(system.contains("Your personal goal is: Help with Robotics in Norway"));
    }

    #[test]
    fn test_task_prompt_sections() {
        let base = AgentBase::new(spec("matcher"), ScriptedBackend::new(&[]));
        let user = base.task_prompt(
            &prompt("match_jobs_task", "### parse_jobs_task\n[]"),
            &[("Empty", "   ".to_string()), ("Resume knowledge", "MSc".to_string())],
        );
        assert!(user.starts_with("Current task: Do match_jobs_task"));
        assert!(user.contains("# Context from previous tasks\n\n### parse_jobs_task"));
        assert!(user.contains("# Resume knowledge\n\nMSc"));
        assert!(!user.contains("# Empty"));
    }

    #[tokio::test]
    async fn test_complete_uses_backend() {
        let backend = ScriptedBackend::new(&["answer"]);
        let base = AgentBase::new(spec("job_parser"), backend.clone());
        let reply = base.complete(&SearchInputs::default(), "hello").await.unwrap();
        assert_eq!(reply, "answer");
        assert_eq!(backend.user_prompts(), vec!["hello".to_string()]);

        let err = base.complete(&SearchInputs::default(), "again").await.unwrap_err();
        assert!(matches!(err, AgentError::Llm(LlmError::EmptyResponse)));
    }
}
