//! Crew Coordinator
//!
//! Runs the configured tasks strictly in order:
//! - Each task is bound to exactly one agent
//! - A task starts only after the previous one finished
//! - Earlier outputs are passed on as context
//! - The first failing task aborts the run

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use thesis_agents::{
    AgentError, ConfigError, CrewAgent, CrewConfig, JobParserAgent, JobSearcherAgent, MatcherAgent,
    ResumeParserAgent, SearchSettings, SharedBackend, StageData, TaskPrompt, TaskSpec, ToolKind,
};
use thesis_core::{KnowledgeSource, SearchInputs};
use thesis_web::{SharedFetcher, SharedSearch};

/// Characters of each task output shown in debug logs
const PREVIEW_CHARS: usize = 200;

/// Crew errors
#[derive(Debug, Error)]
pub enum CrewError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Task '{task}' is bound to unknown agent '{agent}'")]
    UnknownAgent { task: String, agent: String },

    #[error("Crew has no tasks")]
    NoTasks,

    #[error("Task '{task}' failed: {source}")]
    Task {
        task: String,
        #[source]
        source: AgentError,
    },
}

/// How tasks are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Process {
    /// One task at a time, in declaration order
    #[default]
    Sequential,
}

/// Result of one completed task
#[derive(Debug, Clone)]
pub struct TaskOutput {
    pub task: String,
    /// Id of the agent that performed the task
    pub agent: String,
    pub raw: String,
    pub data: StageData,
    pub elapsed: Duration,
}

/// Result of a full crew run
#[derive(Debug, Clone)]
pub struct CrewOutput {
    pub id: Uuid,
    /// Raw text of the final task
    pub raw: String,
    /// Outputs of every task, in execution order
    pub tasks_output: Vec<TaskOutput>,
}

impl CrewOutput {
    pub fn task(&self, name: &str) -> Option<&TaskOutput> {
        self.tasks_output.iter().find(|t| t.task == name)
    }

    /// Typed data of the final task
    pub fn final_data(&self) -> Option<&StageData> {
        self.tasks_output.last().map(|t| &t.data)
    }
}

impl fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Agents, their ordered tasks and the process that runs them
pub struct Crew {
    agents: Vec<Box<dyn CrewAgent>>,
    tasks: Vec<TaskSpec>,
    process: Process,
}

impl Crew {
    /// Bind agents to tasks, checking every task has its agent
    pub fn new(agents: Vec<Box<dyn CrewAgent>>, tasks: Vec<TaskSpec>) -> Result<Self, CrewError> {
        if tasks.is_empty() {
            return Err(CrewError::NoTasks);
        }

        for task in &tasks {
            if !agents.iter().any(|a| a.id() == task.agent) {
                return Err(CrewError::UnknownAgent {
                    task: task.name.clone(),
                    agent: task.agent.clone(),
                });
            }
        }

        Ok(Self {
            agents,
            tasks,
            process: Process::Sequential,
        })
    }

    /// Start building the standard crew from configuration
    pub fn builder(config: CrewConfig, backend: SharedBackend) -> CrewBuilder {
        CrewBuilder::new(config, backend)
    }

    pub fn process(&self) -> Process {
        self.process
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    pub fn agent_ids(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.id()).collect()
    }

    fn agent(&self, id: &str) -> Option<&dyn CrewAgent> {
        self.agents.iter().find(|a| a.id() == id).map(|a| a.as_ref())
    }

    /// Run every task with the given inputs
    pub async fn kickoff(&self, inputs: &SearchInputs) -> Result<CrewOutput, CrewError> {
        let id = Uuid::new_v4();
        let started = Instant::now();
        let total = self.tasks.len();
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(total);

        info!(
            "Crew {} starting: {} tasks ({:?}), field '{}', location '{}', top {}",
            id, total, self.process, inputs.field, inputs.location, inputs.top_k
        );

        for (i, task) in self.tasks.iter().enumerate() {
            let agent = self.agent(&task.agent).ok_or_else(|| CrewError::UnknownAgent {
                task: task.name.clone(),
                agent: task.agent.clone(),
            })?;

            info!(
                "Task {}/{}: {} ({})",
                i + 1,
                total,
                task.name,
                inputs.render(agent.role())
            );

            let prompt = TaskPrompt {
                task: task.name.clone(),
                description: inputs.render(&task.description),
                expected_output: inputs.render(&task.expected_output),
                context: self.build_context(task, &outputs, inputs),
                inputs: inputs.clone(),
            };

            let task_started = Instant::now();
            let output = agent.execute(&prompt).await.map_err(|source| CrewError::Task {
                task: task.name.clone(),
                source,
            })?;
            let elapsed = task_started.elapsed();

            if !output.data.is_structured() {
                warn!("Task {} produced unstructured output", task.name);
            }
            info!("Task {} finished in {:.1}s", task.name, elapsed.as_secs_f64());
            debug!("Task {} output: {}", task.name, preview(&output.raw));

            outputs.push(TaskOutput {
                task: task.name.clone(),
                agent: task.agent.clone(),
                raw: output.raw,
                data: output.data,
                elapsed,
            });
        }

        info!("Crew {} completed in {:.1}s", id, started.elapsed().as_secs_f64());

        let raw = outputs.last().map(|o| o.raw.clone()).unwrap_or_default();
        Ok(CrewOutput {
            id,
            raw,
            tasks_output: outputs,
        })
    }

    /// Earlier outputs the task gets to see, formatted under task headings
    fn build_context(&self, task: &TaskSpec, outputs: &[TaskOutput], inputs: &SearchInputs) -> String {
        let selected: Vec<&TaskOutput> = match &task.context {
            Some(names) => names
                .iter()
                .filter_map(|name| outputs.iter().find(|o| &o.task == name))
                .collect(),
            None => outputs.iter().collect(),
        };

        selected
            .into_iter()
            .map(|output| {
                let role = self
                    .agent(&output.agent)
                    .map(|a| inputs.render(a.role()))
                    .unwrap_or_else(|| output.agent.clone());
                format!("### {} ({})\n{}", output.task, role, output.data.render(&output.raw))
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

/// Assembles the four standard agents from configuration and tools
pub struct CrewBuilder {
    config: CrewConfig,
    backend: SharedBackend,
    search: Option<SharedSearch>,
    fetcher: Option<SharedFetcher>,
    knowledge: Option<Arc<KnowledgeSource>>,
    search_settings: SearchSettings,
}

impl CrewBuilder {
    pub fn new(config: CrewConfig, backend: SharedBackend) -> Self {
        Self {
            config,
            backend,
            search: None,
            fetcher: None,
            knowledge: None,
            search_settings: SearchSettings::default(),
        }
    }

    pub fn search(mut self, search: SharedSearch) -> Self {
        self.search = Some(search);
        self
    }

    pub fn fetcher(mut self, fetcher: SharedFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn knowledge(mut self, knowledge: Arc<KnowledgeSource>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    pub fn search_settings(mut self, settings: SearchSettings) -> Self {
        self.search_settings = settings;
        self
    }

    pub fn build(self) -> Result<Crew, CrewError> {
        let mut agents: Vec<Box<dyn CrewAgent>> = Vec::new();

        for spec in self.config.agents() {
            let agent: Box<dyn CrewAgent> = match spec.id.as_str() {
                "job_searcher" => {
                    let mut agent = JobSearcherAgent::new(spec.clone(), self.backend.clone())
                        .with_settings(self.search_settings.clone());
                    if spec.has_tool(ToolKind::WebSearch) {
                        match &self.search {
                            Some(search) => agent = agent.with_search(search.clone()),
                            None => warn!("Agent {} wants web search but none is configured", spec.id),
                        }
                    }
                    if spec.has_tool(ToolKind::Fetch) {
                        match &self.fetcher {
                            Some(fetcher) => agent = agent.with_fetcher(fetcher.clone()),
                            None => warn!("Agent {} wants page fetching but none is configured", spec.id),
                        }
                    }
                    Box::new(agent)
                }
                "job_parser" => Box::new(JobParserAgent::new(spec.clone(), self.backend.clone())),
                "resume_parser" => {
                    let mut agent = ResumeParserAgent::new(spec.clone(), self.backend.clone());
                    if spec.knowledge {
                        let knowledge = self.knowledge.clone().ok_or_else(|| {
                            ConfigError::Invalid(format!("agent '{}' needs the resume knowledge source", spec.id))
                        })?;
                        agent = agent.with_knowledge(knowledge);
                    }
                    Box::new(agent)
                }
                "matcher" => Box::new(MatcherAgent::new(spec.clone(), self.backend.clone())),
                other => {
                    return Err(ConfigError::Invalid(format!("no implementation for agent '{}'", other)).into());
                }
            };
            debug!("Built agent {}", spec.id);
            agents.push(agent);
        }

        info!("Initialized {} agents", agents.len());
        Crew::new(agents, self.config.tasks().to_vec())
    }
}
