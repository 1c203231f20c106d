//! Agent and task definitions
//!
//! Roles, goals, backstories and task instructions live in TOML
//! (`agents.toml`, `tasks.toml`). The defaults are embedded in the binary
//! and can be replaced by a directory holding files with the same names.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Agent ids every crew configuration must define
pub const REQUIRED_AGENTS: &[&str] = &["job_searcher", "job_parser", "resume_parser", "matcher"];

/// Task names every crew configuration must define
pub const REQUIRED_TASKS: &[&str] = &[
    "search_jobs_task",
    "parse_jobs_task",
    "parse_resume_task",
    "match_jobs_task",
];

const AGENTS_FILE: &str = "agents.toml";
const TASKS_FILE: &str = "tasks.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {file}: {source}")]
    Parse {
        file: String,
        source: toml::de::Error,
    },

    #[error("Missing {kind} '{name}'")]
    Missing { kind: &'static str, name: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// A capability an agent may be given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    WebSearch,
    Fetch,
}

/// One agent's identity and prompt fields
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSpec {
    pub id: String,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    #[serde(default)]
    pub tools: Vec<ToolKind>,
    /// Whether the resume knowledge source is attached
    #[serde(default)]
    pub knowledge: bool,
}

impl AgentSpec {
    pub fn has_tool(&self, tool: ToolKind) -> bool {
        self.tools.contains(&tool)
    }
}

/// One unit of work bound to an agent
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    /// Id of the agent performing the task
    pub agent: String,
    pub description: String,
    pub expected_output: String,
    /// Earlier tasks whose output is passed as context; all earlier tasks when absent
    #[serde(default)]
    pub context: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct AgentsFile {
    #[serde(default)]
    agents: Vec<AgentSpec>,
}

#[derive(Debug, Deserialize)]
struct TasksFile {
    #[serde(default)]
    tasks: Vec<TaskSpec>,
}

/// Agents plus the ordered task list
#[derive(Debug, Clone)]
pub struct CrewConfig {
    agents: Vec<AgentSpec>,
    tasks: Vec<TaskSpec>,
}

impl CrewConfig {
    /// Load the embedded default configuration
    pub fn load_embedded() -> Result<Self, ConfigError> {
        Self::from_toml(
            include_str!("../config/agents.toml"),
            include_str!("../config/tasks.toml"),
        )
    }

    /// Load `agents.toml` and `tasks.toml` from a directory
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })
        };

        let config = Self::from_toml(&read(AGENTS_FILE)?, &read(TASKS_FILE)?)?;
        debug!("Loaded crew configuration from {}", dir.display());
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml(agents_toml: &str, tasks_toml: &str) -> Result<Self, ConfigError> {
        let agents: AgentsFile = toml::from_str(agents_toml).map_err(|source| ConfigError::Parse {
            file: AGENTS_FILE.to_string(),
            source,
        })?;
        let tasks: TasksFile = toml::from_str(tasks_toml).map_err(|source| ConfigError::Parse {
            file: TASKS_FILE.to_string(),
            source,
        })?;

        let config = Self {
            agents: agents.agents,
            tasks: tasks.tasks,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut agent_ids = HashSet::new();
        for agent in &self.agents {
            if !agent_ids.insert(agent.id.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate agent '{}'", agent.id)));
            }
        }

        for id in REQUIRED_AGENTS {
            if !agent_ids.contains(id) {
                return Err(ConfigError::Missing {
                    kind: "agent",
                    name: id.to_string(),
                });
            }
        }

        let mut seen_tasks: HashSet<&str> = HashSet::new();
        for task in &self.tasks {
            if !agent_ids.contains(task.agent.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "task '{}' uses unknown agent '{}'",
                    task.name, task.agent
                )));
            }

            for ctx in task.context.iter().flatten() {
                if !seen_tasks.contains(ctx.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "task '{}' takes context from '{}', which does not run before it",
                        task.name, ctx
                    )));
                }
            }

            if !seen_tasks.insert(task.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate task '{}'", task.name)));
            }
        }

        for name in REQUIRED_TASKS {
            if !seen_tasks.contains(name) {
                return Err(ConfigError::Missing {
                    kind: "task",
                    name: name.to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn agent(&self, id: &str) -> Option<&AgentSpec> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn task(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn agents(&self) -> &[AgentSpec] {
        &self.agents
    }

    /// Tasks in execution order
    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENTS: &str = r#"
[[agents]]
id = "job_searcher"
role = "Scout"
goal = "Find {field} postings"
backstory = "Knows job boards"
tools = ["web_search", "fetch"]

[[agents]]
id = "job_parser"
role = "Parser"
goal = "Structure postings"
backstory = "Careful"

[[agents]]
id = "resume_parser"
role = "Resume reader"
goal = "Profile the candidate"
backstory = "HR veteran"
knowledge = true

[[agents]]
id = "matcher"
role = "Matcher"
goal = "Rank"
backstory = "Recruiter"
"#;

    fn tasks_toml(match_context: &str) -> String {
        format!(
            r#"
[[tasks]]
name = "search_jobs_task"
agent = "job_searcher"
description = "Search"
expected_output = "List"

[[tasks]]
name = "parse_jobs_task"
agent = "job_parser"
description = "Parse"
expected_output = "JSON"

[[tasks]]
name = "parse_resume_task"
agent = "resume_parser"
description = "Read resume"
expected_output = "Profile"

[[tasks]]
name = "match_jobs_task"
agent = "matcher"
description = "Match"
expected_output = "Ranked JSON"
{}
"#,
            match_context
        )
    }

    #[test]
    fn test_load_embedded() {
        let config = CrewConfig::load_embedded().unwrap();
        let order: Vec<_> = config.tasks().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(order, REQUIRED_TASKS);

        let searcher = config.agent("job_searcher").unwrap();
        assert!(searcher.has_tool(ToolKind::WebSearch));
        assert!(searcher.has_tool(ToolKind::Fetch));
        assert!(config.agent("resume_parser").unwrap().knowledge);
        assert!(config.agent("matcher").unwrap().tools.is_empty());
    }

    #[test]
    fn test_from_toml_with_context() {
        let tasks = tasks_toml(r#"context = ["parse_jobs_task", "parse_resume_task"]"#);
        let config = CrewConfig::from_toml(AGENTS, &tasks).unwrap();
        let matcher_task = config.task("match_jobs_task").unwrap();
        assert_eq!(matcher_task.context.as_ref().unwrap().len(), 2);
        assert!(config.task("search_jobs_task").unwrap().context.is_none());
    }

    #[test]
    fn test_context_must_precede() {
        let tasks = tasks_toml("").replace(
            "name = \"parse_jobs_task\"",
            "name = \"parse_jobs_task\"\ncontext = [\"match_jobs_task\"]",
        );
        let err = CrewConfig::from_toml(AGENTS, &tasks).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("does not run before")));
    }

    #[test]
    fn test_missing_agent() {
        let agents = AGENTS.replace("id = \"matcher\"", "id = \"ranker\"");
        let err = CrewConfig::from_toml(&agents, &tasks_toml("")).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { kind: "agent", ref name } if name == "matcher"));
    }

    #[test]
    fn test_missing_task() {
        let tasks = tasks_toml("").replace("match_jobs_task", "rank_task");
        let err = CrewConfig::from_toml(AGENTS, &tasks).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { kind: "task", .. }));
    }

    #[test]
    fn test_unknown_tool_is_parse_error() {
        let agents = AGENTS.replace("\"fetch\"", "\"teleport\"");
        let err = CrewConfig::from_toml(&agents, &tasks_toml("")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("agents.toml"), AGENTS).unwrap();
        std::fs::write(dir.path().join("tasks.toml"), tasks_toml("")).unwrap();

        let config = CrewConfig::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.agents().len(), 4);

        let empty = tempfile::tempdir().unwrap();
        assert!(matches!(
            CrewConfig::load_from_dir(empty.path()),
            Err(ConfigError::Read { .. })
        ));
    }
}
