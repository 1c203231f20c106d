//! thesis-matcher agents
//!
//! The four members of the matching crew:
//! - **Job Searcher**: Finds postings with web search and page fetches
//! - **Job Parser**: Structures postings into JSON
//! - **Resume Parser**: Profiles the candidate from the resume knowledge source
//! - **Matcher**: Ranks postings against the profile
//!
//! ## Configuration
//!
//! Roles, goals, backstories and task instructions are defined in TOML
//! (`config/agents.toml`, `config/tasks.toml`). See [`config::CrewConfig`].

pub mod backend;
pub mod config;
pub mod traits;
pub mod base;
pub mod searcher;
pub mod job_parser;
pub mod resume_parser;
pub mod matcher;

pub use backend::*;
pub use config::*;
pub use traits::*;
pub use base::*;
pub use searcher::*;
pub use job_parser::*;
pub use resume_parser::*;
pub use matcher::*;
