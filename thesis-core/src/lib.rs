//! thesis-matcher core - domain model for the thesis matching crew
//!
//! This crate provides the foundational pieces shared by every stage:
//! - Kickoff inputs and prompt placeholder rendering
//! - Typed stage results (postings, resume profile, match records)
//! - Resume knowledge source with overlapping chunks
//! - JSON extraction from free-form LLM output
//! - JSON/CSV report writing

pub mod inputs;
pub mod postings;
pub mod matches;
pub mod extract;
pub mod knowledge;
pub mod report;

pub use inputs::*;
pub use postings::*;
pub use matches::*;
pub use extract::*;
pub use knowledge::*;
pub use report::*;

/// Default knowledge chunk size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 800;

/// Default overlap between neighbouring chunks in characters
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Default number of ranked matches requested from the crew
pub const DEFAULT_TOP_K: usize = 5;
