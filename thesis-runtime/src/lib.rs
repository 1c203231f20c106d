//! thesis-matcher runtime
//!
//! Binds the four agents to their tasks and runs them one after another,
//! handing each task the outputs of the ones before it.

pub mod crew;

pub use crew::*;
