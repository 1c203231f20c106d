//! thesis-matcher web tools
//!
//! The two capabilities the search agent can use:
//! - **Web search** through the Serper Google Search API
//! - **Fetch/scrape** of a posting page into plain text

pub mod client;
pub mod search;
pub mod fetch;

pub use client::*;
pub use search::*;
pub use fetch::*;
