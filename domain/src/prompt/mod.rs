//! Prompt domain
//!
//! Templates for the prompts sent at each stage of a turn: routing,
//! argument extraction, finalize and conversational fallback.

mod template;

pub use template::PromptTemplate;
