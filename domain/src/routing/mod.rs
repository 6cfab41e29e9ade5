//! Routing rules applied to completion text.
//!
//! Everything here is deterministic: given the same model output and the
//! same registry, the same decision and the same argument map come out.
//!
//! - [`RouterDecision`]: picks a tool name out of a free-form router reply
//! - [`parse_raw_arguments`]: the bracket-scanning JSON extractor
//! - [`BulkPolicy`]: the "all items" shortcut that skips LLM extraction

pub mod bulk;
pub mod decision;
pub mod extraction;

pub use bulk::{
    BulkPolicy, BulkPolicyError, DEFAULT_BULK_TOOLS, DEFAULT_ID_FIELD, DEFAULT_ID_PATTERN, DEFAULT_KEYWORDS,
    DEFAULT_LIST_TOOL,
};
pub use decision::RouterDecision;
pub use extraction::parse_raw_arguments;
