//! Completion session domain.
//!
//! - [`options::CompletionOptions`]: sampling options for one completion
//! - [`stream::StreamEvent`]: one event of a streamed completion

pub mod options;
pub mod stream;
