//! Events of a streamed completion

/// One item on a backend's completion channel.
///
/// A well-formed stream is zero or more `Delta`s followed by exactly one
/// `Completed` or `Error`. `Completed` carries the whole reply, which equals
/// the concatenated deltas when the backend produced any. A channel that
/// closes without a terminal event means the backend went away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Delta(String),
    Completed(String),
    Error(String),
}
