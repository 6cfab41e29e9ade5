//! Console output formatting

pub mod console;
