//! Integration tests for the graph console.

pub mod console_test;
pub mod persistence_test;
pub mod session_test;
pub mod splitter_test;
