//! Graph console - the core of an interactive console for graph query languages.
//!
//! This library exposes the core modules for use by the binary and in
//! integration tests.

pub mod backend;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod output;
pub mod persistence;
pub mod session;
pub mod splitter;
