//! Library surface for the `cinevec` binary and its integration tests.

pub mod analogy;
pub mod cli;
pub mod config;
pub mod db;
pub mod embedder;
pub mod loader;
pub mod model;
pub mod output;
pub mod search;
pub mod vector;
