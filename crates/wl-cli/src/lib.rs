//! Worklog sync CLI library.
//!
//! This crate provides the CLI interface for syncing tracked time into Jira.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::{Config, JiraConfig, JiraCredentials, ScrinConfig};
