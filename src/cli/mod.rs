//! CLI module
//!
//! Command-line interface for issuing throttled requests.
//!
//! # Commands
//!
//! - `get` - Send a GET request
//! - `post` - Send a POST request with optional form fields
//! - `put` - Send a PUT request with optional form fields
//! - `delete` - Send a DELETE request

mod commands;
mod runner;

pub use commands::{Cli, Commands, RequestArgs};
pub use runner::Runner;
