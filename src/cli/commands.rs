//! CLI commands and argument parsing

use crate::error::{Error, Result};
use crate::types::{Method, StringMap};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Throttled HTTP API client
#[derive(Parser, Debug)]
#[command(name = "throttled-api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base endpoint, overrides the config file
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Auth token sent as the `token` query parameter
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Maximum requests per window
    #[arg(long, global = true)]
    pub requests: Option<i64>,

    /// Window length in seconds
    #[arg(long, global = true)]
    pub seconds: Option<i64>,

    /// File receiving failed request messages
    #[arg(long, global = true)]
    pub error_log: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands, one per verb
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a GET request
    Get(RequestArgs),
    /// Send a POST request
    Post(RequestArgs),
    /// Send a PUT request
    Put(RequestArgs),
    /// Send a DELETE request
    Delete(RequestArgs),
}

impl Commands {
    /// Verb and arguments of this command
    pub fn request(&self) -> (Method, &RequestArgs) {
        match self {
            Commands::Get(args) => (Method::GET, args),
            Commands::Post(args) => (Method::POST, args),
            Commands::Put(args) => (Method::PUT, args),
            Commands::Delete(args) => (Method::DELETE, args),
        }
    }
}

/// Arguments shared by every verb
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Path appended to the endpoint
    pub path: String,

    /// Form field as key=value (POST and PUT only)
    #[arg(short, long = "data", value_name = "KEY=VALUE")]
    pub data: Vec<String>,

    /// Send the request this many times through the throttle
    #[arg(long, default_value = "1")]
    pub repeat: usize,
}

impl RequestArgs {
    /// Parse `--data` pairs into a form body
    pub fn form(&self) -> Result<Option<StringMap>> {
        if self.data.is_empty() {
            return Ok(None);
        }

        let mut form = StringMap::new();
        for pair in &self.data {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                Error::config(format!("Invalid form field '{pair}', expected KEY=VALUE"))
            })?;
            form.insert(key.to_string(), value.to_string());
        }
        Ok(Some(form))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_post_with_data() {
        let cli = Cli::try_parse_from([
            "throttled-api",
            "--endpoint",
            "http://example.com",
            "post",
            "/campaigns",
            "-d",
            "name=spring",
            "--data",
            "budget=10",
        ])
        .unwrap();

        assert_eq!(cli.endpoint.as_deref(), Some("http://example.com"));
        let (method, args) = cli.command.request();
        assert_eq!(method, Method::POST);
        assert_eq!(args.path, "/campaigns");

        let form = args.form().unwrap().unwrap();
        assert_eq!(form.get("name").map(String::as_str), Some("spring"));
        assert_eq!(form.get("budget").map(String::as_str), Some("10"));
    }

    #[test]
    fn test_parse_get_with_globals_after_subcommand() {
        let cli = Cli::try_parse_from([
            "throttled-api",
            "get",
            "/x",
            "--requests",
            "2",
            "--seconds",
            "4",
            "--repeat",
            "3",
        ])
        .unwrap();

        assert_eq!(cli.requests, Some(2));
        assert_eq!(cli.seconds, Some(4));
        let (method, args) = cli.command.request();
        assert_eq!(method, Method::GET);
        assert_eq!(args.repeat, 3);
        assert!(args.form().unwrap().is_none());
    }

    #[test]
    fn test_invalid_form_field() {
        let cli = Cli::try_parse_from(["throttled-api", "put", "/x", "-d", "novalue"]).unwrap();
        let (_, args) = cli.command.request();
        assert!(matches!(args.form(), Err(Error::Config { .. })));
    }
}
