//! CLI runner - executes commands

use crate::cli::commands::Cli;
use crate::config::ApiConfig;
use crate::error::Result;
use crate::http::ApiClient;
use std::io::Write;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, writing response bodies to stdout
    pub async fn run(&self) -> Result<()> {
        // `Stdout` locks per write, so no lock is held across an await
        self.run_to(&mut std::io::stdout()).await
    }

    /// Run the CLI command, writing response bodies to `out`
    pub async fn run_to(&self, out: &mut impl Write) -> Result<()> {
        let config = self.build_config()?;
        let client = ApiClient::from_config(&config)?;

        let (method, args) = self.cli.command.request();
        let form = args.form()?;
        let repeat = args.repeat.max(1);

        info!(
            "{} {}{} x{}",
            method,
            config.endpoint.as_deref().unwrap_or_default(),
            args.path,
            repeat
        );

        let handles: Vec<_> = (0..repeat)
            .map(|_| client.request(method, &args.path, form.clone()))
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let body = handle.await?;
            debug!("Response {} of {} received", i + 1, repeat);
            writeln!(out, "{body}")?;
        }

        Ok(())
    }

    /// Merge config file, environment and command-line overrides
    pub fn build_config(&self) -> Result<ApiConfig> {
        self.build_config_with(|key| std::env::var(key).ok())
    }

    /// Merge config file, `lookup` and command-line overrides
    fn build_config_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<ApiConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ApiConfig::from_file(path)?,
            None => ApiConfig::default(),
        }
        .with_overrides_from(lookup);

        if let Some(ref endpoint) = self.cli.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
        if let Some(ref token) = self.cli.token {
            config.token = Some(token.clone());
        }
        if let Some(requests) = self.cli.requests {
            config.throttle.requests = requests;
        }
        if let Some(seconds) = self.cli.seconds {
            config.throttle.seconds = seconds;
        }
        if let Some(ref path) = self.cli.error_log {
            config.error_log = Some(path.clone());
        }

        Ok(config)
    }
}
