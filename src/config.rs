//! Configuration and CLI argument handling

use std::{path::PathBuf, sync::Arc, time::Duration};
use clap::Parser;

use crate::{
    services::{CredentialProvider, CredentialSource},
    state::{RetentionPolicy, SessionSettings},
};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "assessment-timer")]
#[command(about = "Countdown and auto-submit timer service for timed assessments")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20560")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Base URL of the assessment REST API used for fallback submission
    #[arg(long, env = "ASSESSMENT_API_URL", default_value = "http://127.0.0.1:8000")]
    pub api_url: String,

    /// Bearer token for the fallback submission call
    #[arg(long, env = "ASSESSMENT_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// File holding the bearer token, re-read on every submission
    #[arg(long, conflicts_with = "api_token")]
    pub token_file: Option<PathBuf>,

    /// Path the view navigates to after a successful auto-submission
    #[arg(long, default_value = "/interviewee")]
    pub landing_path: String,

    /// Seconds a warning notice stays visible
    #[arg(long, default_value = "5")]
    pub notice_seconds: u64,

    /// Seconds an expired session stays readable before it is reaped
    #[arg(long, default_value = "300")]
    pub session_retention_seconds: u64,

    /// Seconds a reload checkpoint is kept for a submission
    #[arg(long, default_value = "86400")]
    pub checkpoint_ttl_seconds: u64,

    /// Timeout for the fallback submission request
    #[arg(long, default_value = "10")]
    pub submit_timeout_seconds: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Credential provider for the fallback submission call
    pub fn credentials(&self) -> Arc<dyn CredentialProvider> {
        let source = match (&self.api_token, &self.token_file) {
            (Some(token), _) => CredentialSource::Static(token.clone()),
            (None, Some(path)) => CredentialSource::File(path.clone()),
            (None, None) => CredentialSource::None,
        };
        Arc::new(source)
    }

    /// Per-session settings derived from the CLI
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            notice_duration: Duration::from_secs(self.notice_seconds),
            landing_path: self.landing_path.clone(),
        }
    }

    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy {
            finished_session: Duration::from_secs(self.session_retention_seconds),
            checkpoint: Duration::from_secs(self.checkpoint_ttl_seconds),
        }
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_seconds)
    }
}
