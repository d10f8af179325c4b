// CLI module - User-facing command-line interface

mod output;

use crate::client::LogClient;
use crate::config::Settings;
use crate::discovery::logs_endpoint_from_services;
use crate::endpoint::LogMode;
use crate::error::{Result, SilError};
use crate::logs::DisplayZone;
use crate::stream::{run_logs, LogsRequest};
use clap::Parser;
use colored::*;
use output::LineBuffer;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Tail or show recent logs for a service instance
#[derive(Parser, Debug)]
#[command(name = "silogs")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Service instance to show logs for
    service_instance: String,

    /// Dump recent logs instead of tailing
    #[arg(long)]
    recent: bool,

    /// Skip verification of the logs endpoint. Not recommended!
    #[arg(long)]
    skip_ssl_validation: bool,

    /// Service instance logs endpoint URL
    #[arg(long, conflicts_with = "services_file")]
    endpoint: Option<String>,

    /// File holding a /v2/services response to discover the logs endpoint from
    #[arg(long)]
    services_file: Option<PathBuf>,

    /// Access token for the logs endpoint
    #[arg(long, env = "SILOGS_TOKEN", hide_env_values = true)]
    token: String,

    /// Zone to show timestamps in: local, utc, a name such as Europe/London or
    /// an offset such as +05:30
    #[arg(long)]
    timezone: Option<String>,

    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Run the CLI application. Failures are reported before returning.
    pub async fn run() -> Result<()> {
        let cli = Cli::parse();
        let result = cli.execute().await;
        if let Err(e) = &result {
            output::print_failure(e);
        }
        result
    }

    /// Execute the parsed command
    async fn execute(&self) -> Result<()> {
        let settings = match &self.config {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };
        init_tracing(&settings.log_level);

        let request = self.build_request(&settings)?;
        if request.insecure_skip_verify {
            output::print_warning(output::SKIP_SSL_WARNING);
        }

        let instance = self.service_instance.cyan().bold();
        match request.mode {
            LogMode::Dump => {
                let message = format!("Dumping recent logs for service instance {}", instance);
                let pb = output::create_progress_bar(&message);
                let buffer = LineBuffer::default();

                match run_logs(request, buffer.clone(), LogClient::build).await {
                    Ok(()) => {
                        output::finish_progress_success(pb, &message);
                        let mut stdout = std::io::stdout();
                        stdout.write_all(&buffer.take())?;
                        stdout.flush()?;
                        Ok(())
                    }
                    Err(e) => {
                        output::finish_progress_error(pb, &message);
                        Err(e)
                    }
                }
            }
            LogMode::Tail => {
                output::print_action(&format!("Tailing logs for service instance {}", instance));
                run_logs(request, std::io::stdout(), LogClient::build).await
            }
        }
    }

    /// Combine flags and settings into a logs request
    fn build_request(&self, settings: &Settings) -> Result<LogsRequest> {
        let display_zone = match &self.timezone {
            Some(zone) => DisplayZone::parse(zone)?,
            None => settings.display_zone()?,
        };
        debug!(zone = %display_zone, "Timestamps rendered in zone");

        let auth_token = normalize_token(&self.token);
        if auth_token.is_empty() {
            return Err(SilError::ConfigError(
                "Access token not available".to_string(),
            ));
        }

        Ok(LogsRequest {
            target_id: self.service_instance.clone(),
            auth_token,
            discovered_endpoint: self.discovered_endpoint(settings)?,
            mode: if self.recent { LogMode::Dump } else { LogMode::Tail },
            insecure_skip_verify: self.skip_ssl_validation || settings.skip_ssl_validation,
            display_zone,
        })
    }

    /// Logs endpoint from, in order: --endpoint, --services-file, settings
    fn discovered_endpoint(&self, settings: &Settings) -> Result<String> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }

        if let Some(path) = &self.services_file {
            let body = std::fs::read_to_string(path).map_err(|e| {
                SilError::UpstreamMetadata(format!("Failed to read services file: {}", e))
            })?;
            return logs_endpoint_from_services(&body);
        }

        settings.endpoint.clone().ok_or_else(|| {
            SilError::ConfigError(
                "No logs endpoint: use --endpoint, --services-file or a config file".to_string(),
            )
        })
    }
}

/// Strip a leading `bearer ` so tokens copied from an authorization header
/// are not prefixed twice
fn normalize_token(token: &str) -> String {
    let token = token.trim();
    let mut parts = token.splitn(2, char::is_whitespace);
    match (parts.next(), parts.next()) {
        (Some(scheme), rest) if scheme.eq_ignore_ascii_case("bearer") => {
            rest.unwrap_or("").trim().to_string()
        }
        _ => token.to_string(),
    }
}

/// Install the diagnostic subscriber; `RUST_LOG` overrides `default_filter`
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A subscriber may already be installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
