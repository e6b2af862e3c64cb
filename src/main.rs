//! Auth2 Client CLI
//!
//! Validates tokens and usernames against the configured auth service and
//! prints the answers as JSON.

use std::collections::BTreeMap;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use auth2_client::{AuthConfig, AuthSession};

/// Query an auth service from the command line.
///
/// Configuration is read from `AUTH_*` environment variables; flags override it.
#[derive(Debug, Parser)]
#[command(name = "auth2_client", version, about)]
struct Cli {
    /// Root URL of the auth service
    #[arg(long, global = true)]
    url: Option<String>,

    /// Allow an `http` service URL
    #[arg(long, global = true)]
    allow_insecure: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the service version
    Version,
    /// Print the owner of a token
    Validate {
        #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
        token: String,
    },
    /// Report which usernames exist
    CheckUsers {
        #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
        token: String,
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth2_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = AuthConfig::from_env()?;
    if let Some(raw) = &cli.url {
        let url = Url::parse(raw).with_context(|| format!("invalid --url {}", raw))?;
        config = config.with_auth_server_url(url);
    }
    if cli.allow_insecure {
        config = config.with_allow_insecure_urls(true);
    }
    info!(url = %config.auth_server_url, "connecting to auth service");

    let session = AuthSession::new(&config).await?;

    let output = match cli.command {
        Command::Version => {
            let version = session.client().server_version().await?;
            json!({ "url": session.uri().as_str(), "version": version })
        }
        Command::Validate { token } => {
            let validated = session.validate_token(&token).await?;
            serde_json::to_value(&validated)?
        }
        Command::CheckUsers { token, names } => {
            let valid = session.client().is_valid_user_name(&names, &token).await?;
            let sorted: BTreeMap<String, bool> = valid.into_iter().collect();
            serde_json::to_value(sorted)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
