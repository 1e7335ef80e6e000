mod ciop;
mod config;
mod display;
mod error;
mod github;
mod peribolos;
mod scanner;
mod shutdown;
mod sync;

use clap::Parser;
use config::{Options, RawOptions, DEFAULT_ENDPOINT, DEFAULT_TOKEN_PATH};
use error::{Result, SyncError};
use github::GithubClient;
use peribolos::FullConfig;
use shutdown::Shutdown;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::Instrument;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "private-org-sync",
    version,
    about = "Sync repositories that promote official images into a peribolos organization config"
)]
pub struct Cli {
    /// Peribolos configuration file
    #[arg(long)]
    peribolos_config: Option<PathBuf>,

    /// Path to an openshift/release repository directory
    #[arg(long)]
    release_repo_path: Option<PathBuf>,

    /// Destination name of the peribolos configuration organization
    #[arg(long)]
    destination_org: Option<String>,

    /// YAML file listing org/repos to sync regardless of promotion
    #[arg(long)]
    whitelist_file: Option<PathBuf>,

    /// Path to the file containing the GitHub OAuth token
    #[arg(long, env = "GITHUB_TOKEN_PATH", default_value = DEFAULT_TOKEN_PATH)]
    github_token_path: PathBuf,

    /// GitHub API endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    github_endpoint: String,
}

impl From<Cli> for RawOptions {
    fn from(cli: Cli) -> Self {
        RawOptions {
            peribolos_config: cli.peribolos_config,
            release_repo_path: cli.release_repo_path,
            destination_org: cli.destination_org,
            whitelist_file: cli.whitelist_file,
            github_token_path: cli.github_token_path,
            github_endpoint: cli.github_endpoint,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    let opts = match RawOptions::from(cli).validate() {
        Ok(opts) => opts,
        Err(e) => {
            tracing::error!(error = %e, "invalid options");
            std::process::exit(1);
        }
    };

    let span = tracing::info_span!("sync", destination_org = %opts.destination_org);
    let shutdown = Shutdown::on_signal();

    match run(&opts, &shutdown).instrument(span).await {
        Ok(count) => display::success(&format!(
            "Wrote {count} repositories for {} to {}",
            opts.destination_org,
            opts.peribolos_config.display()
        )),
        Err(e) => {
            tracing::error!(error = %e, "sync failed");
            std::process::exit(1);
        }
    }
}

/// Logs go to stderr so stdout only carries the final summary.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

async fn read_file(path: &std::path::Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SyncError::io(path, e))
}

async fn run(opts: &Options, shutdown: &Shutdown) -> Result<usize> {
    let contents = shutdown
        .guard(
            "reading peribolos configuration",
            read_file(&opts.peribolos_config),
        )
        .await?;
    let mut peribolos_config = FullConfig::from_yaml(&opts.peribolos_config, &contents)?;

    let token = config::load_token(&opts.github_token_path)?;
    let client = GithubClient::new(&token, &opts.github_endpoint)?;

    shutdown.check("scanning ci-operator configuration")?;
    let org_repos =
        scanner::repos_for_private_org(&opts.release_repo_path, &opts.whitelist.whitelist)?;
    tracing::info!(
        orgs = org_repos.len(),
        repos = scanner::repo_count(&org_repos),
        "collected repositories that promote official images"
    );

    let repos = sync::generate_repositories(&client, &org_repos, shutdown).await?;
    let count = repos.len();
    peribolos_config.replace_org_repos(&opts.destination_org, repos);

    let out = peribolos_config.to_yaml()?;
    shutdown.check("writing peribolos configuration")?;
    peribolos::write_atomic(&opts.peribolos_config, &out)?;

    Ok(count)
}
