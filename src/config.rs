use crate::auth::CredentialStore;
use crate::error::AuthError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;

/// Password-gated sales dashboard: rolling demand and price elasticity per item.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// CSV files to list in the dashboard at start-up.
    pub files: Vec<PathBuf>,

    /// JSON map of username to Argon2 hash. Demo accounts are used when absent.
    #[arg(long)]
    pub users: Option<PathBuf>,

    /// Rows shown in the combined data preview.
    #[arg(long, default_value_t = 5)]
    pub preview_rows: usize,

    /// Log filter used when RUST_LOG is not set (e.g. "debug", "sales_dashboard=trace").
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print an Argon2 hash for a credential file entry.
    HashPassword { password: String },
}

/// Everything the dashboard window needs from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub files: Vec<PathBuf>,
    pub credentials: CredentialStore,
    pub preview_rows: usize,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self, AuthError> {
        let credentials = match &cli.users {
            Some(path) => CredentialStore::from_json_file(path)?,
            None => CredentialStore::demo()?,
        };
        if credentials.is_empty() {
            warn!("credential store is empty; nobody can log in");
        }

        Ok(Settings {
            files: cli.files.clone(),
            credentials,
            preview_rows: cli.preview_rows,
        })
    }
}
