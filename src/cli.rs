//! Command-line surface: binds user actions to the stores and the pipeline
//! and renders pipeline events as plain console output.

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::{Config, ConfigStore};
use crate::history::HistoryStore;
use crate::pipeline::{upload_batch, EventSink, LocalFile, UploadEvent};
use crate::storage::{FileStore, KeyValueStore};
use crate::uploader::GitHubHost;

/// Env var consulted when the stored configuration has no token.
pub const TOKEN_ENV: &str = "PICBED_TOKEN";

#[derive(Parser)]
#[clap(
    name = "picbed",
    version,
    about = "Upload images to a GitHub repository and hand back CDN share links"
)]
pub struct Cli {
    /// Directory holding the saved configuration and upload history
    #[clap(long, global = true, default_value = ".picbed")]
    pub data_dir: PathBuf,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the stored GitHub configuration
    Config {
        #[clap(subcommand)]
        action: ConfigAction,
    },
    /// Upload one or more image files and print their share links
    Upload {
        /// Image files to upload, processed in order
        #[clap(required = true)]
        files: Vec<PathBuf>,
    },
    /// Inspect or clear the local upload history
    History {
        #[clap(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Save the full configuration (token and owner are required)
    Set {
        /// GitHub personal access token; falls back to $PICBED_TOKEN
        #[clap(long)]
        token: Option<String>,
        /// Repository owner (GitHub user or organisation)
        #[clap(long, default_value = "")]
        owner: String,
        /// Repository name
        #[clap(long, default_value = "")]
        repo: String,
        /// Target branch
        #[clap(long, default_value = "")]
        branch: String,
        /// Repository-relative directory the images land in
        #[clap(long, default_value = "")]
        path: String,
    },
    /// Print the stored configuration with the token redacted
    Show,
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List past uploads, most recent first
    List,
    /// Delete all recorded uploads
    Clear {
        /// Skip the confirmation prompt
        #[clap(long)]
        yes: bool,
    },
}

/// Renders pipeline events as console lines: progress checkpoints while a
/// file is in flight, the link set on success, a one-line error on failure.
struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&self, event: UploadEvent) {
        match event {
            UploadEvent::Progress {
                file,
                percent,
                stage,
            } => {
                println!("[{percent:>3}%] {file}: {stage}");
            }
            UploadEvent::Uploaded { file, record } => {
                println!("{file} -> {}", record.path);
                println!("  markdown: {}", record.links.markdown);
                println!("  html:     {}", record.links.html);
                println!("  direct:   {}", record.links.direct);
                println!("  cdn:      {}", record.links.cdn);
            }
            UploadEvent::Failed { file, message } => {
                eprintln!("{file}: upload failed: {message}");
            }
        }
    }
}

/// CLI entrypoint, extracted from `main` for integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&cli.data_dir));
    let config_store = ConfigStore::new(store.clone());
    let history_store = HistoryStore::new(store);

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Set {
                token,
                owner,
                repo,
                branch,
                path,
            } => {
                let token = token
                    .or_else(|| env::var(TOKEN_ENV).ok())
                    .unwrap_or_default();
                let saved = config_store.save(Config {
                    token,
                    owner,
                    repo,
                    branch,
                    path,
                })?;
                println!(
                    "Configuration saved: {}/{} (branch {}, path {}).",
                    saved.owner, saved.repo, saved.branch, saved.path
                );
                Ok(())
            }
            ConfigAction::Show => {
                match config_store.load()? {
                    Some(config) => {
                        println!("token:  {}", redacted(&config.token));
                        println!("owner:  {}", config.owner);
                        println!("repo:   {}", config.repo);
                        println!("branch: {}", config.branch);
                        println!("path:   {}", config.path);
                    }
                    None => {
                        println!("No configuration saved yet. Run `picbed config set` first.");
                    }
                }
                Ok(())
            }
        },
        Commands::Upload { files } => {
            let config = config_store.load()?.map(with_env_token);
            // With no usable config the pipeline short-circuits before the
            // host is ever asked to do anything.
            let host_config = config.clone().unwrap_or_default();
            let host = GitHubHost::new(&host_config);

            let files: Vec<LocalFile> = files.into_iter().map(LocalFile::from_path).collect();
            let report =
                upload_batch(&files, config.as_ref(), &host, &history_store, &ConsoleSink).await?;

            println!("{} uploaded, {} failed.", report.succeeded(), report.failed());
            if report.succeeded() == 0 && !report.outcomes.is_empty() {
                anyhow::bail!("all uploads failed");
            }
            Ok(())
        }
        Commands::History { action } => match action {
            HistoryAction::List => {
                let records = history_store.load()?;
                if records.is_empty() {
                    println!("No uploads recorded yet.");
                } else {
                    for record in &records {
                        println!("{}  {}", record.time, record.name);
                        println!("    {}", record.links.cdn);
                    }
                }
                Ok(())
            }
            HistoryAction::Clear { yes } => {
                if !yes && !confirm("Clear all upload history?")? {
                    println!("Aborted.");
                    return Ok(());
                }
                history_store.clear()?;
                println!("Upload history cleared.");
                Ok(())
            }
        },
    }
}

/// Fills an empty stored token from the environment.
fn with_env_token(mut config: Config) -> Config {
    if config.token.trim().is_empty() {
        if let Ok(token) = env::var(TOKEN_ENV) {
            config.token = token;
        }
    }
    config
}

fn redacted(token: &str) -> &str {
    if token.is_empty() {
        "(unset)"
    } else {
        "********"
    }
}

/// Blocking yes/no prompt; anything but an explicit yes declines.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
