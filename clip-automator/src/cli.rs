///
/// This module implements the CLI interface for clip-automator: command
/// parsing, argument validation and the async entrypoint shared by `main`
/// and the integration tests.
///
/// All workflow logic (Drive upload, batch download, credential checks,
/// highlight fetchers) lives in [`clip-automator-core`]. This module only
/// wires configuration into it and prints results.
///
/// ## Extending
/// When adding subcommands, update [`Commands`] below and keep non-trivial
/// logic inside `clip-automator-core`.
///
/// [`clip-automator-core`]: ../../clip-automator-core/
use crate::load_config::{load_config, load_static_config};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clip_automator_core::contract::Platform;
use clip_automator_core::credentials::ApiCredentials;
use clip_automator_core::download::{download_manual_urls, ProcessRunner};
use clip_automator_core::fetchers::{fetch_all_highlights, StubHighlightSource};
use clip_automator_core::upload::upload_via_service_account;
use std::path::{Path, PathBuf};

/// CLI for clip-automator: collect clips and push them to Drive.
#[derive(Parser)]
#[clap(
    name = "clip-automator",
    version,
    about = "Download trending clips and upload them to a Google Drive folder"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a local file into the configured Drive subfolder
    Upload {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// File to upload
        #[clap(long)]
        file: PathBuf,
        /// Name on Drive (defaults to the file's name)
        #[clap(long)]
        name: Option<String>,
    },
    /// Download each URL with the external downloader and print a JSON report
    Download {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// File with one URL per line; blank lines and `#` comments are ignored
        #[clap(long)]
        urls_file: Option<PathBuf>,
        /// URLs to download
        urls: Vec<String>,
    },
    /// Report which platforms have their credentials set
    Credentials {
        /// Check a single platform and fail if it is not configured
        #[clap(long)]
        platform: Option<Platform>,
    },
    /// Fetch highlights from every platform configured in the config file
    Highlights {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Upload { config, file, name } => {
            let config = load_static_config(config)?;
            if config.drive.parent_folder_id.trim().is_empty() {
                anyhow::bail!("drive.parent_folder_id must not be empty");
            }
            let name = match name {
                Some(name) => name,
                None => default_drive_name(&file)?,
            };
            tracing::info!(
                command = "upload",
                file = %file.display(),
                name = %name,
                "Starting upload"
            );

            let mut stream = std::fs::File::open(&file)
                .with_context(|| format!("Failed to open {}", file.display()))?;
            match upload_via_service_account(&config.drive, &name, &mut stream).await {
                Ok(id) => {
                    tracing::info!(command = "upload", file_id = %id, "Upload complete");
                    println!("{id}");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "upload", error = %e, "Upload failed");
                    Err(anyhow::Error::new(e).context(format!("Uploading {name} failed")))
                }
            }
        }
        Commands::Download {
            config,
            urls_file,
            mut urls,
        } => {
            let config = load_static_config(config)?;
            if let Some(path) = urls_file {
                urls.extend(read_urls_file(&path)?);
            }
            if urls.is_empty() {
                anyhow::bail!("No URLs given: pass them as arguments or with --urls-file");
            }
            tracing::info!(command = "download", urls = urls.len(), "Starting batch download");

            let report = download_manual_urls(&ProcessRunner, &config.download, &urls).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Credentials { platform } => {
            let credentials =
                ApiCredentials::from_env().context("Failed to read platform credentials")?;
            match platform {
                Some(platform) => {
                    let ok = credentials.validate_api_credentials(platform);
                    println!("{platform}: {}", if ok { "ok" } else { "missing" });
                    if !ok {
                        anyhow::bail!("{platform} credentials are not configured");
                    }
                }
                None => {
                    for (platform, ok) in credentials.validation_report() {
                        println!("{platform}: {}", if ok { "ok" } else { "missing" });
                    }
                }
            }
            Ok(())
        }
        Commands::Highlights { config } => {
            let config = load_config(config)?;
            for (platform, ok) in config.credentials.validation_report() {
                if config_mentions(&config.app.highlights, platform) && !ok {
                    tracing::warn!(%platform, "Platform configured without credentials");
                }
            }
            let results = fetch_all_highlights(&StubHighlightSource, &config.app.highlights).await;
            println!("{}", serde_json::to_string_pretty(&results)?);
            Ok(())
        }
    }
}

fn default_drive_name(file: &Path) -> Result<String> {
    file.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("Cannot derive a Drive name from {}", file.display()))
}

fn read_urls_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read URL list {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn config_mentions(
    highlights: &clip_automator_core::config::HighlightsConfig,
    platform: Platform,
) -> bool {
    match platform {
        Platform::Reddit => highlights.reddit.is_some(),
        Platform::YouTube => highlights.youtube.is_some(),
        Platform::Twitter => highlights.twitter.is_some(),
    }
}
