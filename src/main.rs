//! # fracture CLI Entry Point
//!
//! Parses arguments with clap, sets up logging and wires the production
//! GitHub and git collaborators into the command handlers.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use fracture::commands;
use fracture::config::{self, ProcessEnvironment, Settings};
use fracture::github::GitHubClient;
use fracture::install::Installer;
use fracture::repo::GitProvider;
use fracture::upgrade;

#[cfg(windows)]
#[link(name = "kernel32")]
unsafe extern "system" {
    fn SetConsoleOutputCP(wCodePageID: u32) -> i32;
}

#[cfg(windows)]
fn enable_windows_utf8_console() {
    unsafe {
        SetConsoleOutputCP(65001);
    }
}

#[cfg(not(windows))]
fn enable_windows_utf8_console() {}

const LONG_HELP: &str = "\
Dependency types:
  binary      download a release asset (asset_suffix is required)
  source      download GitHub's source archive for a release tag
  repository  clone a git repository, or pull when it already exists

Source type options:
  asset_extension  'zip' or 'tar.gz' (default: 'tar.gz')
  extract          unpack the archive into path (default: false)
  filename         custom archive file name (only when extract=false)
  asset_name and asset_suffix are not allowed for source dependencies

Path placeholders:
  @VERSION          release tag or commit hash
  @TIMESTAMP        current unix timestamp
  @ASSET_EXTENSION  file extension of the download (empty when extracting)
  $ENV_VAR          value of an environment variable

Environment variables:
  FRACTURE_GITHUB_PAT  GitHub personal access token for private repositories
  FRACTURE_LOG         log filter (e.g. 'debug', 'fracture=trace')";

#[derive(Parser)]
#[command(name = "fracture")]
#[command(about = "Fetches GitHub release binaries, source archives and git repositories", version = env!("CARGO_PKG_VERSION"))]
#[command(after_long_help = LONG_HELP)]
struct Cli {
    /// Path to the manifest; the lock file is kept next to it
    #[arg(short = 'c', long = "config", global = true, default_value = config::MANIFEST_FILE)]
    config: PathBuf,

    /// Guess missing dependency types from entry names
    #[arg(long, global = true)]
    infer_types: bool,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install every dependency in the manifest
    Install,
    /// Reinstall all dependencies, or one dependency at an optional version
    Update {
        /// Dependency to update
        name: Option<String>,
        /// Release tag or git revision
        version: Option<String>,
    },
    /// Update fracture to the latest release
    SelfUpdate,
    /// Show version information
    Version,
}

fn main() -> Result<()> {
    enable_windows_utf8_console();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        None => {
            Cli::command().print_long_help()?;
            println!();
            Ok(())
        }
        Some(Commands::Version) => {
            print_version();
            Ok(())
        }
        Some(Commands::SelfUpdate) => {
            let settings = Settings::from_environment(&cli.config, cli.infer_types)?;
            upgrade::check_and_upgrade(&GitHubClient::new(&settings))
        }
        Some(Commands::Install) => {
            let settings = Settings::from_environment(&cli.config, cli.infer_types)?;
            with_installer(&settings, |installer| {
                commands::install::run_install(&settings, installer).map(|_| ())
            })
        }
        Some(Commands::Update { name, version }) => {
            let settings = Settings::from_environment(&cli.config, cli.infer_types)?;
            with_installer(&settings, |installer| {
                commands::update::run_update(
                    &settings,
                    installer,
                    name.as_deref(),
                    version.as_deref(),
                )
                .map(|_| ())
            })
        }
    }
}

fn with_installer<T>(settings: &Settings, run: impl FnOnce(&Installer) -> Result<T>) -> Result<T> {
    let github = GitHubClient::new(settings);
    let repos = GitProvider::new(settings.github_token.clone());
    let env = ProcessEnvironment;
    let installer = Installer::new(settings, &github, &repos, &env);
    run(&installer)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(config::LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_version() {
    println!("{} {}", "fracture".bold(), env!("CARGO_PKG_VERSION"));
    println!(
        "Git commit: {}",
        option_env!("FRACTURE_GIT_COMMIT").unwrap_or("unknown")
    );
    println!(
        "Build date: {}",
        option_env!("FRACTURE_BUILD_DATE").unwrap_or("unknown")
    );
    println!(
        "OS/Arch: {}/{}",
        std::env::consts::OS.green(),
        std::env::consts::ARCH.cyan()
    );
}
