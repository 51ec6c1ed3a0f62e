//! AppForest - dependency-aware application installer
//!
//! Usage:
//!   appforest tree                       # Show the application forest
//!   appforest plan --install catalog-app # Preview the ordered changes
//!   appforest apply --uninstall solr-app # Apply changes and validate them

mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use appforest_core::config::{AppForestConfig, ConfigStore};
use appforest_core::control::{FileTreeSource, JolokiaClient, TreeSource};
use appforest_core::error::SaveError;
use appforest_core::scheduler::{CancellationToken, SaveOptions, SaveReport};
use appforest_core::tree::Forest;

#[derive(Parser)]
#[command(name = "appforest")]
#[command(about = "Install and uninstall interdependent applications", long_about = None)]
struct Cli {
    /// Path to appforest.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log scheduler activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the application forest and each application's state
    Tree {
        /// Read the tree from a saved JSON response instead of the server
        #[arg(long)]
        file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the ordered steps a selection change would perform
    Plan {
        /// Read the tree from a saved JSON response instead of the server
        #[arg(long)]
        file: Option<PathBuf>,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Apply a selection change against the server and validate the result
    Apply {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct SelectionArgs {
    /// Application to install; its parents are installed too
    #[arg(long = "install", value_name = "NAME")]
    install: Vec<String>,

    /// Application to uninstall; its dependents are uninstalled too.
    /// Uninstalls are applied before installs, so an install wins on overlap.
    #[arg(long = "uninstall", value_name = "NAME")]
    uninstall: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
    /// Only show issues (non-zero exit if problems)
    Quiet,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "appforest_core=debug,appforest_cli=debug,info"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Tree { file, format } => {
            let forest = load_forest(&config, file).await?;
            output::print_tree(&forest, format)?;
        }
        Commands::Plan {
            file,
            selection,
            format,
        } => {
            let mut forest = load_forest(&config, file).await?;
            apply_selection(&mut forest, &selection)?;
            output::print_plan(&forest.plan(), format)?;
        }
        Commands::Apply { selection, format } => {
            run_apply(&config, &selection, format).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<AppForestConfig> {
    let store = match path {
        Some(path) => ConfigStore::from_path(path.clone()),
        None => ConfigStore::with_defaults()?,
    };
    tracing::debug!(path = %store.config_path().display(), "loading configuration");
    store.load()
}

async fn load_forest(config: &AppForestConfig, file: Option<PathBuf>) -> Result<Forest> {
    let roots = match file {
        Some(path) => FileTreeSource::new(path).fetch_tree().await?,
        None => JolokiaClient::new(&config.control)?.fetch_tree().await?,
    };
    Ok(Forest::from_snapshots(&roots))
}

fn apply_selection(forest: &mut Forest, selection: &SelectionArgs) -> Result<()> {
    for name in &selection.uninstall {
        let id = forest
            .find(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown application: {}", name))?;
        forest.deselect(id);
    }
    for name in &selection.install {
        let id = forest
            .find(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown application: {}", name))?;
        forest.select(id);
    }
    Ok(())
}

async fn run_apply(
    config: &AppForestConfig,
    selection: &SelectionArgs,
    format: OutputFormat,
) -> Result<()> {
    let client = JolokiaClient::new(&config.control)?;

    let roots = client
        .fetch_tree()
        .await
        .context("Failed to load application tree")?;
    let mut forest = Forest::from_snapshots(&roots);
    apply_selection(&mut forest, selection)?;

    let total = forest.num_nodes_changed();
    if total == 0 {
        if format == OutputFormat::Table {
            println!("• Nothing to change");
        }
        return Ok(());
    }
    let desired = forest.desired_snapshot();

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing in-flight requests");
            ctrl_c.cancel();
        }
    });

    let progress = |message: &str, percent: f64| {
        if format != OutputFormat::Quiet {
            eprintln!("{}", output::progress_line(message, percent));
        }
    };
    let saved = forest
        .save_with(&client, SaveOptions::default().with_cancel(token), &progress)
        .await;
    if let Err(err) = &saved {
        output::print_save_error(err, format);
    }

    let roots = client
        .fetch_tree()
        .await
        .context("Failed to reload application tree for validation")
        .map_err(|err| with_save_failures(err, &saved))?;
    let mut live = Forest::from_snapshots(&roots);
    let report = live
        .validate_install(&desired, total, |message, percent| {
            tracing::info!(percent, "{message}");
        })
        .context("Application tree changed while applying")
        .map_err(|err| with_save_failures(err, &saved))?;

    output::print_validation(&report, &saved, format)?;

    match saved {
        Err(SaveError::Cancelled { .. }) => anyhow::bail!("Cancelled"),
        Err(err) => Err(err.into()),
        Ok(_) if !report.is_success() => anyhow::bail!("{}", report.message),
        Ok(_) => Ok(()),
    }
}

/// Validation could not run, so no summary will be printed. Keep the save
/// failures in the error instead.
fn with_save_failures(
    err: anyhow::Error,
    saved: &Result<SaveReport, SaveError>,
) -> anyhow::Error {
    match saved {
        Err(save) => err.context(save.to_string()),
        Ok(_) => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appforest_core::error::{Action, RemoteFailure, RemoteOperationError, ShapeMismatchError};

    fn mismatch() -> anyhow::Error {
        anyhow::Error::new(ShapeMismatchError {
            path: "/platform".to_string(),
            expected: "2 children".to_string(),
            found: "3 children".to_string(),
        })
        .context("Application tree changed while applying")
    }

    #[test]
    fn test_aborted_validation_keeps_save_failures() {
        let saved = Err(SaveError::Remote(vec![RemoteOperationError::new(
            "search",
            Action::Install,
            RemoteFailure::Timeout,
        )]));

        let err = with_save_failures(mismatch(), &saved);
        let rendered = format!("{err:#}");
        assert!(rendered.contains("failed to install 'search'"));
        assert!(rendered.contains("Application tree changed while applying"));
        assert!(rendered.contains("/platform"));
    }

    #[test]
    fn test_aborted_validation_after_clean_save() {
        let saved = Ok(SaveReport::default());

        let err = with_save_failures(mismatch(), &saved);
        assert_eq!(err.to_string(), "Application tree changed while applying");
    }
}
