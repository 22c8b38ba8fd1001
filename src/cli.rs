///
/// This module implements the CLI interface for portal-sync: command parsing,
/// the async `run` entrypoint and user-visible output.
///
/// All content handling and reconciliation lives in [`portal-sync-core`];
/// this module wires config loading, the HTTP client and the reconciler together.
///
/// - For command-line users: use the installed `portal-sync` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`portal-sync-core`]: ../../portal-sync-core/
use crate::client::KonnectClient;
use crate::load_config::load_config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use portal_sync_core::synchronise::{synchronise, SynchroniseReport, UpsertAction};
use std::path::PathBuf;

/// CLI for portal-sync: push a local developer portal source tree to Konnect.
#[derive(Parser)]
#[clap(
    name = "portal-sync",
    version,
    about = "Synchronise pages, styles, menus and API specs to a Konnect developer portal"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create or update every page, asset, menu and API from the portal source tree
    Sync {
        /// Root of the portal source tree (holds portal.yaml)
        #[clap(long, default_value = ".")]
        root: PathBuf,
        /// Konnect personal access token; INPUT_KONNECT_PAT overrides it
        #[clap(long)]
        pat: Option<String>,
        /// Konnect API base URL, overriding apiBaseUrl in portal.yaml
        #[clap(long)]
        api_url: Option<String>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { root, pat, api_url } => {
            let settings = load_config(root, pat, api_url)?;
            let client = KonnectClient::new(&settings.api_base_url, settings.token)
                .map_err(|e| anyhow::anyhow!("Failed to construct API client: {e}"))?;
            tracing::info!(
                command = "sync",
                root = %settings.root.display(),
                api_base_url = %client.base_url(),
                "Starting synchronisation process"
            );

            match synchronise(&settings.content.config.portal_id, &settings.content, &client).await
            {
                Ok(report) => {
                    tracing::info!(command = "sync", ?report, "Synchronisation complete");
                    print_summary(&report);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "sync", error = %e, "Synchronisation failed");
                    Err(anyhow::Error::new(e).context("Synchronisation failed"))
                }
            }
        }
    }
}

fn print_summary(report: &SynchroniseReport) {
    println!(
        "Synchronise complete: {} created, {} updated.",
        report.created(),
        report.updated()
    );
    for page in &report.pages {
        println!("  page {:<30} {}", page.key, action_label(page.action));
    }
    if report.customization_pushed {
        println!("  customization                  updated");
    }
    if report.menu_pushed {
        println!("  menu                           updated");
    }
    for product in &report.api_products {
        println!("  api  {:<30} {}", product.key, action_label(product.action));
    }
    for version in &report.api_versions {
        println!(
            "  api  {:<30} {} {}, spec {}",
            version.product,
            version.version.key,
            action_label(version.version.action),
            action_label(version.spec.action)
        );
    }
}

fn action_label(action: UpsertAction) -> &'static str {
    match action {
        UpsertAction::Created => "created",
        UpsertAction::Updated => "updated",
    }
}
