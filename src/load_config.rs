/// `load_config` module: turns CLI flags, environment and the portal source tree
/// into the [`SyncSettings`] a run needs.
///
/// # Responsibilities
/// - Read the portal source tree (`portal.yaml`, pages, assets, APIs) through `portal-sync-core`
/// - Resolve the API token: the `INPUT_KONNECT_PAT` environment variable wins over `--pat`
/// - Resolve the API base URL: `--api-url`, then `apiBaseUrl` in `portal.yaml`, then the default region
///
/// # Errors
/// All errors use `anyhow::Error` with context and are surfaced at the CLI boundary.
use anyhow::{Context, Result};
use portal_sync_core::content::{load_content, PortalContent};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Environment variable holding the API token. Set by the GitHub Action wrapper.
pub const PAT_ENV_VAR: &str = "INPUT_KONNECT_PAT";

#[derive(Debug)]
pub struct SyncSettings {
    pub root: PathBuf,
    pub content: PortalContent,
    pub token: String,
    pub api_base_url: String,
}

/// Picks the API token: a non-empty `INPUT_KONNECT_PAT` overrides the flag.
pub fn resolve_token(flag: Option<String>) -> Result<String> {
    match std::env::var(PAT_ENV_VAR) {
        Ok(token) if !token.trim().is_empty() => {
            info!("{PAT_ENV_VAR} found in env, overriding --pat");
            return Ok(token);
        }
        _ => {}
    }

    match flag {
        Some(token) if !token.trim().is_empty() => {
            info!("Using API token from --pat");
            Ok(token)
        }
        _ => {
            error!("No API token given via --pat or {PAT_ENV_VAR}");
            anyhow::bail!("No API token: pass --pat or set {PAT_ENV_VAR}")
        }
    }
}

/// Loads the portal source tree at `root` and resolves credentials.
pub fn load_config<P: AsRef<Path>>(
    root: P,
    pat: Option<String>,
    api_url: Option<String>,
) -> Result<SyncSettings> {
    let root = root.as_ref();
    info!(root = ?root, "Loading portal content");

    let content = load_content(root)
        .with_context(|| format!("Failed to load portal content from {}", root.display()))?;

    let token = resolve_token(pat)?;

    let api_base_url = match api_url {
        Some(url) => {
            info!(api_base_url = %url, "Using API base URL from --api-url");
            url
        }
        None => content.config.api_base_url().to_string(),
    };

    info!(
        portal_id = %content.config.portal_id,
        api_base_url = %api_base_url,
        "Config loaded and merged successfully"
    );

    Ok(SyncSettings {
        root: root.to_path_buf(),
        content,
        token,
        api_base_url,
    })
}
