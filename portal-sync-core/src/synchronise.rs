//! Reconciler: pushes a local [`PortalContent`] snapshot to the remote portal.
//!
//! Every resource kind goes through the same upsert-by-key pass:
//!   - list the remote collection and index it by its natural key
//!   - for each local item, update the remote entity with the same key, or create one
//!
//! Phases run strictly in order, each call awaited before the next:
//! pages → customization (style/robots) → menu → API products → API versions and specs.
//!
//! # Keys
//! - pages: URL path (`/pricing`)
//! - API products: `info.title`
//! - API versions: `v<major>` under their product
//! - specs: the first specification listed under the version, if any
//!
//! # Error Handling
//! Fail-fast. The first failing remote call aborts the run with a [`SyncError`]
//! naming the phase and item; earlier calls are not rolled back. Nothing is
//! ever deleted remotely.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, error, info, warn};

use crate::config::MenuConfig;
use crate::content::{LocalApiProduct, LocalPage, PortalContent};
use crate::contract::{ApiError, Customization, PortalApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Pages,
    Customization,
    Menu,
    ApiProducts,
    ApiVersions,
    ApiSpecs,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::Pages => "pages",
            SyncPhase::Customization => "customization",
            SyncPhase::Menu => "menu",
            SyncPhase::ApiProducts => "api products",
            SyncPhase::ApiVersions => "api versions",
            SyncPhase::ApiSpecs => "api specs",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum SyncError {
    /// A remote call failed while reconciling `key`.
    Remote {
        phase: SyncPhase,
        key: String,
        source: ApiError,
    },
    /// No product id is known for an API whose versions are being synced.
    UnknownProduct { title: String },
}

impl SyncError {
    fn remote(phase: SyncPhase, key: &str, source: ApiError) -> Self {
        error!(%phase, key, error = %source, "[SYNC][ERROR] Remote call failed");
        SyncError::Remote {
            phase,
            key: key.to_string(),
            source,
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Remote { phase, key, source } => {
                write!(f, "syncing {phase} failed at {key}: {source}")
            }
            SyncError::UnknownProduct { title } => {
                write!(f, "no remote API product id known for {title}")
            }
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Remote { source, .. } => Some(&**source),
            SyncError::UnknownProduct { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Created,
    Updated,
}

/// Outcome of one upsert: the natural key, the remote id and what was done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertReport {
    pub key: String,
    pub remote_id: String,
    pub action: UpsertAction,
}

/// Version and spec outcomes for one API product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersionReport {
    pub product: String,
    pub version: UpsertReport,
    pub spec: UpsertReport,
}

#[derive(Debug, Default)]
pub struct SynchroniseReport {
    pub pages: Vec<UpsertReport>,
    pub customization_pushed: bool,
    pub menu_pushed: bool,
    pub api_products: Vec<UpsertReport>,
    pub api_versions: Vec<ApiVersionReport>,
}

impl SynchroniseReport {
    /// Number of create calls issued across all phases.
    pub fn created(&self) -> usize {
        self.all_upserts()
            .filter(|r| r.action == UpsertAction::Created)
            .count()
    }

    /// Number of update calls issued across all phases.
    pub fn updated(&self) -> usize {
        self.all_upserts()
            .filter(|r| r.action == UpsertAction::Updated)
            .count()
    }

    fn all_upserts(&self) -> impl Iterator<Item = &UpsertReport> {
        self.pages
            .iter()
            .chain(self.api_products.iter())
            .chain(
                self.api_versions
                    .iter()
                    .flat_map(|v| [&v.version, &v.spec]),
            )
    }
}

/// Indexes a remote collection by its natural key. Later entries win on duplicates.
pub fn index_by_key<T, F>(items: Vec<T>, key: F) -> HashMap<String, T>
where
    F: Fn(&T) -> &str,
{
    let mut index = HashMap::with_capacity(items.len());
    for item in items {
        index.insert(key(&item).to_string(), item);
    }
    index
}

/// Runs every phase against `portal_id`, in order.
pub async fn synchronise<A>(
    portal_id: &str,
    content: &PortalContent,
    api: &A,
) -> Result<SynchroniseReport, SyncError>
where
    A: PortalApi,
{
    info!(portal_id, "[SYNC] Starting portal synchronisation");

    let pages = sync_pages(portal_id, &content.pages, api).await?;
    let customization_pushed = sync_customization(portal_id, &content.customization, api).await?;
    let menu_pushed = sync_menu(portal_id, content.config.menu.as_ref(), api).await?;
    let (api_products, product_ids) = sync_api_products(&content.apis, api).await?;
    let api_versions = sync_api_versions(&content.apis, &product_ids, api).await?;

    let report = SynchroniseReport {
        pages,
        customization_pushed,
        menu_pushed,
        api_products,
        api_versions,
    };
    info!(
        created = report.created(),
        updated = report.updated(),
        customization_pushed,
        menu_pushed,
        "[SYNC] Portal synchronisation complete"
    );
    Ok(report)
}

/// Upserts every local page, keyed on its URL path.
pub async fn sync_pages<A>(
    portal_id: &str,
    pages: &[LocalPage],
    api: &A,
) -> Result<Vec<UpsertReport>, SyncError>
where
    A: PortalApi,
{
    info!(count = pages.len(), "[SYNC] Syncing pages");

    let remote = api
        .list_pages(portal_id)
        .await
        .map_err(|e| SyncError::remote(SyncPhase::Pages, portal_id, e))?;
    let mut by_path = index_by_key(remote, |p| p.path.as_str());
    debug!(remote_pages = by_path.len(), "[SYNC] Indexed remote pages");

    let mut reports = Vec::with_capacity(pages.len());
    for page in pages {
        let body = page.payload();
        let report = match by_path.get(&page.url) {
            Some(existing) => {
                info!(url = %page.url, page_id = %existing.id, "[SYNC] Updating page");
                let updated = api
                    .update_page(portal_id, &existing.id, &body)
                    .await
                    .map_err(|e| SyncError::remote(SyncPhase::Pages, &page.url, e))?;
                UpsertReport {
                    key: page.url.clone(),
                    remote_id: updated.id,
                    action: UpsertAction::Updated,
                }
            }
            None => {
                info!(url = %page.url, "[SYNC] Creating page");
                let created = api
                    .create_page(portal_id, &body)
                    .await
                    .map_err(|e| SyncError::remote(SyncPhase::Pages, &page.url, e))?;
                let report = UpsertReport {
                    key: page.url.clone(),
                    remote_id: created.id.clone(),
                    action: UpsertAction::Created,
                };
                // A second local page with the same path must update, not duplicate.
                by_path.insert(page.url.clone(), created);
                report
            }
        };
        reports.push(report);
    }
    Ok(reports)
}

/// Pushes the stylesheet and robots.txt. Returns whether a call was made.
pub async fn sync_customization<A>(
    portal_id: &str,
    customization: &Customization,
    api: &A,
) -> Result<bool, SyncError>
where
    A: PortalApi,
{
    if customization.is_empty() {
        warn!("[SYNC] No style or robots asset found, skipping customization");
        return Ok(false);
    }

    info!(
        css = customization.css.is_some(),
        robots = customization.robots.is_some(),
        "[SYNC] Syncing styles and robots"
    );
    api.update_customization(portal_id, customization)
        .await
        .map_err(|e| SyncError::remote(SyncPhase::Customization, portal_id, e))?;
    Ok(true)
}

/// Pushes the menu configuration. Returns whether a call was made.
pub async fn sync_menu<A>(
    portal_id: &str,
    menu: Option<&MenuConfig>,
    api: &A,
) -> Result<bool, SyncError>
where
    A: PortalApi,
{
    let Some(menu) = menu else {
        info!("[SYNC] No menu in portal config, skipping menus");
        return Ok(false);
    };

    info!(
        header_items = menu.header.as_ref().map_or(0, Vec::len),
        footer_bottom_items = menu.footer_bottom.as_ref().map_or(0, Vec::len),
        "[SYNC] Syncing menus"
    );
    api.update_menu(portal_id, menu)
        .await
        .map_err(|e| SyncError::remote(SyncPhase::Menu, portal_id, e))?;
    Ok(true)
}

/// Upserts every API product, keyed on its title.
///
/// Also returns the remote id of each product by title, for the version pass.
pub async fn sync_api_products<A>(
    apis: &[LocalApiProduct],
    api: &A,
) -> Result<(Vec<UpsertReport>, HashMap<String, String>), SyncError>
where
    A: PortalApi,
{
    info!(count = apis.len(), "[SYNC] Syncing APIs");
    if apis.is_empty() {
        return Ok((Vec::new(), HashMap::new()));
    }

    let remote = api
        .list_api_products()
        .await
        .map_err(|e| SyncError::remote(SyncPhase::ApiProducts, "api-products", e))?;
    let mut by_name = index_by_key(remote, |p| p.name.as_str());

    let mut reports = Vec::with_capacity(apis.len());
    let mut product_ids = HashMap::with_capacity(apis.len());
    for local in apis {
        let body = local.product_payload();
        let report = match by_name.get(&local.title) {
            Some(existing) => {
                info!(name = %local.title, product_id = %existing.id, "[SYNC] Updating API");
                let updated = api
                    .update_api_product(&existing.id, &body)
                    .await
                    .map_err(|e| SyncError::remote(SyncPhase::ApiProducts, &local.title, e))?;
                UpsertReport {
                    key: local.title.clone(),
                    remote_id: updated.id,
                    action: UpsertAction::Updated,
                }
            }
            None => {
                info!(name = %local.title, "[SYNC] Creating API");
                let created = api
                    .create_api_product(&body)
                    .await
                    .map_err(|e| SyncError::remote(SyncPhase::ApiProducts, &local.title, e))?;
                let report = UpsertReport {
                    key: local.title.clone(),
                    remote_id: created.id.clone(),
                    action: UpsertAction::Created,
                };
                by_name.insert(local.title.clone(), created);
                report
            }
        };
        product_ids.insert(local.title.clone(), report.remote_id.clone());
        reports.push(report);
    }
    Ok((reports, product_ids))
}

/// For each API: upserts its `v<major>` version under the product, then its spec
/// document under that version.
pub async fn sync_api_versions<A>(
    apis: &[LocalApiProduct],
    product_ids: &HashMap<String, String>,
    api: &A,
) -> Result<Vec<ApiVersionReport>, SyncError>
where
    A: PortalApi,
{
    let mut reports = Vec::with_capacity(apis.len());
    for local in apis {
        let product_id = product_ids
            .get(&local.title)
            .ok_or_else(|| SyncError::UnknownProduct {
                title: local.title.clone(),
            })?;

        let version = upsert_version(product_id, local, api).await?;
        let spec = upsert_spec(product_id, &version.remote_id, local, api).await?;

        reports.push(ApiVersionReport {
            product: local.title.clone(),
            version,
            spec,
        });
    }
    Ok(reports)
}

async fn upsert_version<A>(
    product_id: &str,
    local: &LocalApiProduct,
    api: &A,
) -> Result<UpsertReport, SyncError>
where
    A: PortalApi,
{
    let name = local.version_name();
    let key = format!("{} {}", local.title, name);
    let body = local.version_payload();

    let remote = api
        .list_api_versions(product_id)
        .await
        .map_err(|e| SyncError::remote(SyncPhase::ApiVersions, &key, e))?;
    let by_name = index_by_key(remote, |v| v.name.as_str());

    match by_name.get(&name) {
        Some(existing) => {
            info!(api = %local.title, version = %name, version_id = %existing.id, "[SYNC] Updating API version");
            let updated = api
                .update_api_version(product_id, &existing.id, &body)
                .await
                .map_err(|e| SyncError::remote(SyncPhase::ApiVersions, &key, e))?;
            Ok(UpsertReport {
                key: name,
                remote_id: updated.id,
                action: UpsertAction::Updated,
            })
        }
        None => {
            info!(api = %local.title, version = %name, "[SYNC] Creating API version");
            let created = api
                .create_api_version(product_id, &body)
                .await
                .map_err(|e| SyncError::remote(SyncPhase::ApiVersions, &key, e))?;
            Ok(UpsertReport {
                key: name,
                remote_id: created.id,
                action: UpsertAction::Created,
            })
        }
    }
}

async fn upsert_spec<A>(
    product_id: &str,
    version_id: &str,
    local: &LocalApiProduct,
    api: &A,
) -> Result<UpsertReport, SyncError>
where
    A: PortalApi,
{
    let key = format!("{} {}", local.title, local.version_name());
    let body = local.spec_payload();

    let remote = api
        .list_api_specs(product_id, version_id)
        .await
        .map_err(|e| SyncError::remote(SyncPhase::ApiSpecs, &key, e))?;

    match remote.first() {
        Some(existing) => {
            info!(api = %local.title, spec_id = %existing.id, "[SYNC] Updating API spec");
            let updated = api
                .update_api_spec(product_id, version_id, &existing.id, &body)
                .await
                .map_err(|e| SyncError::remote(SyncPhase::ApiSpecs, &key, e))?;
            Ok(UpsertReport {
                key: body.name,
                remote_id: updated.id,
                action: UpsertAction::Updated,
            })
        }
        None => {
            info!(api = %local.title, "[SYNC] Creating API spec");
            let created = api
                .create_api_spec(product_id, version_id, &body)
                .await
                .map_err(|e| SyncError::remote(SyncPhase::ApiSpecs, &key, e))?;
            Ok(UpsertReport {
                key: body.name,
                remote_id: created.id,
                action: UpsertAction::Created,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::RemotePage;

    #[test]
    fn index_by_key_keeps_last_duplicate() {
        let pages = vec![
            RemotePage {
                id: "1".into(),
                path: "/a".into(),
                title: None,
            },
            RemotePage {
                id: "2".into(),
                path: "/a".into(),
                title: None,
            },
        ];
        let index = index_by_key(pages, |p| p.path.as_str());
        assert_eq!(index.len(), 1);
        assert_eq!(index["/a"].id, "2");
    }
}
