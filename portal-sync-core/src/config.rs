use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Region endpoint used when `portal.yaml` names none.
pub const DEFAULT_API_BASE_URL: &str = "https://us.api.konghq.tech";

/// Contents of `portal.yaml` at the root of a portal source tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalConfig {
    pub portal_id: String,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub menu: Option<MenuConfig>,
}

impl PortalConfig {
    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn trace_loaded(&self) {
        info!(
            portal_id = %self.portal_id,
            api_base_url = %self.api_base_url(),
            has_menu = self.menu.is_some(),
            "Loaded PortalConfig"
        );
        debug!(?self, "PortalConfig loaded (full debug)");
    }
}

/// Portal menu configuration, pushed as-is apart from item defaults.
///
/// `header` and `footer_bottom` are flat item lists and get their defaults
/// filled in; any other section (e.g. `footer_sections`) passes through.
/// Items missing `path` or `title` are sent with empty strings and left for
/// the remote API to reject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Vec<MenuItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_bottom: Option<Vec<MenuItem>>,
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub external: bool,
    /// Defaults to `true`. An explicit `public: false` is sent as written,
    /// so a private item stays private on the portal.
    #[serde(default = "default_public")]
    pub public: bool,
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

fn default_public() -> bool {
    true
}
