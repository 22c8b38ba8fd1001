//! Local portal source tree: reading pages, assets, menu config and API documents.
//!
//! Expected layout under the content root:
//!
//! ```text
//! portal.yaml
//! pages/*.md                 markdown with optional `---` YAML front matter
//! apis/<name>/openapi.yaml   one OpenAPI document per API product
//! assets/style.css
//! assets/robots.txt
//! ```
//!
//! Everything is read once, up front, into a [`PortalContent`] snapshot. The
//! reconciler never touches the filesystem.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::PortalConfig;
use crate::contract::{ApiProductPayload, ApiSpecPayload, ApiVersionPayload, Customization, PagePayload};

const FRONT_MATTER_DELIMITER: &str = "---";

pub const CONFIG_FILE: &str = "portal.yaml";
pub const PAGES_DIR: &str = "pages";
pub const APIS_DIR: &str = "apis";
pub const ASSETS_DIR: &str = "assets";
pub const OPENAPI_FILE: &str = "openapi.yaml";
pub const STYLE_FILE: &str = "style.css";
pub const ROBOTS_FILE: &str = "robots.txt";

#[derive(Debug)]
pub enum ContentError {
    Io { path: PathBuf, source: io::Error },
    Yaml { path: PathBuf, message: String },
    UnclosedFrontMatter { path: PathBuf },
    MissingDocument { path: PathBuf },
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            ContentError::Yaml { path, message } => {
                write!(f, "invalid YAML in {}: {message}", path.display())
            }
            ContentError::UnclosedFrontMatter { path } => {
                write!(f, "front matter in {} is never closed", path.display())
            }
            ContentError::MissingDocument { path } => {
                write!(f, "API directory has no OpenAPI document at {}", path.display())
            }
        }
    }
}

impl std::error::Error for ContentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContentError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Everything read from a portal source tree for one run.
#[derive(Debug, Clone)]
pub struct PortalContent {
    pub config: PortalConfig,
    pub pages: Vec<LocalPage>,
    pub customization: Customization,
    pub apis: Vec<LocalApiProduct>,
}

/// Front matter keys recognised on a page.
#[derive(Debug, Default, Deserialize)]
struct PageFrontMatter {
    title: Option<String>,
    visibility: Option<String>,
    published: Option<bool>,
    path: Option<String>,
}

/// A markdown page from `pages/`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalPage {
    /// Remote path, always starting with `/`. The page's natural key.
    pub url: String,
    pub title: Option<String>,
    pub visibility: Option<String>,
    pub published: Option<bool>,
    /// Markdown body after the front matter.
    pub content: String,
    pub file_path: PathBuf,
}

impl LocalPage {
    pub fn is_public(&self) -> bool {
        self.visibility.as_deref() == Some("public")
    }

    pub fn payload(&self) -> PagePayload {
        PagePayload {
            title: self.title.clone(),
            public: self.is_public(),
            published: self.published,
            content: self.content.trim().to_string(),
            path: self.url.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenApiDocument {
    info: OpenApiInfo,
}

#[derive(Debug, Deserialize)]
struct OpenApiInfo {
    title: String,
    #[serde(default)]
    description: Option<String>,
    // Unquoted versions such as `1.0` arrive as YAML numbers.
    version: serde_yaml::Value,
}

/// One API product, read from `apis/<name>/openapi.yaml`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalApiProduct {
    /// `info.title`; the product's natural key.
    pub title: String,
    pub description: Option<String>,
    /// `info.version` as written in the document.
    pub version: String,
    /// The raw OpenAPI document, uploaded verbatim.
    pub document: String,
    pub file_path: PathBuf,
}

impl LocalApiProduct {
    /// Remote version name: `v` followed by the major component of `info.version`.
    pub fn version_name(&self) -> String {
        major_version_name(&self.version)
    }

    pub fn product_payload(&self) -> ApiProductPayload {
        ApiProductPayload {
            name: self.title.clone(),
            description: self.description.clone(),
        }
    }

    pub fn version_payload(&self) -> ApiVersionPayload {
        ApiVersionPayload {
            name: self.version_name(),
        }
    }

    pub fn spec_payload(&self) -> ApiSpecPayload {
        ApiSpecPayload {
            name: OPENAPI_FILE.to_string(),
            content: BASE64.encode(self.document.as_bytes()),
        }
    }
}

/// `"2.3.1"` becomes `"v2"`; a leading `v` in the source is not repeated.
pub fn major_version_name(version: &str) -> String {
    let trimmed = version.trim().trim_start_matches(['v', 'V']);
    let major = trimmed.split('.').next().unwrap_or(trimmed);
    format!("v{major}")
}

/// Reads the whole portal source tree rooted at `root`.
pub fn load_content(root: &Path) -> Result<PortalContent, ContentError> {
    info!(root = %root.display(), "Loading portal content");

    let config = load_portal_config(root)?;
    config.trace_loaded();

    let pages = load_pages(&root.join(PAGES_DIR))?;
    let customization = load_customization(&root.join(ASSETS_DIR))?;
    let apis = load_apis(&root.join(APIS_DIR))?;

    info!(
        pages = pages.len(),
        apis = apis.len(),
        has_css = customization.css.is_some(),
        has_robots = customization.robots.is_some(),
        "Portal content loaded"
    );

    Ok(PortalContent {
        config,
        pages,
        customization,
        apis,
    })
}

pub fn load_portal_config(root: &Path) -> Result<PortalConfig, ContentError> {
    let path = root.join(CONFIG_FILE);
    let raw = read_file(&path)?;
    serde_yaml::from_str(&raw).map_err(|e| ContentError::Yaml {
        path,
        message: e.to_string(),
    })
}

/// Reads every `*.md` file in `dir`, in file-name order.
///
/// A missing directory yields no pages.
pub fn load_pages(dir: &Path) -> Result<Vec<LocalPage>, ContentError> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "No pages directory, skipping pages");
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = list_dir(dir)?
        .into_iter()
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();

    files.iter().map(|path| load_page(path)).collect()
}

pub fn load_page(path: &Path) -> Result<LocalPage, ContentError> {
    let raw = read_file(path)?;
    let (yaml, body) = split_front_matter(&raw, path)?;

    let front: PageFrontMatter = match yaml {
        Some(yaml) if !yaml.trim().is_empty() => {
            serde_yaml::from_str(&yaml).map_err(|e| ContentError::Yaml {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        }
        _ => PageFrontMatter::default(),
    };

    let url = match front.path.as_deref() {
        Some(explicit) => format!("/{}", explicit.trim_start_matches('/')),
        None => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("/{stem}")
        }
    };

    debug!(file = %path.display(), url = %url, "Parsed page");

    Ok(LocalPage {
        url,
        title: front.title,
        visibility: front.visibility,
        published: front.published,
        content: body,
        file_path: path.to_path_buf(),
    })
}

/// Splits `---` delimited front matter from the body.
///
/// Returns `None` for the YAML part when the file does not open with a
/// delimiter line, in which case the whole file is body. A leading UTF-8 BOM
/// is dropped first.
pub fn split_front_matter(
    content: &str,
    path: &Path,
) -> Result<(Option<String>, String), ContentError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let lines: Vec<&str> = content.lines().collect();

    if lines.first().map(|l| l.trim()) != Some(FRONT_MATTER_DELIMITER) {
        return Ok((None, content.to_string()));
    }

    let closing = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| line.trim() == FRONT_MATTER_DELIMITER)
        .map(|(i, _)| i)
        .ok_or_else(|| ContentError::UnclosedFrontMatter {
            path: path.to_path_buf(),
        })?;

    let yaml = lines[1..closing].join("\n");
    let body = lines[closing + 1..].join("\n");
    Ok((Some(yaml), body))
}

/// Reads `style.css` and `robots.txt`; either may be absent.
pub fn load_customization(assets_dir: &Path) -> Result<Customization, ContentError> {
    Ok(Customization {
        css: read_optional(&assets_dir.join(STYLE_FILE))?,
        robots: read_optional(&assets_dir.join(ROBOTS_FILE))?,
    })
}

/// Reads one API product per subdirectory of `dir`, in directory-name order.
///
/// A missing directory yields no APIs.
pub fn load_apis(dir: &Path) -> Result<Vec<LocalApiProduct>, ContentError> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "No apis directory, skipping APIs");
        return Ok(Vec::new());
    }

    let mut api_dirs: Vec<PathBuf> = list_dir(dir)?.into_iter().filter(|p| p.is_dir()).collect();
    api_dirs.sort();

    api_dirs.iter().map(|api_dir| load_api(api_dir)).collect()
}

pub fn load_api(api_dir: &Path) -> Result<LocalApiProduct, ContentError> {
    let path = api_dir.join(OPENAPI_FILE);
    if !path.is_file() {
        return Err(ContentError::MissingDocument { path });
    }

    let document = read_file(&path)?;
    let parsed: OpenApiDocument =
        serde_yaml::from_str(&document).map_err(|e| ContentError::Yaml {
            path: path.clone(),
            message: e.to_string(),
        })?;

    let version = match parsed.info.version {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        other => {
            return Err(ContentError::Yaml {
                path,
                message: format!("info.version must be a string or number, got {other:?}"),
            })
        }
    };

    debug!(file = %path.display(), title = %parsed.info.title, version = %version, "Parsed OpenAPI document");

    Ok(LocalApiProduct {
        title: parsed.info.title,
        description: parsed.info.description,
        version,
        document,
        file_path: path,
    })
}

fn read_file(path: &Path) -> Result<String, ContentError> {
    fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_optional(path: &Path) -> Result<Option<String>, ContentError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(file = %path.display(), "Asset not found, leaving it unchanged remotely");
            Ok(None)
        }
        Err(source) => Err(ContentError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, ContentError> {
    let io_err = |source| ContentError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        entries.push(entry.map_err(io_err)?.path());
    }
    Ok(entries)
}
