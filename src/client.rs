#![doc = "Konnect API client: the reqwest-backed `PortalApi` used by the CLI."]
//
//! # KonnectClient
//!
//! Bridges the [`PortalApi`] trait from `portal-sync-core` to the Konnect v2
//! management API over HTTPS.
//!
//! - Every request carries `Authorization: Bearer <token>` and JSON bodies.
//! - List endpoints answer `{"data": [...]}`; create/update answer the entity.
//! - Any non-2xx status becomes an [`HttpError`] holding the method, path,
//!   status and response body. Transport and decode failures are errors too.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use portal_sync_core::config::MenuConfig;
use portal_sync_core::contract::{
    ApiError, ApiProductPayload, ApiSpecPayload, ApiVersionPayload, Customization, PagePayload,
    PortalApi, RemoteApiProduct, RemoteApiSpec, RemoteApiVersion, RemotePage,
};

/// A request that reached the server but was answered with a non-success status.
#[derive(Debug)]
pub struct HttpError {
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    pub body: String,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} failed (HTTP {}): {}",
            self.method, self.path, self.status, self.body
        )
    }
}

impl std::error::Error for HttpError {}

#[derive(Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
}

/// `{"data": ...}` wrapper used by the portal customization and config endpoints.
#[derive(Serialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Serialize)]
struct MenuBody<'a> {
    menu: &'a MenuConfig,
}

pub struct KonnectClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl KonnectClient {
    pub fn new(base_url: &str, token: String) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("portal-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        tracing::info!(
            base_url = %base_url,
            token_set = !token.is_empty(),
            "Initialized KonnectClient"
        );
        Ok(KonnectClient {
            http,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<String, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "Sending request");

        let mut req = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| {
            tracing::error!(error = ?e, %method, path, "Request failed to send");
            e
        })?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            tracing::error!(%status, %method, path, body = %text, "API returned an error status");
            return Err(Box::new(HttpError {
                method,
                path: path.to_string(),
                status,
                body: text,
            }));
        }
        tracing::debug!(%status, %method, path, "Request succeeded");
        Ok(text)
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let text = self.send(method, path, body).await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(error = %e, path, body = %text, "Failed to decode response body");
            format!("failed to decode response from {path}: {e}").into()
        })
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let list: ListResponse<T> = self.send_json::<(), _>(Method::GET, path, None).await?;
        tracing::info!(count = list.data.len(), path, "Fetched remote collection");
        Ok(list.data)
    }
}

fn pages_path(portal_id: &str) -> String {
    format!("/v2/portals/{portal_id}/pages")
}

fn versions_path(product_id: &str) -> String {
    format!("/v2/api-products/{product_id}/product-versions")
}

fn specs_path(product_id: &str, version_id: &str) -> String {
    format!(
        "{}/{version_id}/specifications",
        versions_path(product_id)
    )
}

#[async_trait]
impl PortalApi for KonnectClient {
    async fn list_pages(&self, portal_id: &str) -> Result<Vec<RemotePage>, ApiError> {
        self.list(&pages_path(portal_id)).await
    }

    async fn create_page(
        &self,
        portal_id: &str,
        page: &PagePayload,
    ) -> Result<RemotePage, ApiError> {
        tracing::info!(portal_id, path = %page.path, "Creating portal page");
        self.send_json(Method::POST, &pages_path(portal_id), Some(page))
            .await
    }

    async fn update_page(
        &self,
        portal_id: &str,
        page_id: &str,
        page: &PagePayload,
    ) -> Result<RemotePage, ApiError> {
        tracing::info!(portal_id, page_id, path = %page.path, "Updating portal page");
        let path = format!("{}/{page_id}", pages_path(portal_id));
        self.send_json(Method::PATCH, &path, Some(page)).await
    }

    async fn update_customization(
        &self,
        portal_id: &str,
        customization: &Customization,
    ) -> Result<(), ApiError> {
        tracing::info!(portal_id, "Updating portal customization");
        let path = format!("/v2/portals/{portal_id}/customization");
        let body = DataEnvelope {
            data: customization,
        };
        self.send(Method::PATCH, &path, Some(&body)).await?;
        Ok(())
    }

    async fn update_menu(&self, portal_id: &str, menu: &MenuConfig) -> Result<(), ApiError> {
        tracing::info!(portal_id, "Updating portal menu");
        let path = format!("/v2/portals/{portal_id}/config");
        let body = DataEnvelope {
            data: MenuBody { menu },
        };
        self.send(Method::PATCH, &path, Some(&body)).await?;
        Ok(())
    }

    async fn list_api_products(&self) -> Result<Vec<RemoteApiProduct>, ApiError> {
        self.list("/v2/api-products").await
    }

    async fn create_api_product(
        &self,
        product: &ApiProductPayload,
    ) -> Result<RemoteApiProduct, ApiError> {
        tracing::info!(name = %product.name, "Creating API product");
        self.send_json(Method::POST, "/v2/api-products", Some(product))
            .await
    }

    async fn update_api_product(
        &self,
        product_id: &str,
        product: &ApiProductPayload,
    ) -> Result<RemoteApiProduct, ApiError> {
        tracing::info!(product_id, name = %product.name, "Updating API product");
        let path = format!("/v2/api-products/{product_id}");
        self.send_json(Method::PATCH, &path, Some(product)).await
    }

    async fn list_api_versions(
        &self,
        product_id: &str,
    ) -> Result<Vec<RemoteApiVersion>, ApiError> {
        self.list(&versions_path(product_id)).await
    }

    async fn create_api_version(
        &self,
        product_id: &str,
        version: &ApiVersionPayload,
    ) -> Result<RemoteApiVersion, ApiError> {
        tracing::info!(product_id, version = %version.name, "Creating API product version");
        self.send_json(Method::POST, &versions_path(product_id), Some(version))
            .await
    }

    async fn update_api_version(
        &self,
        product_id: &str,
        version_id: &str,
        version: &ApiVersionPayload,
    ) -> Result<RemoteApiVersion, ApiError> {
        tracing::info!(product_id, version_id, version = %version.name, "Updating API product version");
        let path = format!("{}/{version_id}", versions_path(product_id));
        self.send_json(Method::PATCH, &path, Some(version)).await
    }

    async fn list_api_specs(
        &self,
        product_id: &str,
        version_id: &str,
    ) -> Result<Vec<RemoteApiSpec>, ApiError> {
        self.list(&specs_path(product_id, version_id)).await
    }

    async fn create_api_spec(
        &self,
        product_id: &str,
        version_id: &str,
        spec: &ApiSpecPayload,
    ) -> Result<RemoteApiSpec, ApiError> {
        tracing::info!(product_id, version_id, name = %spec.name, "Creating API specification");
        self.send_json(Method::POST, &specs_path(product_id, version_id), Some(spec))
            .await
    }

    async fn update_api_spec(
        &self,
        product_id: &str,
        version_id: &str,
        spec_id: &str,
        spec: &ApiSpecPayload,
    ) -> Result<RemoteApiSpec, ApiError> {
        tracing::info!(product_id, version_id, spec_id, "Updating API specification");
        let path = format!("{}/{spec_id}", specs_path(product_id, version_id));
        self.send_json(Method::PATCH, &path, Some(spec)).await
    }
}
