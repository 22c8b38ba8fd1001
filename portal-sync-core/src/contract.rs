#![allow(unused)]

//! # contract: Remote portal API interface
//!
//! This module defines a single trait (`PortalApi`) and the request/response
//! types exchanged with the developer-portal management API: portal pages,
//! portal customization and menu config, API products, their versions and the
//! specification documents attached to each version.
//!
//! ## Interface & Extensibility
//! - Implement [`PortalApi`] to target a real backend (see the CLI crate's
//!   `KonnectClient`) or an in-memory double.
//! - All methods are async and return [`ApiError`], a boxed error.
//! - Every list call returns the full remote collection; the reconciler keys it.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`, so tests get a `MockPortalApi`
//!   (exported with the `test-export-mocks` feature).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mockall::{automock, predicate::*};

use crate::config::MenuConfig;

/// Error type for every remote call.
pub type ApiError = Box<dyn std::error::Error + Send + Sync>;

/// A portal page as it exists remotely.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RemotePage {
    pub id: String,
    pub path: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Body for creating or updating a portal page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    pub content: String,
    pub path: String,
}

/// Stylesheet and robots.txt pushed as portal customization.
///
/// Absent fields are left untouched remotely.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Customization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robots: Option<String>,
}

impl Customization {
    pub fn is_empty(&self) -> bool {
        self.css.is_none() && self.robots.is_none()
    }
}

/// An API product as it exists remotely.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RemoteApiProduct {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body for creating or updating an API product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiProductPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A product version as it exists remotely.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RemoteApiVersion {
    pub id: String,
    pub name: String,
}

/// Body for creating or updating a product version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiVersionPayload {
    pub name: String,
}

/// A specification document attached to a product version.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RemoteApiSpec {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Body for creating or updating a specification document.
///
/// `content` is the raw document, base64 encoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiSpecPayload {
    pub name: String,
    pub content: String,
}

/// Trait for reading and writing developer-portal resources.
///
/// Implementors own transport, authentication and the base URL. Any failed
/// request (transport, non-success status, undecodable body) must surface as
/// an `Err`; callers never inspect raw responses.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PortalApi: Send + Sync {
    /// List every page of a portal.
    async fn list_pages(&self, portal_id: &str) -> Result<Vec<RemotePage>, ApiError>;

    async fn create_page(
        &self,
        portal_id: &str,
        page: &PagePayload,
    ) -> Result<RemotePage, ApiError>;

    async fn update_page(
        &self,
        portal_id: &str,
        page_id: &str,
        page: &PagePayload,
    ) -> Result<RemotePage, ApiError>;

    /// Replace the portal's stylesheet and/or robots.txt.
    async fn update_customization(
        &self,
        portal_id: &str,
        customization: &Customization,
    ) -> Result<(), ApiError>;

    /// Replace the portal's menu configuration.
    async fn update_menu(&self, portal_id: &str, menu: &MenuConfig) -> Result<(), ApiError>;

    async fn list_api_products(&self) -> Result<Vec<RemoteApiProduct>, ApiError>;

    async fn create_api_product(
        &self,
        product: &ApiProductPayload,
    ) -> Result<RemoteApiProduct, ApiError>;

    async fn update_api_product(
        &self,
        product_id: &str,
        product: &ApiProductPayload,
    ) -> Result<RemoteApiProduct, ApiError>;

    async fn list_api_versions(&self, product_id: &str)
        -> Result<Vec<RemoteApiVersion>, ApiError>;

    async fn create_api_version(
        &self,
        product_id: &str,
        version: &ApiVersionPayload,
    ) -> Result<RemoteApiVersion, ApiError>;

    async fn update_api_version(
        &self,
        product_id: &str,
        version_id: &str,
        version: &ApiVersionPayload,
    ) -> Result<RemoteApiVersion, ApiError>;

    async fn list_api_specs(
        &self,
        product_id: &str,
        version_id: &str,
    ) -> Result<Vec<RemoteApiSpec>, ApiError>;

    async fn create_api_spec(
        &self,
        product_id: &str,
        version_id: &str,
        spec: &ApiSpecPayload,
    ) -> Result<RemoteApiSpec, ApiError>;

    async fn update_api_spec(
        &self,
        product_id: &str,
        version_id: &str,
        spec_id: &str,
        spec: &ApiSpecPayload,
    ) -> Result<RemoteApiSpec, ApiError>;
}
