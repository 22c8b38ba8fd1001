#![doc = "portal-sync-core: core logic library for portal-sync."]

//! This crate contains the content model, the remote portal API contract and
//! the reconciler that pushes a local portal source tree to a developer portal.
//! The HTTP client and CLI live in the `portal-sync` crate.
//!
//! # Usage
//! Load a [`content::PortalContent`] snapshot, then hand it to
//! [`synchronise::synchronise`] together with any [`contract::PortalApi`]
//! implementation.

pub mod config;
pub mod content;
pub mod contract;
pub mod synchronise;
