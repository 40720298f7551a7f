//! HTTP plumbing for the Strata data platform client.
//!
//! This crate provides the transport layer shared by the resource crates:
//!
//! - [`ApiClient`] - reqwest client with connection pooling, auth and retries
//! - [`endpoints`] - REST path and query construction
//! - [`evaluate`] - maps API error envelopes to typed errors
//! - [`CacheDir`] - local disk cache for pages and invocation results

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cache;
mod client;
pub mod endpoints;
pub mod evaluate;

pub use cache::{CacheDir, TtlEntry};
pub use client::{ApiClient, ClientConfig, DEFAULT_BASE_URL, api_key_from_env};
