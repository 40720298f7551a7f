//! Data Service resource operations for the Strata client.
//!
//! A [`DataService`] is a handle on one service of the platform:
//!
//! - [`DataService::metadata`] / [`DataService::request_definition`] -
//!   service metadata and input contract
//! - [`DataService::invoke`] - validated invocation with an optional
//!   on-disk TTL cache
//! - [`DataService::enrich`] - bulk invocation over records

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod enrich;
mod service;

pub use enrich::InputMapping;
pub use service::DataService;
