//! HTTP interface module.
//!
//! Serves the browser client, health and version probes, the tool list, the
//! session list and a non-streaming chat endpoint.

pub mod handlers;
pub mod routes;

pub(crate) mod assets;
pub(crate) mod monitoring;
