//! Client for the Nacos MCP registry admin API.
//!
//! [`registry`] turns registry entries into typed [`registry::ServerModel`]s,
//! derives endpoints for remote servers and writes tool catalogs back.
//! [`config`] resolves connection settings.

pub mod config;
pub mod registry;
