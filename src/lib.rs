//! Stardust - Proxy Pool Management Service
//!
//! Backend engine for browser-automation chat sessions.
//!
//! ## Features
//!
//! - Proxy group registry with round-robin and random rotation
//! - Binary RPC surface exposing the registry to local clients
//! - Concurrent three-way session bootstrap (proxy, storage, driver)
//! - HTTP management API with JWT-protected group administration
//! - SQLite persistence for groups, sessions and messages

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod registry;
pub mod repository;
pub mod rpc;

pub use config::Config;
pub use database::Database;
pub use error::{Result, StardustError};
pub use registry::Registry;
