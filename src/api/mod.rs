//! HTTP surface
//!
//! Session bootstrap and administrative endpoints. The RPC surface for
//! automation workers lives in `crate::rpc`; this server carries everything
//! a human operator or the desktop shell talks to.

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use server::{ApiServer, AppState};
