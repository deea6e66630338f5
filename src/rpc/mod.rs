//! Binary RPC surface for the proxy registry
//!
//! Exposes `ProxyService` over TCP: length-prefixed frames carrying
//! prost-encoded request/response envelopes. Each call is stateless; status
//! codes follow gRPC numbering so remote callers can map failures uniformly.

pub mod client;
pub mod proto;
pub mod server;
pub mod wire;

pub use client::RpcClient;
pub use server::RpcServer;
