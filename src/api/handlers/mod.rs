//! HTTP request handlers

pub mod auth;
pub mod chat;
pub mod groups;
pub mod health;
pub mod lifecycle;
