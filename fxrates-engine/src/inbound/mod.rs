//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server that drives the workflow engine.

mod handlers;
mod server;

pub use server::HttpServer;
