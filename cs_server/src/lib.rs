//! HTTP server for the courtside matchmaking engine.
//!
//! Exposes the host-facing matchmaking API over axum, with bearer-token
//! authentication, request ids, structured logging and Prometheus metrics.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
