//! # Chutes OpenAI Proxy
//!
//! A protocol translation proxy that lets OpenAI-compatible clients talk to the
//! Chutes chat backend.
//!
//! ## Overview
//!
//! This library provides the core functionality for translating between:
//! - **OpenAI Chat Completions API** - Request and response format
//! - **Chutes chat endpoint** - Backend envelope and event stream
//!
//! The proxy handles:
//! - Request translation and model name mapping
//! - Forwarding through a browser-profiled client with a bot-challenge clearance
//! - Retrying challenge rejections with clearance refresh and exponential backoff
//! - Re-framing the backend SSE stream into OpenAI chunks or one aggregated reply
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chutes_openai_proxy::{config::ProxyConfig, handler::{AppState, router}};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProxyConfig::from_env()?;
//! config.validate()?;
//!
//! let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
//! let app = router(Arc::new(AppState::from_config(config)?));
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Error types and HTTP mapping
//! - [`models`] - Data structures for the OpenAI and Chutes APIs
//! - [`transform`] - Model mapping, validation and request translation
//! - [`client`] - Browser profiles, client factory and clearance refresh
//! - [`retry`] - Forwarding loop with challenge handling
//! - [`streaming`] - Line splitter, frame parser, SSE writer and aggregator
//! - [`handler`] - HTTP routes

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod models;
pub mod provider;
pub mod retry;
pub mod state;
pub mod streaming;
pub mod transform;

pub use config::ProxyConfig;
pub use error::{ProxyError, Result};
