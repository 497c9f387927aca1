//! # Webdir Server Library
//!
//! This crate provides an HTTP file browser for a single directory
//! tree, exposing it for listing, download, upload, deletion and
//! folder creation.
//!
//! ## Overview
//!
//! The server maps URL paths onto filesystem paths beneath one
//! configured root and refuses anything that would escape it. What a
//! client may do is governed twice:
//!
//! - **Operation toggles**: listing, download, upload, deletion and
//!   folder creation are each switched off until enabled
//! - **Filesystem permissions**: whatever the toggles allow is still
//!   checked against what the server process may actually read or write
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        HTTP Router                          │
//! │          (basic auth, body limit, request traces)           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │   ┌──────────────────┐        ┌─────────────────────────┐   │
//! │   │   GET handlers   │        │      POST handlers      │   │
//! │   │  listing / file  │        │ upload/delete/newfolder │   │
//! │   └────────┬─────────┘        └────────────┬────────────┘   │
//! │            │                               │                │
//! │   ┌────────▼───────────────────────────────▼────────────┐   │
//! │   │                 Directory Browser                   │   │
//! │   │      (path confinement, listing, permissions)       │   │
//! │   └─────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use server::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::load_default()?;
//!     config.access.list = true;
//!     config.access.read = true;
//!     config.validate()?;
//!
//!     // Serves until SIGINT or SIGTERM
//!     server::http::serve(config).await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading, validation and defaults
//! - [`files`]: Path confinement, directory listing, filesystem mutations
//! - [`http`]: Router, handlers, basic auth, TLS and the server loop
//! - [`ui`]: The HTML listing page and its value formatting

pub mod config;
pub mod files;
pub mod http;
pub mod ui;

// Re-export config types for convenience
pub use config::{AccessConfig, Config, ConfigError};

// Re-export files types for convenience
pub use files::{BrowserError, DirectoryBrowser, DirectoryEntry, EntryType, OpsError, UploadSink};

// Re-export http types for convenience
pub use http::{router, serve, AppState, BasicCredentials, HttpError};

// Re-export UI entry points for convenience
pub use ui::render_listing;
