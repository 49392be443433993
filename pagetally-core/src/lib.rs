//! # pagetally-core
//!
//! Core library for pagetally - a single-process web-analytics collector.
//!
//! This library provides:
//! - Domain types for page views, events, users and sessions
//! - A snapshot-backed in-memory store (one JSON file, rewritten on
//!   every mutation)
//! - Ingest operations (track page view, track event, register user)
//! - Aggregation queries (trailing-window statistics, user journeys)
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use pagetally_core::{analytics, ingest, Config, Store};
//! use pagetally_core::types::PageViewInput;
//!
//! let config = Config::load().expect("failed to load config");
//! let mut store = Store::open(config.snapshot_path());
//!
//! let view = ingest::track_page_view(&mut store, PageViewInput {
//!     page: Some("/home".to_string()),
//!     ..Default::default()
//! });
//! assert_eq!(view.page, "/home");
//!
//! let stats = analytics::statistics(&store, 24);
//! assert_eq!(stats.total_page_views, 1);
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use store::{Snapshot, Store};

// Public modules
pub mod analytics;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod store;
pub mod types;
