// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # attackwatch
//!
//! A diagnostic TUI and library for monitoring a distributed
//! attack-detection pipeline.
//!
//! This crate provides tools for watching the rolling log history a master
//! aggregation service exposes over HTTP: which workers are processing
//! dispatched logs, what the classifiers are flagging as attacks, and how
//! the pipeline is performing. Snapshots can come from the live HTTP
//! endpoint, a captured JSON file, or an in-memory channel, and are
//! displayed in an interactive terminal UI.
//!
//! ## Architecture
//!
//! The crate is organized into four main modules:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal│ │
//! │  │ (state) │    │(processing)   │(rendering)   │         │ │
//! │  └────┬────┘    └──────────┘    └─────────┘    └─────────┘ │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  ┌─────────┐                                                │
//! │  │ source  │◀── HttpSource | FileSource | ChannelSource    │
//! │  │ (input) │                                                │
//! │  └─────────┘                                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state, view navigation, and user interaction logic
//! - **[`source`]**: Data source abstraction ([`DataSource`] trait) with implementations
//!   for HTTP polling, file polling, and channel-based input
//! - **[`data`]**: Data models and processing - aggregates raw log-history snapshots
//!   into [`DashboardStats`], tracks history for sparklines, and resolves worker names
//! - **[`ui`]**: Terminal rendering using ratatui - overview widgets, worker tables,
//!   the attack feed, and theme support
//!
//! ## Features
//!
//! - **Overview**: Totals, throughput, detection rate, attack-type distribution
//! - **Workers**: Per-worker counters with load share and heartbeats
//! - **Attacks**: Recent attack feed with confidence tiers and ground-truth markers
//! - **Historical tracking**: Sparklines and rate calculations across polls
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Poll the master aggregation service
//! attackwatch --url http://127.0.0.1:5000
//!
//! # Inspect a captured history offline
//! attackwatch --file history.json
//! ```
//!
//! ### As a library with file source
//!
//! ```
//! use attackwatch::{App, FileSource};
//!
//! let source = Box::new(FileSource::new("history.json"));
//! let app = App::new(source);
//! ```
//!
//! ### As a library with the HTTP source
//!
//! ```no_run
//! use std::time::Duration;
//! use attackwatch::{App, HttpSource};
//!
//! # tokio_test::block_on(async {
//! let source = HttpSource::spawn("http://127.0.0.1:5000", Duration::from_secs(5));
//! let app = App::new(Box::new(source));
//! # });
//! ```
//!
//! ### As a library with channel source (for embedding)
//!
//! ```
//! use attackwatch::{App, ChannelSource};
//!
//! // Create a channel for pushing histories directly
//! let (tx, source) = ChannelSource::create("embedded");
//!
//! // Create the app
//! let app = App::new(Box::new(source));
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, ConnectionStatus, View};
pub use config::Settings;
pub use data::{
    analyze, calculate_metrics, AttackType, DashboardStats, RecentAttack, WorkerStats,
};
pub use source::{
    ChannelSource, DataSource, FileSource, HistoryEnvelope, HttpSource, LogEntry, LogHistory,
    RawLog,
};
