//! Dashboard settings.
//!
//! Settings come from an optional file plus `ATTACKWATCH_`-prefixed
//! environment variables; command-line flags override both.

use std::path::Path;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

/// Default base URL of the master aggregation service.
pub const DEFAULT_MASTER_URL: &str = "http://127.0.0.1:5000";

/// Default refresh interval in seconds.
pub const DEFAULT_REFRESH_SECS: u64 = 5;

/// Resolved dashboard settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Base URL of the master aggregation service.
    pub master_url: String,
    /// Refresh interval in seconds.
    pub refresh_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_url: DEFAULT_MASTER_URL.to_string(),
            refresh_secs: DEFAULT_REFRESH_SECS,
        }
    }
}

impl Settings {
    /// Load settings from an optional file and the environment.
    ///
    /// Precedence: defaults < file < `ATTACKWATCH_*` environment
    /// variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("master_url", DEFAULT_MASTER_URL)?
            .set_default("refresh_secs", DEFAULT_REFRESH_SECS as i64)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config = builder.add_source(Environment::with_prefix("ATTACKWATCH")).build()?;

        Ok(config.try_deserialize()?)
    }
}
