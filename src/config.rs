// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Setup configuration for the polling pipeline.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default poll interval in seconds.
pub const DEFAULT_UPDATE_INTERVAL: u64 = 120;

/// Minimum allowed poll interval in seconds.
pub const MIN_UPDATE_INTERVAL: u64 = 30;

/// Maximum allowed poll interval in seconds.
pub const MAX_UPDATE_INTERVAL: u64 = 3600;

/// Configuration for one polling pipeline instance.
///
/// One credential set drives one pipeline. Changing `update_interval_secs`
/// or `enable_last_updated` after setup means tearing the pipeline down and
/// building a new one from the updated config.
///
/// # Examples
///
/// ```
/// use yandex_climate::Config;
///
/// let config: Config = serde_json::from_str(
///     r#"{"token": "abc", "device_ids": ["dev-1"]}"#,
/// ).unwrap();
/// assert_eq!(config.update_interval_secs, 120);
/// assert!(config.enable_last_updated);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// OAuth token; normalized by the client at construction.
    pub token: String,

    /// Device ids to poll, in configuration order.
    pub device_ids: Vec<String>,

    /// Seconds between poll cycles.
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,

    /// Whether to create the diagnostic last-updated entity per device.
    #[serde(default = "default_enable_last_updated")]
    pub enable_last_updated: bool,
}

fn default_update_interval() -> u64 {
    DEFAULT_UPDATE_INTERVAL
}

fn default_enable_last_updated() -> bool {
    true
}

impl Config {
    /// Creates a config with default options.
    #[must_use]
    pub fn new(token: impl Into<String>, device_ids: Vec<String>) -> Self {
        Self {
            token: token.into(),
            device_ids,
            update_interval_secs: DEFAULT_UPDATE_INTERVAL,
            enable_last_updated: true,
        }
    }

    /// Checks the configuration against its allowed ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the interval falls outside
    /// [[`MIN_UPDATE_INTERVAL`], [`MAX_UPDATE_INTERVAL`]] or no device ids
    /// are configured.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_UPDATE_INTERVAL..=MAX_UPDATE_INTERVAL).contains(&self.update_interval_secs) {
            return Err(Error::Config(format!(
                "update interval {} s is out of range [{MIN_UPDATE_INTERVAL}, {MAX_UPDATE_INTERVAL}]",
                self.update_interval_secs
            )));
        }
        if self.device_ids.is_empty() {
            return Err(Error::Config("no device ids configured".to_string()));
        }
        Ok(())
    }

    /// Returns the poll interval as a [`Duration`].
    #[must_use]
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }
}
