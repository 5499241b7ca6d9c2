//! Central link configuration.
//!
//! All tunable parameters for the connection supervisor.  One time-unit
//! is one second, so the defaults give a 2 s connect-timeout and a 5 s
//! interrogate-timeout.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::gatt::ServiceFilter;

/// Core link configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CentralConfig {
    // --- Timeouts ---
    /// Connect attempt deadline (milliseconds); on expiry the attempt is retried.
    pub connect_timeout_ms: u32,
    /// Service discovery deadline after connecting (milliseconds); on expiry
    /// the link is torn down.
    pub interrogate_timeout_ms: u32,

    // --- Scanning ---
    /// Report every advertisement, not just the first per peripheral.
    pub allow_duplicates: bool,
    /// Only report peripherals advertising one of these services.
    /// Empty = unfiltered.
    pub service_filter: Vec<u128>,

    // --- Connection ---
    /// Ask the transport to raise a disconnect event for this link.
    pub notify_on_disconnection: bool,
    /// Restart scanning once a link ends.  When off, the core rests in `Idle`.
    pub resume_scan_on_disconnect: bool,
    /// Give up after this many timed-out attempts.  `None` retries forever.
    pub max_connect_attempts: Option<u32>,
}

impl Default for CentralConfig {
    fn default() -> Self {
        Self {
            // Timeouts
            connect_timeout_ms: 2_000,
            interrogate_timeout_ms: 5_000,

            // Scanning
            allow_duplicates: true,
            service_filter: Vec::new(),

            // Connection
            notify_on_disconnection: true,
            resume_scan_on_disconnect: true,
            max_connect_attempts: None,
        }
    }
}

impl CentralConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "connect_timeout_ms must be > 0",
            ));
        }
        if self.interrogate_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "interrogate_timeout_ms must be > 0",
            ));
        }
        if self.max_connect_attempts == Some(0) {
            return Err(ConfigError::ValidationFailed(
                "max_connect_attempts must be >= 1 when set",
            ));
        }
        Ok(())
    }

    /// Parse a JSON document (missing fields take their defaults) and validate it.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("parsing central config")?;
        config.validate().context("validating central config")?;
        Ok(config)
    }

    /// Scan filter derived from [`service_filter`](Self::service_filter).
    pub fn scan_filter(&self) -> Option<ServiceFilter> {
        ServiceFilter::from_uuids(&self.service_filter)
    }
}
