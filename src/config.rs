//! Configuration record for a simulation run.
//!
//! The record is supplied by the embedding layer (CLI prompt, file,
//! network). The core never parses or persists it beyond the optional
//! environment-variable constructor used by the demo binary; it only
//! validates the numeric fields when the pool and agents are built.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Error raised when a configuration record fails validation.
///
/// Construction errors are fatal to the simulation attempt that supplied
/// the record; they are never silently defaulted away.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric field that must be strictly positive was zero.
    #[error("{field} must be greater than zero")]
    NotPositive {
        /// Name of the offending field.
        field: &'static str,
    },
}

/// Parameters for one simulation run.
///
/// Serializes with camelCase field names (`maxTicketCapacity`, ...) so the
/// record matches what configuration front-ends exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Vendor releasing tickets for the event.
    pub vendor_name: String,
    /// Event the tickets are sold for.
    pub event_title: String,
    /// Hard ceiling on tickets simultaneously resident in the pool.
    pub max_ticket_capacity: u32,
    /// Lifetime cap on tickets ever released across the whole run.
    pub total_tickets: u32,
    /// Tickets per vendor release attempt.
    pub ticket_release_rate: u32,
    /// Pause between vendor release attempts, in milliseconds.
    pub ticket_release_interval_ms: u64,
    /// Tickets requested per customer retrieval attempt.
    pub customer_retrieval_rate: u32,
    /// Pause between customer retrieval attempts, in milliseconds.
    pub customer_retrieval_interval_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            vendor_name: "Velocity Events".to_string(),
            event_title: "Midnight Symphony Tour".to_string(),
            max_ticket_capacity: 20,
            total_tickets: 100,
            ticket_release_rate: 5,
            ticket_release_interval_ms: 1000,
            customer_retrieval_rate: 4,
            customer_retrieval_interval_ms: 800,
        }
    }
}

impl SimulationConfig {
    /// Load a configuration from `TICKET_SIM_*` environment variables,
    /// falling back to the [`Default`] values for anything unset or
    /// unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            vendor_name: env::var("TICKET_SIM_VENDOR_NAME").unwrap_or(defaults.vendor_name),
            event_title: env::var("TICKET_SIM_EVENT_TITLE").unwrap_or(defaults.event_title),
            max_ticket_capacity: env::var("TICKET_SIM_MAX_TICKET_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_ticket_capacity),
            total_tickets: env::var("TICKET_SIM_TOTAL_TICKETS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.total_tickets),
            ticket_release_rate: env::var("TICKET_SIM_RELEASE_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.ticket_release_rate),
            ticket_release_interval_ms: env::var("TICKET_SIM_RELEASE_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.ticket_release_interval_ms),
            customer_retrieval_rate: env::var("TICKET_SIM_RETRIEVAL_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.customer_retrieval_rate),
            customer_retrieval_interval_ms: env::var("TICKET_SIM_RETRIEVAL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.customer_retrieval_interval_ms),
        }
    }

    /// Check that every numeric field is strictly positive.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotPositive`] naming the first field that is
    /// zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive(u64::from(self.max_ticket_capacity), "max ticket capacity")?;
        positive(u64::from(self.total_tickets), "total tickets")?;
        positive(u64::from(self.ticket_release_rate), "ticket release rate")?;
        positive(self.ticket_release_interval_ms, "ticket release interval")?;
        positive(
            u64::from(self.customer_retrieval_rate),
            "customer retrieval rate",
        )?;
        positive(
            self.customer_retrieval_interval_ms,
            "customer retrieval interval",
        )?;
        Ok(())
    }

    /// Pause between vendor release attempts.
    #[must_use]
    pub const fn release_interval(&self) -> Duration {
        Duration::from_millis(self.ticket_release_interval_ms)
    }

    /// Pause between customer retrieval attempts.
    #[must_use]
    pub const fn retrieval_interval(&self) -> Duration {
        Duration::from_millis(self.customer_retrieval_interval_ms)
    }
}

const fn positive(value: u64, field: &'static str) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::NotPositive { field })
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = SimulationConfig {
            max_ticket_capacity: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "max ticket capacity"
            })
        );
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let config = SimulationConfig {
            ticket_release_interval_ms: 0,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            customer_retrieval_interval_ms: 0,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_rates_are_rejected() {
        for field in ["rate", "retrieval"] {
            let mut config = SimulationConfig::default();
            if field == "rate" {
                config.ticket_release_rate = 0;
            } else {
                config.customer_retrieval_rate = 0;
            }
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn record_round_trips_in_camel_case() {
        let config = SimulationConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"maxTicketCapacity\":20"));
        assert!(json.contains("\"ticketReleaseIntervalMs\":1000"));

        let back: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn intervals_convert_to_durations() {
        let config = SimulationConfig::default();
        assert_eq!(config.release_interval(), Duration::from_millis(1000));
        assert_eq!(config.retrieval_interval(), Duration::from_millis(800));
    }
}
