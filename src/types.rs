//! Core value types for the ticket sales simulation.
//!
//! Identifiers are newtypes so they cannot be mixed up at call sites:
//! a [`TicketId`] is a pool-scoped serial number (sale order equals id
//! order), while a [`RunId`] is a random UUID used to correlate log
//! lines from one simulation run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of a single ticket, minted by the pool at admission time.
///
/// Serials start at 1 and increase in admission order, so a drained batch
/// with ascending serials is also in first-in-first-out sale order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TicketId(u64);

impl TicketId {
    /// Create a ticket id from its serial number.
    #[must_use]
    pub const fn new(serial: u64) -> Self {
        Self(serial)
    }

    /// Get the serial number.
    #[must_use]
    pub const fn serial(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a new random run ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Controller state
// ============================================================================

/// Lifecycle state of the simulation controller.
///
/// A controller starts `Idle`, moves to `Running` on a successful start,
/// and ends a run as either `Completed` (sellout detected by the monitor)
/// or `Interrupted` (operator stop). Any non-`Running` state permits a new
/// start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationStatus {
    /// No run has been started yet.
    Idle,
    /// A run is live: agents and monitor are scheduled.
    Running,
    /// The last run ended because the event sold out.
    Completed,
    /// The last run was stopped by an operator.
    Interrupted,
}

impl fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// Pool observations
// ============================================================================

/// One consistent observation of the pool's aggregate state.
///
/// All four fields are read inside the same exclusive section, so they
/// always belong to the same instant. `size` follows the external
/// contract: it reports 0 once the pool is complete, whatever internal
/// storage still holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    /// Tickets currently available for purchase (0 once complete).
    pub size: u32,
    /// Cumulative tickets sold so far.
    pub tickets_sold: u32,
    /// Number of successful retrieval calls that removed at least one ticket.
    pub customers_served: u32,
    /// Sticky completion flag.
    pub complete: bool,
}

/// Final accounting for one simulation run.
///
/// Produced by the controller when a run is reaped, so the embedding layer
/// can print statistics without re-querying the pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Correlates this summary with the run's log lines.
    pub run_id: RunId,
    /// Event the tickets were sold for.
    pub event_title: String,
    /// Vendor that released the tickets.
    pub vendor_name: String,
    /// How the run ended: `Completed` or `Interrupted`.
    pub outcome: SimulationStatus,
    /// Tickets sold over the whole run.
    pub tickets_sold: u32,
    /// Retrieval calls that obtained at least one ticket.
    pub customers_served: u32,
    /// Tickets never sold (never released ones included).
    pub tickets_unsold: u32,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run was reaped.
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Wall-clock duration of the run.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_ids_order_by_serial() {
        assert!(TicketId::new(1) < TicketId::new(2));
        assert_eq!(TicketId::new(7).serial(), 7);
        assert_eq!(TicketId::new(7).to_string(), "7");
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn status_displays_lowercase() {
        assert_eq!(SimulationStatus::Running.to_string(), "running");
        assert_eq!(SimulationStatus::Interrupted.to_string(), "interrupted");
    }
}
