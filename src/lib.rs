//! Concurrent ticket-sales simulation.
//!
//! A vendor agent periodically releases batches of tickets into a shared
//! bounded pool and a customer agent periodically retrieves them, until the
//! event sells out or an operator stops the run. The crate's core is the
//! [`TicketPool`]: a bounded FIFO buffer whose accounting invariants (size
//! never above capacity, lifetime total never exceeded, sticky completion)
//! hold under arbitrary concurrent access because every operation is applied
//! atomically. Pool operations never block; contention is relieved by
//! rejecting a batch, not by waiting.
//!
//! # Architecture
//!
//! - [`pool`] — the shared bounded buffer and its admission rules
//! - [`agents`] — the periodic [`Vendor`] and [`Customer`] tasks
//! - [`manager`] — the [`SimulationManager`] lifecycle controller and its
//!   sellout monitor
//! - [`config`] — the [`SimulationConfig`] record and its validation
//! - [`diagnostics`] — the injected [`DiagnosticsSink`] the pool reports
//!   through
//! - [`types`] — identifiers, snapshots, and run summaries
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ticketing_sim::{SimulationConfig, SimulationManager, TracingSink};
//!
//! # async fn run() -> Result<(), ticketing_sim::SimulationError> {
//! let manager = SimulationManager::new(Arc::new(TracingSink));
//! let run_id = manager.start(&SimulationConfig::default())?;
//! println!("run {run_id} started");
//!
//! let summary = manager.wait().await?;
//! println!("sold {} tickets", summary.tickets_sold);
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod config;
pub mod diagnostics;
pub mod manager;
pub mod pool;
pub mod types;

pub use agents::{Customer, Vendor};
pub use config::{ConfigError, SimulationConfig};
pub use diagnostics::{DiagnosticsSink, InMemorySink, PoolEvent, TracingSink};
pub use manager::{SimulationError, SimulationManager};
pub use pool::{Rejection, TicketPool};
pub use types::{PoolSnapshot, RunId, RunSummary, SimulationStatus, TicketId};
