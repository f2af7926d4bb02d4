//! Diagnostics seam for pool activity.
//!
//! The pool reports everything an operator console would display through an
//! injected [`DiagnosticsSink`] instead of a process-wide logger, so
//! embedders decide how events are routed. [`TracingSink`] is the production
//! implementation; [`InMemorySink`] captures events for test assertions.

use crate::pool::Rejection;
use std::sync::Mutex;

// ============================================================================
// Events
// ============================================================================

/// One observable pool activity, carrying the counts a console would show.
///
/// Accepted operations and natural completion are informational; rejections
/// and operator interruption are warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    /// A pool was constructed from a validated configuration.
    PoolCreated {
        /// Vendor releasing tickets for the event.
        vendor_name: String,
        /// Event the tickets are sold for.
        event_title: String,
        /// Ceiling on simultaneously available tickets.
        max_capacity: u32,
        /// Lifetime ticket cap for the run.
        total_tickets: u32,
    },
    /// A release batch was admitted in full.
    TicketsReleased {
        /// Tickets added by this batch.
        count: u32,
        /// Pool size after the addition.
        pool_size: u32,
    },
    /// A release batch was turned away; the pool is unchanged.
    ReleaseRejected {
        /// Batch size the vendor attempted.
        requested: u32,
        /// Why the batch could not be admitted.
        reason: Rejection,
    },
    /// A retrieval call obtained tickets (possibly fewer than requested).
    TicketsPurchased {
        /// Tickets actually handed out.
        count: u32,
        /// Pool size after the removal.
        pool_size: u32,
        /// Ordinal of the customer this call served.
        customer: u32,
    },
    /// A retrieval call was turned away; the pool is unchanged.
    PurchaseRejected {
        /// Batch size the customer requested.
        requested: u32,
        /// Why nothing was handed out.
        reason: Rejection,
    },
    /// The pool was marked complete after sellout.
    Completed {
        /// Tickets sold over the whole run.
        tickets_sold: u32,
        /// Retrieval calls that obtained at least one ticket.
        customers_served: u32,
    },
    /// The pool was marked complete by an operator stop.
    Interrupted {
        /// Tickets sold before the interruption.
        tickets_sold: u32,
        /// Retrieval calls that obtained at least one ticket.
        customers_served: u32,
    },
}

// ============================================================================
// Sink trait
// ============================================================================

/// Recipient of [`PoolEvent`]s.
///
/// Implementations must be cheap and non-blocking: the pool emits events
/// right after releasing its exclusive section, on the caller's task.
pub trait DiagnosticsSink: Send + Sync {
    /// Record one event.
    fn record(&self, event: PoolEvent);
}

// ============================================================================
// Tracing sink
// ============================================================================

/// Production sink which forwards events to `tracing`.
///
/// Informational events log at `info`, rejections and interruption at
/// `warn`, matching the severity split the simulation's operators expect.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&self, event: PoolEvent) {
        match event {
            PoolEvent::PoolCreated {
                vendor_name,
                event_title,
                max_capacity,
                total_tickets,
            } => {
                tracing::info!(
                    vendor = %vendor_name,
                    event = %event_title,
                    max_capacity,
                    total_tickets,
                    "Ticket pool created"
                );
            }
            PoolEvent::TicketsReleased { count, pool_size } => {
                tracing::info!(count, pool_size, "Tickets released to pool");
            }
            PoolEvent::ReleaseRejected { requested, reason } => {
                tracing::warn!(requested, reason = %reason, "Ticket release rejected");
            }
            PoolEvent::TicketsPurchased {
                count,
                pool_size,
                customer,
            } => {
                tracing::info!(count, pool_size, customer, "Tickets purchased");
            }
            PoolEvent::PurchaseRejected { requested, reason } => {
                tracing::warn!(requested, reason = %reason, "Ticket purchase rejected");
            }
            PoolEvent::Completed {
                tickets_sold,
                customers_served,
            } => {
                tracing::info!(
                    tickets_sold,
                    customers_served,
                    "Simulation completed, all tickets sold"
                );
            }
            PoolEvent::Interrupted {
                tickets_sold,
                customers_served,
            } => {
                tracing::warn!(tickets_sold, customers_served, "Simulation interrupted");
            }
        }
    }
}

// ============================================================================
// In-memory sink
// ============================================================================

/// Sink that stores events in memory, in arrival order.
///
/// Intended for tests and for embedders that render recent activity
/// themselves.
#[derive(Debug, Default)]
pub struct InMemorySink {
    events: Mutex<Vec<PoolEvent>>,
}

impl InMemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<PoolEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Number of events recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether no event has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticsSink for InMemorySink {
    fn record(&self, event: PoolEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_sink_keeps_arrival_order() {
        let sink = InMemorySink::new();
        assert!(sink.is_empty());

        sink.record(PoolEvent::TicketsReleased {
            count: 5,
            pool_size: 5,
        });
        sink.record(PoolEvent::TicketsPurchased {
            count: 2,
            pool_size: 3,
            customer: 1,
        });

        let events = sink.events();
        assert_eq!(sink.len(), 2);
        assert_eq!(
            events[0],
            PoolEvent::TicketsReleased {
                count: 5,
                pool_size: 5,
            }
        );
        assert_eq!(
            events[1],
            PoolEvent::TicketsPurchased {
                count: 2,
                pool_size: 3,
                customer: 1,
            }
        );
    }
}
