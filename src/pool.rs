//! The shared bounded ticket pool.
//!
//! [`TicketPool`] is the only shared mutable state in a simulation run. It is
//! a cheap-to-clone handle over one mutex-guarded [`PoolState`], so the vendor,
//! customer, and monitor tasks all operate on the same storage. Every public
//! operation takes the lock once, applies (or rejects) the whole batch, and
//! releases the lock before any diagnostics are emitted, so the exclusive
//! section never waits on the sink.

use crate::config::{ConfigError, SimulationConfig};
use crate::diagnostics::{DiagnosticsSink, PoolEvent};
use crate::types::{PoolSnapshot, TicketId};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Why an `add_tickets` or `remove_tickets` call did not take effect.
///
/// Rejections are the expected outcome of contention, not failures: the pool
/// is unchanged, the diagnostic is recorded, and the calling agent simply
/// waits out its interval and tries again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The pool has been marked complete; all operations fail fast.
    #[error("simulation is complete")]
    Complete,
    /// A release batch of zero tickets.
    #[error("ticket count must be greater than 0")]
    EmptyBatch,
    /// The batch would push the pool past its capacity ceiling.
    #[error("batch of {requested} exceeds remaining capacity of {room}")]
    OverCapacity {
        /// Batch size the vendor attempted.
        requested: u32,
        /// Slots still free below the capacity ceiling.
        room: u32,
    },
    /// The batch would release more tickets than the event's lifetime total.
    #[error("batch of {requested} exceeds the {remaining} tickets left to release")]
    TotalExhausted {
        /// Batch size the vendor attempted.
        requested: u32,
        /// Tickets that may still legally be released.
        remaining: u32,
    },
    /// A retrieval attempt against an empty pool.
    #[error("ticket pool is empty")]
    Empty,
}

/// Internal storage, only ever touched under the pool's mutex.
#[derive(Debug)]
struct PoolState {
    /// Tickets available for purchase, head = next sold.
    available: VecDeque<TicketId>,
    /// Serial for the next minted ticket, starting at 1.
    next_serial: u64,
    tickets_sold: u32,
    customers_served: u32,
    complete: bool,
}

impl PoolState {
    // Fits in u32: the admission check bounds `available` by `max_capacity`.
    #[allow(clippy::cast_possible_truncation)]
    fn size(&self) -> u32 {
        self.available.len() as u32
    }
}

#[derive(Debug)]
struct PoolInner {
    vendor_name: String,
    event_title: String,
    max_capacity: u32,
    total_tickets: u32,
    release_rate: u32,
    retrieval_rate: u32,
    state: Mutex<PoolState>,
}

/// Shared handle to the bounded FIFO ticket pool.
///
/// Cloning the handle shares the same underlying state; the agents and the
/// monitor each hold a clone. All operations are mutually exclusive on one
/// instance: no two mutations interleave and no read observes a half-applied
/// batch.
#[derive(Clone)]
pub struct TicketPool {
    inner: Arc<PoolInner>,
    sink: Arc<dyn DiagnosticsSink>,
}

impl std::fmt::Debug for TicketPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketPool")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl TicketPool {
    /// Create a pool for one simulation run.
    ///
    /// Diagnostics are delivered to `sink`; the pool records one
    /// [`PoolEvent::PoolCreated`] immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotPositive`] if any numeric field of the
    /// configuration is zero. Construction errors are fatal to the run that
    /// supplied the record.
    pub fn new(
        config: &SimulationConfig,
        sink: Arc<dyn DiagnosticsSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let pool = Self {
            inner: Arc::new(PoolInner {
                vendor_name: config.vendor_name.clone(),
                event_title: config.event_title.clone(),
                max_capacity: config.max_ticket_capacity,
                total_tickets: config.total_tickets,
                release_rate: config.ticket_release_rate,
                retrieval_rate: config.customer_retrieval_rate,
                state: Mutex::new(PoolState {
                    available: VecDeque::new(),
                    next_serial: 1,
                    tickets_sold: 0,
                    customers_served: 0,
                    complete: false,
                }),
            }),
            sink,
        };

        pool.sink.record(PoolEvent::PoolCreated {
            vendor_name: config.vendor_name.clone(),
            event_title: config.event_title.clone(),
            max_capacity: config.max_ticket_capacity,
            total_tickets: config.total_tickets,
        });

        Ok(pool)
    }

    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Release a batch of `count` newly minted tickets into the pool.
    ///
    /// The batch is all-or-nothing: it is admitted only if the whole batch
    /// fits under both the capacity ceiling and the lifetime total, checked
    /// inside the same exclusive section that appends the tickets. Never
    /// blocks.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] that turned the batch away; the pool is
    /// unchanged.
    pub fn add_tickets(&self, count: u32) -> Result<(), Rejection> {
        let outcome = {
            let mut state = self.lock_state();
            self.admit(&mut state, count)
        };

        match outcome {
            Ok(pool_size) => {
                metrics::counter!("ticket_pool.tickets_released").increment(u64::from(count));
                metrics::gauge!("ticket_pool.size").set(f64::from(pool_size));
                self.sink
                    .record(PoolEvent::TicketsReleased { count, pool_size });
                Ok(())
            }
            Err(reason) => {
                metrics::counter!("ticket_pool.releases_rejected").increment(1);
                self.sink.record(PoolEvent::ReleaseRejected {
                    requested: count,
                    reason,
                });
                Err(reason)
            }
        }
    }

    /// The admission check and append, under the caller's lock. Returns the
    /// pool size after the batch was admitted.
    fn admit(&self, state: &mut PoolState, count: u32) -> Result<u32, Rejection> {
        if state.complete {
            return Err(Rejection::Complete);
        }
        if count == 0 {
            return Err(Rejection::EmptyBatch);
        }

        let size = state.size();
        let room = self.inner.max_capacity - size;
        let remaining = self.inner.total_tickets - state.tickets_sold - size;
        if count > room {
            return Err(Rejection::OverCapacity {
                requested: count,
                room,
            });
        }
        if count > remaining {
            return Err(Rejection::TotalExhausted {
                requested: count,
                remaining,
            });
        }

        for _ in 0..count {
            let id = TicketId::new(state.next_serial);
            state.next_serial += 1;
            state.available.push_back(id);
        }
        Ok(state.size())
    }

    /// Remove up to `requested` tickets from the head of the pool.
    ///
    /// Succeeds whenever the pool was non-empty and not complete, even if
    /// fewer than `requested` tickets were available; the call drains what is
    /// there. A call that removes at least one ticket counts as exactly one
    /// customer served, regardless of batch size. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::Complete`] or [`Rejection::Empty`]; the pool is
    /// unchanged.
    pub fn remove_tickets(&self, requested: u32) -> Result<(), Rejection> {
        let outcome = {
            let mut state = self.lock_state();
            if state.complete {
                Err(Rejection::Complete)
            } else if state.available.is_empty() {
                Err(Rejection::Empty)
            } else {
                let take = requested.min(state.size());
                for _ in 0..take {
                    state.available.pop_front();
                }
                state.tickets_sold += take;
                if take > 0 {
                    state.customers_served += 1;
                }
                Ok((take, state.size(), state.customers_served))
            }
        };

        match outcome {
            Ok((count, pool_size, customer)) => {
                metrics::counter!("ticket_pool.tickets_sold").increment(u64::from(count));
                metrics::gauge!("ticket_pool.size").set(f64::from(pool_size));
                self.sink.record(PoolEvent::TicketsPurchased {
                    count,
                    pool_size,
                    customer,
                });
                Ok(())
            }
            Err(reason) => {
                metrics::counter!("ticket_pool.purchases_rejected").increment(1);
                self.sink.record(PoolEvent::PurchaseRejected {
                    requested,
                    reason,
                });
                Err(reason)
            }
        }
    }

    /// Tickets currently available for purchase; 0 once the pool is complete.
    ///
    /// This is the signal the sellout monitor polls.
    #[must_use]
    pub fn size(&self) -> u32 {
        let state = self.lock_state();
        if state.complete { 0 } else { state.size() }
    }

    /// One consistent observation of the pool's aggregate state.
    ///
    /// All fields are read under the same lock acquisition, so they belong to
    /// the same instant.
    #[must_use]
    pub fn snapshot(&self) -> PoolSnapshot {
        let state = self.lock_state();
        PoolSnapshot {
            size: if state.complete { 0 } else { state.size() },
            tickets_sold: state.tickets_sold,
            customers_served: state.customers_served,
            complete: state.complete,
        }
    }

    /// The tickets currently available, head (next sold) first.
    ///
    /// Follows the external contract: empty once the pool is complete.
    #[must_use]
    pub fn available_tickets(&self) -> Vec<TicketId> {
        let state = self.lock_state();
        if state.complete {
            Vec::new()
        } else {
            state.available.iter().copied().collect()
        }
    }

    /// Idempotently mark the pool complete after a detected sellout.
    ///
    /// Only the transition records a diagnostic; repeat calls are no-ops.
    pub fn mark_complete(&self) {
        if let Some((tickets_sold, customers_served)) = self.finish() {
            metrics::counter!("ticket_pool.completed").increment(1);
            self.sink.record(PoolEvent::Completed {
                tickets_sold,
                customers_served,
            });
        }
    }

    /// Idempotently mark the pool complete after an operator stop.
    ///
    /// Same effect as [`mark_complete`](Self::mark_complete), reported with
    /// warning intent.
    pub fn interrupt(&self) {
        if let Some((tickets_sold, customers_served)) = self.finish() {
            metrics::counter!("ticket_pool.interrupted").increment(1);
            self.sink.record(PoolEvent::Interrupted {
                tickets_sold,
                customers_served,
            });
        }
    }

    /// Flip the sticky flag; `Some(counts)` only on the actual transition.
    fn finish(&self) -> Option<(u32, u32)> {
        let mut state = self.lock_state();
        if state.complete {
            return None;
        }
        state.complete = true;
        metrics::gauge!("ticket_pool.size").set(0.0);
        Some((state.tickets_sold, state.customers_served))
    }

    /// Whether the pool has been marked complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.lock_state().complete
    }

    /// Vendor releasing tickets for the event.
    #[must_use]
    pub fn vendor_name(&self) -> &str {
        &self.inner.vendor_name
    }

    /// Event the tickets are sold for.
    #[must_use]
    pub fn event_title(&self) -> &str {
        &self.inner.event_title
    }

    /// Ceiling on simultaneously available tickets.
    #[must_use]
    pub fn max_capacity(&self) -> u32 {
        self.inner.max_capacity
    }

    /// Lifetime cap on tickets released across the whole run.
    #[must_use]
    pub fn total_tickets(&self) -> u32 {
        self.inner.total_tickets
    }

    /// Configured vendor batch size.
    #[must_use]
    pub fn release_rate(&self) -> u32 {
        self.inner.release_rate
    }

    /// Configured customer batch size.
    #[must_use]
    pub fn retrieval_rate(&self) -> u32 {
        self.inner.retrieval_rate
    }
}
