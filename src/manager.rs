//! Simulation lifecycle controller.
//!
//! [`SimulationManager`] owns the run state machine
//! (`Idle → Running → Completed | Interrupted`), builds the pool and agents
//! from a validated configuration, and runs the monitor task that detects
//! sellout. Control operations never block on agent progress: `start` and
//! `stop` only touch the state word and the shutdown channel, and the agents'
//! sleeps are interruptible, so stopping terminates within a bounded time.

use crate::agents::{Customer, Vendor};
use crate::config::{ConfigError, SimulationConfig};
use crate::diagnostics::{DiagnosticsSink, TracingSink};
use crate::pool::TicketPool;
use crate::types::{RunId, RunSummary, SimulationStatus};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Error raised by the controller's operations.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// `start` was called while a run is live.
    #[error("a simulation is already running; stop it before starting a new one")]
    AlreadyRunning,
    /// `stop` or `wait` was called with no live run.
    #[error("no simulation is currently running")]
    NotRunning,
    /// The supplied configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// State word values; decoded by `status()`.
const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const COMPLETED: u8 = 2;
const INTERRUPTED: u8 = 3;

/// Everything owned by one live run. Taken out of the controller by whichever
/// control operation reaps the run.
struct ActiveRun {
    run_id: RunId,
    pool: TicketPool,
    shutdown_tx: broadcast::Sender<()>,
    vendor: JoinHandle<()>,
    customer: JoinHandle<()>,
    monitor: JoinHandle<()>,
    started_at: DateTime<Utc>,
}

/// Controller for one simulation at a time.
///
/// `status()` is a lock-free read safe from any task. `start` rejects a
/// second concurrent run; any non-`Running` state permits a new start, which
/// discards the previous run's pool.
pub struct SimulationManager {
    state: Arc<AtomicU8>,
    run: Mutex<Option<ActiveRun>>,
    sink: Arc<dyn DiagnosticsSink>,
    monitor_interval: Duration,
    reap_timeout: Duration,
}

impl SimulationManager {
    /// Create a controller delivering pool diagnostics to `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(IDLE)),
            run: Mutex::new(None),
            sink,
            monitor_interval: Duration::from_secs(2),
            reap_timeout: Duration::from_secs(10),
        }
    }

    /// Set the monitor's poll cadence (default: 2 seconds).
    #[must_use]
    pub const fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = interval;
        self
    }

    /// Set the per-task shutdown timeout used when reaping a run
    /// (default: 10 seconds).
    #[must_use]
    pub const fn with_reap_timeout(mut self, timeout: Duration) -> Self {
        self.reap_timeout = timeout;
        self
    }

    /// Current controller state.
    #[must_use]
    pub fn status(&self) -> SimulationStatus {
        match self.state.load(Ordering::Acquire) {
            RUNNING => SimulationStatus::Running,
            COMPLETED => SimulationStatus::Completed,
            INTERRUPTED => SimulationStatus::Interrupted,
            _ => SimulationStatus::Idle,
        }
    }

    /// Start a new run from `config`.
    ///
    /// Builds a fresh pool, spawns the vendor and customer agents bound to
    /// it, and spawns the sellout monitor. Returns the new run's identifier.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// [`SimulationError::AlreadyRunning`] if a run is live, or
    /// [`SimulationError::Config`] if `config` fails validation; in both
    /// cases nothing is spawned.
    pub fn start(&self, config: &SimulationConfig) -> Result<RunId, SimulationError> {
        let mut guard = self.lock_run();
        if self.state.load(Ordering::Acquire) == RUNNING {
            return Err(SimulationError::AlreadyRunning);
        }

        let pool = TicketPool::new(config, Arc::clone(&self.sink))?;
        let (shutdown_tx, _) = broadcast::channel(4);
        let vendor = Vendor::new(
            pool.clone(),
            config.ticket_release_rate,
            config.release_interval(),
            shutdown_tx.subscribe(),
        )?;
        let customer = Customer::new(
            pool.clone(),
            config.customer_retrieval_rate,
            config.retrieval_interval(),
            shutdown_tx.subscribe(),
        )?;

        let run_id = RunId::new();
        let monitor = self.spawn_monitor(pool.clone(), shutdown_tx.clone());
        self.state.store(RUNNING, Ordering::Release);
        *guard = Some(ActiveRun {
            run_id,
            pool,
            shutdown_tx,
            vendor: vendor.spawn(),
            customer: customer.spawn(),
            monitor,
            started_at: Utc::now(),
        });

        metrics::counter!("simulation.started").increment(1);
        info!(run_id = %run_id, event = %config.event_title, "Simulation started");
        Ok(run_id)
    }

    /// Stop the live run.
    ///
    /// Marks the pool interrupted so in-flight operations fail fast, signals
    /// the agents and the monitor to exit, awaits them within the reap
    /// timeout, and returns the run's final accounting.
    ///
    /// # Errors
    ///
    /// [`SimulationError::NotRunning`] if no run is live; reported, not
    /// fatal, and nothing changes.
    pub async fn stop(&self) -> Result<RunSummary, SimulationError> {
        let run = {
            let mut guard = self.lock_run();
            if self.state.load(Ordering::Acquire) != RUNNING {
                return Err(SimulationError::NotRunning);
            }
            guard.take().ok_or(SimulationError::NotRunning)?
        };

        run.pool.interrupt();
        self.state.store(INTERRUPTED, Ordering::Release);
        metrics::counter!("simulation.interrupted").increment(1);
        let _ = run.shutdown_tx.send(());

        Self::reap_task("monitor", run.monitor, self.reap_timeout).await;
        Self::reap_task("vendor", run.vendor, self.reap_timeout).await;
        Self::reap_task("customer", run.customer, self.reap_timeout).await;

        let summary = self.summarize(run.run_id, run.started_at, &run.pool);
        info!(run_id = %run.run_id, tickets_sold = summary.tickets_sold, "Simulation stopped");
        Ok(summary)
    }

    /// Wait for the live run to complete naturally.
    ///
    /// Takes ownership of the run, awaits the monitor's sellout detection,
    /// then reaps the agents the same way `stop` does. A concurrent `stop`
    /// will observe no run to take and report [`SimulationError::NotRunning`].
    ///
    /// # Errors
    ///
    /// [`SimulationError::NotRunning`] if no run is live.
    pub async fn wait(&self) -> Result<RunSummary, SimulationError> {
        let run = {
            let mut guard = self.lock_run();
            guard.take().ok_or(SimulationError::NotRunning)?
        };

        // The monitor exits when it detects sellout; no timeout here, this is
        // the run's natural duration.
        if let Err(e) = run.monitor.await {
            warn!(task = "monitor", error = %e, "Monitor task failed");
        }

        // The monitor already broadcast shutdown on sellout; resend in case
        // it exited another way.
        let _ = run.shutdown_tx.send(());
        Self::reap_task("vendor", run.vendor, self.reap_timeout).await;
        Self::reap_task("customer", run.customer, self.reap_timeout).await;

        let summary = self.summarize(run.run_id, run.started_at, &run.pool);
        info!(run_id = %run.run_id, tickets_sold = summary.tickets_sold, "Simulation finished");
        Ok(summary)
    }

    /// Poll the pool until sellout: the pool is empty, not yet complete, and
    /// the vendor's next all-or-nothing batch can no longer be admitted. A
    /// bare "empty and not complete" check would misfire on the transient
    /// empty between a customer drain and the next release.
    fn spawn_monitor(&self, pool: TicketPool, shutdown_tx: broadcast::Sender<()>) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let interval = self.monitor_interval;
        let mut shutdown = shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!(interval = ?interval, "Sellout monitor started");
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    () = tokio::time::sleep(interval) => {}
                }

                let snap = pool.snapshot();
                if snap.complete {
                    break;
                }
                let releasable = pool.total_tickets() - snap.tickets_sold;
                if snap.size == 0 && releasable < pool.release_rate() {
                    pool.mark_complete();
                    state.store(COMPLETED, Ordering::Release);
                    metrics::counter!("simulation.completed").increment(1);
                    info!(
                        tickets_sold = snap.tickets_sold,
                        "All tickets sold, ending simulation"
                    );
                    let _ = shutdown_tx.send(());
                    break;
                }
            }
            info!("Sellout monitor stopped");
        })
    }

    async fn reap_task(name: &str, handle: JoinHandle<()>, timeout: Duration) {
        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(())) => info!(task = name, "Task stopped gracefully"),
            Ok(Err(e)) => warn!(task = name, error = %e, "Task failed"),
            Err(_) => warn!(task = name, "Task shutdown timed out"),
        }
    }

    fn summarize(&self, run_id: RunId, started_at: DateTime<Utc>, pool: &TicketPool) -> RunSummary {
        let snap = pool.snapshot();
        RunSummary {
            run_id,
            event_title: pool.event_title().to_string(),
            vendor_name: pool.vendor_name().to_string(),
            outcome: self.status(),
            tickets_sold: snap.tickets_sold,
            customers_served: snap.customers_served,
            tickets_unsold: pool.total_tickets() - snap.tickets_sold,
            started_at,
            finished_at: Utc::now(),
        }
    }

    fn lock_run(&self) -> std::sync::MutexGuard<'_, Option<ActiveRun>> {
        self.run.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimulationManager {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diagnostics::InMemorySink;

    fn fast_config() -> SimulationConfig {
        SimulationConfig {
            max_ticket_capacity: 10,
            total_tickets: 20,
            ticket_release_rate: 5,
            ticket_release_interval_ms: 5,
            customer_retrieval_rate: 4,
            customer_retrieval_interval_ms: 5,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn controller_starts_idle() {
        let manager = SimulationManager::new(Arc::new(InMemorySink::new()));
        assert_eq!(manager.status(), SimulationStatus::Idle);
    }

    #[tokio::test]
    async fn invalid_config_aborts_the_start() {
        let manager = SimulationManager::new(Arc::new(InMemorySink::new()));
        let config = SimulationConfig {
            total_tickets: 0,
            ..fast_config()
        };

        let result = manager.start(&config);
        assert!(matches!(result, Err(SimulationError::Config(_))));
        assert_eq!(manager.status(), SimulationStatus::Idle);
    }

    #[tokio::test]
    async fn stop_without_a_run_is_rejected() {
        let manager = SimulationManager::new(Arc::new(InMemorySink::new()));
        assert!(matches!(
            manager.stop().await,
            Err(SimulationError::NotRunning)
        ));
    }

    #[tokio::test]
    async fn second_start_is_rejected_while_running() {
        let manager = SimulationManager::new(Arc::new(InMemorySink::new()))
            .with_monitor_interval(Duration::from_millis(10))
            .with_reap_timeout(Duration::from_millis(500));
        let config = fast_config();

        manager.start(&config).unwrap();
        assert!(matches!(
            manager.start(&config),
            Err(SimulationError::AlreadyRunning)
        ));

        manager.stop().await.unwrap();
        assert_eq!(manager.status(), SimulationStatus::Interrupted);
    }
}
