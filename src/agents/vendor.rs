//! The ticket-releasing vendor agent.

use crate::config::ConfigError;
use crate::pool::TicketPool;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;

/// Periodic task that releases a fixed batch of tickets into the pool.
///
/// Each iteration attempts one `add_tickets` call and then sleeps for the
/// configured interval. Rejections (pool full, nothing left to release) are
/// not retried early; the vendor simply waits out the interval and tries
/// again. The sleep races against the shutdown signal, so cancellation takes
/// effect promptly rather than after a blind delay.
pub struct Vendor {
    pool: TicketPool,
    release_rate: u32,
    release_interval: Duration,
    shutdown: broadcast::Receiver<()>,
}

impl Vendor {
    /// Create a vendor bound to `pool`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotPositive`] if `release_rate` is 0 or
    /// `release_interval` is zero.
    pub fn new(
        pool: TicketPool,
        release_rate: u32,
        release_interval: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<Self, ConfigError> {
        if release_rate == 0 {
            return Err(ConfigError::NotPositive {
                field: "ticket release rate",
            });
        }
        if release_interval.is_zero() {
            return Err(ConfigError::NotPositive {
                field: "ticket release interval",
            });
        }
        Ok(Self {
            pool,
            release_rate,
            release_interval,
            shutdown,
        })
    }

    /// Spawn the vendor as a background task.
    ///
    /// The task runs until the shutdown signal is received.
    #[must_use]
    pub fn spawn(mut self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&mut self) {
        info!(
            agent = "vendor",
            rate = self.release_rate,
            interval = ?self.release_interval,
            "Vendor started"
        );

        loop {
            // Rejections are already recorded by the pool's diagnostics.
            let _ = self.pool.add_tickets(self.release_rate);

            tokio::select! {
                _ = self.shutdown.recv() => {
                    info!(agent = "vendor", "Vendor received shutdown signal");
                    break;
                }
                () = tokio::time::sleep(self.release_interval) => {}
            }
        }

        info!(agent = "vendor", "Vendor stopped");
    }
}
