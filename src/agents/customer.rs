//! The ticket-purchasing customer agent.

use crate::config::ConfigError;
use crate::pool::TicketPool;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;

/// Periodic task that retrieves up to a fixed batch of tickets from the pool.
///
/// Same loop and interruption contract as the vendor: one `remove_tickets`
/// attempt per iteration, then an interruptible sleep. An empty pool is not
/// retried early.
pub struct Customer {
    pool: TicketPool,
    retrieval_rate: u32,
    retrieval_interval: Duration,
    shutdown: broadcast::Receiver<()>,
}

impl Customer {
    /// Create a customer bound to `pool`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotPositive`] if `retrieval_rate` is 0 or
    /// `retrieval_interval` is zero.
    pub fn new(
        pool: TicketPool,
        retrieval_rate: u32,
        retrieval_interval: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<Self, ConfigError> {
        if retrieval_rate == 0 {
            return Err(ConfigError::NotPositive {
                field: "customer retrieval rate",
            });
        }
        if retrieval_interval.is_zero() {
            return Err(ConfigError::NotPositive {
                field: "customer retrieval interval",
            });
        }
        Ok(Self {
            pool,
            retrieval_rate,
            retrieval_interval,
            shutdown,
        })
    }

    /// Spawn the customer as a background task.
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
            agent = "customer",
            rate = self.retrieval_rate,
            interval = ?self.retrieval_interval,
            "Customer started"
        );

        loop {
            // Rejections are already recorded by the pool's diagnostics.
            let _ = self.pool.remove_tickets(self.retrieval_rate);

            tokio::select! {
                _ = self.shutdown.recv() => {
                    info!(agent = "customer", "Customer received shutdown signal");
                    break;
                }
                () = tokio::time::sleep(self.retrieval_interval) => {}
            }
        }

        info!(agent = "customer", "Customer stopped");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::diagnostics::InMemorySink;
    use std::sync::Arc;

    fn test_pool() -> TicketPool {
        TicketPool::new(&SimulationConfig::default(), Arc::new(InMemorySink::new())).unwrap()
    }

    #[test]
    fn zero_rate_is_rejected() {
        let (tx, _) = broadcast::channel(1);
        let result = Customer::new(test_pool(), 0, Duration::from_millis(10), tx.subscribe());
        assert_eq!(
            result.err(),
            Some(ConfigError::NotPositive {
                field: "customer retrieval rate"
            })
        );
    }

    #[tokio::test]
    async fn customer_drains_until_shutdown() {
        let pool = test_pool();
        pool.add_tickets(10).unwrap();
        let (tx, _) = broadcast::channel(1);
        let customer =
            Customer::new(pool.clone(), 4, Duration::from_millis(5), tx.subscribe()).unwrap();

        let handle = customer.spawn();
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(()).unwrap();
        handle.await.unwrap();

        assert_eq!(pool.size(), 0);
        assert_eq!(pool.snapshot().tickets_sold, 10);
    }
}
