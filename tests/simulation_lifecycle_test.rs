//! Lifecycle tests for the simulation controller.
//!
//! Exercises the `Idle → Running → (Completed | Interrupted)` state machine
//! end to end with millisecond intervals: natural sellout, operator
//! interruption, double-start/double-stop rejection, prompt agent shutdown,
//! and the diagnostics trail each run leaves behind.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use std::sync::Arc;
use std::time::{Duration, Instant};
use ticketing_sim::{
    InMemorySink, PoolEvent, SimulationConfig, SimulationError, SimulationManager,
    SimulationStatus,
};

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

fn fast_manager(sink: Arc<InMemorySink>) -> SimulationManager {
    SimulationManager::new(sink)
        .with_monitor_interval(Duration::from_millis(10))
        .with_reap_timeout(Duration::from_secs(1))
}

#[tokio::test]
async fn run_completes_when_the_event_sells_out() {
    let sink = Arc::new(InMemorySink::new());
    let manager = fast_manager(Arc::clone(&sink));

    manager.start(&fast_config()).unwrap();
    assert_eq!(manager.status(), SimulationStatus::Running);

    let summary = manager.wait().await.unwrap();
    assert_eq!(summary.outcome, SimulationStatus::Completed);
    assert_eq!(manager.status(), SimulationStatus::Completed);
    assert_eq!(summary.tickets_sold, 20);
    assert_eq!(summary.tickets_unsold, 0);
    // At most 4 tickets per retrieval call, so at least 5 calls served.
    assert!(summary.customers_served >= 5);

    let events = sink.events();
    assert!(events
        .iter()
        .any(|e| matches!(e, PoolEvent::PoolCreated { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, PoolEvent::TicketsReleased { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, PoolEvent::TicketsPurchased { .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        PoolEvent::Completed {
            tickets_sold: 20,
            ..
        }
    )));
}

#[tokio::test]
async fn sellout_fires_even_when_the_remainder_is_unreleasable() {
    // 7 tickets with an all-or-nothing batch of 5: after one release the
    // remaining 2 can never be admitted, so the run must still end.
    let config = SimulationConfig {
        max_ticket_capacity: 10,
        total_tickets: 7,
        ticket_release_rate: 5,
        ticket_release_interval_ms: 5,
        customer_retrieval_rate: 7,
        customer_retrieval_interval_ms: 5,
        ..SimulationConfig::default()
    };
    let manager = fast_manager(Arc::new(InMemorySink::new()));

    manager.start(&config).unwrap();
    let summary = manager.wait().await.unwrap();

    assert_eq!(summary.outcome, SimulationStatus::Completed);
    assert_eq!(summary.tickets_sold, 5);
    assert_eq!(summary.tickets_unsold, 2);
}

#[tokio::test]
async fn double_start_is_rejected_and_restart_allowed_after_stop() {
    let manager = fast_manager(Arc::new(InMemorySink::new()));
    let config = SimulationConfig {
        total_tickets: 100_000,
        ..fast_config()
    };

    manager.start(&config).unwrap();
    assert!(matches!(
        manager.start(&config),
        Err(SimulationError::AlreadyRunning)
    ));

    let summary = manager.stop().await.unwrap();
    assert_eq!(summary.outcome, SimulationStatus::Interrupted);
    assert_eq!(manager.status(), SimulationStatus::Interrupted);

    // Double stop is reported, not fatal.
    assert!(matches!(
        manager.stop().await,
        Err(SimulationError::NotRunning)
    ));

    // Any non-running state permits a fresh start.
    manager.start(&fast_config()).unwrap();
    assert_eq!(manager.status(), SimulationStatus::Running);
    manager.stop().await.unwrap();
}

#[tokio::test]
async fn stop_interrupts_a_live_run() {
    let sink = Arc::new(InMemorySink::new());
    let manager = fast_manager(Arc::clone(&sink));
    let config = SimulationConfig {
        total_tickets: 100_000,
        ..fast_config()
    };

    manager.start(&config).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let summary = manager.stop().await.unwrap();

    assert_eq!(summary.outcome, SimulationStatus::Interrupted);
    assert!(summary.tickets_sold < config.total_tickets);
    assert!(sink
        .events()
        .iter()
        .any(|e| matches!(e, PoolEvent::Interrupted { .. })));
}

#[tokio::test]
async fn stop_returns_promptly_despite_long_agent_intervals() {
    // Agents sleeping for 30s must still exit as soon as the shutdown
    // signal lands; the stop must not wait out their intervals.
    let config = SimulationConfig {
        max_ticket_capacity: 10,
        total_tickets: 1_000,
        ticket_release_rate: 5,
        ticket_release_interval_ms: 30_000,
        customer_retrieval_rate: 4,
        customer_retrieval_interval_ms: 30_000,
        ..SimulationConfig::default()
    };
    let manager = SimulationManager::new(Arc::new(InMemorySink::new()))
        .with_monitor_interval(Duration::from_millis(10))
        .with_reap_timeout(Duration::from_secs(5));

    manager.start(&config).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let before = Instant::now();
    let summary = manager.stop().await.unwrap();
    assert!(
        before.elapsed() < Duration::from_secs(2),
        "stop took {:?}",
        before.elapsed()
    );
    assert_eq!(summary.outcome, SimulationStatus::Interrupted);
}

#[tokio::test]
async fn control_calls_without_a_run_are_rejected() {
    let manager = fast_manager(Arc::new(InMemorySink::new()));
    assert_eq!(manager.status(), SimulationStatus::Idle);
    assert!(matches!(
        manager.stop().await,
        Err(SimulationError::NotRunning)
    ));
    assert!(matches!(
        manager.wait().await,
        Err(SimulationError::NotRunning)
    ));
}

#[tokio::test]
async fn wait_reaps_the_run_exactly_once() {
    let manager = fast_manager(Arc::new(InMemorySink::new()));
    manager.start(&fast_config()).unwrap();

    manager.wait().await.unwrap();
    assert!(matches!(
        manager.wait().await,
        Err(SimulationError::NotRunning)
    ));
}

#[tokio::test]
async fn summary_carries_the_run_metadata() {
    let config = fast_config();
    let manager = fast_manager(Arc::new(InMemorySink::new()));

    let run_id = manager.start(&config).unwrap();
    let summary = manager.wait().await.unwrap();

    assert_eq!(summary.run_id, run_id);
    assert_eq!(summary.event_title, config.event_title);
    assert_eq!(summary.vendor_name, config.vendor_name);
    assert!(summary.finished_at >= summary.started_at);
}
