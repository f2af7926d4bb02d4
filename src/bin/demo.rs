//! Ticket Sales Simulation Demo
//!
//! Plays the role of the interactive console: runs one simulation to natural
//! sellout, then starts a second run and interrupts it mid-flight, printing
//! the final accounting for both.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin demo
//! ```
//!
//! Configuration is read from `TICKET_SIM_*` environment variables, falling
//! back to built-in defaults.

use std::sync::Arc;
use std::time::Duration;
use ticketing_sim::{RunSummary, SimulationConfig, SimulationManager, TracingSink};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ticketing_sim=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("\n🎫 ============================================");
    println!("   Ticket Sales Simulation - Demo");
    println!("============================================\n");

    let config = SimulationConfig::from_env();
    println!("📋 Configuration");
    println!("   Event:    {}", config.event_title);
    println!("   Vendor:   {}", config.vendor_name);
    println!(
        "   Tickets:  {} total, pool capacity {}",
        config.total_tickets, config.max_ticket_capacity
    );
    println!(
        "   Release:  {} every {}ms / Retrieval: {} every {}ms\n",
        config.ticket_release_rate,
        config.ticket_release_interval_ms,
        config.customer_retrieval_rate,
        config.customer_retrieval_interval_ms
    );

    let manager = SimulationManager::new(Arc::new(TracingSink))
        .with_monitor_interval(Duration::from_millis(500));

    // Step 1: run to natural sellout
    println!("1️⃣  Running simulation to sellout...");
    let run_id = manager.start(&config)?;
    println!("✓ Run {run_id} started\n");

    let summary = manager.wait().await?;
    print_summary(&summary);

    // Step 2: start a second run and interrupt it
    println!("2️⃣  Starting a second run, then interrupting it...");
    let run_id = manager.start(&config)?;
    println!("✓ Run {run_id} started");

    tokio::time::sleep(Duration::from_secs(3)).await;
    println!("⏹  Stopping the run...\n");
    let summary = manager.stop().await?;
    print_summary(&summary);

    println!("✅ Demo complete");
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("📊 Run {} — {}", summary.run_id, summary.outcome);
    println!("   Tickets sold:     {}", summary.tickets_sold);
    println!("   Customers served: {}", summary.customers_served);
    println!("   Tickets unsold:   {}", summary.tickets_unsold);
    println!(
        "   Duration:         {}ms\n",
        summary.duration().num_milliseconds()
    );
}
