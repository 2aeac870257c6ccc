//! Planner demo.
//!
//! Walks one wedding through rooms, a shuttle and reception seating, then prints
//! the occupancy export. Uses `PostgreSQL` when `DATABASE_URL` is set and an
//! in-memory store otherwise.
//!
//! Run with:
//! ```bash
//! cargo run --bin demo
//! ```

use anyhow::Context;
use wedplan::telemetry::{init_metrics, init_tracing};
use wedplan::{Config, PlannerApp};
use wedplan_core::types::{Guest, ResourceCategory, RsvpStatus};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = Config::from_env().context("loading configuration")?;
    init_tracing(&config.observability);
    let metrics = init_metrics(&config.observability)?;

    println!("=== Wedding Planner Demo ===\n");

    let app = PlannerApp::new(config).await?;
    let ledger = app.ledger();

    println!("Step 1: Seeding guests...");
    let jane = app.seed_guest(Guest::new("Jane", "Doe", RsvpStatus::Attending)).await?;
    let john = app.seed_guest(Guest::new("John", "Smith", RsvpStatus::Attending)).await?;
    let ana = app.seed_guest(Guest::new("Ana", "Lopez", RsvpStatus::Pending)).await?;
    let max = app.seed_guest(Guest::new("Max", "Weber", RsvpStatus::Declined)).await?;
    println!("  ✓ 4 guests (one pending, one declined)\n");

    println!("Step 2: Creating hotel, shuttle and reception...");
    let (hotel, _) = ledger.create_parent(ResourceCategory::Room, "Grand Hotel").await?;
    let (double, _) = ledger.create_container(hotel, "101", "Double", Some(2)).await?;
    let (single, _) = ledger.create_container(hotel, "102", "Single", Some(1)).await?;
    let (route, _) = ledger.create_parent(ResourceCategory::Vehicle, "Airport Shuttle").await?;
    let (van, _) = ledger.create_container(route, "Van 1", "Minivan", Some(6)).await?;
    let (reception, _) = ledger.create_parent(ResourceCategory::Table, "Reception").await?;
    let (rose, _) = ledger.create_container(reception, "Rose", "Round", Some(8)).await?;
    println!("  ✓ 3 parents, 4 containers\n");

    println!("Step 3: Assigning rooms...");
    ledger.assign(jane, double).await?;
    ledger.assign(john, double).await?;
    println!("  ✓ Jane and John share room 101");
    match ledger.assign(ana, double).await {
        Err(e) => println!("  ✓ Ana rejected: {e}"),
        Ok(_) => println!("  ✗ Ana should not fit in a full room"),
    }
    ledger.assign(ana, single).await?;
    println!("  ✓ Ana placed in room 102\n");

    println!("Step 4: Shuttle and seating...");
    ledger.assign(jane, van).await?;
    ledger.assign(john, van).await?;
    for guest in [jane, john, ana] {
        ledger.assign(guest, rose).await?;
    }
    println!("  ✓ 2 riders, 3 seated at Rose\n");

    println!("Step 5: Still to place...");
    for category in ResourceCategory::ALL {
        let scope = (category == ResourceCategory::Table).then_some(reception);
        let waiting = ledger.unassigned(category, scope).await?;
        let names: Vec<String> = waiting.iter().map(Guest::full_name).collect();
        println!("  {category}: {}", if names.is_empty() { "-".to_string() } else { names.join(", ") });
    }
    println!("  (Max declined and is never listed)\n");
    tracing::debug!(declined = %max, "Declined guest skipped");

    println!("Step 6: Resizing room 101 down to 1...");
    let resized = ledger.resize(double, 1).await?;
    if let Some(warning) = resized.warning {
        println!("  ⚠ {warning}\n");
    }

    println!("Step 7: Occupancy export (CSV)");
    println!("{}", ledger.export_csv().await?);

    println!("Step 8: Occupancy export (JSON)");
    let rows = ledger.export_rows().await?;
    println!("{}", serde_json::to_string_pretty(&rows)?);

    if let Some(text) = metrics.as_ref().and_then(|m| m.render()) {
        println!("\n=== Metrics ===\n{text}");
    }

    println!("\n=== Demo Complete ===");
    Ok(())
}
