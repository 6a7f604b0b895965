//! Feed demo binary
//!
//! Walks through the event participation lifecycle: registering events,
//! requesting to join, organizer decisions, withdrawal, and the feed and
//! button projections a presentation layer would render.

use chrono::{Duration, Utc};
use clubhub_core::environment::SystemClock;
use clubhub_participation::{
    Capacity, Decision, EventId, EventRecord, ParticipationEngine, UserId,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_card(record: &EventRecord, viewer: UserId) {
    let button = record.join_button(viewer);
    println!(
        "  [{}] {}/{} participants ({} pending) — button: \"{}\" (enabled: {})",
        record.status(),
        record.approved_count(),
        record.required_slots(),
        record.pending_count(),
        button.label,
        button.enabled,
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feed_demo=debug,clubhub_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Feed Demo: ClubHub Event Participation Engine ===\n");

    let engine = ParticipationEngine::new(Arc::new(SystemClock));

    // Register two events: a small workshop and a hike with a waitlist
    let workshop = EventId::new();
    let hike = EventId::new();
    let now = Utc::now();

    engine
        .register_event(
            workshop,
            Capacity::new(2),
            false,
            now + Duration::days(7),
            now + Duration::days(7) + Duration::hours(3),
        )
        .await?;
    engine
        .register_event(
            hike,
            Capacity::new(1),
            true,
            now + Duration::days(10),
            now + Duration::days(10) + Duration::hours(6),
        )
        .await?;

    let alice = UserId::new();
    let bob = UserId::new();
    let carol = UserId::new();

    println!(">>> Alice and Bob request to join the workshop");
    engine.request_to_join(workshop, alice).await?;
    engine.request_to_join(workshop, bob).await?;
    print_card(&engine.record(workshop).await?, carol);

    println!("\n>>> The organizer approves both");
    engine.decide(workshop, alice, Decision::Approve).await?;
    engine.decide(workshop, bob, Decision::Approve).await?;
    print_card(&engine.record(workshop).await?, carol);

    println!("\n>>> Carol tries the full workshop (no waitlist)");
    match engine.request_to_join(workshop, carol).await {
        Ok(outcome) => println!("  unexpected success: {outcome:?}"),
        Err(error) => println!("  refused: {error}"),
    }

    println!("\n>>> Carol joins the hike, Alice waitlists behind her");
    engine.request_to_join(hike, carol).await?;
    engine.decide(hike, carol, Decision::Approve).await?;
    let outcome = engine.request_to_join(hike, alice).await?;
    println!("  Alice's request outcome: {outcome:?}");
    print_card(&engine.record(hike).await?, alice);

    println!("\n>>> Carol withdraws from the hike (no auto-promotion)");
    engine.withdraw(hike, carol).await?;
    print_card(&engine.record(hike).await?, alice);

    println!("\n>>> The feed, newest registration first");
    for record in engine.events_by_recency().await {
        print_card(&record, carol);
    }

    println!("\n>>> Closing the workshop");
    engine.close_event(workshop).await?;
    print_card(&engine.record(workshop).await?, carol);

    Ok(())
}
