//! Basic Waymark wizard example.
//!
//! This example demonstrates:
//! - Running a wizard session over a cached card source
//! - Gated forward navigation
//! - Cascading invalidation when an earlier choice changes
//! - Observing wizard events
//! - Rendering the navigation trail
//!
//! Run with: `RUST_LOG=waymark=debug cargo run --example basic_wizard`

use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use waymark::{
    CachedLoader, Card, CardType, LoadKey, MemoryCardSource, OptionsStatus, Result,
    SessionConfig, StepCatalog, StepId, StepLoader, Wizard, WizardEvent, WizardHandle,
    WizardSession, WizardSnapshot,
};

async fn seed(source: &MemoryCardSource) {
    source
        .insert(
            LoadKey::root(StepId::Class),
            vec![
                Card::new(1, "Warrior", CardType::Class).with_description("Frontline fighter"),
                Card::new(2, "Ranger", CardType::Class).with_description("Tracker and archer"),
            ],
        )
        .await;
    source
        .insert(
            LoadKey::dependent(StepId::Subclass, 1),
            vec![Card::new(11, "Call of the Brave", CardType::Subclass)],
        )
        .await;
    source
        .insert(
            LoadKey::dependent(StepId::Subclass, 2),
            vec![Card::new(21, "Beastbound", CardType::Subclass)],
        )
        .await;
    source
        .insert(
            LoadKey::root(StepId::Ancestry),
            vec![Card::new(31, "Elf", CardType::Ancestry)],
        )
        .await;
}

async fn settled(handle: &WizardHandle) -> Result<WizardSnapshot> {
    loop {
        let snapshot = handle.snapshot().await?;
        if !matches!(snapshot.current_options, OptionsStatus::Loading) {
            return Ok(snapshot);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn first_card(snapshot: &WizardSnapshot) -> Option<Card> {
    snapshot.cards().and_then(|cards| cards.first().cloned())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("╔═══════════════════════════════════════════╗");
    println!("║  Waymark Character Creation Example      ║");
    println!("╚═══════════════════════════════════════════╝\n");

    let source = MemoryCardSource::new();
    seed(&source).await;
    let loader: Arc<dyn StepLoader> = Arc::new(CachedLoader::new(source.clone()));

    let handle = WizardSession::spawn(
        Wizard::new(StepCatalog::character_creation()),
        loader,
        SessionConfig::default().with_name("demo"),
    );

    let mut events = handle.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                WizardEvent::StepEntered { to, .. } => println!("   [Event] Entered '{}'", to),
                WizardEvent::CardSelected { step, card, .. } => {
                    println!("   [Event] Card #{} chosen on '{}'", card, step)
                }
                WizardEvent::StepsInvalidated { steps } => {
                    println!("   [Event] Cleared steps: {:?}", steps)
                }
                WizardEvent::NavigationBlocked { target, .. } => {
                    println!("   [Event] '{}' is not reachable yet", target)
                }
                WizardEvent::LoadCompleted { key, count } => {
                    println!("   [Event] Loaded {} card(s) for {}", count, key)
                }
                _ => {}
            }
        }
    });

    println!("🃏 Choosing a class");
    let snapshot = settled(&handle).await?;
    if let Some(card) = first_card(&snapshot) {
        println!("   Picking {}", card);
        handle.select(card).await?;
    }

    println!("\n🚫 Trying to skip ahead to ancestry");
    handle.navigate(StepId::Ancestry).await?;

    println!("\n▶️  Next: subclass");
    handle.next().await?;
    let snapshot = settled(&handle).await?;
    if let Some(card) = first_card(&snapshot) {
        handle.select(card).await?;
    }

    println!("\n🔁 Changing class to Ranger");
    handle.navigate(StepId::Class).await?;
    handle.select(Card::new(2, "Ranger", CardType::Class)).await?;

    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = handle.snapshot().await?;
    println!("\n📊 Navigation:");
    println!("─────────────────────────────────────────");
    println!("{}", snapshot.navigation);
    println!("Summary: {}", serde_json::to_string(&snapshot.summary)?);
    println!("Card fetches: {}", source.fetch_count().await);

    handle.shutdown().await?;
    Ok(())
}
