// Decision cycle walkthrough
// Feeds a bullish and a neutral snapshot through the engine and prints the
// resulting events and tracked state

use chrono::Utc;
use common::{IndicatorSnapshot, OptionType};
use rust_decimal_macros::dec;
use signal_engine::{InMemoryGateway, SignalConfig, SignalEngine};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = SignalConfig {
        confidence_threshold: 0.6,
        ..SignalConfig::default()
    };

    let gateway = Arc::new(InMemoryGateway::new());
    let mut engine = SignalEngine::new(config, Box::new(gateway.clone()))?;

    let now = Utc::now();
    let snapshots = vec![
        // PCR bullish, RSI oversold, OI building on a volume spike.
        IndicatorSnapshot {
            symbol: "NIFTY".to_string(),
            strike: dec!(21000),
            option_type: OptionType::Ce,
            pcr: 0.65,
            rsi: 25.0,
            oi: 120_000,
            oi_change_pct: 20.0,
            volume: 40_000,
            avg_volume: 15_000.0,
            last_price: 142.5,
            timestamp: now,
        },
        // Everything in its neutral zone: no signal expected.
        IndicatorSnapshot {
            symbol: "NIFTY".to_string(),
            strike: dec!(21100),
            option_type: OptionType::Pe,
            pcr: 0.9,
            rsi: 50.0,
            oi: 90_000,
            oi_change_pct: 5.0,
            volume: 12_000,
            avg_volume: 15_000.0,
            last_price: 98.3,
            timestamp: now,
        },
    ];

    let events = engine.run_cycle(&snapshots, now).await?;
    println!("cycle produced {} event(s)", events.len());
    for event in &events {
        println!("  {event}");
        for reason in &event.reasons {
            println!("    - {reason}");
        }
    }

    for signal in engine.list_active_signals() {
        println!(
            "active: {} {} until {} (entry {} target {} stop {})",
            signal.key,
            signal.direction,
            signal.expires_at,
            signal.levels.entry_price,
            signal.levels.target_price,
            signal.levels.stop_loss
        );
    }

    println!("status: {:?}", engine.status(now));
    Ok(())
}
