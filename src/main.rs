//! # nore-track
//!
//! Follows one order from the terminal, redrawing the view on every change
//! until the order is served, cancelled or not found (or Ctrl-C is pressed).

use clap::Parser;
use nore_tracker::clients::{build_client, HttpOrderSource, HttpProfileClient, SseChangeChannel};
use nore_tracker::config::{TrackerArgs, TrackerConfig};
use nore_tracker::lifecycle::{setup_tracing, TrackerServices, TrackerSession};
use nore_tracker::model::RestaurantProfile;
use nore_tracker::tracker::{Alert, SilentAlert, TerminalBell};
use std::sync::Arc;
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    // A missing .env file is fine; real environment variables still apply.
    dotenvy::dotenv().ok();
    setup_tracing();

    let config = TrackerConfig::try_from(TrackerArgs::parse()).map_err(|e| e.to_string())?;
    info!(order_id = %config.order_id, api_url = %config.api_url, "Starting order tracker");

    let lookups = build_client(Some(config.timeout)).map_err(|e| e.to_string())?;
    let streaming = build_client(None).map_err(|e| e.to_string())?;

    let profile = match &config.restaurant_id {
        Some(restaurant_id) => {
            let span = tracing::info_span!("profile_lookup");
            HttpProfileClient::new(lookups.clone(), config.api_url.clone(), config.session.clone())
                .fetch_or_fallback(restaurant_id)
                .instrument(span)
                .await
        }
        None => RestaurantProfile::fallback(),
    };

    let alert: Arc<dyn Alert> = if config.alert_enabled {
        Arc::new(TerminalBell)
    } else {
        Arc::new(SilentAlert)
    };
    let services = TrackerServices {
        source: Arc::new(HttpOrderSource::new(
            lookups,
            config.api_url.clone(),
            config.session.clone(),
        )),
        channel: Arc::new(SseChangeChannel::new(
            streaming,
            config.realtime_url.clone(),
            config.session.clone(),
        )),
        alert,
    };

    let session = TrackerSession::start(config.order_id.clone(), services, profile);
    let mut changes = session.client.changes();

    loop {
        let view = session.view();
        println!("{}", session.render(&view));
        if view.is_final() {
            break;
        }

        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    warn!("Tracker stopped unexpectedly");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    session.shutdown().await.map_err(|e| e.to_string())?;
    Ok(())
}
