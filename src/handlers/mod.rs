//! NATS message handlers

pub mod ping;
pub mod places;
pub mod trip;

use std::sync::Arc;

use anyhow::Result;
use async_nats::Client;
use futures::FutureExt;
use tracing::{error, info};

use crate::config::Config;
use crate::services::routing::{create_route_provider, RouteProvider};

/// Start all message handlers
pub async fn start_handlers(client: Client, config: &Config) -> Result<()> {
    info!("Starting message handlers...");

    // Shared route provider (Mapbox or mock per configuration)
    let provider: Arc<dyn RouteProvider> = Arc::from(create_route_provider(config));
    info!("Route provider initialized: {}", provider.name());

    // Subscribe to all subjects
    let ping_sub = client.subscribe("roadlog.ping").await?;
    let trip_plan_sub = client.subscribe("roadlog.trip.plan").await?;
    let places_suggest_sub = client.subscribe("roadlog.places.suggest").await?;

    info!("Subscribed to NATS subjects");

    // Clone for each handler
    let client_ping = client.clone();
    let client_trip_plan = client.clone();
    let client_places_suggest = client.clone();

    let provider_trip_plan = Arc::clone(&provider);
    let provider_places_suggest = Arc::clone(&provider);
    let provider_name = provider.name().to_string();

    let ping_handle = tokio::spawn(async move {
        if let Err(e) = ping::handle_ping(client_ping, ping_sub, provider_name).await {
            error!("Ping handler error: {}", e);
        }
    });

    let trip_plan_handle = tokio::spawn(async move {
        if let Err(e) = trip::handle_plan(client_trip_plan, trip_plan_sub, provider_trip_plan).await
        {
            error!("Trip plan handler error: {}", e);
        }
    });

    let places_suggest_handle = tokio::spawn(async move {
        if let Err(e) = places::handle_suggest(
            client_places_suggest,
            places_suggest_sub,
            provider_places_suggest,
        )
        .await
        {
            error!("Places suggest handler error: {}", e);
        }
    });

    let handles = vec![
        ping_handle.boxed(),
        trip_plan_handle.boxed(),
        places_suggest_handle.boxed(),
    ];

    let (result, _index, _remaining) = futures::future::select_all(handles).await;
    error!("A handler finished unexpectedly: {:?}", result);

    Ok(())
}
