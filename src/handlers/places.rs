//! Place autocomplete handler
//!
//! Upstream failures degrade to an empty suggestion list instead of an
//! error: a broken autocomplete should never block the form.

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::services::routing::RouteProvider;
use crate::types::{
    ErrorResponse, PlaceQueryPayload, PlaceSuggestionsResponse, Request, SuccessResponse,
};

const SUGGESTION_LIMIT: usize = 5;
const MIN_QUERY_LEN: usize = 2;

/// Trim the query; None when it is too short to search.
fn normalize_query(raw: &str) -> Option<&str> {
    let query = raw.trim();
    (query.len() >= MIN_QUERY_LEN).then_some(query)
}

/// Handle places.suggest requests
pub async fn handle_suggest(
    client: Client,
    mut subscriber: Subscriber,
    provider: Arc<dyn RouteProvider>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received places.suggest message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<PlaceQueryPayload> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse places.suggest request: {}", e);
                let response = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client
                    .publish(reply, serde_json::to_vec(&response)?.into())
                    .await;
                continue;
            }
        };

        let suggestions = match normalize_query(&request.payload.q) {
            Some(query) => match provider.search_places(query, SUGGESTION_LIMIT).await {
                Ok(suggestions) => suggestions,
                Err(e) => {
                    warn!("Place search failed, returning no suggestions: {}", e);
                    vec![]
                }
            },
            None => vec![],
        };

        let response =
            SuccessResponse::new(request.id, PlaceSuggestionsResponse { suggestions });
        let _ = client
            .publish(reply, serde_json::to_vec(&response)?.into())
            .await;
    }

    Ok(())
}
