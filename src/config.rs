//! Configuration management

use anyhow::Result;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// NATS server URL
    pub nats_url: String,

    /// Mapbox access token for geocoding and directions (optional;
    /// without it route planning resolves no routes)
    pub mapbox_access_token: Option<String>,

    /// Route provider override ("mock" for offline development)
    pub route_provider: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let nats_url = std::env::var("NATS_URL")
            .unwrap_or_else(|_| "nats://localhost:4222".to_string());

        let mapbox_access_token = std::env::var("MAPBOX_ACCESS_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let route_provider = std::env::var("ROUTE_PROVIDER").ok();

        Ok(Self {
            nats_url,
            mapbox_access_token,
            route_provider,
        })
    }
}
