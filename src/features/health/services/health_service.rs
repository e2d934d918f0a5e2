use std::sync::Arc;

use chrono::Utc;

use crate::core::config::Environment;
use crate::core::database::StoreHealth;
use crate::features::health::dtos::HealthResponseDto;

/// Reports whether the relational store answers
pub struct HealthService {
    store: Arc<dyn StoreHealth>,
    environment: Environment,
}

impl HealthService {
    pub fn new(store: Arc<dyn StoreHealth>, environment: Environment) -> Self {
        Self { store, environment }
    }

    /// Probe the store. `Err` carries the unhealthy body.
    pub async fn check(&self) -> Result<HealthResponseDto, HealthResponseDto> {
        match self.store.ping().await {
            Ok(()) => Ok(HealthResponseDto {
                status: "ok".to_string(),
                timestamp: Utc::now(),
                database: "connected".to_string(),
                environment: Some(self.environment.to_string()),
            }),
            Err(e) => {
                tracing::error!("Health check failed: {}", e);
                Err(HealthResponseDto {
                    status: "error".to_string(),
                    timestamp: Utc::now(),
                    database: "disconnected".to_string(),
                    environment: None,
                })
            }
        }
    }
}
