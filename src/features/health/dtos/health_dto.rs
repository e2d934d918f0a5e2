use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Store connectivity report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponseDto {
    /// `ok` or `error`
    pub status: String,
    pub timestamp: DateTime<Utc>,
    /// `connected` or `disconnected`
    pub database: String,
    /// Runtime mode, omitted when unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RootResponseDto {
    pub message: String,
}
