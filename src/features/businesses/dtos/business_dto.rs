use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request DTO for registering a business
///
/// Missing fields deserialize as empty strings so they are reported as
/// field issues rather than as a malformed body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateBusinessDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 255, message = "Owner name must be 1-255 characters"))]
    pub owner_name: String,

    /// At least 10 characters
    #[validate(length(min = 10, max = 255, message = "Phone number must be valid"))]
    pub owner_phone: String,

    #[validate(length(min = 1, max = 255, message = "Category must be 1-255 characters"))]
    pub category: String,

    #[validate(length(min = 1, max = 255, message = "City must be 1-255 characters"))]
    pub city: String,
}

impl CreateBusinessDto {
    /// Strip surrounding whitespace so blank values fail the non-empty rules
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            owner_name: self.owner_name.trim().to_string(),
            owner_phone: self.owner_phone.trim().to_string(),
            category: self.category.trim().to_string(),
            city: self.city.trim().to_string(),
        }
    }
}

/// Response DTO for a business
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessResponseDto {
    pub id: i64,
    pub name: String,
    pub owner_name: String,
    pub owner_phone: String,
    pub category: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
