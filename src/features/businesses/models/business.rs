use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::features::businesses::dtos::BusinessResponseDto;

/// Database model for business
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Business {
    pub id: i64,
    pub name: String,
    pub owner_name: String,
    pub owner_phone: String,
    pub category: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Business> for BusinessResponseDto {
    fn from(b: Business) -> Self {
        Self {
            id: b.id,
            name: b.name,
            owner_name: b.owner_name,
            owner_phone: b.owner_phone,
            category: b.category,
            city: b.city,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}
