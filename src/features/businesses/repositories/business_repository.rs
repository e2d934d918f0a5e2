use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::businesses::dtos::CreateBusinessDto;
use crate::features::businesses::models::Business;
use crate::shared::types::Pagination;

/// Persistence for businesses
#[async_trait]
pub trait BusinessRepository: Send + Sync {
    async fn insert(&self, dto: &CreateBusinessDto) -> Result<Business>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Business>>;

    /// One page of businesses, newest first
    async fn list(&self, pagination: Pagination) -> Result<Vec<Business>>;

    async fn count(&self) -> Result<i64>;
}

const BUSINESS_COLUMNS: &str =
    "id, name, owner_name, owner_phone, category, city, created_at, updated_at";

pub struct PgBusinessRepository {
    pool: PgPool,
}

impl PgBusinessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BusinessRepository for PgBusinessRepository {
    async fn insert(&self, dto: &CreateBusinessDto) -> Result<Business> {
        let sql = format!(
            r#"
            INSERT INTO businesses (name, owner_name, owner_phone, category, city)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            BUSINESS_COLUMNS
        );

        sqlx::query_as::<_, Business>(&sql)
            .bind(&dto.name)
            .bind(&dto.owner_name)
            .bind(&dto.owner_phone)
            .bind(&dto.category)
            .bind(&dto.city)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create business: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Business>> {
        let sql = format!("SELECT {} FROM businesses WHERE id = $1", BUSINESS_COLUMNS);

        sqlx::query_as::<_, Business>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch business {}: {:?}", id, e);
                AppError::Database(e)
            })
    }

    async fn list(&self, pagination: Pagination) -> Result<Vec<Business>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM businesses
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
            BUSINESS_COLUMNS
        );

        sqlx::query_as::<_, Business>(&sql)
            .bind(pagination.limit)
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list businesses: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM businesses")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count businesses: {:?}", e);
                AppError::Database(e)
            })
    }
}
