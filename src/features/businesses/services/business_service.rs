use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::businesses::dtos::{BusinessResponseDto, CreateBusinessDto};
use crate::features::businesses::repositories::BusinessRepository;
use crate::shared::constants::BUSINESS_NOT_FOUND_MESSAGE;
use crate::shared::types::{PaginatedResponse, Pagination};

/// Service for managing businesses
pub struct BusinessService {
    repository: Arc<dyn BusinessRepository>,
}

impl BusinessService {
    pub fn new(repository: Arc<dyn BusinessRepository>) -> Self {
        Self { repository }
    }

    /// Persist an already validated business
    pub async fn create(&self, dto: CreateBusinessDto) -> Result<BusinessResponseDto> {
        let business = self.repository.insert(&dto).await?;

        tracing::info!(
            "Business created: id={}, name={:?}",
            business.id,
            business.name
        );

        Ok(business.into())
    }

    pub async fn get(&self, id: i64) -> Result<BusinessResponseDto> {
        self.repository
            .find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound(BUSINESS_NOT_FOUND_MESSAGE.to_string()))
    }

    /// List businesses, newest first.
    ///
    /// The total is counted alongside the page fetch, not in the same
    /// transaction, so it may lag concurrent inserts.
    pub async fn list(&self, pagination: Pagination) -> Result<PaginatedResponse<BusinessResponseDto>> {
        let (businesses, total) = tokio::try_join!(
            self.repository.list(pagination),
            self.repository.count()
        )?;

        Ok(PaginatedResponse::new(businesses, total, pagination).map(Into::into))
    }
}
