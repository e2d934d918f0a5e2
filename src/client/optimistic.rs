use chrono::Utc;

use crate::client::api_client::{Business, Report, ReportSubmission};
use crate::client::cache::{CacheSnapshot, CachedRecord, QueryCache, QueryKey};
use crate::features::businesses::dtos::CreateBusinessDto;

/// Locally fabricated record shown while a creation is in flight.
///
/// The cached list is snapshotted before the record is injected, so a failed
/// creation restores the list exactly as it was.
#[derive(Debug)]
pub struct OptimisticUpdate {
    snapshot: CacheSnapshot,
    temp_id: i64,
}

impl OptimisticUpdate {
    /// Snapshot `key`, then put `pending(temp_id)` at the top of its first
    /// page and bump the cached total. Lists never loaded are left alone.
    pub fn begin<T: CachedRecord>(
        cache: &mut QueryCache,
        key: QueryKey,
        pending: impl FnOnce(i64) -> T,
    ) -> Self {
        let snapshot = cache.snapshot(key);
        let temp_id = Utc::now().timestamp_millis();

        if let Some(first) = cache.pages_mut::<T>(key).and_then(|pages| pages.first_mut()) {
            first.data.insert(0, pending(temp_id));
            first.meta.total += 1;
        }

        Self { snapshot, temp_id }
    }

    pub fn key(&self) -> QueryKey {
        self.snapshot.key()
    }

    pub fn temp_id(&self) -> i64 {
        self.temp_id
    }

    /// Replace the temporary record with the server's. Returns whether it was found.
    pub fn reconcile<T: CachedRecord>(self, cache: &mut QueryCache, record: T) -> bool {
        let Some(pages) = cache.pages_mut::<T>(self.key()) else {
            return false;
        };

        let slot = pages
            .iter_mut()
            .flat_map(|page| page.data.iter_mut())
            .find(|r| r.record_id() == self.temp_id);

        match slot {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Keep the temporary record visible but mark the list for refetch
    pub fn invalidate(self, cache: &mut QueryCache) {
        cache.invalidate(self.key());
    }

    /// Restore the list exactly as it was before `begin`
    pub fn rollback(self, cache: &mut QueryCache) {
        cache.restore(self.snapshot);
    }

    /// Reconcile on success, roll back on failure, passing the outcome through
    pub fn settle<T: CachedRecord, E>(
        self,
        cache: &mut QueryCache,
        outcome: Result<T, E>,
    ) -> Result<T, E> {
        match outcome {
            Ok(record) => {
                self.reconcile(cache, record.clone());
                Ok(record)
            }
            Err(e) => {
                self.rollback(cache);
                Err(e)
            }
        }
    }
}

/// Placeholder business built from the submitted form
pub fn pending_business(temp_id: i64, dto: &CreateBusinessDto) -> Business {
    let now = Utc::now();
    Business {
        id: temp_id,
        name: dto.name.clone(),
        owner_name: dto.owner_name.clone(),
        owner_phone: dto.owner_phone.clone(),
        category: dto.category.clone(),
        city: dto.city.clone(),
        created_at: now,
        updated_at: now,
    }
}

/// Placeholder report; media locations point at the local file names until
/// the server answers. Pass the business for lists that show it inline.
pub fn pending_report(
    temp_id: i64,
    submission: &ReportSubmission,
    business: Option<&Business>,
) -> Report {
    Report {
        id: temp_id,
        sales: submission.sales,
        expenses: submission.expenses,
        customer_count: submission.customer_count,
        notes: submission.notes.clone().filter(|n| !n.is_empty()),
        image_url: submission.image.file_name.clone(),
        video_url: submission.video.as_ref().map(|v| v.file_name.clone()),
        business_id: submission.business_id,
        business: business.cloned(),
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::api_client::{ApiClient, ClientError, MediaFile};
    use crate::client::cache::tests::{business, business_page};
    use crate::shared::test_helpers::{business_dto, spawn_http_app};
    use rust_decimal::Decimal;

    fn loaded_cache() -> QueryCache {
        let mut cache = QueryCache::new();
        cache.store_page(QueryKey::Businesses, business_page(&[4, 3], 1, 4));
        cache.store_page(QueryKey::Businesses, business_page(&[2, 1], 2, 4));
        cache
    }

    fn ids(cache: &QueryCache) -> Vec<i64> {
        cache
            .records::<Business>(QueryKey::Businesses)
            .iter()
            .map(|b| b.id)
            .collect()
    }

    #[test]
    fn test_begin_injects_into_first_page() {
        let mut cache = loaded_cache();
        let dto = business_dto("Ana's Bakery");

        let update =
            OptimisticUpdate::begin(&mut cache, QueryKey::Businesses, |id| pending_business(id, &dto));

        assert_eq!(ids(&cache), vec![update.temp_id(), 4, 3, 2, 1]);
        assert_eq!(cache.total(QueryKey::Businesses), Some(5));
        let pages = cache.pages::<Business>(QueryKey::Businesses).unwrap();
        assert_eq!(pages[0].data[0].name, "Ana's Bakery");
        assert_eq!(pages[1].meta.total, 4);
    }

    #[test]
    fn test_reconcile_replaces_temporary_record() {
        let mut cache = loaded_cache();
        let dto = business_dto("Ana's Bakery");
        let update =
            OptimisticUpdate::begin(&mut cache, QueryKey::Businesses, |id| pending_business(id, &dto));

        assert!(update.reconcile(&mut cache, business(5, "Ana's Bakery")));
        assert_eq!(ids(&cache), vec![5, 4, 3, 2, 1]);
        assert_eq!(cache.total(QueryKey::Businesses), Some(5));
    }

    #[test]
    fn test_rollback_restores_snapshot_wholesale() {
        let mut cache = loaded_cache();
        let before = cache.snapshot(QueryKey::Businesses);
        let dto = business_dto("Ana's Bakery");

        let update =
            OptimisticUpdate::begin(&mut cache, QueryKey::Businesses, |id| pending_business(id, &dto));
        update.rollback(&mut cache);

        assert_eq!(cache.snapshot(QueryKey::Businesses), before);
    }

    #[test]
    fn test_invalidate_marks_list_stale() {
        let mut cache = loaded_cache();
        let dto = business_dto("Ana's Bakery");
        let update =
            OptimisticUpdate::begin(&mut cache, QueryKey::Businesses, |id| pending_business(id, &dto));

        update.invalidate(&mut cache);
        assert!(cache.is_stale(QueryKey::Businesses));
        assert_eq!(cache.total(QueryKey::Businesses), Some(5));
    }

    #[test]
    fn test_unloaded_list_is_untouched() {
        let mut cache = QueryCache::new();
        let dto = business_dto("Ana's Bakery");
        let update =
            OptimisticUpdate::begin(&mut cache, QueryKey::Businesses, |id| pending_business(id, &dto));

        assert!(cache.pages::<Business>(QueryKey::Businesses).is_none());
        assert!(!update.reconcile(&mut cache, business(1, "Ana's Bakery")));
    }

    #[tokio::test]
    async fn test_failed_creation_rolls_back() {
        let (base_url, _store, _storage) = spawn_http_app().await;
        let client = ApiClient::new(base_url);
        client
            .create_business(&business_dto("Joe's Deli"))
            .await
            .unwrap();

        let mut cache = QueryCache::new();
        cache.store_page(QueryKey::Businesses, client.list_businesses(1, 10).await.unwrap());
        let before = cache.snapshot(QueryKey::Businesses);

        let mut invalid = business_dto("Ana's Bakery");
        invalid.owner_phone = "123".to_string();
        let update = OptimisticUpdate::begin(&mut cache, QueryKey::Businesses, |id| {
            pending_business(id, &invalid)
        });
        assert_eq!(cache.total(QueryKey::Businesses), Some(2));

        let outcome = update.settle(&mut cache, client.create_business(&invalid).await);
        match outcome {
            Err(ClientError::Api { message, .. }) => assert_eq!(message, "Phone number must be valid"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(cache.snapshot(QueryKey::Businesses), before);
    }

    #[tokio::test]
    async fn test_report_creation_reconciles() {
        let (base_url, _store, _storage) = spawn_http_app().await;
        let client = ApiClient::new(base_url);
        let shop = client
            .create_business(&business_dto("Joe's Deli"))
            .await
            .unwrap();

        let key = QueryKey::BusinessReports(shop.id);
        let mut cache = QueryCache::new();
        cache.store_page(key, client.list_reports_by_business(shop.id, 1, 10).await.unwrap());

        let submission = ReportSubmission {
            business_id: shop.id,
            sales: Decimal::new(25050, 2),
            expenses: Decimal::new(8025, 2),
            customer_count: 34,
            notes: None,
            image: MediaFile::new("receipt.jpg", "image/jpeg", vec![0xFF, 0xD8]),
            video: None,
        };
        let update = OptimisticUpdate::begin(&mut cache, key, |id| pending_report(id, &submission, None));
        let pending = cache.records::<Report>(key);
        assert_eq!(pending[0].image_url, "receipt.jpg");
        assert_eq!(pending[0].profit(), Decimal::new(17025, 2));

        let created = update
            .settle(&mut cache, client.create_report(submission.clone()).await)
            .unwrap();

        assert_eq!(cache.records::<Report>(key), vec![created]);
        assert_eq!(cache.total(key), Some(1));
    }

    #[tokio::test]
    async fn test_pending_report_in_combined_list_shows_business() {
        let (base_url, _store, _storage) = spawn_http_app().await;
        let client = ApiClient::new(base_url);
        let shop = client
            .create_business(&business_dto("Joe's Deli"))
            .await
            .unwrap();

        let mut cache = QueryCache::new();
        cache.store_page(QueryKey::AllReports, client.list_reports(1, 10).await.unwrap());

        let submission = ReportSubmission {
            business_id: shop.id,
            sales: Decimal::new(1000, 2),
            expenses: Decimal::new(400, 2),
            customer_count: 3,
            notes: Some("Quiet morning".to_string()),
            image: MediaFile::new("till.png", "image/png", vec![0x89, 0x50]),
            video: None,
        };
        let update = OptimisticUpdate::begin(&mut cache, QueryKey::AllReports, |id| {
            pending_report(id, &submission, Some(&shop))
        });
        let pending = cache.records::<Report>(QueryKey::AllReports);
        assert_eq!(pending[0].business.as_ref().unwrap().name, "Joe's Deli");

        let created = update
            .settle(&mut cache, client.create_report(submission.clone()).await)
            .unwrap();
        assert_eq!(created.business, None);
        assert_eq!(cache.records::<Report>(QueryKey::AllReports), vec![created]);
    }
}
