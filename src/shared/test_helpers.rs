//! In-memory stand-ins for the store and object storage, plus builders for
//! multipart bodies and fully wired test routers.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{FromRequest, Multipart},
    http::{header, Request},
};
use axum_test::TestServer;
use chrono::Utc;
use fake::faker::address::en::CityName;
use fake::faker::company::en::{CompanyName, Industry};
use fake::faker::name::en::Name;
use fake::Fake;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::app::{build_router, AppServices};
use crate::core::config::{AppConfig, Environment, RateLimitConfig, RateLimitPolicyConfig, SwaggerConfig};
use crate::core::database::StoreHealth;
use crate::core::error::{AppError, Result};
use crate::core::rate_limit::RateLimiter;
use crate::features::businesses::dtos::CreateBusinessDto;
use crate::features::businesses::models::Business;
use crate::features::businesses::{BusinessRepository, BusinessService};
use crate::features::health::HealthService;
use crate::features::reports::models::{NewReport, Report, ReportWithBusiness};
use crate::features::reports::{ReportRepository, ReportService};
use crate::modules::storage::{ObjectStorage, StoredObject};
use crate::shared::constants::BUSINESS_NOT_FOUND_MESSAGE;
use crate::shared::types::Pagination;

// =============================================================================
// FIXTURES
// =============================================================================

pub fn business_dto(name: &str) -> CreateBusinessDto {
    CreateBusinessDto {
        name: name.to_string(),
        owner_name: "Joe Smith".to_string(),
        owner_phone: "5551234567".to_string(),
        category: "Restaurant".to_string(),
        city: "Boston".to_string(),
    }
}

/// Valid business with generated details
pub fn fake_business_dto() -> CreateBusinessDto {
    CreateBusinessDto {
        name: CompanyName().fake(),
        owner_name: Name().fake(),
        owner_phone: format!("555{}", (1_000_000u32..9_999_999).fake::<u32>()),
        category: Industry().fake(),
        city: CityName().fake(),
    }
}

/// A complete, valid report submission for `business_id`
pub fn report_body(business_id: &str) -> MultipartBody {
    MultipartBody::new()
        .text("sales", "250.50")
        .text("expenses", "80.25")
        .text("customerCount", "34")
        .text("businessId", business_id)
        .file("image", "receipt.jpg", "image/jpeg", &[0xFF, 0xD8, 0xFF, 0xE0])
}

// =============================================================================
// RELATIONAL STORE
// =============================================================================

#[derive(Default)]
struct Tables {
    businesses: Vec<Business>,
    reports: Vec<Report>,
}

/// Store double implementing both repositories and the health probe
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }

    pub fn report_count(&self) -> usize {
        self.tables.lock().unwrap().reports.len()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

/// Newest first: ids grow with insertion order
fn page_of<T: Clone>(rows: &[T], pagination: Pagination) -> Vec<T> {
    rows.iter()
        .rev()
        .skip(pagination.offset() as usize)
        .take(pagination.limit as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl BusinessRepository for MemoryStore {
    async fn insert(&self, dto: &CreateBusinessDto) -> Result<Business> {
        self.check_online()?;
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        let business = Business {
            id: tables.businesses.len() as i64 + 1,
            name: dto.name.clone(),
            owner_name: dto.owner_name.clone(),
            owner_phone: dto.owner_phone.clone(),
            category: dto.category.clone(),
            city: dto.city.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.businesses.push(business.clone());
        Ok(business)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Business>> {
        self.check_online()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.businesses.iter().find(|b| b.id == id).cloned())
    }

    async fn list(&self, pagination: Pagination) -> Result<Vec<Business>> {
        self.check_online()?;
        Ok(page_of(&self.tables.lock().unwrap().businesses, pagination))
    }

    async fn count(&self) -> Result<i64> {
        self.check_online()?;
        Ok(self.tables.lock().unwrap().businesses.len() as i64)
    }
}

#[async_trait]
impl ReportRepository for MemoryStore {
    async fn insert(&self, new: &NewReport) -> Result<Report> {
        self.check_online()?;
        let mut tables = self.tables.lock().unwrap();
        if !tables.businesses.iter().any(|b| b.id == new.business_id) {
            return Err(AppError::BadRequest(BUSINESS_NOT_FOUND_MESSAGE.to_string()));
        }
        let report = Report {
            id: tables.reports.len() as i64 + 1,
            sales: new.sales,
            expenses: new.expenses,
            customer_count: new.customer_count,
            notes: new.notes.clone(),
            image_url: new.image_url.clone(),
            video_url: new.video_url.clone(),
            business_id: new.business_id,
            created_at: Utc::now(),
        };
        tables.reports.push(report.clone());
        Ok(report)
    }

    async fn list_with_business(&self, pagination: Pagination) -> Result<Vec<ReportWithBusiness>> {
        self.check_online()?;
        let tables = self.tables.lock().unwrap();
        Ok(page_of(&tables.reports, pagination)
            .into_iter()
            .filter_map(|report| {
                let business = tables
                    .businesses
                    .iter()
                    .find(|b| b.id == report.business_id)?
                    .clone();
                Some(ReportWithBusiness { report, business })
            })
            .collect())
    }

    async fn count(&self) -> Result<i64> {
        self.check_online()?;
        Ok(self.tables.lock().unwrap().reports.len() as i64)
    }

    async fn list_by_business(&self, business_id: i64, pagination: Pagination) -> Result<Vec<Report>> {
        self.check_online()?;
        let tables = self.tables.lock().unwrap();
        let owned: Vec<Report> = tables
            .reports
            .iter()
            .filter(|r| r.business_id == business_id)
            .cloned()
            .collect();
        Ok(page_of(&owned, pagination))
    }

    async fn count_by_business(&self, business_id: i64) -> Result<i64> {
        self.check_online()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .reports
            .iter()
            .filter(|r| r.business_id == business_id)
            .count() as i64)
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<()> {
        self.check_online()
    }
}

// =============================================================================
// OBJECT STORAGE
// =============================================================================

/// Object storage double that keeps objects in memory and counts calls
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put_stream(
        &self,
        key: &str,
        _content_type: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<StoredObject> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Storage(format!("simulated outage writing '{}'", key)));
        }

        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload '{}': {}", key, e)))?;

        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(StoredObject {
            key: key.to_string(),
            location: format!("https://media.test/{}", key),
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

// =============================================================================
// MULTIPART
// =============================================================================

const BOUNDARY: &str = "ovasight-test-boundary";

/// Hand-built `multipart/form-data` body
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}

/// Run the `Multipart` extractor over a hand-built body
pub async fn multipart_from(body: MultipartBody) -> Multipart {
    let request = Request::builder()
        .method("POST")
        .header(header::CONTENT_TYPE, MultipartBody::content_type())
        .body(Body::from(body.into_bytes()))
        .unwrap();
    Multipart::from_request(request, &()).await.unwrap()
}

// =============================================================================
// APPLICATION
// =============================================================================

/// Fully wired router over in-memory doubles
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub storage: Arc<MemoryStorage>,
}

/// Limits high enough that ordinary tests never hit them
pub fn relaxed_limits() -> RateLimitConfig {
    RateLimitConfig {
        api: RateLimitPolicyConfig::new(10_000, 900),
        upload: RateLimitPolicyConfig::new(10_000, 900),
        create: RateLimitPolicyConfig::new(10_000, 3600),
    }
}

pub fn test_app_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: Environment::Test,
        cors_allowed_origins: vec!["*".to_string()],
        max_request_body_size: 10 * 1024 * 1024,
        trust_proxy: true,
    }
}

fn test_swagger_config() -> SwaggerConfig {
    SwaggerConfig {
        username: None,
        password: None,
        title: "OvaSight API".to_string(),
        version: "test".to_string(),
        description: "test".to_string(),
    }
}

/// Router plus the doubles behind it
pub fn test_router(limits: RateLimitConfig) -> (axum::Router, Arc<MemoryStore>, Arc<MemoryStorage>) {
    let store = Arc::new(MemoryStore::default());
    let storage = Arc::new(MemoryStorage::default());
    let config = test_app_config();

    let services = AppServices {
        businesses: Arc::new(BusinessService::new(store.clone())),
        reports: Arc::new(ReportService::new(store.clone(), storage.clone())),
        health: Arc::new(HealthService::new(store.clone(), config.environment)),
        rate_limiter: Arc::new(RateLimiter::new(limits, config.trust_proxy)),
    };

    let router = build_router(services, &config, &test_swagger_config());
    (router, store, storage)
}

pub fn test_app() -> TestApp {
    test_app_with_limits(relaxed_limits())
}

pub fn test_app_with_limits(limits: RateLimitConfig) -> TestApp {
    let (router, store, storage) = test_router(limits);
    TestApp {
        server: TestServer::new(router).unwrap(),
        store,
        storage,
    }
}

/// Serve the test router on an ephemeral local port, returning its base URL
pub async fn spawn_http_app() -> (String, Arc<MemoryStore>, Arc<MemoryStorage>) {
    let (router, store, storage) = test_router(relaxed_limits());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    (format!("http://{}", addr), store, storage)
}
