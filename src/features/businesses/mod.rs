//! Businesses tracked by the platform.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Rate limit | Description |
//! |--------|----------|------------|-------------|
//! | POST | `/api/businesses` | create (5/hour) | Register a business |
//! | GET | `/api/businesses` | - | List businesses, newest first |
//! | GET | `/api/businesses/{id}` | - | Get one business |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::{BusinessRepository, PgBusinessRepository};
pub use services::BusinessService;
