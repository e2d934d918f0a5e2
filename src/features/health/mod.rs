//! Liveness and readiness endpoints.
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/` | Liveness message |
//! | GET | `/health` | Store connectivity, 503 when unreachable |

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use services::HealthService;
