//! Service layer
//!
//! HTTP-facing services: the hit recording endpoint pair, counter reads and
//! registration, the anonymous session cookie, and the health check.

pub mod health;
pub mod hitcount;
pub mod session;

pub use health::{AppStartTime, HealthService, health_routes};
pub use hitcount::{HitCountService, hitcount_routes};
pub use session::{SessionHandle, obtain_session, persist_cookie};
