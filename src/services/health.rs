use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::{error, trace};

use crate::storages::{CounterStore, HitStore};

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        counters: web::Data<Arc<dyn CounterStore>>,
        hits: web::Data<Arc<dyn HitStore>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let storage_status =
            match tokio::time::timeout(Duration::from_secs(5), counters.load_all()).await {
                Ok(Ok(all)) => {
                    trace!("Store health check passed, {} counters found", all.len());
                    json!({
                        "status": "healthy",
                        "counters": all.len(),
                        "backend": hits.backend_name().await,
                    })
                }
                Ok(Err(e)) => {
                    error!("Store health check failed: {}", e);
                    json!({ "status": "unhealthy", "error": e.message() })
                }
                Err(_) => {
                    error!("Store health check timeout");
                    json!({ "status": "unhealthy", "error": "timeout" })
                }
            };

        let now = chrono::Utc::now();
        let uptime_seconds = (now - app_start_time.start_datetime).num_seconds().max(0) as u64;
        let is_healthy = storage_status["status"] == "healthy";

        let response_status = if is_healthy {
            actix_web::http::StatusCode::OK
        } else {
            actix_web::http::StatusCode::SERVICE_UNAVAILABLE
        };

        HttpResponse::build(response_status).json(json!({
            "status": if is_healthy { "healthy" } else { "unhealthy" },
            "timestamp": now.to_rfc3339(),
            "uptime": uptime_seconds,
            "checks": { "storage": storage_status },
            "response_time_ms": start_time.elapsed().as_millis(),
        }))
    }
}

pub fn health_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(HealthService::health_check))
        .route("/health", web::head().to(HealthService::health_check));
}
