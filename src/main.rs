use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hitcounter::config::{AppConfig, get_config, init_config};
use hitcounter::engine::{HitDecisionEngine, HitPolicy};
use hitcounter::i18n;
use hitcounter::services::{AppStartTime, health_routes, hitcount_routes};
use hitcounter::storages::StorageFactory;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Throwaway load to seed the log filter: the subscriber must be up before
    // the global config initializes, or the load diagnostics are dropped
    let log_level = AppConfig::load().logging.level;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();

    init_config();
    let config = get_config();

    i18n::set_locale(&config.server.locale);

    // 记录程序启动时间
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    let stores = StorageFactory::create(config).await?;
    info!("Using storage backend: {}", stores.hits.backend_name().await);

    let policy = HitPolicy::from_config(&config.policy);
    if policy.hits_per_ip_limit > 0 {
        info!("Per-IP hit limit enabled: {}", policy.hits_per_ip_limit);
    }
    if !policy.exclude_user_groups.is_empty() {
        info!(
            "Hits excluded for user groups: {:?}",
            policy.exclude_user_groups
        );
    }

    let engine = Arc::new(HitDecisionEngine::new(&stores));
    let session_config = config.session.clone();
    let counters = stores.counters.clone();
    let hits = stores.hits.clone();

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server at http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(engine.clone()))
            .app_data(web::Data::new(counters.clone()))
            .app_data(web::Data::new(hits.clone()))
            .app_data(web::Data::new(policy.clone()))
            .app_data(web::Data::new(session_config.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .configure(hitcount_routes)
            .configure(health_routes)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
