//! Hit recording endpoints
//!
//! `POST /hit` runs the decision engine for one view event and answers with a
//! structured JSON payload; the same path rejects GET outright with 405 since
//! hits are only ever recorded via the mutating verb. Counter registration
//! and reads live under `/hitcount`.
//!
//! Identity arrives from the trusted upstream as `X-User-Id` /
//! `X-User-Groups` headers; an absent user header means anonymous.

use std::sync::Arc;

use actix_web::http::header::{HeaderMap, USER_AGENT};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, trace};

use crate::config::SessionConfig;
use crate::engine::{HitDecisionEngine, HitEvent, HitPolicy, Identity};
use crate::errors::HitCounterError;
use crate::i18n::lazy;
use crate::services::session;
use crate::storages::{ContentTarget, CounterStore, HitCount};
use crate::utils::{extract_client_ip, normalize_user_agent};

#[derive(Debug, Deserialize)]
pub struct HitCountForm {
    pub hitcount_pk: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterCounterRequest {
    pub id: u64,
    pub kind: String,
    pub object_id: String,
    pub author: Option<String>,
}

pub struct HitCountService;

impl HitCountService {
    /// POST /hit — evaluate one view event against the target counter.
    pub async fn post_hit(
        req: HttpRequest,
        form: web::Form<HitCountForm>,
        engine: web::Data<Arc<HitDecisionEngine>>,
        counters: web::Data<Arc<dyn CounterStore>>,
        policy: web::Data<HitPolicy>,
        session_config: web::Data<SessionConfig>,
    ) -> impl Responder {
        let Some(pk) = form
            .hitcount_pk
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
        else {
            debug!("POST /hit with missing or unparseable hitcount_pk");
            return HttpResponse::BadRequest().body("hitcount_pk missing or not a counter id");
        };

        // counter resolution failure is a caller error, distinct from a
        // policy rejection
        match counters.get(pk).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!("POST /hit for unknown counter {}", pk);
                return HttpResponse::BadRequest()
                    .body(format!("hitcount_pk {} does not resolve to a counter", pk));
            }
            Err(e) => return Self::storage_error(e),
        }

        let session = session::obtain_session(&req, &session_config);
        let event = HitEvent {
            identity: identity_from_headers(req.headers()),
            session: session.key.clone(),
            ip: extract_client_ip(&req).unwrap_or_else(|| "unknown".to_string()),
            user_agent: normalize_user_agent(
                req.headers().get(USER_AGENT).and_then(|v| v.to_str().ok()),
            ),
            hitcount_id: pk,
        };

        let verdict = match engine.evaluate(&event, &policy).await {
            Ok(verdict) => verdict,
            Err(HitCounterError::NotFound(msg)) => {
                return HttpResponse::BadRequest().body(msg);
            }
            Err(e) => return Self::storage_error(e),
        };

        let hits = match counters.get(pk).await {
            Ok(counter) => counter.map(|c| c.hits).unwrap_or(0),
            Err(e) => return Self::storage_error(e),
        };

        let status = if verdict.counted() {
            lazy("success")
        } else {
            lazy("no hit recorded")
        };

        let mut response = HttpResponse::Ok();
        // a fresh session key must survive this request, and an accepted
        // anonymous hit extends the session it deduplicates on
        if session.fresh || (!event.identity.is_authenticated() && verdict.counted()) {
            response.cookie(session::persist_cookie(&session.key, &session_config));
        }

        response.json(json!({
            "success": {
                "title": lazy("Hit count"),
                "status": status,
                "hits": hits,
            }
        }))
    }

    /// GET /hit — hits are counted via POST only.
    pub async fn get_hit() -> impl Responder {
        trace!("GET on the hit endpoint rejected");
        HttpResponse::MethodNotAllowed().json(json!({
            "error": {
                "title": lazy("You did wrong!"),
                "message": lazy("Hits counted via POST only."),
            }
        }))
    }

    /// GET /hitcount/{id} — read one counter.
    pub async fn get_counter(
        path: web::Path<u64>,
        counters: web::Data<Arc<dyn CounterStore>>,
    ) -> impl Responder {
        let id = path.into_inner();
        match counters.get(id).await {
            Ok(Some(counter)) => HttpResponse::Ok().json(json!({ "hitcount": counter })),
            Ok(None) => HttpResponse::NotFound().json(json!({
                "error": { "message": format!("hitcount {} does not exist", id) }
            })),
            Err(e) => Self::storage_error(e),
        }
    }

    /// POST /hitcount — register a counter for a content object. The upstream
    /// application owns counter ids.
    pub async fn register_counter(
        payload: web::Json<RegisterCounterRequest>,
        counters: web::Data<Arc<dyn CounterStore>>,
    ) -> impl Responder {
        let request = payload.into_inner();
        let target = match request.author {
            Some(author) => ContentTarget::with_author(request.kind, request.object_id, author),
            None => ContentTarget::new(request.kind, request.object_id),
        };
        let counter = HitCount::new(request.id, target);

        match counters.insert(counter.clone()).await {
            Ok(true) => {
                debug!("Registered counter {}", counter.id);
                HttpResponse::Created().json(json!({ "hitcount": counter }))
            }
            Ok(false) => HttpResponse::Conflict().json(json!({
                "error": { "message": format!("hitcount {} already exists", counter.id) }
            })),
            Err(e) => Self::storage_error(e),
        }
    }

    fn storage_error(e: HitCounterError) -> HttpResponse {
        error!("Storage failure in hit endpoint: {}", e);
        HttpResponse::InternalServerError().json(json!({
            "error": { "code": e.code(), "message": e.message() }
        }))
    }
}

fn identity_from_headers(headers: &HeaderMap) -> Identity {
    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match user_id {
        Some(user_id) => {
            let groups = headers
                .get("x-user-groups")
                .and_then(|v| v.to_str().ok())
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();
            Identity::Authenticated {
                user_id: user_id.to_string(),
                groups,
            }
        }
        None => Identity::Anonymous,
    }
}

/// Route registration for the hit counting endpoints.
pub fn hitcount_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/hit", web::post().to(HitCountService::post_hit))
        .route("/hit", web::get().to(HitCountService::get_hit))
        .route("/hitcount", web::post().to(HitCountService::register_counter))
        .route("/hitcount/{id}", web::get().to(HitCountService::get_counter));
}
