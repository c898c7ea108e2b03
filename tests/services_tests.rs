//! HTTP endpoint tests
//!
//! End-to-end contract of the hit endpoint: POST records at most one hit per
//! session/user, GET is rejected with 405, unresolvable counters give a plain
//! 400, and the anonymous session cookie round-trips.

use std::collections::HashMap;
use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use hitcounter::config::SessionConfig;
use hitcounter::engine::{HitDecisionEngine, HitPolicy};
use hitcounter::services::{AppStartTime, health_routes, hitcount_routes};
use hitcounter::storages::memory::MemoryStore;
use hitcounter::storages::{BlacklistStore, ContentTarget, CounterStore, HitCount, Stores};

// =============================================================================
// Test Setup
// =============================================================================

fn test_stores() -> Stores {
    let backend = Arc::new(MemoryStore::new(Duration::days(7)));
    Stores {
        hits: backend.clone(),
        counters: backend.clone(),
        blacklists: backend,
    }
}

async fn seed_counter(stores: &Stores, id: u64, author: Option<&str>) {
    let target = match author {
        Some(author) => ContentTarget::with_author("post", id.to_string(), author),
        None => ContentTarget::new("post", id.to_string()),
    };
    assert!(stores.counters.insert(HitCount::new(id, target)).await.unwrap());
}

/// App wiring shared by every test, parameterized on stores and policy.
fn test_app(stores: &Stores, policy: HitPolicy) -> impl Fn(&mut web::ServiceConfig) {
    let engine = Arc::new(HitDecisionEngine::new(stores));
    let counters = stores.counters.clone();
    let hits = stores.hits.clone();
    let app_start_time = AppStartTime {
        start_datetime: Utc::now(),
    };

    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(engine.clone()))
            .app_data(web::Data::new(counters.clone()))
            .app_data(web::Data::new(hits.clone()))
            .app_data(web::Data::new(policy.clone()))
            .app_data(web::Data::new(SessionConfig::default()))
            .app_data(web::Data::new(app_start_time.clone()));
        hitcount_routes(cfg);
        health_routes(cfg);
    }
}

fn hit_form(pk: &str) -> HashMap<&'static str, String> {
    HashMap::from([("hitcount_pk", pk.to_string())])
}

fn session_cookie_value(resp: &actix_web::dev::ServiceResponse) -> String {
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .expect("expected a session cookie")
        .to_str()
        .unwrap();
    set_cookie
        .split(';')
        .next()
        .unwrap()
        .strip_prefix("hc_session=")
        .expect("unexpected cookie name")
        .to_string()
}

// =============================================================================
// POST /hit
// =============================================================================

#[actix_rt::test]
async fn test_anonymous_hit_counts_once_per_session() {
    let stores = test_stores();
    seed_counter(&stores, 1, None).await;
    let app =
        test::init_service(App::new().configure(test_app(&stores, HitPolicy::default()))).await;

    // fresh session: hit recorded, session cookie issued
    let req = test::TestRequest::post()
        .uri("/hit")
        .set_form(hit_form("1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let session_key = session_cookie_value(&resp);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"]["title"], "Hit count");
    assert_eq!(body["success"]["status"], "success");
    assert_eq!(body["success"]["hits"], 1);

    // same session again: no hit recorded, count unchanged
    let req = test::TestRequest::post()
        .uri("/hit")
        .cookie(Cookie::new("hc_session", session_key))
        .set_form(hit_form("1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"]["status"], "no hit recorded");
    assert_eq!(body["success"]["hits"], 1);
}

#[actix_rt::test]
async fn test_fresh_sessions_count_separately() {
    let stores = test_stores();
    seed_counter(&stores, 1, None).await;
    let app =
        test::init_service(App::new().configure(test_app(&stores, HitPolicy::default()))).await;

    for expected_hits in 1..=2 {
        // no cookie sent, so every request is a brand new session
        let req = test::TestRequest::post()
            .uri("/hit")
            .set_form(hit_form("1"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"]["status"], "success");
        assert_eq!(body["success"]["hits"], expected_hits);
    }
}

#[actix_rt::test]
async fn test_authenticated_hit_deduplicates_across_sessions() {
    let stores = test_stores();
    seed_counter(&stores, 1, None).await;
    let app =
        test::init_service(App::new().configure(test_app(&stores, HitPolicy::default()))).await;

    let req = test::TestRequest::post()
        .uri("/hit")
        .insert_header(("x-user-id", "alice"))
        .set_form(hit_form("1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"]["status"], "success");

    // same user, different session: still deduplicated
    let req = test::TestRequest::post()
        .uri("/hit")
        .insert_header(("x-user-id", "alice"))
        .set_form(hit_form("1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"]["status"], "no hit recorded");
    assert_eq!(body["success"]["hits"], 1);
}

#[actix_rt::test]
async fn test_author_self_hit_not_recorded() {
    let stores = test_stores();
    seed_counter(&stores, 1, Some("alice")).await;
    let app =
        test::init_service(App::new().configure(test_app(&stores, HitPolicy::default()))).await;

    let req = test::TestRequest::post()
        .uri("/hit")
        .insert_header(("x-user-id", "alice"))
        .set_form(hit_form("1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"]["status"], "no hit recorded");
    assert_eq!(body["success"]["hits"], 0);
}

#[actix_rt::test]
async fn test_excluded_group_not_recorded() {
    let stores = test_stores();
    seed_counter(&stores, 1, None).await;
    let policy = HitPolicy {
        exclude_user_groups: ["staff".to_string()].into_iter().collect(),
        ..HitPolicy::default()
    };
    let app = test::init_service(App::new().configure(test_app(&stores, policy))).await;

    let req = test::TestRequest::post()
        .uri("/hit")
        .insert_header(("x-user-id", "bob"))
        .insert_header(("x-user-groups", "staff, editors"))
        .set_form(hit_form("1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"]["status"], "no hit recorded");
}

#[actix_rt::test]
async fn test_blacklisted_peer_not_recorded() {
    let stores = test_stores();
    seed_counter(&stores, 1, None).await;
    stores.blacklists.add_ip("203.0.113.9").await.unwrap();
    let app =
        test::init_service(App::new().configure(test_app(&stores, HitPolicy::default()))).await;

    let req = test::TestRequest::post()
        .uri("/hit")
        .peer_addr("203.0.113.9:9000".parse().unwrap())
        .set_form(hit_form("1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"]["status"], "no hit recorded");
}

#[actix_rt::test]
async fn test_unknown_counter_is_bad_request() {
    let stores = test_stores();
    let app =
        test::init_service(App::new().configure(test_app(&stores, HitPolicy::default()))).await;

    let req = test::TestRequest::post()
        .uri("/hit")
        .set_form(hit_form("999"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("does not resolve"));

    // nothing was created as a side effect
    let req = test::TestRequest::get().uri("/hitcount/999").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_missing_or_malformed_pk_is_bad_request() {
    let stores = test_stores();
    seed_counter(&stores, 1, None).await;
    let app =
        test::init_service(App::new().configure(test_app(&stores, HitPolicy::default()))).await;

    let req = test::TestRequest::post()
        .uri("/hit")
        .set_form(HashMap::<&str, String>::new())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/hit")
        .set_form(hit_form("not-a-number"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// GET /hit
// =============================================================================

#[actix_rt::test]
async fn test_get_hit_is_method_not_allowed() {
    let stores = test_stores();
    let app =
        test::init_service(App::new().configure(test_app(&stores, HitPolicy::default()))).await;

    let req = test::TestRequest::get().uri("/hit").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["title"], "You did wrong!");
    assert_eq!(body["error"]["message"], "Hits counted via POST only.");
}

// =============================================================================
// Counter registration and reads
// =============================================================================

#[actix_rt::test]
async fn test_register_then_count() {
    let stores = test_stores();
    let app =
        test::init_service(App::new().configure(test_app(&stores, HitPolicy::default()))).await;

    let req = test::TestRequest::post()
        .uri("/hitcount")
        .set_json(json!({ "id": 5, "kind": "article", "object_id": "slug-5" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // duplicate registration conflicts
    let req = test::TestRequest::post()
        .uri("/hitcount")
        .set_json(json!({ "id": 5, "kind": "article", "object_id": "slug-5" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/hit")
        .set_form(hit_form("5"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"]["status"], "success");

    let req = test::TestRequest::get().uri("/hitcount/5").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["hitcount"]["hits"], 1);
    assert_eq!(body["hitcount"]["target"]["kind"], "article");
}

// =============================================================================
// Health
// =============================================================================

#[actix_rt::test]
async fn test_health_check() {
    let stores = test_stores();
    seed_counter(&stores, 1, None).await;
    let app =
        test::init_service(App::new().configure(test_app(&stores, HitPolicy::default()))).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["storage"]["counters"], 1);
    assert_eq!(body["checks"]["storage"]["backend"], "memory");
}
