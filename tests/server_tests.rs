// tests/server_tests.rs
mod common;

use actix_web::{test, web, App};
use serde_json::Value;

use common::{amazon_and_apple, config, memory_service};
use ticker_meta_cache::server::{self, AppState};
use ticker_meta_cache::source::{StaticSource, TickerSource};
use ticker_meta_cache::TickerRecord;

async fn state_with(
    records: Vec<TickerRecord>,
    source: Option<Box<dyn TickerSource>>,
) -> web::Data<AppState> {
    let (_store, service) = memory_service();
    service
        .builder
        .build(StaticSource::new(records).records())
        .await;

    web::Data::new(AppState::new(config(), service, source))
}

#[actix_web::test]
async fn test_autocomplete_endpoint() {
    let state = state_with(amazon_and_apple(), None).await;
    let app = test::init_service(App::new().app_data(state).configure(server::configure)).await;

    let req = test::TestRequest::get().uri("/autocomplete?q=Ama&limit=5").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["query"], "Ama");
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0], "Amazon");
}

#[actix_web::test]
async fn test_resolve_endpoints() {
    let state = state_with(amazon_and_apple(), None).await;
    let app = test::init_service(App::new().app_data(state).configure(server::configure)).await;

    let req = test::TestRequest::get().uri("/tickers/symbol/aapl").to_request();
    let record: TickerRecord = test::call_and_read_body_json(&app, req).await;
    assert_eq!(record, TickerRecord::new("Apple", "AAPL"));

    let req = test::TestRequest::get().uri("/tickers/company/Amazon").to_request();
    let record: TickerRecord = test::call_and_read_body_json(&app, req).await;
    assert_eq!(record.ticker, "AMZN");

    let req = test::TestRequest::get().uri("/tickers/resolve?q=AMZN").to_request();
    let record: TickerRecord = test::call_and_read_body_json(&app, req).await;
    assert_eq!(record.company_name, "Amazon");

    let req = test::TestRequest::get().uri("/tickers/company/Nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_rebuild_requires_a_source() {
    let state = state_with(amazon_and_apple(), None).await;
    let app = test::init_service(App::new().app_data(state).configure(server::configure)).await;

    let req = test::TestRequest::post().uri("/admin/rebuild").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_rebuild_replaces_index_from_source() {
    let next_crawl: Box<dyn TickerSource> =
        Box::new(StaticSource::new(vec![TickerRecord::new("Amazon", "AMZN")]));
    let state = state_with(amazon_and_apple(), Some(next_crawl)).await;
    let app = test::init_service(App::new().app_data(state).configure(server::configure)).await;

    let req = test::TestRequest::post().uri("/admin/rebuild?clear=true").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["report"]["records_indexed"], 1);

    let req = test::TestRequest::get().uri("/autocomplete?q=Ap").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 0);
}

#[actix_web::test]
async fn test_rebuild_checks_admin_token() {
    let (_store, service) = memory_service();
    let source: Box<dyn TickerSource> = Box::new(StaticSource::new(amazon_and_apple()));
    let mut cfg = config();
    cfg.admin_token = Some("secret".to_string());
    let state = AppState::new(cfg, service, Some(source));
    assert_eq!(state.admin_token.as_deref(), Some("secret"));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(server::configure),
    )
    .await;

    let req = test::TestRequest::post().uri("/admin/rebuild").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::post()
        .uri("/admin/rebuild")
        .insert_header(("Authorization", "Bearer secret"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn test_health_reports_store_status() {
    let state = state_with(Vec::new(), None).await;
    let app = test::init_service(App::new().app_data(state).configure(server::configure)).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["namespace"], common::NAMESPACE);
}
