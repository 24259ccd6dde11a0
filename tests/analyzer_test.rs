mod server;

use actix_web::{HttpResponse, web};
use server::spawn_site;
use sitelint::analyzer::PageAnalyzer;
use sitelint::http_client::build_http_client;
use sitelint::models::PageStatus;
use std::time::Duration;

async fn full_page() -> HttpResponse {
    HttpResponse::Ok().content_type("text/html").body(
        r#"<html><head>
            <title>Test Page</title>
            <meta name="description" content="A page served by the test site">
            <link rel="canonical" href="https://example.com/canonical">
        </head><body><h1>Heading</h1></body></html>"#,
    )
}

async fn bare_page() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html")
        .body("<html><body><p>nothing here</p></body></html>")
}

async fn server_error() -> HttpResponse {
    HttpResponse::InternalServerError().body("boom")
}

fn analyzer_site(cfg: &mut web::ServiceConfig) {
    cfg.route("/full", web::route().to(full_page))
        .route("/bare", web::route().to(bare_page))
        .route("/error", web::route().to(server_error));
}

fn analyzer() -> PageAnalyzer {
    PageAnalyzer::new(
        build_http_client(5).expect("Failed to build HTTP client"),
        Duration::ZERO,
    )
}

#[tokio::test]
async fn test_scrape_extracts_attributes() {
    let base = spawn_site(analyzer_site).await;
    let analyzer = analyzer();

    let result = analyzer.scrape(&format!("{base}/full")).await;
    assert_eq!(result.error, None);
    assert_eq!(result.status, PageStatus::Ok);
    assert_eq!(result.title, Some("Test Page".to_string()));
    assert_eq!(
        result.meta_description,
        Some("A page served by the test site".to_string())
    );
    assert_eq!(
        result.canonical,
        Some("https://example.com/canonical".to_string())
    );
    assert_eq!(result.h1_tags, vec!["Heading".to_string()]);
}

#[tokio::test]
async fn test_scrape_bare_page_yields_warnings() {
    let base = spawn_site(analyzer_site).await;
    let analyzer = analyzer();

    let result = analyzer.scrape(&format!("{base}/bare")).await;
    assert_eq!(result.status, PageStatus::Warning);
    assert!(!result.issues.is_empty());
}

#[tokio::test]
async fn test_scrape_http_error_yields_error_result() {
    let base = spawn_site(analyzer_site).await;
    let analyzer = analyzer();

    let result = analyzer.scrape(&format!("{base}/missing")).await;
    assert_eq!(result.status, PageStatus::Error);
    assert_eq!(result.error, Some("HTTP 404".to_string()));
    assert!(result.title.is_none());

    let result = analyzer.scrape(&format!("{base}/error")).await;
    assert_eq!(result.status, PageStatus::Error);
    assert_eq!(result.error, Some("HTTP 500".to_string()));
}

#[tokio::test]
async fn test_scrape_connection_failure_yields_error_result() {
    let analyzer = analyzer();

    // Nothing listens here.
    let result = analyzer.scrape("http://127.0.0.1:9/unreachable").await;
    assert_eq!(result.status, PageStatus::Error);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_fetch_html_returns_raw_body() {
    let base = spawn_site(analyzer_site).await;
    let analyzer = analyzer();

    let html = analyzer
        .fetch_html(&format!("{base}/full"))
        .await
        .expect("fetch_html failed");
    assert!(html.contains("<title>Test Page</title>"));

    assert!(analyzer.fetch_html(&format!("{base}/missing")).await.is_err());
}
