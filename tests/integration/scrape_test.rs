// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_app, create_test_app_with, test_scraping_settings, REFUSED_URL, SAMPLE_PAGE};
use pagecron::config::settings::ScrapingSettings;
use pagecron::domain::models::pagination::PaginationRequest;
use pagecron::domain::repositories::scrape_result_repository::ScrapeResultRepository;
use pagecron::domain::services::PageScraper;
use pagecron::utils::errors::ScrapeError;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_raw(body.as_bytes().to_vec(), "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_scrape_extracts_and_persists() {
    let app = create_test_app().await;
    let server = MockServer::start().await;
    mount_page(&server, "/page", 200, SAMPLE_PAGE).await;
    Mock::given(method("HEAD"))
        .and(path("/favicon.png"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let owner = Uuid::new_v4();
    let url = format!("{}/page", server.uri());
    let result = app.scrape_service.scrape_url(&url, owner).await.unwrap();

    assert_eq!(result.status_code, 200);
    assert_eq!(result.title, "Sample Page");
    assert_eq!(result.description, "A page used in tests");
    assert_eq!(result.keywords, "rust,cron");
    assert_eq!(result.site_name, "Sample");
    assert_eq!(
        result.links,
        vec![
            format!("{}/docs", server.uri()),
            "https://other.example/".to_string(),
        ]
    );
    assert_eq!(result.images, vec![format!("{}/img/logo.png", server.uri())]);
    assert_eq!(result.headers.len(), 1);
    assert_eq!(result.headers[0].level, 1);
    assert_eq!(result.headers[0].text, "Sample heading");
    assert_eq!(result.favicon, format!("{}/favicon.png", server.uri()));
    assert!(result.content_type.starts_with("text/html"));
    assert!(result.word_count > 10);

    let stored = app.result_repo.find_by_id(result.id).await.unwrap().unwrap();
    assert_eq!(stored.owner_id, owner);
    assert_eq!(stored.links, result.links);
    assert_eq!(stored.headers, result.headers);
    assert_eq!(stored.favicon, result.favicon);
}

#[tokio::test]
async fn test_http_error_status_is_a_result() {
    let app = create_test_app().await;
    let server = MockServer::start().await;
    mount_page(&server, "/gone", 404, "<html><title>Not Found</title></html>").await;

    let owner = Uuid::new_v4();
    let result = app
        .scrape_service
        .scrape_url(&format!("{}/gone", server.uri()), owner)
        .await
        .unwrap();

    assert_eq!(result.status_code, 404);
    assert_eq!(result.title, "Not Found");
    assert!(result.favicon.is_empty());
    assert_eq!(app.result_repo.count_by_owner(owner).await.unwrap(), 1);
}

#[tokio::test]
async fn test_connection_refused_is_an_error() {
    let app = create_test_app().await;
    let owner = Uuid::new_v4();

    let err = app
        .scrape_service
        .scrape_url(REFUSED_URL, owner)
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Fetch(_)), "got {err:?}");
    assert_eq!(app.result_repo.count_by_owner(owner).await.unwrap(), 0);
}

#[tokio::test]
async fn test_slow_server_hits_deadline() {
    let app = create_test_app_with(ScrapingSettings {
        timeout_secs: 1,
        ..test_scraping_settings()
    })
    .await;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(SAMPLE_PAGE.as_bytes().to_vec(), "text/html")
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = app
        .scrape_service
        .scrape_url(&server.uri(), Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Fetch(ref e) if e.is_timeout()), "got {err:?}");
}

#[tokio::test]
async fn test_declared_charset_is_decoded() {
    let app = create_test_app().await;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"<html><title>Caf\xe9</title></html>".to_vec(),
            "text/html; charset=windows-1252",
        ))
        .mount(&server)
        .await;

    let result = app
        .scrape_service
        .scrape_url(&server.uri(), Uuid::new_v4())
        .await
        .unwrap();

    assert_eq!(result.title, "Café");
}

#[tokio::test]
async fn test_mislabelled_charset_still_persists() {
    let app = create_test_app().await;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"<html><head><title>Caf\xe9</title></head><body><a href=\"/menu\">Menu</a></body></html>"
                .to_vec(),
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;

    let owner = Uuid::new_v4();
    let result = app
        .scrape_service
        .scrape_url(&server.uri(), owner)
        .await
        .unwrap();

    assert_eq!(result.title, "Caf\u{FFFD}");
    assert_eq!(result.links, vec![format!("{}/menu", server.uri())]);
    assert_eq!(app.result_repo.count_by_owner(owner).await.unwrap(), 1);
}

#[tokio::test]
async fn test_results_are_owner_scoped() {
    let app = create_test_app().await;
    let server = MockServer::start().await;
    mount_page(&server, "/", 200, SAMPLE_PAGE).await;

    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let mut ids = Vec::new();
    for _ in 0..3 {
        let result = app.scrape_service.scrape_url(&server.uri(), owner).await.unwrap();
        ids.push(result.id);
    }

    let page = app
        .scrape_service
        .list_results_paginated(owner, PaginationRequest::new(1, 2))
        .await
        .unwrap();
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.pagination.total_items, 3);
    assert!(page.pagination.has_next);

    assert!(matches!(
        app.scrape_service.get_result(ids[0], stranger).await,
        Err(ScrapeError::NotFound(_))
    ));
    assert!(app.scrape_service.list_results(stranger).await.unwrap().is_empty());

    app.scrape_service.delete_result(ids[0], owner).await.unwrap();
    assert_eq!(app.scrape_service.list_results(owner).await.unwrap().len(), 2);
}
