// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use pagecron::application::usecases::scrape_service::ScrapeService;
use pagecron::config::settings::{DatabaseSettings, ScrapingSettings};
use pagecron::domain::models::schedule::CreateScheduleRequest;
use pagecron::engines::reqwest_engine::ReqwestEngine;
use pagecron::infrastructure::database::connection;
use pagecron::infrastructure::repositories::schedule_repo_impl::ScheduleRepositoryImpl;
use pagecron::infrastructure::repositories::scrape_result_repo_impl::ScrapeResultRepositoryImpl;
use pagecron::queue::scheduler::ScheduleOrchestrator;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

/// 关闭的本地端口，用于制造连接被拒绝
pub const REFUSED_URL: &str = "http://127.0.0.1:9/";

pub const SAMPLE_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <title>Sample Page</title>
  <meta name="description" content="A page used in tests">
  <meta name="keywords" content="rust,cron">
  <meta property="og:site_name" content="Sample">
</head>
<body>
  <h1>Sample heading</h1>
  <a href="/docs">Docs</a>
  <a href="https://other.example/">Other</a>
  <a href="/docs">Docs again</a>
  <a href="#top">Top</a>
  <img src="/img/logo.png">
  <p>Five words in this paragraph.</p>
</body>
</html>"##;

#[allow(dead_code)]
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub schedule_repo: Arc<ScheduleRepositoryImpl>,
    pub result_repo: Arc<ScrapeResultRepositoryImpl>,
    pub scrape_service: Arc<ScrapeService>,
    pub orchestrator: ScheduleOrchestrator,
}

/// 连接内存SQLite并执行迁移
///
/// 内存数据库随连接存在，所以连接池固定为一个连接
pub async fn create_test_db() -> Arc<DatabaseConnection> {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: Some(1),
        min_connections: Some(1),
        connect_timeout: Some(10),
        idle_timeout: None,
    };

    let db = connection::create_pool(&settings)
        .await
        .expect("failed to connect to sqlite");
    connection::run_migrations(&db)
        .await
        .expect("failed to run migrations");
    Arc::new(db)
}

pub fn test_scraping_settings() -> ScrapingSettings {
    ScrapingSettings {
        timeout_secs: 5,
        favicon_timeout_secs: 1,
        ..Default::default()
    }
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(test_scraping_settings()).await
}

pub async fn create_test_app_with(scraping: ScrapingSettings) -> TestApp {
    let db = create_test_db().await;
    let schedule_repo = Arc::new(ScheduleRepositoryImpl::new(db.clone()));
    let result_repo = Arc::new(ScrapeResultRepositoryImpl::new(db.clone()));

    let engine = Arc::new(ReqwestEngine::new(&scraping).expect("failed to build engine"));
    let scrape_service = Arc::new(ScrapeService::new(engine, result_repo.clone(), &scraping));

    let orchestrator = ScheduleOrchestrator::new(
        schedule_repo.clone(),
        scrape_service.clone(),
        Duration::from_secs(30),
    );

    TestApp {
        db,
        schedule_repo,
        result_repo,
        scrape_service,
        orchestrator,
    }
}

pub fn schedule_request(name: &str, url: &str, cron: &str) -> CreateScheduleRequest {
    CreateScheduleRequest {
        name: name.to_string(),
        url: url.to_string(),
        cron_expression: cron.to_string(),
    }
}
