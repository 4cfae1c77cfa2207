// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_app, schedule_request, REFUSED_URL, SAMPLE_PAGE};
use chrono::Utc;
use pagecron::domain::models::schedule::UpdateScheduleRequest;
use pagecron::domain::repositories::schedule_repository::ScheduleRepository;
use pagecron::domain::repositories::scrape_result_repository::ScrapeResultRepository;
use pagecron::utils::errors::ScheduleError;
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const EVERY_SECOND: &str = "* * * * * *";
const YEARLY: &str = "0 0 0 1 1 *";

async fn page_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(SAMPLE_PAGE.as_bytes().to_vec(), "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;
    server
}

async fn get_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.to_string() == "GET")
        .count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scheduled_fire_scrapes_and_records_run() {
    let app = create_test_app().await;
    let server = page_server().await;
    let owner = Uuid::new_v4();

    let schedule = app
        .orchestrator
        .create_schedule(schedule_request("every second", &server.uri(), EVERY_SECOND), owner)
        .await
        .unwrap();
    assert!(schedule.next_run.unwrap() > schedule.created_at);

    app.orchestrator.start().await.unwrap();
    sleep(Duration::from_millis(2600)).await;
    app.orchestrator.stop().await;
    // 等待已派发的执行写回统计
    sleep(Duration::from_millis(800)).await;

    let stored = app.schedule_repo.find_by_id(schedule.id).await.unwrap().unwrap();
    assert!(stored.run_count >= 1, "run_count = {}", stored.run_count);
    assert!(stored.last_run.is_some());
    assert!(stored.next_run.unwrap() > stored.last_run.unwrap());

    let results = app.result_repo.find_by_owner(owner).await.unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0].title, "Sample Page");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_fire_still_counts_attempt() {
    let app = create_test_app().await;
    let owner = Uuid::new_v4();

    let schedule = app
        .orchestrator
        .create_schedule(schedule_request("refused", REFUSED_URL, EVERY_SECOND), owner)
        .await
        .unwrap();

    app.orchestrator.start().await.unwrap();
    sleep(Duration::from_millis(2600)).await;
    app.orchestrator.stop().await;
    sleep(Duration::from_millis(500)).await;

    let stored = app.schedule_repo.find_by_id(schedule.id).await.unwrap().unwrap();
    assert!(stored.run_count >= 1, "run_count = {}", stored.run_count);
    assert!(stored.last_run.is_some());
    assert_eq!(app.result_repo.count_by_owner(owner).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_delete_stops_future_fires() {
    let app = create_test_app().await;
    let server = page_server().await;
    let owner = Uuid::new_v4();

    let schedule = app
        .orchestrator
        .create_schedule(schedule_request("to delete", &server.uri(), EVERY_SECOND), owner)
        .await
        .unwrap();
    app.orchestrator.start().await.unwrap();
    sleep(Duration::from_millis(1600)).await;

    app.orchestrator.delete_schedule(schedule.id, owner).await.unwrap();
    let status = app.orchestrator.get_status().await;
    assert_eq!(status.active_jobs, 0);
    assert_eq!(status.cron_entries, 0);

    // 删除前已派发的执行允许完成
    sleep(Duration::from_millis(500)).await;
    let after_delete = get_requests(&server).await;
    sleep(Duration::from_millis(2200)).await;
    assert_eq!(get_requests(&server).await, after_delete);
    assert!(app.schedule_repo.find_by_id(schedule.id).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cron_update_reschedules() {
    let app = create_test_app().await;
    let server = page_server().await;
    let owner = Uuid::new_v4();

    let schedule = app
        .orchestrator
        .create_schedule(schedule_request("yearly", &server.uri(), YEARLY), owner)
        .await
        .unwrap();
    app.orchestrator.start().await.unwrap();
    assert_eq!(app.orchestrator.get_status().await.active_jobs, 1);

    let before = Utc::now();
    let updated = app
        .orchestrator
        .update_schedule(
            schedule.id,
            UpdateScheduleRequest {
                cron_expression: Some(EVERY_SECOND.to_string()),
                ..Default::default()
            },
            owner,
        )
        .await
        .unwrap();
    assert!(updated.active);
    assert_eq!(updated.cron_expression, EVERY_SECOND);
    let next_run = updated.next_run.unwrap();
    assert!(next_run > before);
    assert!(next_run <= before + chrono::Duration::seconds(2));

    let status = app.orchestrator.get_status().await;
    assert_eq!(status.active_jobs, 1);
    assert_eq!(status.cron_entries, 1);

    sleep(Duration::from_millis(2600)).await;
    app.orchestrator.stop().await;
    sleep(Duration::from_millis(500)).await;

    let stored = app.schedule_repo.find_by_id(schedule.id).await.unwrap().unwrap();
    assert!(stored.run_count >= 1);
    assert!(get_requests(&server).await >= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_start_registers_only_active_schedules() {
    let app = create_test_app().await;
    let owner = Uuid::new_v4();

    let kept = app
        .orchestrator
        .create_schedule(schedule_request("kept", "https://example.com", YEARLY), owner)
        .await
        .unwrap();
    let paused = app
        .orchestrator
        .create_schedule(schedule_request("paused", "https://example.com", YEARLY), owner)
        .await
        .unwrap();
    app.orchestrator
        .update_schedule(
            paused.id,
            UpdateScheduleRequest {
                active: Some(false),
                ..Default::default()
            },
            owner,
        )
        .await
        .unwrap();

    app.orchestrator.start().await.unwrap();
    let status = app.orchestrator.get_status().await;
    assert!(status.is_running);
    assert_eq!(status.active_jobs, 1);
    assert_eq!(status.cron_entries, 1);

    let listed = app.orchestrator.list_schedules(owner).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|s| s.id == kept.id && s.active));
    assert!(listed.iter().any(|s| s.id == paused.id && !s.active));

    app.orchestrator.stop().await;
    let status = app.orchestrator.get_status().await;
    assert!(!status.is_running);
    assert_eq!(status.active_jobs, 0);
    assert_eq!(status.cron_entries, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_orphaned_entry_self_heals() {
    let app = create_test_app().await;
    let server = page_server().await;
    let owner = Uuid::new_v4();

    let schedule = app
        .orchestrator
        .create_schedule(schedule_request("orphan", &server.uri(), EVERY_SECOND), owner)
        .await
        .unwrap();
    app.orchestrator.start().await.unwrap();

    // 绕过调度器直接删除行
    app.schedule_repo.delete(schedule.id).await.unwrap();
    sleep(Duration::from_millis(2200)).await;

    let status = app.orchestrator.get_status().await;
    assert!(status.is_running);
    assert_eq!(status.active_jobs, 0);
    assert_eq!(status.cron_entries, 0);
    assert_eq!(get_requests(&server).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_schedules_are_owner_scoped() {
    let app = create_test_app().await;
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let schedule = app
        .orchestrator
        .create_schedule(schedule_request("private", "https://example.com", YEARLY), owner)
        .await
        .unwrap();

    let missing = app
        .orchestrator
        .get_schedule(Uuid::new_v4(), owner)
        .await
        .unwrap_err();
    let foreign = app
        .orchestrator
        .get_schedule(schedule.id, stranger)
        .await
        .unwrap_err();
    assert_eq!(missing.to_string(), foreign.to_string());
    assert!(matches!(foreign, ScheduleError::NotFound(_)));

    assert!(matches!(
        app.orchestrator.delete_schedule(schedule.id, stranger).await,
        Err(ScheduleError::NotFound(_))
    ));
    assert!(app.orchestrator.list_schedules(stranger).await.unwrap().is_empty());
    assert!(app
        .orchestrator
        .get_schedule(schedule.id, owner)
        .await
        .is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invalid_requests_are_rejected() {
    let app = create_test_app().await;
    let owner = Uuid::new_v4();

    for request in [
        schedule_request("five fields", "https://example.com", "0 * * * *"),
        schedule_request("bad url", "not a url", EVERY_SECOND),
        schedule_request("", "https://example.com", EVERY_SECOND),
    ] {
        assert!(matches!(
            app.orchestrator.create_schedule(request, owner).await,
            Err(ScheduleError::Validation(_))
        ));
    }
    assert!(app.schedule_repo.find_by_owner(owner).await.unwrap().is_empty());

    let schedule = app
        .orchestrator
        .create_schedule(schedule_request("valid", "https://example.com", YEARLY), owner)
        .await
        .unwrap();
    let err = app
        .orchestrator
        .update_schedule(
            schedule.id,
            UpdateScheduleRequest {
                cron_expression: Some("every minute".to_string()),
                ..Default::default()
            },
            owner,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Validation(_)));

    let stored = app.schedule_repo.find_by_id(schedule.id).await.unwrap().unwrap();
    assert_eq!(stored.cron_expression, YEARLY);
}
