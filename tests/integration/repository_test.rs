// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::create_test_db;
use chrono::{Duration, Utc};
use pagecron::domain::models::pagination::PaginationRequest;
use pagecron::domain::models::schedule::Schedule;
use pagecron::domain::models::scrape_result::{PageHeader, ScrapeResult};
use pagecron::domain::repositories::schedule_repository::ScheduleRepository;
use pagecron::domain::repositories::scrape_result_repository::ScrapeResultRepository;
use pagecron::infrastructure::repositories::schedule_repo_impl::ScheduleRepositoryImpl;
use pagecron::infrastructure::repositories::scrape_result_repo_impl::ScrapeResultRepositoryImpl;
use pagecron::utils::errors::RepositoryError;
use uuid::Uuid;

fn sample_schedule(owner_id: Uuid, name: &str) -> Schedule {
    Schedule::new(
        owner_id,
        name.to_string(),
        "https://example.com".to_string(),
        "0 0 * * * *".to_string(),
        Utc::now() + Duration::hours(1),
    )
}

fn sample_result(owner_id: Uuid) -> ScrapeResult {
    ScrapeResult {
        id: Uuid::new_v4(),
        owner_id,
        url: "https://example.com/".to_string(),
        title: "Example".to_string(),
        description: "An example".to_string(),
        keywords: String::new(),
        author: String::new(),
        language: "en".to_string(),
        favicon: "https://example.com/favicon.ico".to_string(),
        image_url: String::new(),
        site_name: String::new(),
        links: vec![
            "https://example.com/a".to_string(),
            "https://example.com/b".to_string(),
        ],
        images: vec!["https://example.com/logo.png".to_string()],
        headers: vec![PageHeader {
            level: 2,
            text: "Section".to_string(),
        }],
        status_code: 200,
        content_type: "text/html".to_string(),
        word_count: 42,
        load_time_ms: 120,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_schedule_repository_crud() {
    let db = create_test_db().await;
    let repo = ScheduleRepositoryImpl::new(db);
    let owner = Uuid::new_v4();

    let created = repo.create(&sample_schedule(owner, "first")).await.unwrap();
    repo.create(&sample_schedule(owner, "second")).await.unwrap();
    repo.create(&sample_schedule(Uuid::new_v4(), "other owner"))
        .await
        .unwrap();

    let found = repo.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(found.name, "first");
    assert_eq!(found.owner_id, owner);
    assert!(found.active);
    assert_eq!(found.run_count, 0);
    assert!(found.last_run.is_none());

    assert_eq!(repo.find_by_owner(owner).await.unwrap().len(), 2);
    assert_eq!(repo.find_active().await.unwrap().len(), 3);

    let mut patched = found.clone();
    patched.active = false;
    patched.cron_expression = "*/5 * * * * *".to_string();
    let next_run = Utc::now() + Duration::seconds(5);
    patched.next_run = Some(next_run);
    let updated = repo.update(&patched).await.unwrap();
    assert!(!updated.active);
    assert_eq!(updated.cron_expression, "*/5 * * * * *");
    assert_eq!(
        updated.next_run.map(|t| t.timestamp()),
        Some(next_run.timestamp())
    );
    assert_eq!(repo.find_active().await.unwrap().len(), 2);

    repo.delete(created.id).await.unwrap();
    assert!(repo.find_by_id(created.id).await.unwrap().is_none());
    assert!(matches!(
        repo.delete(created.id).await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
async fn test_schedule_run_statistics() {
    let db = create_test_db().await;
    let repo = ScheduleRepositoryImpl::new(db);
    let schedule = repo
        .create(&sample_schedule(Uuid::new_v4(), "stats"))
        .await
        .unwrap();

    let ran_at = Utc::now();
    repo.update_last_run(schedule.id, ran_at, 7).await.unwrap();
    let next_run = ran_at + Duration::minutes(1);
    repo.update_next_run(schedule.id, next_run).await.unwrap();

    let stored = repo.find_by_id(schedule.id).await.unwrap().unwrap();
    assert_eq!(stored.run_count, 7);
    assert_eq!(stored.last_run.map(|t| t.timestamp()), Some(ran_at.timestamp()));
    assert_eq!(stored.next_run.map(|t| t.timestamp()), Some(next_run.timestamp()));

    // update() 不覆盖执行统计
    let mut renamed = stored.clone();
    renamed.name = "renamed".to_string();
    renamed.run_count = 0;
    let updated = repo.update(&renamed).await.unwrap();
    assert_eq!(updated.run_count, 7);

    let missing = Uuid::new_v4();
    assert!(matches!(
        repo.update_last_run(missing, ran_at, 1).await,
        Err(RepositoryError::NotFound)
    ));
    assert!(matches!(
        repo.update_next_run(missing, next_run).await,
        Err(RepositoryError::NotFound)
    ));
    assert!(matches!(
        repo.update(&sample_schedule(Uuid::new_v4(), "ghost")).await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
async fn test_scrape_result_repository() {
    let db = create_test_db().await;
    let repo = ScrapeResultRepositoryImpl::new(db);
    let owner = Uuid::new_v4();

    let result = sample_result(owner);
    repo.save(&result).await.unwrap();

    let stored = repo.find_by_id(result.id).await.unwrap().unwrap();
    assert_eq!(stored.links, result.links);
    assert_eq!(stored.images, result.images);
    assert_eq!(stored.headers, result.headers);
    assert_eq!(stored.status_code, 200);
    assert_eq!(stored.word_count, 42);
    assert_eq!(stored.load_time_ms, 120);

    for _ in 0..4 {
        repo.save(&sample_result(owner)).await.unwrap();
    }
    repo.save(&sample_result(Uuid::new_v4())).await.unwrap();

    assert_eq!(repo.count_by_owner(owner).await.unwrap(), 5);
    assert_eq!(repo.find_by_owner(owner).await.unwrap().len(), 5);

    let (page, total) = repo
        .find_by_owner_paginated(owner, PaginationRequest::new(2, 2))
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(total, 5);

    let (last_page, _) = repo
        .find_by_owner_paginated(owner, PaginationRequest::new(3, 2))
        .await
        .unwrap();
    assert_eq!(last_page.len(), 1);

    repo.delete(result.id).await.unwrap();
    assert!(repo.find_by_id(result.id).await.unwrap().is_none());
    assert!(matches!(
        repo.delete(result.id).await,
        Err(RepositoryError::NotFound)
    ));
}
