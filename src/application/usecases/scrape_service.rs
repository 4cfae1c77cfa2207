// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::config::settings::ScrapingSettings;
use crate::domain::models::pagination::{PaginatedResults, PaginationRequest, PaginationResponse};
use crate::domain::models::scrape_result::ScrapeResult;
use crate::domain::repositories::scrape_result_repository::ScrapeResultRepository;
use crate::domain::services::extraction_service::{
    calculate_word_count, ExtractionOptions, ExtractionService,
};
use crate::domain::services::PageScraper;
use crate::engines::traits::{FetchRequest, ScraperEngine};
use crate::infrastructure::metrics::{self, Outcome};
use crate::utils::errors::{RepositoryError, ScrapeError};
use crate::utils::text_encoding::decode_body;
use crate::utils::validators::parse_http_url;

/// favicon 探测路径，按顺序尝试
const FAVICON_PATHS: [&str; 3] = ["/favicon.ico", "/favicon.png", "/apple-touch-icon.png"];

/// 抓取服务
///
/// 抓取页面、提取结构化数据并保存，同时提供抓取结果的查询与删除
pub struct ScrapeService {
    engine: Arc<dyn ScraperEngine>,
    result_repository: Arc<dyn ScrapeResultRepository>,
    extraction: ExtractionService,
    timeout: Duration,
    favicon_timeout: Duration,
    extract_favicon: bool,
}

impl ScrapeService {
    /// 创建抓取服务
    ///
    /// # 参数
    ///
    /// * `engine` - 抓取引擎
    /// * `result_repository` - 抓取结果仓库
    /// * `settings` - 抓取配置
    pub fn new(
        engine: Arc<dyn ScraperEngine>,
        result_repository: Arc<dyn ScrapeResultRepository>,
        settings: &ScrapingSettings,
    ) -> Self {
        Self {
            engine,
            result_repository,
            extraction: ExtractionService::new(ExtractionOptions::from(settings)),
            timeout: settings.timeout(),
            favicon_timeout: settings.favicon_timeout(),
            extract_favicon: settings.extract_favicon,
        }
    }

    async fn scrape(&self, url: &Url, owner_id: Uuid) -> Result<ScrapeResult, ScrapeError> {
        let response = self
            .engine
            .fetch(&FetchRequest {
                url: url.to_string(),
                timeout: self.timeout,
            })
            .await?;

        if !(200..300).contains(&response.status_code) {
            debug!(url = %url, status_code = response.status_code, "non-success status, extracting anyway");
        }

        let html = decode_body(&response.body, &response.content_type);

        let page = self.extraction.extract(&html, url);
        let favicon = if self.extract_favicon {
            self.probe_favicon(url).await.unwrap_or_default()
        } else {
            String::new()
        };

        let result = ScrapeResult {
            id: Uuid::new_v4(),
            owner_id,
            url: url.to_string(),
            title: page.title,
            description: page.description,
            keywords: page.keywords,
            author: page.author,
            language: page.language,
            favicon,
            image_url: page.image_url,
            site_name: page.site_name,
            links: page.links,
            images: page.images,
            headers: page.headers,
            status_code: response.status_code,
            content_type: response.content_type,
            word_count: calculate_word_count(&html),
            load_time_ms: response.response_time_ms,
            created_at: Utc::now(),
        };

        self.result_repository.save(&result).await?;
        Ok(result)
    }

    /// 依次探测常见的favicon地址，第一个返回200的胜出
    async fn probe_favicon(&self, url: &Url) -> Option<String> {
        for path in FAVICON_PATHS {
            let Ok(candidate) = url.join(path) else {
                continue;
            };
            if self.engine.probe(candidate.as_str(), self.favicon_timeout).await {
                return Some(candidate.to_string());
            }
        }
        None
    }

    /// 获取抓取结果
    ///
    /// # 参数
    ///
    /// * `id` - 结果ID
    /// * `owner_id` - 调用方用户ID
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapeResult)` - 抓取结果
    /// * `Err(ScrapeError::NotFound)` - 结果不存在或不属于调用方
    pub async fn get_result(&self, id: Uuid, owner_id: Uuid) -> Result<ScrapeResult, ScrapeError> {
        match self.result_repository.find_by_id(id).await? {
            Some(result) if result.owner_id == owner_id => Ok(result),
            _ => Err(ScrapeError::NotFound("result")),
        }
    }

    /// 列出用户的全部抓取结果
    pub async fn list_results(&self, owner_id: Uuid) -> Result<Vec<ScrapeResult>, ScrapeError> {
        Ok(self.result_repository.find_by_owner(owner_id).await?)
    }

    /// 分页列出用户的抓取结果
    pub async fn list_results_paginated(
        &self,
        owner_id: Uuid,
        pagination: PaginationRequest,
    ) -> Result<PaginatedResults<ScrapeResult>, ScrapeError> {
        let (data, total) = self
            .result_repository
            .find_by_owner_paginated(owner_id, pagination)
            .await?;

        Ok(PaginatedResults {
            data,
            pagination: PaginationResponse::new(pagination, total),
        })
    }

    /// 删除抓取结果，不存在或不属于调用方时返回 `NotFound`
    pub async fn delete_result(&self, id: Uuid, owner_id: Uuid) -> Result<(), ScrapeError> {
        self.get_result(id, owner_id).await?;
        match self.result_repository.delete(id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(ScrapeError::NotFound("result")),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PageScraper for ScrapeService {
    #[instrument(skip(self), fields(engine = self.engine.name()))]
    async fn scrape_url(&self, url: &str, owner_id: Uuid) -> Result<ScrapeResult, ScrapeError> {
        let url = parse_http_url(url).map_err(ScrapeError::Validation)?;

        let start = Instant::now();
        let outcome = self.scrape(&url, owner_id).await;
        let elapsed = start.elapsed();

        match &outcome {
            Ok(result) => {
                metrics::record_scrape(Outcome::Success, elapsed);
                info!(
                    result_id = %result.id,
                    status_code = result.status_code,
                    links = result.links.len(),
                    "Scrape completed"
                );
            }
            Err(ScrapeError::Fetch(e)) if e.is_timeout() => {
                metrics::record_scrape(Outcome::Timeout, elapsed);
                warn!("Scrape timed out: {}", e);
            }
            Err(e) => {
                metrics::record_scrape(Outcome::Error, elapsed);
                error!("Scrape failed: {}", e);
            }
        }

        outcome
    }
}

#[cfg(test)]
#[path = "scrape_service_test.rs"]
mod tests;
