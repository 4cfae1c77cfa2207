// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 提取服务（extraction_service）：单次遍历DOM，提取页面结构化数据
///
/// 抓取能力本身由 `PageScraper` 抽象，调度器只依赖这一接口。
pub mod extraction_service;

use crate::domain::models::scrape_result::ScrapeResult;
use crate::utils::errors::ScrapeError;
use async_trait::async_trait;
use uuid::Uuid;

/// 页面抓取特质
///
/// 抓取一个URL、提取结构化数据并持久化。只有持久化成功的结果才会返回给调用方。
#[async_trait]
pub trait PageScraper: Send + Sync {
    /// 抓取页面
    ///
    /// # 参数
    ///
    /// * `url` - http/https 绝对地址
    /// * `owner_id` - 结果所属用户ID
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapeResult)` - 已保存的抓取结果，非2xx状态码也属于成功
    /// * `Err(ScrapeError)` - URL无效、传输失败、解码失败或保存失败
    async fn scrape_url(&self, url: &str, owner_id: Uuid) -> Result<ScrapeResult, ScrapeError>;
}
