// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::pagination::PaginationRequest;
use crate::domain::models::scrape_result::ScrapeResult;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 爬取结果仓库特质
///
/// 定义爬取结果数据访问接口
#[async_trait]
pub trait ScrapeResultRepository: Send + Sync {
    /// 保存爬取结果
    async fn save(&self, result: &ScrapeResult) -> Result<(), RepositoryError>;

    /// 根据ID查找结果
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScrapeResult>, RepositoryError>;

    /// 查找用户的所有结果，按创建时间倒序
    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<ScrapeResult>, RepositoryError>;

    /// 分页查找用户的结果
    ///
    /// # 返回值
    ///
    /// * `Ok((Vec<ScrapeResult>, u64))` - 当前页数据与总条数
    async fn find_by_owner_paginated(
        &self,
        owner_id: Uuid,
        pagination: PaginationRequest,
    ) -> Result<(Vec<ScrapeResult>, u64), RepositoryError>;

    /// 统计用户的结果数
    async fn count_by_owner(&self, owner_id: Uuid) -> Result<u64, RepositoryError>;

    /// 删除结果，不存在时返回 `RepositoryError::NotFound`
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}
