// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::schedule::Schedule;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 定时任务仓库特质
///
/// 定义定时任务数据访问接口
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// 创建定时任务
    async fn create(&self, schedule: &Schedule) -> Result<Schedule, RepositoryError>;

    /// 根据ID查找定时任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Schedule>, RepositoryError>;

    /// 查找用户的所有定时任务，按创建时间倒序
    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Schedule>, RepositoryError>;

    /// 查找所有启用的定时任务
    async fn find_active(&self) -> Result<Vec<Schedule>, RepositoryError>;

    /// 更新名称、URL、cron表达式、启用状态与下一次执行时间
    ///
    /// # 返回值
    ///
    /// * `Ok(Schedule)` - 更新后的任务
    /// * `Err(RepositoryError::NotFound)` - 任务不存在
    async fn update(&self, schedule: &Schedule) -> Result<Schedule, RepositoryError>;

    /// 删除定时任务，任务不存在时返回 `RepositoryError::NotFound`
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// 写回最近执行时间与执行次数
    async fn update_last_run(
        &self,
        id: Uuid,
        last_run: DateTime<Utc>,
        run_count: i64,
    ) -> Result<(), RepositoryError>;

    /// 写回下一次执行时间
    async fn update_next_run(
        &self,
        id: Uuid,
        next_run: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}
