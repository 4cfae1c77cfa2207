// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 定时抓取任务实体
///
/// 持久化的周期抓取定义。`active` 与 `cron_expression` 只由调度器的更新路径修改，
/// `last_run`、`run_count`、`next_run` 只在每次触发后由触发处理器写回。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 所属用户ID
    pub owner_id: Uuid,
    /// 任务名称
    pub name: String,
    /// 抓取目标URL
    pub url: String,
    /// 六字段cron表达式：秒 分 时 日 月 周
    pub cron_expression: String,
    /// 是否启用
    pub active: bool,
    /// 最近一次执行时间
    pub last_run: Option<DateTime<Utc>>,
    /// 下一次预计执行时间，始终由当前表达式计算得出
    pub next_run: Option<DateTime<Utc>>,
    /// 已尝试执行的次数（失败也计入）
    pub run_count: i64,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    /// 创建一个新的启用状态的定时任务
    ///
    /// # 参数
    ///
    /// * `owner_id` - 所属用户ID
    /// * `name` - 任务名称
    /// * `url` - 目标URL
    /// * `cron_expression` - cron表达式
    /// * `next_run` - 下一次执行时间
    ///
    /// # 返回值
    ///
    /// 返回带有新ID与当前时间戳的Schedule
    pub fn new(
        owner_id: Uuid,
        name: String,
        url: String,
        cron_expression: String,
        next_run: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            url,
            cron_expression,
            active: true,
            last_run: None,
            next_run: Some(next_run),
            run_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 创建定时任务请求
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateScheduleRequest {
    #[validate(length(min = 3, max = 100, message = "name must be between 3 and 100 characters"))]
    pub name: String,
    #[validate(custom(function = "crate::utils::validators::validate_http_url"))]
    pub url: String,
    #[validate(custom(function = "crate::utils::validators::validate_cron_expression"))]
    pub cron_expression: String,
}

impl CreateScheduleRequest {
    /// 去除所有字段首尾空白
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            url: self.url.trim().to_string(),
            cron_expression: self.cron_expression.trim().to_string(),
        }
    }
}

/// 更新定时任务请求，只应用出现的字段
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateScheduleRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: Option<String>,
    #[validate(custom(function = "crate::utils::validators::validate_http_url"))]
    pub url: Option<String>,
    #[validate(custom(function = "crate::utils::validators::validate_cron_expression"))]
    pub cron_expression: Option<String>,
    pub active: Option<bool>,
}

impl UpdateScheduleRequest {
    /// 去除所有出现字段的首尾空白
    pub fn trimmed(self) -> Self {
        let trim = |value: Option<String>| value.map(|v| v.trim().to_string());
        Self {
            name: trim(self.name),
            url: trim(self.url),
            cron_expression: trim(self.cron_expression),
            active: self.active,
        }
    }
}

/// 调度器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    /// 调度器是否运行中
    pub is_running: bool,
    /// 注册表中的任务数
    pub active_jobs: usize,
    /// cron驱动自身持有的条目数，应与 `active_jobs` 一致
    pub cron_entries: usize,
}
