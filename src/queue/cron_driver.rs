// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use croner::Cron;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{debug, warn};
use uuid::Uuid;

/// cron表达式字段数：秒 分 时 日 月 周
const CRON_FIELDS: usize = 6;

/// cron表达式解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CronParseError {
    #[error("cron expression is required")]
    Empty,

    #[error("cron expression must have 6 fields (sec min hour day-of-month month day-of-week), got {0}")]
    FieldCount(usize),

    #[error("invalid cron expression: {0}")]
    Invalid(String),
}

/// cron驱动错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    #[error(transparent)]
    Parse(#[from] CronParseError),

    #[error("job scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}

/// 已解析的六字段cron表达式
///
/// 星期字段0-6，0为周日（7也表示周日），同时限定日和星期时两者都要满足，
/// 与驱动内部的解析配置一致，被接受的表达式一定可调度
pub struct CronExpression {
    source: String,
    schedule: Cron,
}

impl CronExpression {
    /// 解析cron表达式
    ///
    /// # 参数
    ///
    /// * `expression` - 六字段cron表达式
    ///
    /// # 返回值
    ///
    /// * `Ok(CronExpression)` - 解析成功
    /// * `Err(CronParseError)` - 为空、字段数不为6或语法错误
    pub fn parse(expression: &str) -> Result<Self, CronParseError> {
        let source = expression.trim();
        if source.is_empty() {
            return Err(CronParseError::Empty);
        }

        let fields = source.split_whitespace().count();
        if fields != CRON_FIELDS {
            return Err(CronParseError::FieldCount(fields));
        }

        let schedule = Cron::new(source)
            .with_seconds_required()
            .with_dom_and_dow()
            .parse()
            .map_err(|e| CronParseError::Invalid(e.to_string()))?;

        Ok(Self {
            source: source.to_string(),
            schedule,
        })
    }

    /// 严格晚于 `after` 的下一次触发时间，表达式没有未来的触发点时返回None
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.find_next_occurrence(&after, false).ok()
    }

    /// 原始表达式文本（已去除首尾空白）
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl fmt::Debug for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CronExpression").field(&self.source).finish()
    }
}

/// 计算从当前时刻起的下一次执行时间
pub fn next_run(expression: &str) -> Result<DateTime<Utc>, CronParseError> {
    let parsed = CronExpression::parse(expression)?;
    parsed
        .next_after(Utc::now())
        .ok_or_else(|| CronParseError::Invalid(format!("'{}' has no upcoming run", expression)))
}

/// 定时任务回调，参数为触发它的任务句柄
pub type JobCallback = Arc<dyn Fn(Uuid) -> BoxFuture<'static, ()> + Send + Sync>;

/// cron驱动
///
/// 包装 `JobScheduler`，并记录自身持有的任务句柄以便报告条目数。
/// 每次启动调度器都创建新的驱动，停止时整体关闭。
pub struct CronDriver {
    scheduler: JobScheduler,
    entries: Mutex<HashSet<Uuid>>,
}

impl CronDriver {
    /// 创建尚未启动的驱动
    pub async fn new() -> Result<Self, DriverError> {
        Ok(Self {
            scheduler: JobScheduler::new().await?,
            entries: Mutex::new(HashSet::new()),
        })
    }

    /// 添加任务
    ///
    /// # 参数
    ///
    /// * `expression` - 六字段cron表达式
    /// * `callback` - 每次触发时执行的回调
    ///
    /// # 返回值
    ///
    /// * `Ok(Uuid)` - 新任务的句柄
    /// * `Err(DriverError)` - 表达式无效或调度器拒绝
    pub async fn add(&self, expression: &str, callback: JobCallback) -> Result<Uuid, DriverError> {
        let expression = CronExpression::parse(expression)?;

        let job = Job::new_async(expression.as_str(), move |job_id, _scheduler| {
            callback(job_id)
        })?;
        let job_id = self.scheduler.add(job).await?;

        self.entries.lock().insert(job_id);
        debug!(job_id = %job_id, cron = %expression, "cron job added");
        Ok(job_id)
    }

    /// 移除任务
    ///
    /// # 返回值
    ///
    /// 任务由本驱动持有时返回true
    pub async fn remove(&self, job_id: Uuid) -> bool {
        let known = self.entries.lock().remove(&job_id);
        if !known {
            return false;
        }
        if let Err(e) = self.scheduler.remove(&job_id).await {
            warn!(job_id = %job_id, "Failed to remove cron job: {}", e);
        }
        true
    }

    /// 启动驱动
    pub async fn start(&self) -> Result<(), DriverError> {
        self.scheduler.start().await?;
        debug!(entries = self.len(), "cron driver started");
        Ok(())
    }

    /// 关闭驱动，之后不会再有新的触发；已经开始的回调会继续执行完毕
    pub async fn shutdown(mut self) {
        let entries = self.len();
        if let Err(e) = self.scheduler.shutdown().await {
            warn!("Failed to shut down cron driver: {}", e);
        }
        debug!(entries, "cron driver stopped");
    }

    /// 驱动持有的任务数
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for CronDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CronDriver")
            .field("entries", &self.len())
            .finish()
    }
}
