// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::infrastructure::metrics::{self, Outcome};
use crate::queue::cron_driver;
use crate::queue::scheduler::OrchestratorInner;
use chrono::Utc;
use std::sync::Weak;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 触发处理器
///
/// 绑定到一个定时任务的ID，每次触发时重新读取任务的最新数据，
/// 不会使用注册时的快照。
#[derive(Clone)]
pub struct TriggerHandler {
    schedule_id: Uuid,
    orchestrator: Weak<OrchestratorInner>,
}

impl TriggerHandler {
    pub(crate) fn new(schedule_id: Uuid, orchestrator: Weak<OrchestratorInner>) -> Self {
        Self {
            schedule_id,
            orchestrator,
        }
    }

    /// 处理一次触发
    ///
    /// 注册表不再指向 `job_id` 时（调度器已停止、任务已删除或已重新注册）直接返回。
    /// 任务已删除或已停用时移除自身的cron任务并返回。否则在执行截止时间内抓取，
    /// 无论成功与否都记录执行时间并把执行次数加一，最后按当前表达式写回下一次执行时间。
    ///
    /// # 参数
    ///
    /// * `job_id` - 触发本次执行的cron任务句柄
    pub async fn fire(&self, job_id: Uuid) {
        let Some(orchestrator) = self.orchestrator.upgrade() else {
            return;
        };
        let id = self.schedule_id;
        let repository = &orchestrator.schedule_repository;

        if !orchestrator.is_current(id, job_id).await {
            debug!(schedule_id = %id, job_id = %job_id, "Cron job is no longer registered, skipping");
            orchestrator.deregister_entry(id, job_id).await;
            metrics::record_fire(Outcome::Skipped);
            return;
        }

        let schedule = match repository.find_by_id(id).await {
            Ok(Some(schedule)) => schedule,
            Ok(None) => {
                warn!(schedule_id = %id, "Schedule no longer exists, removing cron entry");
                orchestrator.deregister_entry(id, job_id).await;
                metrics::record_fire(Outcome::Skipped);
                return;
            }
            Err(e) => {
                error!(schedule_id = %id, "Failed to load schedule: {}", e);
                metrics::record_fire(Outcome::Error);
                return;
            }
        };

        if !schedule.active {
            info!(schedule_id = %id, "Schedule is inactive, removing cron entry");
            orchestrator.deregister_entry(id, job_id).await;
            metrics::record_fire(Outcome::Skipped);
            return;
        }

        let started_at = Utc::now();
        debug!(schedule_id = %id, url = %schedule.url, "Running scheduled scrape");

        let execution = orchestrator
            .scraper
            .scrape_url(&schedule.url, schedule.owner_id);
        let outcome = match tokio::time::timeout(orchestrator.execution_timeout, execution).await {
            Ok(Ok(result)) => {
                info!(
                    schedule_id = %id,
                    result_id = %result.id,
                    status_code = result.status_code,
                    "Scheduled scrape completed"
                );
                Outcome::Success
            }
            Ok(Err(e)) => {
                error!(schedule_id = %id, url = %schedule.url, "Scheduled scrape failed: {}", e);
                Outcome::Error
            }
            Err(_) => {
                error!(
                    schedule_id = %id,
                    timeout = ?orchestrator.execution_timeout,
                    "Scheduled scrape exceeded execution deadline"
                );
                Outcome::Timeout
            }
        };
        metrics::record_fire(outcome);

        // 一次执行计为一次尝试，失败也计数。计数基于触发开始时读到的值，
        // 同一任务的两次触发重叠时后写入者覆盖先写入者
        if let Err(e) = repository
            .update_last_run(id, started_at, schedule.run_count + 1)
            .await
        {
            error!(schedule_id = %id, "Failed to record run: {}", e);
        }

        // 执行期间表达式可能被修改，按最新的表达式计算
        let cron_expression = match repository.find_by_id(id).await {
            Ok(Some(current)) => current.cron_expression,
            Ok(None) => {
                debug!(schedule_id = %id, "Schedule deleted during execution");
                return;
            }
            Err(e) => {
                warn!(schedule_id = %id, "Failed to reload schedule, using loaded expression: {}", e);
                schedule.cron_expression
            }
        };

        match cron_driver::next_run(&cron_expression) {
            Ok(next_run) => match repository.update_next_run(id, next_run).await {
                Ok(()) => debug!(schedule_id = %id, next_run = %next_run, "Updated next run"),
                Err(e) => error!(schedule_id = %id, "Failed to update next run: {}", e),
            },
            Err(e) => {
                error!(schedule_id = %id, cron = %cron_expression, "Failed to compute next run: {}", e)
            }
        }
    }
}
