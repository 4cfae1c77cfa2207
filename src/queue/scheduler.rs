// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::schedule::{
    CreateScheduleRequest, Schedule, SchedulerStatus, UpdateScheduleRequest,
};
use crate::domain::repositories::schedule_repository::ScheduleRepository;
use crate::domain::services::PageScraper;
use crate::infrastructure::metrics;
use crate::queue::cron_driver::{self, CronDriver, JobCallback};
use crate::queue::trigger::TriggerHandler;
use crate::utils::errors::{RepositoryError, ScheduleError};
use crate::utils::validators::describe;
use chrono::Utc;
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator::Validate;

/// 调度器可变状态，由同一把读写锁保护
///
/// 持有驱动即为运行中
#[derive(Debug, Default)]
struct SchedulerState {
    driver: Option<CronDriver>,
    /// 定时任务ID到cron任务句柄的映射，每个定时任务至多一个句柄
    jobs: HashMap<Uuid, Uuid>,
}

impl SchedulerState {
    fn is_running(&self) -> bool {
        self.driver.is_some()
    }
}

/// 调度器内部共享数据
///
/// 触发处理器只持有它的弱引用
pub(crate) struct OrchestratorInner {
    pub(crate) schedule_repository: Arc<dyn ScheduleRepository>,
    pub(crate) scraper: Arc<dyn PageScraper>,
    pub(crate) execution_timeout: Duration,
    state: RwLock<SchedulerState>,
}

impl OrchestratorInner {
    /// 为定时任务注册cron任务，已注册时跳过
    async fn register(
        self: &Arc<Self>,
        state: &mut SchedulerState,
        schedule: &Schedule,
    ) -> Result<(), ScheduleError> {
        if state.jobs.contains_key(&schedule.id) {
            info!(schedule_id = %schedule.id, "Schedule already registered, skipping");
            return Ok(());
        }
        let Some(driver) = state.driver.as_ref() else {
            return Err(ScheduleError::Internal("scheduler is not running".to_string()));
        };

        let handler = TriggerHandler::new(schedule.id, Arc::downgrade(self));
        let callback: JobCallback = Arc::new(move |job_id: Uuid| {
            let handler = handler.clone();
            async move { handler.fire(job_id).await }.boxed()
        });

        let job_id = driver.add(&schedule.cron_expression, callback).await?;
        state.jobs.insert(schedule.id, job_id);
        metrics::set_active_jobs(state.jobs.len());

        info!(
            schedule_id = %schedule.id,
            cron = %schedule.cron_expression,
            job_id = %job_id,
            "Registered schedule"
        );
        Ok(())
    }

    /// 移除定时任务的cron任务，没有注册时无操作
    async fn deregister(&self, state: &mut SchedulerState, schedule_id: Uuid) -> bool {
        let Some(job_id) = state.jobs.remove(&schedule_id) else {
            return false;
        };
        if let Some(driver) = state.driver.as_ref() {
            driver.remove(job_id).await;
        }
        metrics::set_active_jobs(state.jobs.len());
        info!(schedule_id = %schedule_id, job_id = %job_id, "Deregistered schedule");
        true
    }

    /// 注册表是否仍把定时任务映射到这个cron任务
    ///
    /// 停止、删除或重新注册之后旧的触发都会在这里被拒绝
    pub(crate) async fn is_current(&self, schedule_id: Uuid, job_id: Uuid) -> bool {
        self.state.read().await.jobs.get(&schedule_id) == Some(&job_id)
    }

    /// 触发处理器自我清理
    ///
    /// 只有注册表中仍是同一个cron任务时才移除映射，不会误删更新后重新注册的任务
    pub(crate) async fn deregister_entry(&self, schedule_id: Uuid, job_id: Uuid) {
        let mut state = self.state.write().await;
        if state.jobs.get(&schedule_id) == Some(&job_id) {
            self.deregister(&mut state, schedule_id).await;
        } else if let Some(driver) = state.driver.as_ref() {
            // 注册表已不再指向它，只需从驱动中移除
            driver.remove(job_id).await;
        }
    }
}

/// 定时抓取调度器
///
/// 持有cron驱动和内存注册表，保证注册表与持久化的定时任务保持一致。
/// 只有 `Stopped` 与 `Running` 两种状态。
#[derive(Clone)]
pub struct ScheduleOrchestrator {
    inner: Arc<OrchestratorInner>,
}

impl ScheduleOrchestrator {
    /// 创建处于停止状态的调度器
    ///
    /// # 参数
    ///
    /// * `schedule_repository` - 定时任务仓库
    /// * `scraper` - 页面抓取实现
    /// * `execution_timeout` - 单次定时执行的截止时间，应长于抓取自身的网络超时
    ///
    /// # 返回值
    ///
    /// 返回新的调度器实例
    pub fn new(
        schedule_repository: Arc<dyn ScheduleRepository>,
        scraper: Arc<dyn PageScraper>,
        execution_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(OrchestratorInner {
                schedule_repository,
                scraper,
                execution_timeout,
                state: RwLock::new(SchedulerState::default()),
            }),
        }
    }

    /// 启动调度器
    ///
    /// 创建并启动新的cron驱动，然后加载所有启用的定时任务并注册。
    /// 加载失败只记录日志，调度器照常运行。已运行时无操作。
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 启动成功或已在运行
    /// * `Err(ScheduleError)` - cron驱动无法启动，调度器保持停止
    pub async fn start(&self) -> Result<(), ScheduleError> {
        let mut state = self.inner.state.write().await;
        if state.is_running() {
            info!("Scheduler already running");
            return Ok(());
        }

        let driver = CronDriver::new().await?;
        driver.start().await?;
        state.driver = Some(driver);

        let loaded = match self.inner.schedule_repository.find_active().await {
            Ok(schedules) => {
                for schedule in &schedules {
                    if let Err(e) = self.inner.register(&mut state, schedule).await {
                        error!(schedule_id = %schedule.id, "Failed to register schedule: {}", e);
                    }
                }
                schedules.len()
            }
            Err(e) => {
                error!("Failed to load active schedules: {}", e);
                0
            }
        };

        info!(
            loaded,
            registered = state.jobs.len(),
            "Scheduler started"
        );
        Ok(())
    }

    /// 停止调度器
    ///
    /// 先关闭cron驱动再清空注册表，返回后不会再有新的执行；
    /// 已经在执行的触发会继续完成。已停止时无操作。
    pub async fn stop(&self) {
        let mut state = self.inner.state.write().await;
        let Some(driver) = state.driver.take() else {
            debug!("Scheduler already stopped");
            return;
        };

        driver.shutdown().await;
        state.jobs.clear();

        metrics::set_active_jobs(0);
        info!("Scheduler stopped");
    }

    /// 创建定时任务
    ///
    /// # 参数
    ///
    /// * `request` - 创建请求
    /// * `owner_id` - 所属用户ID
    ///
    /// # 返回值
    ///
    /// * `Ok(Schedule)` - 已保存的定时任务
    /// * `Err(ScheduleError)` - 校验失败或保存失败
    pub async fn create_schedule(
        &self,
        request: CreateScheduleRequest,
        owner_id: Uuid,
    ) -> Result<Schedule, ScheduleError> {
        let request = request.trimmed();
        request
            .validate()
            .map_err(|e| ScheduleError::Validation(describe(&e)))?;

        let next_run = cron_driver::next_run(&request.cron_expression)
            .map_err(|e| ScheduleError::Validation(e.to_string()))?;

        let schedule = Schedule::new(
            owner_id,
            request.name,
            request.url,
            request.cron_expression,
            next_run,
        );
        let created = self.inner.schedule_repository.create(&schedule).await?;
        info!(schedule_id = %created.id, owner_id = %owner_id, "Created schedule");

        let mut state = self.inner.state.write().await;
        if state.is_running() && created.active {
            // 行已保存，注册失败留给下次启动时重新加载
            if let Err(e) = self.inner.register(&mut state, &created).await {
                error!(schedule_id = %created.id, "Failed to register schedule: {}", e);
            }
        }

        Ok(created)
    }

    /// 获取定时任务
    ///
    /// # 返回值
    ///
    /// * `Ok(Schedule)` - 定时任务
    /// * `Err(ScheduleError::NotFound)` - 不存在或不属于调用方
    pub async fn get_schedule(&self, id: Uuid, owner_id: Uuid) -> Result<Schedule, ScheduleError> {
        match self.inner.schedule_repository.find_by_id(id).await? {
            Some(schedule) if schedule.owner_id == owner_id => Ok(schedule),
            _ => Err(ScheduleError::NotFound("schedule")),
        }
    }

    /// 列出用户的定时任务
    pub async fn list_schedules(&self, owner_id: Uuid) -> Result<Vec<Schedule>, ScheduleError> {
        Ok(self.inner.schedule_repository.find_by_owner(owner_id).await?)
    }

    /// 更新定时任务
    ///
    /// 只应用请求中出现的字段。cron表达式改变时重新计算下一次执行时间。
    /// 旧条目无条件移除，运行中且更新后仍启用时重新注册。
    ///
    /// # 参数
    ///
    /// * `id` - 定时任务ID
    /// * `request` - 更新请求
    /// * `owner_id` - 调用方用户ID
    ///
    /// # 返回值
    ///
    /// * `Ok(Schedule)` - 更新后的定时任务
    /// * `Err(ScheduleError)` - 校验失败、不存在或保存失败
    pub async fn update_schedule(
        &self,
        id: Uuid,
        request: UpdateScheduleRequest,
        owner_id: Uuid,
    ) -> Result<Schedule, ScheduleError> {
        let request = request.trimmed();
        request
            .validate()
            .map_err(|e| ScheduleError::Validation(describe(&e)))?;

        let current = self.get_schedule(id, owner_id).await?;
        let mut patched = current.clone();

        if let Some(name) = request.name {
            patched.name = name;
        }
        if let Some(url) = request.url {
            patched.url = url;
        }
        if let Some(cron_expression) = request.cron_expression {
            if cron_expression != current.cron_expression {
                let next_run = cron_driver::next_run(&cron_expression)
                    .map_err(|e| ScheduleError::Validation(e.to_string()))?;
                patched.cron_expression = cron_expression;
                patched.next_run = Some(next_run);
            }
        }
        if let Some(active) = request.active {
            patched.active = active;
        }
        patched.updated_at = Utc::now();

        let mut state = self.inner.state.write().await;
        let was_registered = self.inner.deregister(&mut state, id).await;

        let updated = match self.inner.schedule_repository.update(&patched).await {
            Ok(updated) => updated,
            Err(e) => {
                if was_registered {
                    if let Err(e) = self.inner.register(&mut state, &current).await {
                        error!(schedule_id = %id, "Failed to restore registration: {}", e);
                    }
                }
                return Err(match e {
                    RepositoryError::NotFound => ScheduleError::NotFound("schedule"),
                    e => e.into(),
                });
            }
        };

        if state.is_running() && updated.active {
            self.inner.register(&mut state, &updated).await?;
        }
        info!(
            schedule_id = %id,
            active = updated.active,
            cron = %updated.cron_expression,
            "Updated schedule"
        );

        Ok(updated)
    }

    /// 删除定时任务
    ///
    /// 先移除cron条目，再删除持久化的行
    pub async fn delete_schedule(&self, id: Uuid, owner_id: Uuid) -> Result<(), ScheduleError> {
        let current = self.get_schedule(id, owner_id).await?;

        let mut state = self.inner.state.write().await;
        let was_registered = self.inner.deregister(&mut state, id).await;

        match self.inner.schedule_repository.delete(id).await {
            Ok(()) => {
                info!(schedule_id = %id, "Deleted schedule");
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(ScheduleError::NotFound("schedule")),
            Err(e) => {
                warn!(schedule_id = %id, "Failed to delete schedule: {}", e);
                if was_registered {
                    if let Err(e) = self.inner.register(&mut state, &current).await {
                        error!(schedule_id = %id, "Failed to restore registration: {}", e);
                    }
                }
                Err(e.into())
            }
        }
    }

    /// 获取调度器状态
    pub async fn get_status(&self) -> SchedulerStatus {
        let state = self.inner.state.read().await;
        SchedulerStatus {
            is_running: state.is_running(),
            active_jobs: state.jobs.len(),
            cron_entries: state.driver.as_ref().map_or(0, CronDriver::len),
        }
    }

    /// 调度器是否运行中
    pub async fn is_running(&self) -> bool {
        self.inner.state.read().await.is_running()
    }
}
