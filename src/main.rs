// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use pagecron::application::usecases::scrape_service::ScrapeService;
use pagecron::config::settings::Settings;
use pagecron::engines::reqwest_engine::ReqwestEngine;
use pagecron::infrastructure::database::connection;
use pagecron::infrastructure::metrics;
use pagecron::infrastructure::repositories::schedule_repo_impl::ScheduleRepositoryImpl;
use pagecron::infrastructure::repositories::scrape_result_repo_impl::ScrapeResultRepositoryImpl;
use pagecron::queue::scheduler::ScheduleOrchestrator;
use pagecron::utils::telemetry;
use std::sync::Arc;
use tracing::{info, warn};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并运行调度器直到收到退出信号
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting pagecron...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    if settings.metrics.enabled {
        metrics::init_metrics(&settings.metrics.listen_addr);
    }

    // 3. Connect to database
    let db = Arc::new(connection::create_pool(&settings.database).await?);
    info!("Database connection established");

    connection::run_migrations(db.as_ref()).await?;

    // 4. Initialize components
    let schedule_repo = Arc::new(ScheduleRepositoryImpl::new(db.clone()));
    let result_repo = Arc::new(ScrapeResultRepositoryImpl::new(db.clone()));
    let engine = Arc::new(ReqwestEngine::new(&settings.scraping)?);
    let scraper = Arc::new(ScrapeService::new(engine, result_repo, &settings.scraping));

    let execution_timeout = settings.scheduler.execution_timeout(&settings.scraping);
    let orchestrator = ScheduleOrchestrator::new(schedule_repo, scraper, execution_timeout);

    // 5. Start scheduler
    if settings.scheduler.autostart {
        orchestrator.start().await?;
    } else {
        warn!("Scheduler autostart disabled");
    }

    let status = orchestrator.get_status().await;
    info!(
        running = status.is_running,
        active_jobs = status.active_jobs,
        "pagecron ready"
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    orchestrator.stop().await;

    Ok(())
}
