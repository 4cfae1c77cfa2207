// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};

pub const SCRAPES_TOTAL: &str = "pagecron_scrapes_total";
pub const SCRAPE_DURATION_SECONDS: &str = "pagecron_scrape_duration_seconds";
pub const SCHEDULE_FIRES_TOTAL: &str = "pagecron_schedule_fires_total";
pub const SCHEDULER_ACTIVE_JOBS: &str = "pagecron_scheduler_active_jobs";

/// 指标结果标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Error,
    Timeout,
    Skipped,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Error => "error",
            Outcome::Timeout => "timeout",
            Outcome::Skipped => "skipped",
        }
    }
}

/// 安装Prometheus导出器并注册指标描述
///
/// 监听地址无效或端口被占用时只记录警告，不影响服务启动
///
/// # 参数
///
/// * `listen_addr` - 指标HTTP监听地址，例如 `0.0.0.0:9000`
pub fn init_metrics(listen_addr: &str) {
    let addr: SocketAddr = match listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", listen_addr, e);
            return;
        }
    };

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }

    describe_counter!(SCRAPES_TOTAL, "Total number of page scrapes by outcome");
    describe_histogram!(
        SCRAPE_DURATION_SECONDS,
        "Duration of page scrapes including persistence in seconds"
    );
    describe_counter!(
        SCHEDULE_FIRES_TOTAL,
        "Total number of scheduled fires by outcome"
    );
    describe_gauge!(
        SCHEDULER_ACTIVE_JOBS,
        "Number of schedules currently registered with the cron driver"
    );

    info!("Metrics exporter listening on {}", addr);
}

/// 记录一次抓取
pub fn record_scrape(outcome: Outcome, elapsed: Duration) {
    counter!(SCRAPES_TOTAL, "outcome" => outcome.as_str()).increment(1);
    histogram!(SCRAPE_DURATION_SECONDS).record(elapsed.as_secs_f64());
}

/// 记录一次定时触发
pub fn record_fire(outcome: Outcome) {
    counter!(SCHEDULE_FIRES_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

/// 更新已注册任务数
pub fn set_active_jobs(count: usize) {
    gauge!(SCHEDULER_ACTIVE_JOBS).set(count as f64);
}
