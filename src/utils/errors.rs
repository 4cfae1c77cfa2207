// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::EngineError;
use crate::queue::cron_driver::DriverError;
use sea_orm::DbErr;
use thiserror::Error;

/// 仓库层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("数据库错误: {0}")]
    Database(#[from] DbErr),

    #[error("未找到数据")]
    NotFound,

    #[error("无效数据: {0}")]
    InvalidData(String),
}

/// 抓取错误类型
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("验证错误: {0}")]
    Validation(String),

    #[error("抓取失败: {0}")]
    Fetch(#[from] EngineError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("仓库错误: {0}")]
    Repository(#[from] RepositoryError),
}

/// 定时任务错误类型
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("验证错误: {0}")]
    Validation(String),

    /// 不存在与无权访问使用同一个变体，避免向非所有者泄露存在性
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("仓库错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error("调度驱动错误: {0}")]
    Driver(#[from] DriverError),

    #[error("内部错误: {0}")]
    Internal(String),
}
