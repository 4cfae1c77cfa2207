// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 调度模块
///
/// 提供cron驱动、定时抓取调度器与触发处理器
/// 负责定时任务的注册、触发和生命周期管理
pub mod cron_driver;
pub mod scheduler;
pub mod trigger;
