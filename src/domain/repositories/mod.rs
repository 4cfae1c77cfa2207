// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 定时任务仓库（schedule_repository）：管理定时任务定义及其执行统计
/// - 爬取结果仓库（scrape_result_repository）：管理爬取结果的存储
pub mod schedule_repository;
pub mod scrape_result_repository;
