// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 分页（pagination）：分页请求与响应
/// - 定时任务（schedule）：周期抓取的定义与请求
/// - 爬取结果（scrape_result）：存储爬取到的数据结果
pub mod pagination;
pub mod schedule;
pub mod scrape_result;
