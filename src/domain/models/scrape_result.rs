// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 页面标题（h1-h6）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHeader {
    /// 标题层级，取值 1..=6
    pub level: u8,
    /// 去除首尾空白后的标题文本
    pub text: String,
}

/// 爬取结果实体
///
/// 一次页面抓取提取出的结构化数据。由抓取服务创建，
/// 保存后不再修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    /// 结果唯一标识符
    pub id: Uuid,
    /// 所属用户ID
    pub owner_id: Uuid,
    /// 目标URL
    pub url: String,
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub author: String,
    pub language: String,
    /// favicon的绝对地址，探测全部失败时为空
    pub favicon: String,
    /// og:image
    pub image_url: String,
    /// og:site_name
    pub site_name: String,
    /// 去重后的绝对链接，按首次出现的文档顺序
    pub links: Vec<String>,
    /// 去重后的绝对图片地址，按首次出现的文档顺序
    pub images: Vec<String>,
    /// 文档顺序的标题列表
    pub headers: Vec<PageHeader>,
    /// HTTP响应状态码
    pub status_code: u16,
    /// 内容类型，HTTP响应的Content-Type头信息
    pub content_type: String,
    /// 去除标签后的单词数
    pub word_count: u64,
    /// 主请求耗时（毫秒）
    pub load_time_ms: u64,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}
