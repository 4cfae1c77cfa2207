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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含数据库、抓取、调度器和指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 抓取配置
    pub scraping: ScrapingSettings,
    /// 调度器配置
    pub scheduler: SchedulerSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 抓取配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapingSettings {
    /// 请求使用的User-Agent
    pub user_agent: String,
    /// 主请求超时时间（秒）
    pub timeout_secs: u64,
    /// 最大重定向次数
    pub max_redirects: usize,
    /// 最多提取的链接数，0表示不限制
    pub max_links: usize,
    /// 最多提取的图片数，0表示不限制
    pub max_images: usize,
    /// 是否提取图片
    pub extract_images: bool,
    /// 是否探测favicon
    pub extract_favicon: bool,
    /// 是否提取标题层级
    pub extract_headers: bool,
    /// 单次favicon探测超时时间（秒）
    pub favicon_timeout_secs: u64,
}

impl ScrapingSettings {
    /// 主请求超时
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// 单次favicon探测超时
    pub fn favicon_timeout(&self) -> Duration {
        Duration::from_secs(self.favicon_timeout_secs)
    }

    /// 一次完整抓取在网络上最多花费的时间：主请求加上三次favicon探测
    pub fn network_budget(&self) -> Duration {
        let probes = if self.extract_favicon {
            self.favicon_timeout() * 3
        } else {
            Duration::ZERO
        };
        self.timeout() + probes
    }
}

impl Default for ScrapingSettings {
    fn default() -> Self {
        Self {
            user_agent: "WebScraper/1.0".to_string(),
            timeout_secs: 30,
            max_redirects: 10,
            max_links: 100,
            max_images: 50,
            extract_images: true,
            extract_favicon: true,
            extract_headers: true,
            favicon_timeout_secs: 3,
        }
    }
}

/// 调度器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// 进程启动时是否自动启动调度器
    pub autostart: bool,
    /// 单次定时执行的截止时间（秒），包含抓取、解析与持久化
    pub execution_timeout_secs: u64,
}

impl SchedulerSettings {
    /// 计算实际生效的执行截止时间
    ///
    /// 截止时间必须严格长于抓取本身的网络预算，否则取网络预算再加一分钟
    ///
    /// # 参数
    ///
    /// * `scraping` - 抓取配置
    ///
    /// # 返回值
    ///
    /// 实际使用的执行截止时间
    pub fn execution_timeout(&self, scraping: &ScrapingSettings) -> Duration {
        let configured = Duration::from_secs(self.execution_timeout_secs);
        let budget = scraping.network_budget();
        if configured > budget {
            configured
        } else {
            budget + Duration::from_secs(60)
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            autostart: true,
            execution_timeout_secs: 300,
        }
    }
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用Prometheus指标导出
    pub enabled: bool,
    /// 指标监听地址
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和
    /// `PAGECRON__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default DB settings
            .set_default("database.url", "sqlite://./data/pagecron.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default scraping settings
            .set_default("scraping.user_agent", "WebScraper/1.0")?
            .set_default("scraping.timeout_secs", 30)?
            .set_default("scraping.max_redirects", 10)?
            .set_default("scraping.max_links", 100)?
            .set_default("scraping.max_images", 50)?
            .set_default("scraping.extract_images", true)?
            .set_default("scraping.extract_favicon", true)?
            .set_default("scraping.extract_headers", true)?
            .set_default("scraping.favicon_timeout_secs", 3)?
            // Default scheduler settings
            .set_default("scheduler.autostart", true)?
            .set_default("scheduler.execution_timeout_secs", 300)?
            // Default metrics settings
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("PAGECRON").separator("__"));

        builder.build()?.try_deserialize()
    }
}
