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

use crate::queue::cron_driver::CronExpression;
use std::borrow::Cow;
use url::Url;
use validator::{ValidationError, ValidationErrors};

/// 解析并校验抓取目标URL
///
/// 只接受带主机名的 http/https 绝对地址
///
/// # 参数
///
/// * `url` - URL字符串
///
/// # 返回值
///
/// * `Ok(Url)` - 解析后的URL
/// * `Err(String)` - 可读的错误描述
pub fn parse_http_url(url: &str) -> Result<Url, String> {
    let url = url.trim();
    if url.is_empty() {
        return Err("URL is required".to_string());
    }

    let parsed = Url::parse(url).map_err(|e| format!("invalid URL format: {}", e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err("only HTTP and HTTPS protocols are supported".to_string());
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err("URL must include a valid domain".to_string());
    }

    Ok(parsed)
}

/// `validator` 自定义校验：http/https URL
pub fn validate_http_url(url: &str) -> Result<(), ValidationError> {
    parse_http_url(url)
        .map(|_| ())
        .map_err(|message| ValidationError::new("url").with_message(Cow::Owned(message)))
}

/// `validator` 自定义校验：六字段cron表达式
///
/// 与调度器执行时使用同一个解析器
pub fn validate_cron_expression(expression: &str) -> Result<(), ValidationError> {
    CronExpression::parse(expression).map(|_| ()).map_err(|e| {
        ValidationError::new("cron_expression").with_message(Cow::Owned(e.to_string()))
    })
}

/// 将 `ValidationErrors` 展平为一行可读信息
pub fn describe(errors: &ValidationErrors) -> String {
    let mut parts = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            match &error.message {
                Some(message) => parts.push(format!("{}: {}", field, message)),
                None => parts.push(format!("{}: {}", field, error.code)),
            }
        }
    }
    parts.sort();
    parts.join("; ")
}
