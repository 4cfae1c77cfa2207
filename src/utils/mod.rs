// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
/// 包括错误类型、响应体解码、日志初始化与请求校验
pub mod errors;
pub mod telemetry;
pub mod text_encoding;
pub mod validators;
