// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::{debug, warn};

/// 在文档开头多少字节内查找 `<meta charset>`
const META_PRESCAN_BYTES: usize = 1024;

static CONTENT_TYPE_CHARSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"';\s]+)"#).unwrap());

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]*charset\s*=\s*["']?([^"'>\s/;]+)"#).unwrap()
});

/// 将HTTP响应体解码为UTF-8字符串
///
/// 编码按以下顺序确定：BOM、Content-Type中的charset、文档开头的 `<meta charset>`、
/// chardetng 检测结果。非法字节序列替换为U+FFFD，不会失败。
///
/// # 参数
///
/// * `body` - 原始响应体
/// * `content_type` - Content-Type 响应头，可为空
///
/// # 返回值
///
/// 解码后的文本
pub fn decode_body(body: &[u8], content_type: &str) -> String {
    let (encoding, payload) = match Encoding::for_bom(body) {
        Some((encoding, bom_len)) => (encoding, &body[bom_len..]),
        None => (select_encoding(body, content_type), body),
    };

    debug!(encoding = encoding.name(), bytes = payload.len(), "decoding response body");

    let (text, had_errors) = encoding.decode_without_bom_handling(payload);
    if had_errors {
        warn!(
            encoding = encoding.name(),
            "response body has malformed byte sequences, replaced with U+FFFD"
        );
    }
    text.into_owned()
}

fn select_encoding(body: &[u8], content_type: &str) -> &'static Encoding {
    if let Some(encoding) = label_from(&CONTENT_TYPE_CHARSET, content_type.as_bytes()) {
        return encoding;
    }

    let head = &body[..body.len().min(META_PRESCAN_BYTES)];
    if let Some(encoding) = label_from(&META_CHARSET, head) {
        return encoding;
    }

    if std::str::from_utf8(body).is_ok() {
        return UTF_8;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(body, true);
    detector.guess(None, true)
}

fn label_from(pattern: &Regex, haystack: &[u8]) -> Option<&'static Encoding> {
    let label = pattern.captures(haystack)?.get(1)?;
    Encoding::for_label(label.as_bytes())
}
