// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sha2::{Digest, Sha256};
use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 将商品链接补全为绝对地址
///
/// 只接受 http(s) 结果；`javascript:`、`#` 等无效链接返回 `None`
pub fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let base = Url::parse(base).ok()?;
    let resolved = resolve_url(&base, href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// URL 的稳定短键，用作调试快照文件名
pub fn snapshot_key(url: &str) -> String {
    let digest = Sha256::digest(url.trim().as_bytes());
    hex::encode(digest)[..16].to_string()
}
