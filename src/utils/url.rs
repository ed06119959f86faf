//! URL 工具函数
//!
//! 负责相对地址解析、data URL 判断以及从 URL 路径推导本地文件名。

use percent_encoding::percent_decode_str;

pub use ::url::Url;

/// 解析引用地址
///
/// 绝对地址原样返回，相对地址基于 `base` 解析。无法解析时返回 `None`。
pub fn resolve_url(base: &Url, reference: &str) -> Option<Url> {
    let reference = reference.trim();

    if reference.is_empty() {
        return None;
    }

    match Url::parse(reference) {
        Ok(parsed) => Some(parsed),
        Err(_) => base.join(reference).ok(),
    }
}

/// 判断引用是否为内联 data URL（不需要下载）
pub fn is_data_url(reference: &str) -> bool {
    reference
        .trim_start()
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// 去掉 URL 的片段部分，用作下载缓存的键
pub fn clean_url(url: &Url) -> Url {
    let mut cleaned = url.clone();
    cleaned.set_fragment(None);
    cleaned
}

/// 从 URL 路径的最后一段推导本地文件名
///
/// 路径段会先做百分号解码，再把文件系统不安全的字符替换为 `-`。
/// 路径以 `/` 结尾或没有可用字符时返回 `None`。
pub fn file_name_from_url(url: &Url) -> Option<String> {
    let last_segment = url.path_segments()?.last()?;
    let decoded = percent_decode_str(last_segment).decode_utf8_lossy();

    let sanitized: String = decoded
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let sanitized = sanitized.trim_matches(|c| c == '.' || c == '-').to_string();

    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

/// 按 `cloned-{host}` 规则生成默认输出目录名（`.` 替换为 `-`）
pub fn default_folder_name(url: &Url) -> String {
    match url.host_str() {
        Some(host) if !host.is_empty() => format!("cloned-{}", host.replace('.', "-")),
        _ => "cloned-local".to_string(),
    }
}
