use crate::utils::url::Url;

/// Favicon 相关的值
pub const FAVICON_VALUES: &[&str] = &["icon", "shortcut icon"];

/// ASCII 空白字符
pub const WHITESPACES: &[char] = &[' ', '\t', '\n', '\x0c', '\r'];

/// 懒加载图片使用的属性，按优先级排列（`data-srcset` 单独处理）
pub const LAZY_IMAGE_ATTRS: &[&str] = &["data-src", "data-lazy", "data-original"];

/// 下载成功后从 `<img>` 上移除的属性；`srcset` 会被浏览器优先使用，必须一并移除
pub const STRIPPED_IMAGE_ATTRS: &[&str] = &[
    "data-src",
    "data-lazy",
    "data-original",
    "data-srcset",
    "srcset",
    "sizes",
];

/// 字体服务域名；这些样式表链接原样保留
pub const FONT_SERVICE_HOSTS: &[&str] = &["fonts.googleapis.com", "fonts.bunny.net", "use.typekit.net"];

/// 统计和社交组件脚本的 `src` 特征
pub const TRACKER_SCRIPT_PATTERNS: &[&str] = &["google-analytics", "googletagmanager", "facebook"];

/// 检查是否为 favicon
pub fn is_favicon(attr_value: &str) -> bool {
    FAVICON_VALUES.contains(&attr_value.to_lowercase().as_str())
}

/// 判断链接是否指向字体服务
pub fn is_font_service(url: &Url) -> bool {
    url.host_str().is_some_and(|host| {
        FONT_SERVICE_HOSTS
            .iter()
            .any(|font_host| host.eq_ignore_ascii_case(font_host))
    })
}

/// 判断脚本地址是否属于统计或社交组件
pub fn is_tracker_script(src: &str) -> bool {
    TRACKER_SCRIPT_PATTERNS
        .iter()
        .any(|pattern| src.contains(pattern))
}
