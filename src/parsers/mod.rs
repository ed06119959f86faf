//! # 解析器模块
//!
//! - `html` - HTML文档解析、DOM操作、资源引用改写
//! - `css` - 样式汇总、`url(...)` 扫描与格式化

pub mod css;
pub mod html;

pub use css::{format_css, CssFormat, StyleSheetAggregate};
pub use html::{beautify_html, get_base_url, get_title, serialize_document};
