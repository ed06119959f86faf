//! HTML解析和处理模块
//!
//! - `utils`: 基础工具函数和常量
//! - `parser`: 属性值解析（`rel`、`srcset`）
//! - `dom`: 基础DOM操作与简单选择器
//! - `metadata`: 文档元数据与快照清理
//! - `serializer`: 序列化与格式化输出
//! - `styles`: 样式表汇总
//! - `assets`: 资源下载与引用改写

pub mod assets;
pub mod dom;
pub mod metadata;
pub mod parser;
pub mod serializer;
pub mod styles;
pub mod utils;

pub use assets::{AssetLocalizer, AssetRewriter};
pub use dom::{find_nodes, get_node_attr, parse_html, select, set_node_attr};
pub use metadata::{get_base_url, get_title, strip_for_snapshot};
pub use parser::{parse_link_type, parse_srcset, LinkType, SrcSetItem};
pub use serializer::{beautify_html, serialize_document, HtmlFormat};
pub use styles::resolve_styles;
pub use utils::{is_favicon, FAVICON_VALUES, WHITESPACES};
