//! # WebClone Library
//!
//! 将渲染后的网页保存为可离线浏览的静态目录：`index.html`、合并后的 `styles.css`、
//! 所有下载到本地的资源文件以及一份 `README.md`。
//!
//! ## 模块组织
//!
//! - `core` - 克隆流程、选项与结果报告
//! - `network` - 页面渲染与资源下载
//! - `parsers` - HTML 与 CSS 处理
//! - `builders` - 输出目录写入
//! - `utils` - URL 与文件名工具
//! - `env` - 环境变量配置

pub mod builders;
pub mod core;
pub mod env;
pub mod network;
pub mod parsers;
pub mod utils;

// Re-export commonly used items for convenience
pub use crate::core::{
    clone_site, clone_website, create_static_bundle, AssetKind, AssetOutcome, AssetStatus,
    CloneError, CloneJob, CloneOptions, ClonePipeline, CloneReport,
};
pub use crate::network::{AssetFetcher, PageRenderer, Session, StaticRenderer};
