//! # 网络模块
//!
//! 这个模块包含所有与网络通信和页面渲染相关的功能：
//!
//! - HTTP会话管理和单个资源下载
//! - 无头浏览器渲染，获取客户端渲染后的DOM
//!
//! # 模块组织
//!
//! - `session` - HTTP会话、资源下载（含 `file://`）
//! - `renderer` - 页面渲染（无头浏览器 / 直接下载）

pub mod renderer;
pub mod session;

// Re-export commonly used items for convenience
#[cfg(feature = "headless")]
pub use renderer::HeadlessRenderer;
pub use renderer::{PageRenderer, RenderError, RenderOptions, StaticRenderer};
pub use session::{AssetFetcher, FetchError, RetrievedAsset, Session};
