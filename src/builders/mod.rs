//! # 构建器模块
//!
//! - `bundle` - 输出目录写入（资源文件、index.html、styles.css、README.md）

pub mod bundle;

pub use bundle::{BundleWriter, ReadmeInfo};
