//! # 工具模块
//!
//! 这个模块包含各种工具函数和实用程序：
//!
//! - URL处理和解析工具
//! - 本地资源文件命名
//!
//! # 模块组织
//!
//! - `url` - URL解析、data URL判断、文件名推导
//! - `naming` - 资源本地文件名分配（去重、保留名、回退名）

pub mod naming;
pub mod url;

// Re-export commonly used items for convenience
pub use naming::{AssetNamer, FallbackName, RESERVED_FILE_NAMES};
pub use self::url::{
    clean_url, default_folder_name, file_name_from_url, is_data_url, resolve_url, Url,
};
