//! 资源本地文件名分配
//!
//! 文件名取自 URL 路径的最后一段；没有可用的路径段时使用按资源类型区分的回退名。
//! 同一目录内的文件名保持唯一。

use std::collections::HashSet;

use super::url::{file_name_from_url, Url};

/// Names the bundle writer owns; assets never take them.
pub const RESERVED_FILE_NAMES: &[&str] = &["index.html", "styles.css", "README.md"];

/// 回退文件名的生成方式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackName {
    /// 使用元素在文档中的位置，如 `image-3.jpg`
    Positional {
        prefix: &'static str,
        index: usize,
        extension: &'static str,
    },
    /// 使用单调递增计数器，如 `bg-7.jpg`
    Sequential {
        prefix: &'static str,
        extension: &'static str,
    },
}

#[derive(Debug, Default)]
pub struct AssetNamer {
    claimed: HashSet<String>,
    counter: usize,
}

impl AssetNamer {
    pub fn new() -> Self {
        let mut namer = Self::default();
        for reserved in RESERVED_FILE_NAMES {
            namer.claimed.insert(reserved.to_ascii_lowercase());
        }
        namer
    }

    /// Proposes a free name for `url` without claiming it.
    pub fn propose(&mut self, url: &Url, fallback: FallbackName) -> String {
        let base_name = match file_name_from_url(url) {
            Some(name) => name,
            None => match fallback {
                FallbackName::Positional {
                    prefix,
                    index,
                    extension,
                } => format!("{prefix}-{index}.{extension}"),
                FallbackName::Sequential { prefix, extension } => {
                    let name = format!("{prefix}-{}.{extension}", self.counter);
                    self.counter += 1;
                    name
                }
            },
        };

        self.deduplicate(base_name)
    }

    /// Marks `name` as taken in the destination directory.
    pub fn claim(&mut self, name: &str) {
        self.claimed.insert(name.to_ascii_lowercase());
    }

    pub fn is_claimed(&self, name: &str) -> bool {
        self.claimed.contains(&name.to_ascii_lowercase())
    }

    fn deduplicate(&self, name: String) -> String {
        if !self.is_claimed(&name) {
            return name;
        }

        let (stem, extension) = match name.rfind('.') {
            Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
            _ => (name.as_str(), ""),
        };

        let mut suffix = 1;
        loop {
            let candidate = format!("{stem}-{suffix}{extension}");
            if !self.is_claimed(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }
}
