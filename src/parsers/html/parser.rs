//! HTML 属性值解析
//!
//! - **链接类型解析**: 解析 `<link>` 元素的 `rel` 属性
//! - **SrcSet解析**: 解析 `srcset` / `data-srcset` 属性
//!
//! ```rust
//! use webclone::parsers::html::parser::{parse_link_type, parse_srcset, LinkType};
//!
//! let link_types = parse_link_type("shortcut icon");
//! assert_eq!(link_types, vec![LinkType::Favicon]);
//!
//! let srcset_items = parse_srcset("small.jpg 480w, large.jpg 800w");
//! assert_eq!(srcset_items.len(), 2);
//! ```

use super::utils::{is_favicon, WHITESPACES};

/// `<link rel>` 中识别的链接类型
#[derive(Debug, PartialEq, Eq)]
pub enum LinkType {
    /// Apple设备触摸图标
    AppleTouchIcon,
    /// 网站图标
    Favicon,
    /// CSS样式表
    Stylesheet,
}

/// `srcset` 中的单个候选项
#[derive(Debug, PartialEq, Eq)]
pub struct SrcSetItem<'a> {
    /// 图片路径或URL
    pub path: &'a str,
    /// 宽度描述符（如 "480w"）或像素密度描述符（如 "2x"），可为空
    pub descriptor: &'a str,
}

/// 解析 `rel` 属性值
///
/// 多个空格分隔的值各自解析，不区分大小写，不支持的值被忽略。
/// `shortcut icon` 中的 `shortcut` 单独出现时没有含义，`icon` 会被识别为 [`LinkType::Favicon`]。
pub fn parse_link_type(link_attr_rel_value: &str) -> Vec<LinkType> {
    let mut types: Vec<LinkType> = vec![];

    for link_attr_rel_type in link_attr_rel_value.split_whitespace() {
        if link_attr_rel_type.eq_ignore_ascii_case("stylesheet") {
            types.push(LinkType::Stylesheet);
        } else if is_favicon(link_attr_rel_type) {
            types.push(LinkType::Favicon);
        } else if link_attr_rel_type.eq_ignore_ascii_case("apple-touch-icon") {
            types.push(LinkType::AppleTouchIcon);
        }
    }

    types
}

/// 解析 `srcset` 属性
///
/// 候选项以逗号分隔，路径与描述符以空白分隔。没有描述符时 `descriptor` 为空字符串。
/// 路径内部的逗号（如 `a.jpg?w=1,2`）在其后紧跟空白之前不会被当作分隔符。
pub fn parse_srcset(srcset: &str) -> Vec<SrcSetItem> {
    let mut srcset_items: Vec<SrcSetItem> = vec![];
    let mut rest = srcset;

    loop {
        rest = rest.trim_start_matches(|c: char| WHITESPACES.contains(&c) || c == ',');
        if rest.is_empty() {
            break;
        }

        // 路径一直延续到下一个空白字符
        let path_end = rest.find(WHITESPACES).unwrap_or(rest.len());
        let mut path = &rest[..path_end];
        rest = &rest[path_end..];

        if let Some(stripped) = path.strip_suffix(',') {
            path = stripped.trim_end_matches(',');
            srcset_items.push(SrcSetItem {
                path,
                descriptor: "",
            });
            continue;
        }

        // 描述符一直延续到下一个逗号
        let descriptor_end = rest.find(',').unwrap_or(rest.len());
        let descriptor = rest[..descriptor_end].trim_matches(WHITESPACES);
        rest = &rest[descriptor_end..];

        srcset_items.push(SrcSetItem { path, descriptor });
    }

    srcset_items
}
