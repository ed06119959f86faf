//! HTML 静态资源本地化
//!
//! [`AssetLocalizer`] 下载单个资源并写入输出目录，同一地址只下载一次，
//! 失败的地址不会重试。[`AssetRewriter`] 在文档与汇总样式表中查找资源引用：
//!
//! - 图片（`src` 及懒加载属性）
//! - 行内样式中的背景图
//! - SVG `<image>` 引用
//! - 样式表中的 `url(...)`
//! - 外部脚本
//! - 网站图标
//!
//! 下载失败时引用保持原样。

use std::collections::HashMap;
use std::sync::OnceLock;

use markup5ever_rcdom::{Handle, NodeData};
use regex::Regex;
use tracing::{debug, warn};

use crate::builders::bundle::{BundleWriter, STYLESHEET_FILE_NAME};
use crate::core::{AssetKind, AssetOutcome, AssetStatus};
use crate::network::session::{AssetFetcher, RetrievedAsset};
use crate::parsers::css::{
    find_css_urls, is_localizable_css_url, replace_css_urls, CssUrl, StyleSheetAggregate,
};
use crate::utils::naming::FallbackName;
use crate::utils::url::{clean_url, is_data_url, resolve_url, Url};

use super::dom::{
    detach_node, get_node_attr, get_parent, remove_node_attr, select, set_node_attr,
};
use super::parser::{parse_link_type, parse_srcset, LinkType};
use super::utils::{LAZY_IMAGE_ATTRS, STRIPPED_IMAGE_ATTRS};

const BACKGROUND_FALLBACK: FallbackName = FallbackName::Sequential {
    prefix: "bg",
    extension: "jpg",
};
const VECTOR_FALLBACK: FallbackName = FallbackName::Sequential {
    prefix: "svg",
    extension: "svg",
};
const CSS_RESOURCE_FALLBACK: FallbackName = FallbackName::Sequential {
    prefix: "css-img",
    extension: "jpg",
};
const ICON_FALLBACK: FallbackName = FallbackName::Sequential {
    prefix: "icon",
    extension: "ico",
};

/// data URL 在结果中只保留 `,` 之前的部分
fn summarize_data_url(reference: &str) -> String {
    let reference = reference.trim();
    match reference.find(',') {
        Some(comma) => format!("{},...", &reference[..comma]),
        None => reference.to_string(),
    }
}

pub struct AssetLocalizer<'a> {
    fetcher: &'a dyn AssetFetcher,
    bundle: &'a mut BundleWriter,
    /// 本地文件名缓存；`None` 表示该地址已下载失败
    localized: HashMap<Url, Option<String>>,
    outcomes: Vec<AssetOutcome>,
}

impl<'a> AssetLocalizer<'a> {
    pub fn new(fetcher: &'a dyn AssetFetcher, bundle: &'a mut BundleWriter) -> Self {
        AssetLocalizer {
            fetcher,
            bundle,
            localized: HashMap::new(),
            outcomes: Vec::new(),
        }
    }

    /// 下载 `url` 并写入输出目录，返回可写回文档的本地引用（保留片段）
    pub fn localize(
        &mut self,
        kind: AssetKind,
        url: &Url,
        fallback: FallbackName,
    ) -> Option<String> {
        let key = clean_url(url);

        let local_name = match self.localized.get(&key) {
            Some(cached) => cached.clone(),
            None => {
                let local_name = self.download(kind, &key, fallback);
                self.localized.insert(key, local_name.clone());
                local_name
            }
        }?;

        Some(match url.fragment() {
            Some(fragment) => format!("{local_name}#{fragment}"),
            None => local_name,
        })
    }

    fn download(&mut self, kind: AssetKind, url: &Url, fallback: FallbackName) -> Option<String> {
        let written = match self.fetcher.retrieve_asset(url) {
            Ok(asset) => self
                .bundle
                .write_asset(url, fallback, &asset.data)
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match written {
            Ok(local_name) => {
                self.record(
                    kind,
                    url.as_str(),
                    AssetStatus::Ok {
                        local_name: local_name.clone(),
                    },
                );
                Some(local_name)
            }
            Err(error) => {
                warn!(kind = ?kind, url = %url, "failed to download asset: {error}");
                self.record(kind, url.as_str(), AssetStatus::Failed { error });
                None
            }
        }
    }

    /// 下载样式表文本；内容会并入 `styles.css`，不单独写文件
    pub fn fetch_stylesheet(&mut self, url: &Url) -> Option<RetrievedAsset> {
        match self.fetcher.retrieve_asset(url) {
            Ok(asset) => {
                self.record(
                    AssetKind::Stylesheet,
                    url.as_str(),
                    AssetStatus::Ok {
                        local_name: STYLESHEET_FILE_NAME.to_string(),
                    },
                );
                Some(asset)
            }
            Err(e) => {
                warn!(url = %url, "failed to fetch stylesheet: {e}");
                self.record(
                    AssetKind::Stylesheet,
                    url.as_str(),
                    AssetStatus::Failed {
                        error: e.to_string(),
                    },
                );
                None
            }
        }
    }

    pub fn skip(&mut self, kind: AssetKind, origin: &str, reason: &str) {
        let origin = if is_data_url(origin) {
            summarize_data_url(origin)
        } else {
            origin.trim().to_string()
        };
        debug!(kind = ?kind, origin = %origin, "skipping asset: {reason}");
        self.record(
            kind,
            &origin,
            AssetStatus::Skipped {
                reason: reason.to_string(),
            },
        );
    }

    fn record(&mut self, kind: AssetKind, origin: &str, status: AssetStatus) {
        self.outcomes.push(AssetOutcome {
            kind,
            origin: origin.to_string(),
            status,
        });
    }

    pub fn into_outcomes(self) -> Vec<AssetOutcome> {
        self.outcomes
    }
}

/// 图片来源：依次取 `src`、`data-src`、`data-lazy`、`data-original`、
/// `data-srcset` 的第一个地址，跳过空值与 data URL
pub fn image_source_candidate(img: &Handle) -> Option<String> {
    for attr_name in std::iter::once("src").chain(LAZY_IMAGE_ATTRS.iter().copied()) {
        if let Some(value) = get_node_attr(img, attr_name) {
            let value = value.trim();
            if !value.is_empty() && !is_data_url(value) {
                return Some(value.to_string());
            }
        }
    }

    get_node_attr(img, "data-srcset")
        .and_then(|srcset| {
            parse_srcset(&srcset)
                .first()
                .map(|item| item.path.to_string())
        })
        .filter(|path| !path.is_empty() && !is_data_url(path))
}

fn background_declaration_regex() -> &'static Regex {
    static BACKGROUND_RE: OnceLock<Regex> = OnceLock::new();
    BACKGROUND_RE.get_or_init(|| {
        Regex::new(r"background(?:-image)?\s*:").expect("valid background pattern")
    })
}

/// 声明值在第一个不在括号或引号内的 `;` 处结束
fn declaration_value_end(style: &str, start: usize) -> usize {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (offset, c) in style[start..].char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ';' if depth == 0 => return start + offset,
                _ => {}
            },
        }
    }

    style.len()
}

/// 找出 `background` / `background-image` 声明中的所有 `url(...)`
///
/// 返回的位置相对于整个 `style` 字符串。
pub fn find_background_urls(style: &str) -> Vec<CssUrl> {
    // ASCII 小写副本与原文字节位置一致
    let lowercased = style.to_ascii_lowercase();
    let mut urls = Vec::new();

    for declaration in background_declaration_regex().find_iter(&lowercased) {
        let preceded_by_name_char = lowercased[..declaration.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if preceded_by_name_char {
            continue;
        }

        let value_start = declaration.end();
        let value_end = declaration_value_end(style, value_start);

        for css_url in find_css_urls(&style[value_start..value_end]) {
            urls.push(CssUrl {
                range: value_start + css_url.range.start..value_start + css_url.range.end,
                value: css_url.value,
            });
        }
    }

    urls
}

/// `<picture>` 中的 `<source srcset>` 仍指向原站；`<img>` 已本地化后移除它们
fn drop_picture_sources(img: &Handle) {
    let Some(picture) = get_parent(img).filter(|parent| {
        matches!(&parent.data, NodeData::Element { name, .. } if &*name.local == "picture")
    }) else {
        return;
    };
    for source in select(&picture, "source") {
        detach_node(&source);
    }
}

pub struct AssetRewriter<'r, 'l> {
    base_url: &'r Url,
    localizer: &'r mut AssetLocalizer<'l>,
}

impl<'r, 'l> AssetRewriter<'r, 'l> {
    pub fn new(base_url: &'r Url, localizer: &'r mut AssetLocalizer<'l>) -> Self {
        AssetRewriter {
            base_url,
            localizer,
        }
    }

    /// 解析引用；data URL 与无法解析的地址记为跳过
    fn resolve(&mut self, kind: AssetKind, reference: &str) -> Option<Url> {
        if is_data_url(reference) {
            self.localizer.skip(kind, reference, "data URI");
            return None;
        }

        let resolved = resolve_url(self.base_url, reference);
        if resolved.is_none() {
            self.localizer
                .skip(kind, reference, "reference could not be resolved");
        }
        resolved
    }

    /// `<img>`：下载后设置 `src` 并移除懒加载属性
    pub fn localize_images(&mut self, document: &Handle) {
        for (index, img) in select(document, "img").iter().enumerate() {
            let Some(reference) = image_source_candidate(img) else {
                if let Some(src) = get_node_attr(img, "src").filter(|src| is_data_url(src)) {
                    self.localizer.skip(AssetKind::Image, &src, "data URI");
                }
                continue;
            };
            let Some(url) = self.resolve(AssetKind::Image, &reference) else {
                continue;
            };

            let fallback = FallbackName::Positional {
                prefix: "image",
                index,
                extension: "jpg",
            };
            if let Some(local) = self.localizer.localize(AssetKind::Image, &url, fallback) {
                set_node_attr(img, "src", Some(local));
                for attr_name in STRIPPED_IMAGE_ATTRS {
                    remove_node_attr(img, attr_name);
                }
                drop_picture_sources(img);
            }
        }
    }

    /// 行内样式中的背景图；只替换地址本身，下载失败的地址保持原样
    pub fn localize_backgrounds(&mut self, document: &Handle) {
        for node in select(document, "[style]") {
            let Some(style) = get_node_attr(&node, "style") else {
                continue;
            };

            let mut rewritten = String::with_capacity(style.len());
            let mut last = 0;

            for css_url in find_background_urls(&style) {
                let reference = css_url.value.trim();
                if !is_localizable_css_url(reference) && !is_data_url(reference) {
                    continue;
                }
                let Some(url) = self.resolve(AssetKind::Background, reference) else {
                    continue;
                };

                if let Some(local) =
                    self.localizer
                        .localize(AssetKind::Background, &url, BACKGROUND_FALLBACK)
                {
                    rewritten.push_str(&style[last..css_url.range.start]);
                    rewritten.push_str(&local);
                    last = css_url.range.end;
                }
            }

            if last > 0 {
                rewritten.push_str(&style[last..]);
                set_node_attr(&node, "style", Some(rewritten));
            }
        }
    }

    /// SVG `<image>`：`href` 与 `xlink:href` 都改为本地文件名
    pub fn localize_vectors(&mut self, document: &Handle) {
        for image in select(document, "image") {
            let reference = get_node_attr(&image, "href")
                .filter(|href| !href.trim().is_empty())
                .or_else(|| get_node_attr(&image, "xlink:href"))
                .filter(|href| !href.trim().is_empty());
            let Some(reference) = reference else {
                continue;
            };
            let Some(url) = self.resolve(AssetKind::Vector, &reference) else {
                continue;
            };

            if let Some(local) = self
                .localizer
                .localize(AssetKind::Vector, &url, VECTOR_FALLBACK)
            {
                set_node_attr(&image, "href", Some(local.clone()));
                set_node_attr(&image, "xlink:href", Some(local));
            }
        }
    }

    /// 汇总样式表中的 `url(...)`；每段使用自己的基础URL
    pub fn localize_stylesheet_resources(&mut self, styles: &mut StyleSheetAggregate) {
        let localizer = &mut *self.localizer;

        for segment in styles.segments_mut() {
            let base_url = segment.base_url.clone();

            segment.css = replace_css_urls(&segment.css, |value| {
                let value = value.trim();
                if !is_localizable_css_url(value) {
                    if is_data_url(value) {
                        localizer.skip(AssetKind::CssResource, value, "data URI");
                    }
                    return None;
                }

                let Some(url) = resolve_url(&base_url, value) else {
                    localizer.skip(
                        AssetKind::CssResource,
                        value,
                        "reference could not be resolved",
                    );
                    return None;
                };
                localizer.localize(AssetKind::CssResource, &url, CSS_RESOURCE_FALLBACK)
            });
        }
    }

    /// `<script src>`：写出脚本文件并改写 `src`
    pub fn localize_scripts(&mut self, document: &Handle) {
        for (index, script) in select(document, "script[src]").iter().enumerate() {
            let Some(src) = get_node_attr(script, "src").filter(|src| !src.trim().is_empty())
            else {
                continue;
            };
            let Some(url) = self.resolve(AssetKind::Script, &src) else {
                continue;
            };

            let fallback = FallbackName::Positional {
                prefix: "script",
                index,
                extension: "js",
            };
            if let Some(local) = self.localizer.localize(AssetKind::Script, &url, fallback) {
                set_node_attr(script, "src", Some(local));
                // 内容已变为本地副本，原有的完整性校验不再适用
                remove_node_attr(script, "integrity");
            }
        }
    }

    /// `<link rel="icon" | "shortcut icon" | "apple-touch-icon">`
    pub fn localize_icons(&mut self, document: &Handle) {
        for link in select(document, "link[href]") {
            let rel = get_node_attr(&link, "rel").unwrap_or_default();
            let is_icon = parse_link_type(&rel)
                .iter()
                .any(|link_type| matches!(link_type, LinkType::Favicon | LinkType::AppleTouchIcon));
            if !is_icon {
                continue;
            }

            let Some(href) = get_node_attr(&link, "href").filter(|href| !href.trim().is_empty())
            else {
                continue;
            };
            let Some(url) = self.resolve(AssetKind::Icon, &href) else {
                continue;
            };

            if let Some(local) = self.localizer.localize(AssetKind::Icon, &url, ICON_FALLBACK) {
                set_node_attr(&link, "href", Some(local));
            }
        }
    }
}
