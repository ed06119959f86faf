//! 样式汇总
//!
//! 收集文档中的外部样式表与 `<style>` 块，合并为一个 [`StyleSheetAggregate`]，
//! 并把文档改为只引用 `styles.css`。字体服务的样式表链接原样保留。

use markup5ever_rcdom::{Handle, RcDom};
use tracing::{debug, warn};

use crate::builders::bundle::STYLESHEET_FILE_NAME;
use crate::core::AssetKind;
use crate::parsers::css::StyleSheetAggregate;
use crate::utils::url::{is_data_url, resolve_url, Url};

use super::assets::AssetLocalizer;
use super::dom::{
    append_child, detach_node, get_head, get_node_attr, get_text_content, new_element, select,
};
use super::parser::{parse_link_type, LinkType};
use super::utils::is_font_service;

fn is_stylesheet_link(link: &Handle) -> bool {
    get_node_attr(link, "rel")
        .is_some_and(|rel| parse_link_type(&rel).contains(&LinkType::Stylesheet))
}

/// 带 `media` 条件的样式包进 `@media`，否则合并后会在所有媒体上生效
fn scope_to_media(css: String, media: Option<String>) -> String {
    match media.as_deref().map(str::trim) {
        Some(media) if !media.is_empty() && !media.eq_ignore_ascii_case("all") => {
            format!("@media {media} {{\n{css}\n}}")
        }
        _ => css,
    }
}

/// 汇总样式并改写文档中的样式引用
///
/// 外部样式表按文档顺序在前，`<style>` 块按文档顺序在后。
/// 下载失败的样式表只记录结果，不影响其余内容。
pub fn resolve_styles(
    dom: &RcDom,
    base_url: &Url,
    localizer: &mut AssetLocalizer,
) -> StyleSheetAggregate {
    let mut styles = StyleSheetAggregate::new();
    let mut font_links: Vec<Handle> = Vec::new();
    let mut external_sheets: Vec<(Url, Option<String>)> = Vec::new();

    for link in select(&dom.document, "link") {
        if !is_stylesheet_link(&link) {
            continue;
        }

        let href = get_node_attr(&link, "href").unwrap_or_default();
        if is_data_url(&href) {
            localizer.skip(AssetKind::Stylesheet, &href, "data URI");
            continue;
        }

        match resolve_url(base_url, &href) {
            Some(url) if is_font_service(&url) => font_links.push(link),
            Some(url) => {
                detach_node(&link);
                external_sheets.push((url, get_node_attr(&link, "media")));
            }
            None => {
                // 没有可用地址的样式表链接没有内容可以合并
                detach_node(&link);
                if !href.trim().is_empty() {
                    localizer.skip(
                        AssetKind::Stylesheet,
                        &href,
                        "reference could not be resolved",
                    );
                }
            }
        }
    }

    for (sheet_url, media) in &external_sheets {
        if let Some(asset) = localizer.fetch_stylesheet(sheet_url) {
            let css = scope_to_media(asset.text(), media.clone());
            styles.push_external(asset.final_url.clone(), css);
        }
    }

    for style in select(&dom.document, "style") {
        let css = scope_to_media(get_text_content(&style), get_node_attr(&style, "media"));
        styles.push_inline(base_url, css);
        detach_node(&style);
    }

    debug!(
        external = external_sheets.len(),
        segments = styles.segments().len(),
        fonts = font_links.len(),
        "styles collected"
    );

    match get_head(&dom.document) {
        Some(head) => {
            for font_link in &font_links {
                append_child(&head, font_link);
            }
            let stylesheet_link = new_element(
                dom,
                "link",
                &[("rel", "stylesheet"), ("href", STYLESHEET_FILE_NAME)],
            );
            append_child(&head, &stylesheet_link);
        }
        None => warn!("document has no <head>; {STYLESHEET_FILE_NAME} is not linked"),
    }

    styles
}
