//! HTML 文档元数据处理
//!
//! - 读取 `<base href>` 与 `<title>`
//! - 移除不应出现在静态副本中的节点（统计脚本、`<noscript>`、刷新与 robots meta、`<base>`）

use markup5ever_rcdom::{Handle, NodeData};
use tracing::debug;

use super::dom::{detach_node, find_nodes, get_node_attr, select};
use super::utils::is_tracker_script;

/// 获取文档的 base URL
///
/// 只有第一个带 `href` 的 `<base>` 标签有效。
pub fn get_base_url(handle: &Handle) -> Option<String> {
    select(handle, "base[href]")
        .first()
        .and_then(|base_node| get_node_attr(base_node, "href"))
        .filter(|href| !href.trim().is_empty())
}

/// 获取文档标题
pub fn get_title(node: &Handle) -> Option<String> {
    for title_node in find_nodes(node, vec!["html", "head", "title"]).iter() {
        for child_node in title_node.children.borrow().iter() {
            if let NodeData::Text { ref contents } = child_node.data {
                let title = contents.borrow().trim().to_string();
                if !title.is_empty() {
                    return Some(title);
                }
            }
        }
    }

    None
}

fn is_stripped_meta(meta: &Handle) -> bool {
    get_node_attr(meta, "http-equiv")
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("refresh"))
        || get_node_attr(meta, "name")
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("robots"))
}

/// 移除统计/社交脚本及其他会干扰离线浏览的节点，返回移除的节点数
///
/// 必须在资源处理之前调用，这样统计脚本永远不会被下载。
pub fn strip_for_snapshot(document: &Handle) -> usize {
    let mut removed = 0;

    for script in select(document, "script[src]") {
        let src = get_node_attr(&script, "src").unwrap_or_default();
        if is_tracker_script(&src) {
            debug!(src = %src, "removing tracker script");
            detach_node(&script);
            removed += 1;
        }
    }

    for meta in select(document, "meta") {
        if is_stripped_meta(&meta) {
            detach_node(&meta);
            removed += 1;
        }
    }

    for node in select(document, "noscript")
        .into_iter()
        .chain(select(document, "base"))
    {
        detach_node(&node);
        removed += 1;
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::parse_html;

    #[test]
    fn test_get_base_url() {
        let dom = parse_html(
            r#"<html><head><base target="_blank"><base href="https://cdn.example.com/site/"></head></html>"#,
        );
        assert_eq!(
            get_base_url(&dom.document).as_deref(),
            Some("https://cdn.example.com/site/")
        );

        let dom = parse_html("<html><head></head></html>");
        assert_eq!(get_base_url(&dom.document), None);
    }

    #[test]
    fn test_get_title() {
        let dom = parse_html("<html><head><title>  Example Domain </title></head></html>");
        assert_eq!(get_title(&dom.document).as_deref(), Some("Example Domain"));

        let dom = parse_html("<html><head><title></title></head></html>");
        assert_eq!(get_title(&dom.document), None);
    }

    #[test]
    fn test_strip_for_snapshot() {
        let dom = parse_html(
            r#"<html><head>
                <base href="https://example.com/">
                <meta http-equiv="refresh" content="5">
                <meta name="robots" content="noindex">
                <meta name="viewport" content="width=device-width">
                <script src="https://www.googletagmanager.com/gtag/js"></script>
                <script src="https://www.google-analytics.com/analytics.js"></script>
                <script src="https://connect.facebook.net/sdk.js"></script>
                <script src="/app.js"></script>
            </head><body><noscript><img src="pixel.gif"></noscript><p>hi</p></body></html>"#,
        );

        assert_eq!(strip_for_snapshot(&dom.document), 7);
        assert_eq!(select(&dom.document, "script").len(), 1);
        assert_eq!(select(&dom.document, "meta").len(), 1);
        assert!(select(&dom.document, "noscript").is_empty());
        assert!(select(&dom.document, "base").is_empty());
        assert_eq!(select(&dom.document, "p").len(), 1);
    }
}
