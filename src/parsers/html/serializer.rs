//! HTML 序列化与格式化
//!
//! `serialize_document` 输出紧凑的 HTML；`beautify_html` 输出带缩进、按列宽折行的 HTML。
//! 格式化只在块级结构之间插入换行，`<pre>`、`<textarea>`、`<script>`、`<style>`、
//! `<template>` 的内容保持原样。

use std::io;

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

/// 格式化参数
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HtmlFormat {
    pub indent_size: usize,
    pub wrap_line_length: usize,
}

impl Default for HtmlFormat {
    fn default() -> Self {
        HtmlFormat {
            indent_size: 2,
            wrap_line_length: 120,
        }
    }
}

/// 内容必须原样输出的元素
const VERBATIM_ELEMENTS: &[&str] = &["pre", "textarea", "script", "style", "template"];

/// 独占一行的元素
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "audio", "base", "blockquote", "body", "canvas", "dd",
    "details", "dialog", "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form",
    "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html", "iframe", "li",
    "link", "main", "menu", "meta", "nav", "noscript", "ol", "option", "p", "picture", "pre",
    "script", "section", "select", "source", "style", "summary", "table", "tbody", "td",
    "template", "textarea", "tfoot", "th", "thead", "title", "tr", "ul", "video",
];

/// 序列化文档
pub fn serialize_document(dom: &RcDom) -> io::Result<String> {
    let mut buf: Vec<u8> = Vec::new();
    let serializable = SerializableHandle::from(dom.document.clone());
    serialize(&mut buf, &serializable, SerializeOpts::default())?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// 序列化单个节点（包括节点自身）
fn serialize_node(node: &Handle) -> io::Result<String> {
    let mut buf: Vec<u8> = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };
    serialize(&mut buf, &SerializableHandle::from(node.clone()), opts)?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// 格式化文档
pub fn beautify_html(dom: &RcDom, format: &HtmlFormat) -> io::Result<String> {
    let mut printer = PrettyPrinter {
        format: *format,
        out: String::new(),
    };

    for child in dom.document.children.borrow().iter() {
        printer.write_node(child, 0)?;
    }

    Ok(printer.out)
}

struct PrettyPrinter {
    format: HtmlFormat,
    out: String,
}

impl PrettyPrinter {
    fn indent(&self, depth: usize) -> String {
        " ".repeat(depth * self.format.indent_size)
    }

    fn push_line(&mut self, depth: usize, line: &str) {
        let indent = self.indent(depth);
        self.out.push_str(&indent);
        self.out.push_str(line);
        self.out.push('\n');
    }

    fn write_node(&mut self, node: &Handle, depth: usize) -> io::Result<()> {
        match &node.data {
            NodeData::Doctype { name, .. } => {
                self.push_line(depth, &format!("<!DOCTYPE {name}>"));
            }
            NodeData::Comment { contents } => {
                self.push_line(depth, &format!("<!--{contents}-->"));
            }
            NodeData::Text { contents } => {
                let text = escape_text(&contents.borrow());
                self.write_wrapped(depth, &text);
            }
            NodeData::Element { name, .. } => {
                let tag = name.local.as_ref();

                if VERBATIM_ELEMENTS.contains(&tag) {
                    let html = serialize_node(node)?;
                    self.push_line(depth, &html);
                } else if !has_block_content(node) {
                    let html = serialize_node(node)?;
                    self.write_wrapped(depth, &html);
                } else {
                    self.push_line(depth, &open_tag(node));
                    for child in node.children.borrow().iter() {
                        self.write_node(child, depth + 1)?;
                    }
                    self.push_line(depth, &format!("</{}>", qualified_tag_name(node)));
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// 在标签之外的空白处折行；多个连续空白合并为一个空格
    fn write_wrapped(&mut self, depth: usize, html: &str) {
        let indent = self.indent(depth);
        let mut line = String::new();

        for word in split_outside_tags(html) {
            if !line.is_empty()
                && indent.len() + line.len() + 1 + word.len() > self.format.wrap_line_length
            {
                self.push_line(depth, &line);
                line.clear();
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }

        if !line.is_empty() {
            self.push_line(depth, &line);
        }
    }
}

/// 子节点中有块级元素或注释，或者更深处有必须原样输出的元素
///
/// 行内元素整体折行时会合并空白，因此 `<span><pre>` 这类嵌套也要走逐层输出。
fn has_block_content(node: &Handle) -> bool {
    node.children.borrow().iter().any(|child| match &child.data {
        NodeData::Element { name, .. } => {
            BLOCK_ELEMENTS.contains(&name.local.as_ref()) || contains_verbatim(child)
        }
        NodeData::Comment { .. } => true,
        _ => false,
    })
}

fn contains_verbatim(node: &Handle) -> bool {
    node.children.borrow().iter().any(|child| match &child.data {
        NodeData::Element { name, .. } => {
            VERBATIM_ELEMENTS.contains(&name.local.as_ref()) || contains_verbatim(child)
        }
        _ => false,
    })
}

fn qualified_tag_name(node: &Handle) -> String {
    match &node.data {
        NodeData::Element { name, .. } => match &name.prefix {
            Some(prefix) => format!("{}:{}", prefix, name.local),
            None => name.local.to_string(),
        },
        _ => String::new(),
    }
}

fn open_tag(node: &Handle) -> String {
    let mut tag = format!("<{}", qualified_tag_name(node));

    if let NodeData::Element { attrs, .. } = &node.data {
        for attr in attrs.borrow().iter() {
            tag.push(' ');
            if let Some(prefix) = &attr.name.prefix {
                tag.push_str(prefix);
                tag.push(':');
            }
            tag.push_str(&attr.name.local);
            tag.push_str("=\"");
            tag.push_str(&escape_attr(&attr.value));
            tag.push('"');
        }
    }

    tag.push('>');
    tag
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('"', "&quot;")
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// 按标签外的空白切分，标签内部（包括带引号的属性值）不切分
fn split_outside_tags(html: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_tag = false;
    let mut quote: Option<char> = None;

    for (i, c) in html.char_indices() {
        if in_tag {
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None if c == '"' || c == '\'' => quote = Some(c),
                None if c == '>' => in_tag = false,
                None => {}
            }
        } else if c == '<' {
            in_tag = true;
        } else if c.is_ascii_whitespace() {
            if let Some(s) = start.take() {
                words.push(&html[s..i]);
            }
            continue;
        }

        if start.is_none() {
            start = Some(i);
        }
    }

    if let Some(s) = start {
        words.push(&html[s..]);
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::parse_html;

    #[test]
    fn test_serialize_document_round_trip() {
        let dom = parse_html("<!DOCTYPE html><html><head></head><body><p>a &amp; b</p></body></html>");
        assert_eq!(
            serialize_document(&dom).unwrap(),
            "<!DOCTYPE html><html><head></head><body><p>a &amp; b</p></body></html>"
        );
    }

    #[test]
    fn test_beautify_indents_block_structure() {
        let dom = parse_html(
            "<!DOCTYPE html><html><head><title>T</title></head><body><div><p>Hello <b>world</b></p></div></body></html>",
        );
        let html = beautify_html(&dom, &HtmlFormat::default()).unwrap();

        assert_eq!(
            html,
            "<!DOCTYPE html>\n\
             <html>\n  \
               <head>\n    \
                 <title>T</title>\n  \
               </head>\n  \
               <body>\n    \
                 <div>\n      \
                   <p>Hello <b>world</b></p>\n    \
                 </div>\n  \
               </body>\n\
             </html>\n"
        );
    }

    #[test]
    fn test_beautify_keeps_preformatted_content() {
        let dom = parse_html(
            "<html><head></head><body><div><pre>  line 1\n    line 2</pre><script>if (a < b) {\n  go();\n}</script></div></body></html>",
        );
        let html = beautify_html(&dom, &HtmlFormat::default()).unwrap();

        assert!(html.contains("<pre>  line 1\n    line 2</pre>"));
        assert!(html.contains("<script>if (a < b) {\n  go();\n}</script>"));
    }

    #[test]
    fn test_beautify_keeps_verbatim_content_nested_in_inline_elements() {
        let dom = parse_html(
            "<html><head></head><body>\
             <div><label>Msg <textarea>line1\n    line2</textarea></label></div>\
             <div><span><pre>a\n    b</pre></span></div>\
             <div><span><script>// note\nrun();</script></span></div>\
             </body></html>",
        );
        let html = beautify_html(&dom, &HtmlFormat::default()).unwrap();

        assert!(html.contains("<textarea>line1\n    line2</textarea>"));
        assert!(html.contains("<pre>a\n    b</pre>"));
        assert!(html.contains("<script>// note\nrun();</script>"));
        assert!(html.contains("<label>\n"));
    }

    #[test]
    fn test_beautify_wraps_long_text() {
        let words = vec!["lorem"; 40].join(" ");
        let dom = parse_html(&format!("<html><head></head><body><div><p>{words}</p></div></body></html>"));
        let format = HtmlFormat {
            indent_size: 2,
            wrap_line_length: 60,
        };
        let html = beautify_html(&dom, &format).unwrap();

        assert!(html.lines().all(|line| line.len() <= 60));
        assert_eq!(html.matches("lorem").count(), 40);
    }

    #[test]
    fn test_beautify_does_not_split_tags() {
        let dom = parse_html(
            r#"<html><head></head><body><p><a href="https://example.com/a b" title="one two three">link</a> text</p></body></html>"#,
        );
        let format = HtmlFormat {
            indent_size: 4,
            wrap_line_length: 40,
        };
        let html = beautify_html(&dom, &format).unwrap();

        assert!(html.contains(r#"<a href="https://example.com/a b" title="one two three">link</a>"#));
    }

    #[test]
    fn test_beautify_escapes_attributes_in_block_tags() {
        let dom = parse_html(r#"<html><head></head><body><div title="a &quot;b&quot; &amp; c"><p>x</p></div></body></html>"#);
        let html = beautify_html(&dom, &HtmlFormat::default()).unwrap();

        assert!(html.contains(r#"<div title="a &quot;b&quot; &amp; c">"#));
    }

    #[test]
    fn test_split_outside_tags() {
        assert_eq!(
            split_outside_tags("a  <b class=\"x y\">c</b>\n d"),
            vec!["a", "<b class=\"x y\">c</b>", "d"]
        );
    }
}
