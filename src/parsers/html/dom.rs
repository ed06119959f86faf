use std::cell::RefCell;
use std::rc::Rc;

use html5ever::interface::{Attribute, QualName};
use html5ever::parse_document;
use html5ever::tendril::{format_tendril, StrTendril, TendrilSink};
use html5ever::tree_builder::create_element;
use html5ever::{namespace_url, ns, LocalName, Prefix};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};

/// 将 HTML 文本解析为 DOM
pub fn parse_html(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(html)
}

/// 查找指定路径的DOM节点
pub fn find_nodes(node: &Handle, node_names: Vec<&str>) -> Vec<Handle> {
    let mut found_nodes = Vec::new();
    let Some(&node_name) = node_names.first() else {
        return found_nodes;
    };

    if node_names.len() == 1 {
        if let NodeData::Element { ref name, .. } = node.data {
            if &*name.local == node_name {
                found_nodes.push(node.clone());
            }
        }

        for child_node in node.children.borrow().iter() {
            found_nodes.append(&mut find_nodes(child_node, node_names.clone()));
        }
    } else if let NodeData::Element { ref name, .. } = node.data {
        if &*name.local == node_name {
            let mut new_node_names = node_names;
            new_node_names.remove(0);
            found_nodes.append(&mut find_nodes(node, new_node_names));
        } else {
            for child_node in node.children.borrow().iter() {
                found_nodes.append(&mut find_nodes(child_node, node_names.clone()));
            }
        }
    } else {
        for child_node in node.children.borrow().iter() {
            found_nodes.append(&mut find_nodes(child_node, node_names.clone()));
        }
    }

    found_nodes
}

/// 获取文档的 `<head>` 元素
pub fn get_head(document: &Handle) -> Option<Handle> {
    find_nodes(document, vec!["html", "head"]).into_iter().next()
}

/// 属性名按限定名比较：`xlink:href` 与 `href` 是两个不同的属性
fn attr_name_matches(name: &QualName, attr_name: &str) -> bool {
    match &name.prefix {
        Some(prefix) => attr_name
            .split_once(':')
            .is_some_and(|(p, local)| &**prefix == p && &*name.local == local),
        None => &*name.local == attr_name,
    }
}

fn qualified_attr_name(attr_name: &str) -> QualName {
    match attr_name.split_once(':') {
        Some(("xlink", local)) => QualName::new(
            Some(Prefix::from("xlink")),
            ns!(xlink),
            LocalName::from(local),
        ),
        _ => QualName::new(None, ns!(), LocalName::from(attr_name)),
    }
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| attr_name_matches(&attr.name, attr_name))
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// 判断节点是否带有某个属性
pub fn has_node_attr(node: &Handle, attr_name: &str) -> bool {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .any(|attr| attr_name_matches(&attr.name, attr_name)),
        _ => false,
    }
}

/// 设置节点属性；`attr_value` 为 `None` 时删除该属性
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut i = 0;
        let mut found_existing_attr: bool = false;

        while i < attrs_mut.len() {
            if attr_name_matches(&attrs_mut[i].name, attr_name) {
                found_existing_attr = true;

                if let Some(attr_value) = attr_value.as_deref() {
                    attrs_mut[i].value.clear();
                    attrs_mut[i].value.push_slice(attr_value);
                } else {
                    // Remove attr completely if attr_value is not defined
                    attrs_mut.remove(i);
                    continue;
                }
            }

            i += 1;
        }

        if !found_existing_attr {
            // Add new attribute (since originally the target node didn't have it)
            if let Some(attr_value) = attr_value {
                attrs_mut.push(Attribute {
                    name: qualified_attr_name(attr_name),
                    value: format_tendril!("{}", attr_value),
                });
            }
        }
    };
}

/// 删除节点属性
pub fn remove_node_attr(node: &Handle, attr_name: &str) {
    set_node_attr(node, attr_name, None);
}

/// 获取节点内所有文本内容
pub fn get_text_content(node: &Handle) -> String {
    let mut text = String::new();
    collect_text(node, &mut text);
    text
}

fn collect_text(node: &Handle, text: &mut String) {
    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => text.push_str(&contents.borrow()),
            NodeData::Element { .. } => collect_text(child, text),
            _ => {}
        }
    }
}

/// 用单个文本节点替换节点的全部子节点
pub fn set_text_content(node: &Handle, text: &str) {
    for child in node.children.borrow().iter() {
        child.parent.set(None);
    }
    node.children.borrow_mut().clear();

    let text_node = Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from(text)),
    });
    append_child(node, &text_node);
}

/// 将子节点追加到父节点末尾（会先从原位置移除）
pub fn append_child(parent: &Handle, child: &Handle) {
    detach_node(child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child.clone());
}

/// 获取父节点
pub fn get_parent(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(|weak| weak.upgrade());
    node.parent.set(weak);
    parent
}

/// 将节点从其父节点中移除
pub fn detach_node(node: &Handle) {
    if let Some(parent) = node.parent.take().and_then(|weak| weak.upgrade()) {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
}

/// 创建一个 HTML 元素
pub fn new_element(dom: &RcDom, tag_name: &str, attrs: &[(&str, &str)]) -> Handle {
    create_element(
        dom,
        QualName::new(None, ns!(html), LocalName::from(tag_name)),
        attrs
            .iter()
            .map(|(name, value)| Attribute {
                name: qualified_attr_name(name),
                value: format_tendril!("{}", value),
            })
            .collect(),
    )
}

/// 属性选择条件
#[derive(Clone, Debug, PartialEq, Eq)]
enum AttrMatch {
    Exists,
    Equals(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
}

/// 简单的复合选择器：`tag`、`*`、`[attr]`、`[attr="v"]`、`[attr*="v"]`、
/// `[attr^="v"]`、`[attr$="v"]` 及其组合（如 `script[src*="facebook"]`）。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    attrs: Vec<(String, AttrMatch)>,
}

impl Selector {
    pub fn parse(input: &str) -> Option<Selector> {
        let input = input.trim();
        let tag_end = input.find('[').unwrap_or(input.len());
        let tag = &input[..tag_end];

        if !tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '*')
        {
            return None;
        }

        let tag = match tag {
            "" | "*" => None,
            name => Some(name.to_ascii_lowercase()),
        };

        let mut attrs = Vec::new();
        let mut rest = &input[tag_end..];

        while !rest.is_empty() {
            let body_end = rest.find(']')?;
            if !rest.starts_with('[') {
                return None;
            }
            attrs.push(parse_attr_selector(&rest[1..body_end])?);
            rest = &rest[body_end + 1..];
        }

        if tag.is_none() && attrs.is_empty() && !input.starts_with('*') {
            return None;
        }

        Some(Selector { tag, attrs })
    }

    pub fn matches(&self, node: &Handle) -> bool {
        let NodeData::Element { ref name, .. } = node.data else {
            return false;
        };

        if let Some(tag) = &self.tag {
            if !name.local.as_ref().eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        self.attrs.iter().all(|(attr_name, condition)| {
            let Some(value) = get_node_attr(node, attr_name) else {
                return false;
            };
            match condition {
                AttrMatch::Exists => true,
                AttrMatch::Equals(expected) => &value == expected,
                AttrMatch::Contains(needle) => value.contains(needle.as_str()),
                AttrMatch::StartsWith(prefix) => value.starts_with(prefix.as_str()),
                AttrMatch::EndsWith(suffix) => value.ends_with(suffix.as_str()),
            }
        })
    }
}

fn parse_attr_selector(body: &str) -> Option<(String, AttrMatch)> {
    let Some(eq) = body.find('=') else {
        let name = body.trim();
        return (!name.is_empty()).then(|| (name.to_string(), AttrMatch::Exists));
    };

    let (name_part, value_part) = (&body[..eq], &body[eq + 1..]);
    let value = value_part.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
        .to_string();

    let (name, condition) = if let Some(name) = name_part.strip_suffix('*') {
        (name, AttrMatch::Contains(value))
    } else if let Some(name) = name_part.strip_suffix('^') {
        (name, AttrMatch::StartsWith(value))
    } else if let Some(name) = name_part.strip_suffix('$') {
        (name, AttrMatch::EndsWith(value))
    } else {
        (name_part, AttrMatch::Equals(value))
    };

    let name = name.trim();
    (!name.is_empty()).then(|| (name.to_string(), condition))
}

/// 按文档顺序返回所有匹配选择器的后代节点
///
/// 无效选择器不匹配任何节点。
pub fn select(node: &Handle, selector: &str) -> Vec<Handle> {
    let mut found_nodes = Vec::new();

    if let Some(selector) = Selector::parse(selector) {
        select_into(node, &selector, &mut found_nodes);
    }

    found_nodes
}

fn select_into(node: &Handle, selector: &Selector, found_nodes: &mut Vec<Handle>) {
    for child in node.children.borrow().iter() {
        if selector.matches(child) {
            found_nodes.push(child.clone());
        }
        select_into(child, selector, found_nodes);
    }
}
