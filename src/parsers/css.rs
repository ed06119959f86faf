//! CSS 处理模块
//!
//! - **样式汇总**: [`StyleSheetAggregate`] 按顺序保存外部样式表与内联样式，
//!   每一段记住用于解析相对地址的基础URL
//! - **URL扫描与重写**: 找出 `url(...)` 引用并按位置替换，其余文本保持不变
//! - **格式化**: 基于 cssparser 的 token 遍历输出缩进、折行后的样式表

use std::ops::Range;
use std::sync::OnceLock;

use cssparser::{ParseError, Parser, ParserInput, Token};
use regex::Regex;

use crate::utils::url::Url;

/// 样式片段来源
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StyleOrigin {
    /// 外部样式表，值为下载后的最终地址
    External(Url),
    /// `<style>` 块
    Inline,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleSegment {
    pub origin: StyleOrigin,
    /// Base for relative `url(...)` references inside `css`
    pub base_url: Url,
    pub css: String,
}

/// 汇总后的样式表，写出为 `styles.css`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleSheetAggregate {
    segments: Vec<StyleSegment>,
}

impl StyleSheetAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_external(&mut self, sheet_url: Url, css: String) {
        self.segments.push(StyleSegment {
            origin: StyleOrigin::External(sheet_url.clone()),
            base_url: sheet_url,
            css,
        });
    }

    pub fn push_inline(&mut self, document_url: &Url, css: String) {
        self.segments.push(StyleSegment {
            origin: StyleOrigin::Inline,
            base_url: document_url.clone(),
            css,
        });
    }

    pub fn segments(&self) -> &[StyleSegment] {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut [StyleSegment] {
        &mut self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// 每一段后跟一个换行
    pub fn to_css(&self) -> String {
        let mut css = String::new();
        for segment in &self.segments {
            css.push_str(&segment.css);
            css.push('\n');
        }
        css
    }
}

/// 样式表中的一个 `url(...)` 引用
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CssUrl {
    /// Byte range of the referenced value, quotes excluded
    pub range: Range<usize>,
    pub value: String,
}

fn css_url_regex() -> &'static Regex {
    static CSS_URL_RE: OnceLock<Regex> = OnceLock::new();
    CSS_URL_RE.get_or_init(|| {
        Regex::new(r#"[uU][rR][lL]\(\s*(?:"([^"]*)"|'([^']*)'|([^)'"\s]*))\s*\)"#)
            .expect("valid url() pattern")
    })
}

/// 找出所有 `url(...)` 引用，按出现顺序返回
pub fn find_css_urls(css: &str) -> Vec<CssUrl> {
    css_url_regex()
        .captures_iter(css)
        .filter_map(|captures| {
            let value = captures
                .get(1)
                .or_else(|| captures.get(2))
                .or_else(|| captures.get(3))?;
            Some(CssUrl {
                range: value.range(),
                value: value.as_str().to_string(),
            })
        })
        .collect()
}

/// 判断 `url(...)` 的值是否需要下载
pub fn is_localizable_css_url(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.starts_with('#') && !crate::utils::url::is_data_url(value)
}

/// 按位置替换 `url(...)` 的值
///
/// `replacement` 返回 `None` 的引用保持原样；其余文本逐字节保留。
pub fn replace_css_urls<F>(css: &str, mut replacement: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut result = String::with_capacity(css.len());
    let mut last = 0;

    for css_url in find_css_urls(css) {
        if let Some(local) = replacement(&css_url.value) {
            result.push_str(&css[last..css_url.range.start]);
            result.push_str(&local);
            last = css_url.range.end;
        }
    }

    result.push_str(&css[last..]);
    result
}

/// 格式化参数
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CssFormat {
    pub indent_size: usize,
    pub wrap_line_length: usize,
}

impl Default for CssFormat {
    fn default() -> Self {
        CssFormat {
            indent_size: 2,
            wrap_line_length: 120,
        }
    }
}

/// 格式化样式表
///
/// `{` 后换行并增加缩进，`;` 结束一行，`}` 独占一行；
/// 其余 token 原样输出，连续空白合并为一个空格。
pub fn format_css(css: &str, format: &CssFormat) -> String {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut printer = CssPrinter {
        format: *format,
        out: String::new(),
        line: String::new(),
        pending_space: false,
    };

    match printer.walk(&mut parser, 0) {
        Ok(()) => {
            printer.flush(0);
            printer.out
        }
        Err(_) => css.to_string(),
    }
}

struct CssPrinter {
    format: CssFormat,
    out: String,
    line: String,
    pending_space: bool,
}

impl CssPrinter {
    fn walk<'i, 't>(
        &mut self,
        parser: &mut Parser<'i, 't>,
        depth: usize,
    ) -> Result<(), ParseError<'i, ()>> {
        loop {
            let token_offset = parser.position();
            let token = match parser.next_including_whitespace_and_comments() {
                Ok(token) => token.clone(),
                Err(_) => break,
            };

            match token {
                Token::WhiteSpace(_) => self.pending_space = true,
                Token::Semicolon => {
                    self.pending_space = false;
                    self.emit(";", depth);
                    self.flush(depth);
                }
                Token::CurlyBracketBlock => {
                    self.pending_space = !self.line.is_empty();
                    self.emit("{", depth);
                    self.flush(depth);
                    parser.parse_nested_block(|parser| self.walk(parser, depth + 1))?;
                    self.flush(depth + 1);
                    self.emit("}", depth);
                    self.flush(depth);
                }
                Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock => {
                    parser.parse_nested_block(|parser| {
                        while parser.next_including_whitespace_and_comments().is_ok() {}
                        Ok::<(), ParseError<'i, ()>>(())
                    })?;
                    let text = collapse_whitespace(parser.slice_from(token_offset));
                    self.emit(&text, depth);
                }
                _ => {
                    let text = parser.slice_from(token_offset);
                    self.emit(text, depth);
                }
            }
        }

        Ok(())
    }

    fn emit(&mut self, text: &str, depth: usize) {
        let indent = depth * self.format.indent_size;

        if self.line.is_empty() {
            self.line.push_str(text);
        } else if self.pending_space {
            if indent + self.line.len() + 1 + text.len() > self.format.wrap_line_length {
                self.flush(depth);
                // 折行后的续行多缩进一级
                self.line
                    .push_str(&" ".repeat(self.format.indent_size));
                self.line.push_str(text);
            } else {
                self.line.push(' ');
                self.line.push_str(text);
            }
        } else {
            self.line.push_str(text);
        }

        self.pending_space = false;
    }

    fn flush(&mut self, depth: usize) {
        if !self.line.trim().is_empty() {
            self.out
                .push_str(&" ".repeat(depth * self.format.indent_size));
            self.out.push_str(&self.line);
            self.out.push('\n');
        }
        self.line.clear();
        self.pending_space = false;
    }
}

/// 合并引号外的连续空白
fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut in_whitespace = false;

    for c in text.chars() {
        match quote {
            Some(q) => {
                result.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c.is_whitespace() => {
                if !in_whitespace {
                    result.push(' ');
                }
                in_whitespace = true;
                continue;
            }
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                result.push(c);
            }
        }
        in_whitespace = false;
    }

    result
}
