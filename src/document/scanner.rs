//! Top-level HTML fragment scanner
//!
//! Finds the byte spans of top-level nodes without building a tree, so
//! that every page can be emitted as a verbatim slice of the source.
//! The scanner is lenient: it never fails, mismatched end tags pop to the
//! nearest matching open element, and unterminated elements run to the end
//! of the input.

use smallvec::SmallVec;
use std::ops::Range;

/// Elements that never have content
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is not markup
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Tags whose start implicitly closes an open `<p>`
const CLOSES_PARAGRAPH: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "table", "pre", "hr",
    "section", "blockquote",
];

/// A parsed attribute. Values are kept raw (entities are not decoded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

/// A parsed start tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// Lowercase tag name
    pub name: String,
    pub attrs: SmallVec<[Attribute; 4]>,
    pub self_closing: bool,
    /// Byte offset just past the closing `>`
    pub end: usize,
}

impl StartTag {
    /// Get an attribute value by (lowercase) name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Check whether the `class` attribute lists `class`
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|v| v.split_ascii_whitespace().any(|c| c.eq_ignore_ascii_case(class)))
            .unwrap_or(false)
    }
}

/// What a top-level node is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        tag: StartTag,
        /// Content between the start and end tags
        inner: Range<usize>,
    },
    Text,
    Comment {
        body: Range<usize>,
    },
}

/// A top-level node with its source span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub span: Range<usize>,
    pub kind: NodeKind,
}

impl Node {
    pub fn tag(&self) -> Option<&StartTag> {
        match &self.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }
}

/// Scan a fragment into its top-level nodes
pub fn scan(src: &str) -> Vec<Node> {
    Scanner::new(src).run()
}

struct OpenTop {
    start: usize,
    tag: StartTag,
}

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    nodes: Vec<Node>,
    /// Open element names, outermost first
    stack: SmallVec<[String; 8]>,
    top: Option<OpenTop>,
    text_start: Option<usize>,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            nodes: Vec::new(),
            stack: SmallVec::new(),
            top: None,
            text_start: Some(0),
        }
    }

    fn run(mut self) -> Vec<Node> {
        let len = self.bytes.len();
        let mut pos = 0;

        while pos < len {
            let Some(rel) = self.src[pos..].find('<') else {
                break;
            };
            let lt = pos + rel;
            let rest = &self.bytes[lt..];

            if rest.starts_with(b"<!--") {
                let end = find_from(self.src, lt + 4, "-->").map_or(len, |i| i + 3);
                if self.stack.is_empty() {
                    self.flush_text(lt);
                    let body_end = if end == len && !self.src.ends_with("-->") {
                        len
                    } else {
                        end - 3
                    };
                    self.nodes.push(Node {
                        span: lt..end,
                        kind: NodeKind::Comment {
                            body: (lt + 4).min(body_end)..body_end,
                        },
                    });
                    self.text_start = Some(end);
                }
                pos = end;
            } else if rest.starts_with(b"<!") || rest.starts_with(b"<?") {
                let end = find_from(self.src, lt, ">").map_or(len, |i| i + 1);
                if self.stack.is_empty() {
                    self.flush_text(lt);
                    self.text_start = Some(end);
                }
                pos = end;
            } else if rest.starts_with(b"</") {
                pos = self.end_tag(lt);
            } else if rest.get(1).is_some_and(|b| b.is_ascii_alphabetic()) {
                pos = self.start_tag(lt);
            } else {
                // Literal `<` in text
                pos = lt + 1;
            }
        }

        if let Some(open) = self.top.take() {
            self.push_element(open, len, len);
        } else {
            self.flush_text(len);
        }

        self.nodes
    }

    fn start_tag(&mut self, lt: usize) -> usize {
        let tag = parse_start_tag(self.src, lt);
        let end = tag.end;

        // `<p>` without `</p>` followed by another block
        if self.stack.len() == 1
            && self.stack[0] == "p"
            && CLOSES_PARAGRAPH.contains(&tag.name.as_str())
        {
            self.stack.clear();
            if let Some(open) = self.top.take() {
                let close = trim_end(self.src, lt);
                self.push_element(open, close, close);
            }
        }

        if VOID_ELEMENTS.contains(&tag.name.as_str()) || tag.self_closing {
            if self.stack.is_empty() {
                self.flush_text(lt);
                self.nodes.push(Node {
                    span: lt..end,
                    kind: NodeKind::Element { tag, inner: end..end },
                });
                self.text_start = Some(end);
            }
            return end;
        }

        if RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
            let closing = format!("</{}", tag.name);
            let (inner_end, close_end) = match find_from_ignore_case(self.src, end, &closing) {
                Some(i) => (i, find_from(self.src, i, ">").map_or(self.bytes.len(), |j| j + 1)),
                None => (self.bytes.len(), self.bytes.len()),
            };
            if self.stack.is_empty() {
                self.flush_text(lt);
                self.nodes.push(Node {
                    span: lt..close_end,
                    kind: NodeKind::Element {
                        tag,
                        inner: end..inner_end,
                    },
                });
                self.text_start = Some(close_end);
            }
            return close_end;
        }

        if self.stack.is_empty() {
            self.flush_text(lt);
            self.top = Some(OpenTop {
                start: lt,
                tag: tag.clone(),
            });
        }
        self.stack.push(tag.name);
        end
    }

    fn end_tag(&mut self, lt: usize) -> usize {
        let len = self.bytes.len();
        let name_start = lt + 2;
        let mut name_end = name_start;
        while name_end < len && !self.bytes[name_end].is_ascii_whitespace() && self.bytes[name_end] != b'>'
        {
            name_end += 1;
        }
        let name = self.src[name_start..name_end].to_ascii_lowercase();
        let end = find_from(self.src, name_end, ">").map_or(len, |i| i + 1);

        if let Some(idx) = self.stack.iter().rposition(|open| *open == name) {
            self.stack.truncate(idx);
            if self.stack.is_empty() {
                if let Some(open) = self.top.take() {
                    self.push_element(open, lt, end);
                }
                self.text_start = Some(end);
            }
        } else if self.stack.is_empty() {
            // Stray end tag at top level: not content
            self.flush_text(lt);
            self.text_start = Some(end);
        }
        end
    }

    fn push_element(&mut self, open: OpenTop, inner_end: usize, end: usize) {
        let inner = open.tag.end.min(inner_end)..inner_end;
        self.nodes.push(Node {
            span: open.start..end,
            kind: NodeKind::Element {
                tag: open.tag,
                inner,
            },
        });
    }

    fn flush_text(&mut self, end: usize) {
        let Some(start) = self.text_start.take() else {
            return;
        };
        if start >= end {
            return;
        }
        let slice = &self.src[start..end];
        let trimmed_start = slice.trim_start();
        if trimmed_start.is_empty() {
            return;
        }
        let lead = slice.len() - trimmed_start.len();
        let body = trimmed_start.trim_end();
        let span = start + lead..start + lead + body.len();
        self.nodes.push(Node {
            span,
            kind: NodeKind::Text,
        });
    }
}

/// Parse the start tag beginning at `lt` (which points at `<`)
fn parse_start_tag(src: &str, lt: usize) -> StartTag {
    let bytes = src.as_bytes();
    let len = bytes.len();
    let mut i = lt + 1;

    let name_start = i;
    while i < len && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-' || bytes[i] == b':') {
        i += 1;
    }
    let name = src[name_start..i].to_ascii_lowercase();

    let mut attrs = SmallVec::new();
    let mut self_closing = false;

    loop {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= len {
            break;
        }
        match bytes[i] {
            b'>' => {
                i += 1;
                break;
            }
            b'/' => {
                i += 1;
                if i < len && bytes[i] == b'>' {
                    self_closing = true;
                    i += 1;
                    break;
                }
                continue;
            }
            _ => {}
        }

        let attr_start = i;
        while i < len && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        if i == attr_start {
            // Lone `=` or similar junk
            i += 1;
            continue;
        }
        let attr_name = src[attr_start..i].to_ascii_lowercase();

        let mut j = i;
        while j < len && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let mut value = None;
        if j < len && bytes[j] == b'=' {
            j += 1;
            while j < len && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < len && (bytes[j] == b'"' || bytes[j] == b'\'') {
                let quote = bytes[j];
                let value_start = j + 1;
                let mut k = value_start;
                while k < len && bytes[k] != quote {
                    k += 1;
                }
                value = Some(src[value_start..k].to_string());
                i = (k + 1).min(len);
            } else {
                let value_start = j;
                let mut k = j;
                while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                    k += 1;
                }
                value = Some(src[value_start..k].to_string());
                i = k;
            }
        }

        attrs.push(Attribute {
            name: attr_name,
            value,
        });
    }

    StartTag {
        name,
        attrs,
        self_closing,
        end: i.min(len),
    }
}

fn find_from(src: &str, from: usize, needle: &str) -> Option<usize> {
    src.get(from..)?.find(needle).map(|i| from + i)
}

fn find_from_ignore_case(src: &str, from: usize, needle: &str) -> Option<usize> {
    let hay = src.as_bytes().get(from..)?;
    let needle = needle.as_bytes();
    hay.windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
        .map(|i| from + i)
}

fn trim_end(src: &str, end: usize) -> usize {
    src[..end].trim_end().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans<'a>(src: &'a str, nodes: &[Node]) -> Vec<&'a str> {
        nodes.iter().map(|n| &src[n.span.clone()]).collect()
    }

    #[test]
    fn test_top_level_elements() {
        let src = "<p>One</p>\n<div><p>Two</p><p>Three</p></div>\n<h2>Four</h2>";
        let nodes = scan(src);
        assert_eq!(
            spans(src, &nodes),
            vec!["<p>One</p>", "<div><p>Two</p><p>Three</p></div>", "<h2>Four</h2>"]
        );
        assert_eq!(nodes[1].tag().map(|t| t.name.as_str()), Some("div"));
    }

    #[test]
    fn test_text_and_comments() {
        let src = "  Intro text <!-- note --> <b>bold</b> tail  ";
        let nodes = scan(src);
        assert_eq!(
            spans(src, &nodes),
            vec!["Intro text", "<!-- note -->", "<b>bold</b>", "tail"]
        );
        match &nodes[1].kind {
            NodeKind::Comment { body } => assert_eq!(&src[body.clone()], " note "),
            other => panic!("expected comment, got {:?}", other),
        }
    }

    #[test]
    fn test_void_and_self_closing() {
        let src = "<img src=\"a.png\"><hr/><br><div class=\"x\"/>";
        let nodes = scan(src);
        assert_eq!(nodes.len(), 4);
        assert!(nodes[3].tag().unwrap().self_closing);
    }

    #[test]
    fn test_quoted_gt_in_attribute() {
        let src = "<p title=\"a > b\" data-x='1>2'>Text</p><p>Next</p>";
        let nodes = scan(src);
        assert_eq!(spans(src, &nodes), vec!["<p title=\"a > b\" data-x='1>2'>Text</p>", "<p>Next</p>"]);
        let tag = nodes[0].tag().unwrap();
        assert_eq!(tag.attr("title"), Some("a > b"));
        assert_eq!(tag.attr("data-x"), Some("1>2"));
    }

    #[test]
    fn test_raw_text_elements() {
        let src = "<style>p > a { color: red } </p></style><p>After</p>";
        let nodes = scan(src);
        assert_eq!(nodes.len(), 2);
        assert_eq!(&src[nodes[1].span.clone()], "<p>After</p>");
    }

    #[test]
    fn test_mismatched_and_unterminated() {
        let src = "<div><span>open</div><p>tail";
        let nodes = scan(src);
        assert_eq!(spans(src, &nodes), vec!["<div><span>open</div>", "<p>tail"]);
    }

    #[test]
    fn test_implicit_paragraph_close() {
        let src = "<p>first\n<p>second</p>";
        let nodes = scan(src);
        assert_eq!(spans(src, &nodes), vec!["<p>first", "<p>second</p>"]);
    }

    #[test]
    fn test_stray_end_tag_ignored() {
        let src = "</div><p>a</p>";
        let nodes = scan(src);
        assert_eq!(spans(src, &nodes), vec!["<p>a</p>"]);
    }

    #[test]
    fn test_classes_and_attrs() {
        let src = "<div class=\"foo Page-Break\" data-page-break></div>";
        let nodes = scan(src);
        let tag = nodes[0].tag().unwrap();
        assert!(tag.has_class("page-break"));
        assert!(tag.has_attr("data-page-break"));
        assert_eq!(tag.attr("data-page-break"), Some(""));
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(scan("").is_empty());
        assert!(scan(" \n\t ").is_empty());
    }

    #[test]
    fn test_multibyte_text() {
        let src = "<p>Récépissé « été »</p> déjà";
        let nodes = scan(src);
        assert_eq!(spans(src, &nodes), vec!["<p>Récépissé « été »</p>", "déjà"]);
    }
}
