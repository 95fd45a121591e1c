//! Manual page-break marker recognition

use crate::document::scanner::{self, Node, NodeKind, StartTag};

/// Classes that mark an element as a forced page break
const BREAK_CLASSES: &[&str] = &["page-break", "manual-page-break", "pagebreak"];

/// Comment bodies that mark a forced page break
const BREAK_COMMENTS: &[&str] = &["pagebreak", "page-break", "page break"];

/// Elements whose content is not markup
const OPAQUE: &[&str] = &["script", "style", "textarea", "title"];

/// How a top-level node forces a page break
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakMarker {
    /// Empty marker; dropped from the output
    Standalone,
    /// Break class or attribute on an element with content; the element
    /// starts the next section
    Before,
}

/// Classify a top-level node as a manual break marker
pub fn break_marker(src: &str, node: &Node) -> Option<BreakMarker> {
    match &node.kind {
        NodeKind::Comment { body } => {
            let body = src[body.clone()].trim();
            BREAK_COMMENTS
                .iter()
                .any(|m| body.eq_ignore_ascii_case(m))
                .then_some(BreakMarker::Standalone)
        }
        NodeKind::Element { tag, inner } => {
            let empty = src[inner.clone()].trim().is_empty();
            if has_break_flag(tag) {
                return Some(if empty {
                    BreakMarker::Standalone
                } else {
                    BreakMarker::Before
                });
            }
            (forces_break_after(tag) && empty).then_some(BreakMarker::Standalone)
        }
        NodeKind::Text => None,
    }
}

/// Check whether a top-level node is an empty marker that is dropped
pub fn is_break_marker(src: &str, node: &Node) -> bool {
    break_marker(src, node) == Some(BreakMarker::Standalone)
}

/// Check whether an element holds a break marker somewhere below top level.
/// Such markers cannot be honoured.
pub fn contains_nested_marker(src: &str, node: &Node) -> bool {
    let NodeKind::Element { tag, inner } = &node.kind else {
        return false;
    };
    if OPAQUE.contains(&tag.name.as_str()) {
        return false;
    }
    let inner = &src[inner.clone()];
    scanner::scan(inner).iter().any(|child| {
        break_marker(inner, child).is_some() || contains_nested_marker(inner, child)
    })
}

fn has_break_flag(tag: &StartTag) -> bool {
    tag.has_attr("data-page-break") || BREAK_CLASSES.iter().any(|c| tag.has_class(c))
}

fn forces_break_after(tag: &StartTag) -> bool {
    let Some(style) = tag.attr("style") else {
        return false;
    };
    style.split(';').any(|decl| {
        let Some((prop, value)) = decl.split_once(':') else {
            return false;
        };
        let prop = prop.trim();
        let value = value.trim();
        (prop.eq_ignore_ascii_case("page-break-after") && value.eq_ignore_ascii_case("always"))
            || (prop.eq_ignore_ascii_case("break-after") && value.eq_ignore_ascii_case("page"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::scanner::scan;

    fn first(src: &str) -> Option<BreakMarker> {
        let nodes = scan(src);
        break_marker(src, &nodes[0])
    }

    fn first_is_marker(src: &str) -> bool {
        first(src) == Some(BreakMarker::Standalone)
    }

    #[test]
    fn test_class_markers() {
        assert!(first_is_marker("<div class=\"page-break\"></div>"));
        assert!(first_is_marker("<hr class=\"pagebreak\">"));
        assert!(first_is_marker("<div class=\"a manual-page-break b\"></div>"));
        assert!(!first_is_marker("<div class=\"page-breaker\"></div>"));
    }

    #[test]
    fn test_flagged_element_with_content_breaks_before() {
        assert_eq!(
            first("<h2 class=\"page-break\">Chapitre 2</h2>"),
            Some(BreakMarker::Before)
        );
        assert_eq!(
            first("<section data-page-break><p>x</p></section>"),
            Some(BreakMarker::Before)
        );
        assert_eq!(first("<p>plain</p>"), None);
    }

    #[test]
    fn test_attribute_and_comment_markers() {
        assert!(first_is_marker("<span data-page-break></span>"));
        assert!(first_is_marker("<!-- PageBreak -->"));
        assert!(first_is_marker("<!--page break-->"));
        assert!(!first_is_marker("<!-- page 2 -->"));
    }

    #[test]
    fn test_style_markers_need_empty_content() {
        assert!(first_is_marker("<div style=\"page-break-after: always\"></div>"));
        assert!(first_is_marker("<div style=\"color:red; break-after:page\"> </div>"));
        assert_eq!(first("<div style=\"break-after: page\">Text</div>"), None);
        assert!(!first_is_marker("<div style=\"break-after: auto\"></div>"));
    }

    #[test]
    fn test_nested_marker_detection() {
        let src = "<div><div class=\"page-break\"></div></div>";
        let nodes = scan(src);
        assert!(!is_break_marker(src, &nodes[0]));
        assert!(contains_nested_marker(src, &nodes[0]));

        let src = "<div><section><!-- pagebreak --></section></div>";
        assert!(contains_nested_marker(src, &scan(src)[0]));
    }

    #[test]
    fn test_prose_mentioning_markers_is_not_nested_marker() {
        let src = "<p>Add class page-break or data-page-break to split.</p>";
        assert!(!contains_nested_marker(src, &scan(src)[0]));

        let src = "<script>const c = \"page-break\";</script>";
        assert!(!contains_nested_marker(src, &scan(src)[0]));
    }
}
