//! Page footer templates

use crate::error::TemplateError;
use std::fmt::Write;
use std::str::FromStr;

pub const DEFAULT_FOOTER: &str = "Page {index} / {total}";

/// Tokens recognised inside `{...}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterToken {
    /// 1-based page number (`{index}` or `{page}`)
    PageNumber,
    /// Total page count (`{total}`)
    PageCount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FooterSegment {
    Literal(String),
    Token(FooterToken),
}

/// Parsed footer template, rendered once per page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterTemplate {
    segments: Vec<FooterSegment>,
}

impl Default for FooterTemplate {
    fn default() -> Self {
        Self {
            segments: vec![
                FooterSegment::Literal("Page ".to_string()),
                FooterSegment::Token(FooterToken::PageNumber),
                FooterSegment::Literal(" / ".to_string()),
                FooterSegment::Token(FooterToken::PageCount),
            ],
        }
    }
}

impl FooterTemplate {
    pub fn parse(input: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut buffer = String::new();
        let mut chars = input.char_indices().peekable();

        while let Some((pos, ch)) = chars.next() {
            match ch {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    buffer.push('{');
                    chars.next();
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    buffer.push('}');
                    chars.next();
                }
                '}' => return Err(TemplateError::UnmatchedClose(pos)),
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::Unterminated(pos));
                    }

                    let token = match name.trim() {
                        "index" | "page" => FooterToken::PageNumber,
                        "total" => FooterToken::PageCount,
                        _ => return Err(TemplateError::UnknownToken(name)),
                    };
                    flush(&mut buffer, &mut segments);
                    segments.push(FooterSegment::Token(token));
                }
                other => buffer.push(other),
            }
        }
        flush(&mut buffer, &mut segments);

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[FooterSegment] {
        &self.segments
    }

    /// Render the footer text for page `index` of `total`
    pub fn render(&self, index: usize, total: usize) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                FooterSegment::Literal(text) => out.push_str(text),
                FooterSegment::Token(FooterToken::PageNumber) => {
                    let _ = write!(out, "{}", index);
                }
                FooterSegment::Token(FooterToken::PageCount) => {
                    let _ = write!(out, "{}", total);
                }
            }
        }
        out
    }
}

impl FromStr for FooterTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn flush(buffer: &mut String, segments: &mut Vec<FooterSegment>) {
    if !buffer.is_empty() {
        segments.push(FooterSegment::Literal(std::mem::take(buffer)));
    }
}
