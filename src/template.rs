//! The wall page template.
//!
//! A tiny template language, just enough for one page:
//!
//! | Action | Meaning |
//! |---|---|
//! | `{{range}}` … `{{end}}` | repeat the enclosed block once per record |
//! | `{{.User}}`, `{{.Note}}` | the current record's field, HTML-escaped |
//!
//! Everything outside `{{ }}` is copied through untouched. Substituted
//! values are always escaped; there is no raw-output action.

use std::sync::LazyLock;

use crate::record::Record;

const SOURCE: &str = include_str!("wall.html");

/// The parsed wall page. Parsed once, on first use, and shared read-only.
pub static PAGE: LazyLock<Template> =
    LazyLock::new(|| Template::parse(SOURCE).expect("built-in wall template must parse"));

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unterminated action at byte {0}")]
    Unterminated(usize),

    #[error("unknown action `{action}` at byte {offset}")]
    UnknownAction { action: String, offset: usize },

    #[error("`{{{{{0}}}}}` outside `{{{{range}}}}`")]
    OutsideRange(String),

    #[error("nested `{{{{range}}}}` at byte {0}")]
    NestedRange(usize),

    #[error("`{{{{end}}}}` without `{{{{range}}}}` at byte {0}")]
    UnmatchedEnd(usize),

    #[error("`{{{{range}}}}` never closed")]
    UnclosedRange,
}

#[derive(Debug, PartialEq, Eq)]
enum Node {
    Text(String),
    User,
    Note,
    Range(Vec<Node>),
}

/// A parsed template.
#[derive(Debug, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(src: &str) -> Result<Self, TemplateError> {
        let mut top: Vec<Node> = Vec::new();
        let mut block: Option<Vec<Node>> = None;
        let mut rest = src;

        loop {
            let offset = src.len() - rest.len();
            let Some(open) = rest.find("{{") else {
                push_text(block.as_mut().unwrap_or(&mut top), rest);
                break;
            };
            push_text(block.as_mut().unwrap_or(&mut top), &rest[..open]);

            let after = &rest[open + 2..];
            let close = after.find("}}").ok_or(TemplateError::Unterminated(offset + open))?;
            let action = after[..close].trim();
            rest = &after[close + 2..];

            match action {
                "range" if block.is_some() => {
                    return Err(TemplateError::NestedRange(offset + open));
                }
                "range" => block = Some(Vec::new()),
                "end" => match block.take() {
                    Some(body) => top.push(Node::Range(body)),
                    None => return Err(TemplateError::UnmatchedEnd(offset + open)),
                },
                ".User" | ".Note" => {
                    let node = if action == ".User" { Node::User } else { Node::Note };
                    match block.as_mut() {
                        Some(nodes) => nodes.push(node),
                        None => return Err(TemplateError::OutsideRange(action.to_owned())),
                    }
                }
                other => {
                    return Err(TemplateError::UnknownAction {
                        action: other.to_owned(),
                        offset: offset + open,
                    });
                }
            }
        }

        if block.is_some() {
            return Err(TemplateError::UnclosedRange);
        }
        Ok(Self { nodes: top })
    }

    /// Renders `records`, in order. The same input always yields the same
    /// bytes.
    pub fn render(&self, records: &[Record]) -> String {
        let mut out = String::with_capacity(SOURCE.len() + records.len() * 128);
        for node in &self.nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Range(body) => {
                    for record in records {
                        render_record(&mut out, body, record);
                    }
                }
                // Rejected by `parse` outside a range.
                Node::User | Node::Note => {}
            }
        }
        out
    }
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if !text.is_empty() {
        nodes.push(Node::Text(text.to_owned()));
    }
}

fn render_record(out: &mut String, body: &[Node], record: &Record) {
    for node in body {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::User => escape_html(out, &record.user),
            Node::Note => escape_html(out, &record.note),
            Node::Range(_) => {}
        }
    }
}

/// Appends `s` to `out` with every markup-significant character replaced by
/// a character reference. NUL becomes U+FFFD.
pub fn escape_html(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            '\0' => out.push('\u{FFFD}'),
            c => out.push(c),
        }
    }
}
