#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Indentation-driven parser for IOS-style configuration text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a statement inside its owning [`ConfigDocument`].
pub type StatementId = usize;

/// What the parser does with comment lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentPolicy {
    /// Comment lines become ordinary statements.
    #[default]
    Keep,
    /// Comment lines are dropped before tree construction.
    Skip,
}

/// Options controlling how raw text is turned into statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Comment handling.
    comments:       CommentPolicy,
    /// Leading character that marks a comment line.
    comment_prefix: char,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            comments:       CommentPolicy::Keep,
            comment_prefix: '!',
        }
    }
}

impl ParseOptions {
    /// Returns a copy with the given comment policy.
    pub fn with_comments(mut self, comments: CommentPolicy) -> Self {
        self.comments = comments;
        self
    }

    /// Returns the comment policy.
    pub fn comments(&self) -> CommentPolicy {
        self.comments
    }

    /// Whether `text` (already trimmed) should be dropped.
    fn skips(&self, text: &str) -> bool {
        self.comments == CommentPolicy::Skip && text.starts_with(self.comment_prefix)
    }
}

/// Arena slot backing a [`Statement`].
#[derive(Debug, Clone)]
struct Node {
    /// Trimmed line text.
    text:     String,
    /// Width of the leading whitespace in the source line.
    indent:   usize,
    /// Distance from the top level.
    depth:    usize,
    /// Enclosing statement, if any.
    parent:   Option<StatementId>,
    /// Immediate children in source order.
    children: Vec<StatementId>,
}

/// The parsed statement tree of one device configuration.
///
/// Statements are stored in source order; the tree is fixed once `parse`
/// returns.
#[derive(Debug, Clone, Default)]
pub struct ConfigDocument {
    /// Every statement, in source order.
    nodes: Vec<Node>,
    /// Depth-0 statements, in source order.
    roots: Vec<StatementId>,
}

impl ConfigDocument {
    /// Parses `source` with default options.
    pub fn parse(source: &str) -> Self {
        Self::parse_with(source, &ParseOptions::default())
    }

    /// Parses `source`.
    ///
    /// Each line becomes a child of the closest preceding line with strictly
    /// smaller indentation. Parsing never fails: a line indented deeper than
    /// its predecessor's children simply attaches to the nearest shallower
    /// line.
    pub fn parse_with(source: &str, options: &ParseOptions) -> Self {
        let mut doc = Self::default();
        let mut open: Vec<StatementId> = Vec::new();

        for line in source.lines() {
            let text = line.trim();
            if text.is_empty() || options.skips(text) {
                continue;
            }

            let indent = line.len() - line.trim_start().len();
            while let Some(&top) = open.last() {
                if doc.nodes[top].indent < indent {
                    break;
                }
                open.pop();
            }

            let parent = open.last().copied();
            let depth = parent.map_or(0, |p| doc.nodes[p].depth + 1);
            let id = doc.nodes.len();
            doc.nodes.push(Node {
                text: text.to_string(),
                indent,
                depth,
                parent,
                children: Vec::new(),
            });

            match parent {
                Some(p) => doc.nodes[p].children.push(id),
                None => doc.roots.push(id),
            }
            open.push(id);
        }

        doc
    }

    /// Top-level statements in source order.
    pub fn top_level(&self) -> impl Iterator<Item = Statement<'_>> + '_ {
        self.roots.iter().map(move |&id| Statement { doc: self, id })
    }

    /// Total number of statements at every depth.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document holds no statements.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A borrowed handle to one statement of a [`ConfigDocument`].
#[derive(Clone, Copy)]
pub struct Statement<'a> {
    /// Owning document.
    doc: &'a ConfigDocument,
    /// Arena index.
    id:  StatementId,
}

impl<'a> Statement<'a> {
    /// The arena slot this handle refers to.
    fn node(&self) -> &'a Node {
        &self.doc.nodes[self.id]
    }

    /// Trimmed line text.
    pub fn text(&self) -> &'a str {
        self.node().text.as_str()
    }

    /// Depth in the tree, zero for top-level statements.
    pub fn depth(&self) -> usize {
        self.node().depth
    }

    /// Enclosing statement.
    pub fn parent(&self) -> Option<Statement<'a>> {
        self.node().parent.map(|id| Statement { doc: self.doc, id })
    }

    /// Immediate children in source order.
    pub fn children(&self) -> impl Iterator<Item = Statement<'a>> + use<'a> {
        let doc = self.doc;
        self.node()
            .children
            .iter()
            .map(move |&id| Statement { doc, id })
    }
}

impl fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("id", &self.id)
            .field("depth", &self.depth())
            .field("text", &self.text())
            .finish()
    }
}

impl PartialEq for Statement<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for Statement<'_> {}
