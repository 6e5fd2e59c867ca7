//! Source model for C# files, reduced to what using-directive organization
//! needs: using directives, namespace declarations, file-level attributes,
//! opaque type declarations and statements, each carrying its leading
//! trivia (comments, blank lines, preprocessor directives) and byte spans
//! into the original text.
//!
//! The model is deliberately splice-based: untouched items render back as
//! verbatim slices of the original source, so a parse/render round trip
//! with no edits reproduces the input byte-for-byte.

mod parse;
mod render;
mod scan;

pub use parse::parse;
pub use render::render;
pub use scan::{scan_directives, DirectiveToken};

use std::sync::Arc;

pub type NodeId = u32;

/// Half-open byte range into the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Preprocessor directive keyword, as found at the start of a `#` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    If,
    Elif,
    Else,
    Endif,
    /// `#region`, `#pragma`, `#define` and friends. Carried as trivia but
    /// irrelevant to the region tree.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriviaKind {
    Comment,
    BlankLine,
    Directive(DirectiveKind),
}

/// One piece of leading trivia: a comment, a blank line, or a preprocessor
/// directive line. The text is owned and includes the line terminator when
/// the trivia covers a whole line, so concatenating trivia and item bodies
/// reproduces the source.
#[derive(Debug, Clone)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: String,
}

impl Trivia {
    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            kind: TriviaKind::Comment,
            text: text.into(),
        }
    }

    pub fn blank_line() -> Self {
        Self {
            kind: TriviaKind::BlankLine,
            text: "\n".to_string(),
        }
    }

    pub fn is_directive(&self) -> bool {
        matches!(self.kind, TriviaKind::Directive(_))
    }

    pub fn is_comment(&self) -> bool {
        self.kind == TriviaKind::Comment
    }
}

/// Item body text: a slice of the original source for parsed nodes, or an
/// owned string for replacement nodes synthesized during a fix.
#[derive(Debug, Clone)]
pub enum SourceText {
    Slice(Span),
    Owned(String),
}

impl SourceText {
    pub fn resolve<'a>(&'a self, src: &'a str) -> &'a str {
        match self {
            SourceText::Slice(span) => &src[span.start..span.end],
            SourceText::Owned(text) => text,
        }
    }
}

/// A single `using` directive.
///
/// `name` is the target path with all interior whitespace removed, e.g.
/// `System.Collections.Generic.List<int>`. The directive's original full
/// line (indentation through line terminator) is `body`.
#[derive(Debug, Clone)]
pub struct UsingDirective {
    pub id: NodeId,
    pub span: Span,
    pub leading: Vec<Trivia>,
    pub body: SourceText,
    pub name: String,
    pub alias: Option<String>,
    pub is_static: bool,
    pub is_global: bool,
    pub trailing_comment: Option<String>,
}

impl UsingDirective {
    /// First dotted-path segment of the target, used for core-library
    /// classification. Lexical only.
    pub fn root_segment(&self) -> &str {
        let end = self
            .name
            .find(|c| c == '.' || c == '<' || c == '[')
            .unwrap_or(self.name.len());
        &self.name[..end]
    }
}

/// An item with no internal structure the organizer cares about.
#[derive(Debug, Clone)]
pub struct RawItem {
    pub id: NodeId,
    pub span: Span,
    pub leading: Vec<Trivia>,
    pub body: SourceText,
}

/// A `namespace N { ... }` block or file-scoped `namespace N;` declaration.
#[derive(Debug, Clone)]
pub struct NamespaceDecl {
    pub id: NodeId,
    pub span: Span,
    pub leading: Vec<Trivia>,
    pub name: String,
    /// Declaration text through the opening brace (block form) or through
    /// the semicolon line (file-scoped form).
    pub header: SourceText,
    pub items: Vec<Item>,
    /// Trivia between the last member and the closing brace.
    pub inner_trailing: Vec<Trivia>,
    /// Closing-brace line. `None` for file-scoped namespaces.
    pub footer: Option<SourceText>,
    pub file_scoped: bool,
}

#[derive(Debug, Clone)]
pub enum Item {
    Using(UsingDirective),
    Namespace(NamespaceDecl),
    /// File-level `[assembly: ...]` / `[module: ...]` attribute.
    Attribute(RawItem),
    /// Type declaration (class, struct, interface, enum, record, delegate),
    /// body opaque.
    Type(RawItem),
    /// Anything else at member level; top-level occurrences mark the file
    /// as containing executable statements.
    Statement(RawItem),
}

impl Item {
    pub fn id(&self) -> NodeId {
        match self {
            Item::Using(u) => u.id,
            Item::Namespace(n) => n.id,
            Item::Attribute(r) | Item::Type(r) | Item::Statement(r) => r.id,
        }
    }

    pub fn leading(&self) -> &[Trivia] {
        match self {
            Item::Using(u) => &u.leading,
            Item::Namespace(n) => &n.leading,
            Item::Attribute(r) | Item::Type(r) | Item::Statement(r) => &r.leading,
        }
    }

    pub fn leading_mut(&mut self) -> &mut Vec<Trivia> {
        match self {
            Item::Using(u) => &mut u.leading,
            Item::Namespace(n) => &mut n.leading,
            Item::Attribute(r) | Item::Type(r) | Item::Statement(r) => &mut r.leading,
        }
    }
}

/// A parsed source file. `src` is shared with rewritten copies so slice
/// bodies stay resolvable in the output tree.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub src: Arc<str>,
    pub items: Vec<Item>,
    pub trailing: Vec<Trivia>,
    next_id: NodeId,
}

impl SourceFile {
    pub(crate) fn new(src: Arc<str>, items: Vec<Item>, trailing: Vec<Trivia>, next_id: NodeId) -> Self {
        Self {
            src,
            items,
            trailing,
            next_id,
        }
    }

    pub fn node_count(&self) -> NodeId {
        self.next_id
    }

    /// All using directives in document order, with the enclosing namespace
    /// (if any) and its nesting depth.
    pub fn usings(&self) -> Vec<UsingEntry<'_>> {
        let mut out = Vec::new();
        collect_usings(&self.items, None, 0, &mut out);
        out
    }

    /// Top-level namespace declarations, in document order.
    pub fn top_level_namespaces(&self) -> Vec<&NamespaceDecl> {
        self.items
            .iter()
            .filter_map(|item| match item {
                Item::Namespace(ns) => Some(ns),
                _ => None,
            })
            .collect()
    }

    pub fn has_file_level_attributes(&self) -> bool {
        self.items.iter().any(|item| matches!(item, Item::Attribute(_)))
    }

    pub fn has_top_level_statements(&self) -> bool {
        self.items.iter().any(|item| matches!(item, Item::Statement(_)))
    }
}

/// A using directive paired with its lexical context.
#[derive(Debug, Clone, Copy)]
pub struct UsingEntry<'a> {
    pub using: &'a UsingDirective,
    /// Id of the enclosing namespace declaration, `None` at top level.
    pub scope: Option<NodeId>,
    /// Namespace nesting depth: 0 at top level.
    pub depth: usize,
}

fn collect_usings<'a>(
    items: &'a [Item],
    scope: Option<NodeId>,
    depth: usize,
    out: &mut Vec<UsingEntry<'a>>,
) {
    for item in items {
        match item {
            Item::Using(u) => out.push(UsingEntry {
                using: u,
                scope,
                depth,
            }),
            Item::Namespace(ns) => {
                collect_usings(&ns.items, Some(ns.id), depth + 1, out);
            }
            _ => {}
        }
    }
}
