//! Lenient single-pass parser producing the reduced source model.
//!
//! The parser never fails: anything it cannot positively identify becomes
//! an opaque `Statement` item, which downstream only makes the placement
//! resolver more conservative. Item bodies are byte spans of the original
//! text, so rendering an unmodified tree reproduces the input exactly.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use super::scan::{self, find_matching, line_end, line_end_incl, scan_statement_end, skip_noncode};
use super::{
    DirectiveKind, Item, NamespaceDecl, NodeId, RawItem, SourceFile, SourceText, Span, Trivia,
    TriviaKind, UsingDirective,
};

/// Recognizes a using directive (and nothing that merely starts with the
/// `using` keyword, such as using statements or declarations). The target
/// may carry generics or array suffixes in the alias form.
static USING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<global>global\s+)?using\s+(?P<static>static\s+)?(?:(?P<alias>@?[A-Za-z_]\w*)\s*=\s*)?(?P<name>@?[A-Za-z_][\w\s.<>,\[\]:@?]*?)\s*;",
    )
    .expect("using directive pattern")
});

const TYPE_KEYWORDS: &[&str] = &["class", "struct", "interface", "enum", "record", "delegate"];

const MODIFIER_KEYWORDS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "sealed", "abstract", "partial",
    "unsafe", "readonly", "ref", "file", "new", "extern",
];

pub fn parse(src: &str) -> SourceFile {
    let mut next_id: NodeId = 0;
    let (items, trailing, _) = parse_items(src, 0, src.len(), &mut next_id);
    SourceFile::new(Arc::from(src), items, trailing, next_id)
}

fn bump(next_id: &mut NodeId) -> NodeId {
    let id = *next_id;
    *next_id += 1;
    id
}

/// Parses members in `[pos, end)`. Returns the items, any trailing trivia
/// after the last item, and the final scan position.
fn parse_items(
    src: &str,
    mut pos: usize,
    end: usize,
    next_id: &mut NodeId,
) -> (Vec<Item>, Vec<Trivia>, usize) {
    let mut items = Vec::new();
    loop {
        let (trivia, after_trivia) = scan_trivia(src, pos, end);
        pos = after_trivia;
        if pos >= end {
            return (items, trivia, pos);
        }
        let (item, after_item) = parse_item(src, pos, end, trivia, next_id);
        debug_assert!(after_item > pos, "parser must make progress");
        items.push(item);
        pos = after_item.max(pos + 1);
    }
}

/// Consumes blank lines, comments and preprocessor directive lines starting
/// at `pos`. Stops (without consuming) at the first line that starts an
/// item; whitespace-only tails before `end` are consumed as blank trivia.
fn scan_trivia(src: &str, mut pos: usize, end: usize) -> (Vec<Trivia>, usize) {
    let mut out = Vec::new();
    while pos < end {
        let le = line_end_incl(src, pos).min(end);
        let seg = &src[pos..le];
        let trimmed = seg.trim();
        if trimmed.is_empty() {
            out.push(Trivia {
                kind: TriviaKind::BlankLine,
                text: seg.to_string(),
            });
            pos = le;
            continue;
        }
        let first = pos + (seg.len() - seg.trim_start().len());
        let rest = &src[first..];
        if rest.starts_with("//") {
            out.push(Trivia {
                kind: TriviaKind::Comment,
                text: src[pos..le].to_string(),
            });
            pos = le;
        } else if rest.starts_with('#') {
            out.push(Trivia {
                kind: TriviaKind::Directive(scan::directive_kind(src, first)),
                text: src[pos..le].to_string(),
            });
            pos = le;
        } else if rest.starts_with("/*") {
            let after = skip_noncode(src, first).min(end);
            let after_le = line_end_incl(src, after).min(end);
            if src[after..after_le].trim().is_empty() {
                out.push(Trivia {
                    kind: TriviaKind::Comment,
                    text: src[pos..after_le].to_string(),
                });
                pos = after_le;
            } else {
                // Block comment with code after it on the same line; the
                // item begins right after the comment.
                out.push(Trivia {
                    kind: TriviaKind::Comment,
                    text: src[pos..after].to_string(),
                });
                pos = after;
                break;
            }
        } else {
            break;
        }
    }
    (out, pos)
}

fn parse_item(
    src: &str,
    start: usize,
    end: usize,
    leading: Vec<Trivia>,
    next_id: &mut NodeId,
) -> (Item, usize) {
    let content_start = start
        + src[start..end]
            .find(|c| c != ' ' && c != '\t')
            .unwrap_or(end - start);
    let content = &src[content_start..];

    if let Some(caps) = USING_RE.captures(content) {
        let mat_end = content_start + caps.get(0).map(|m| m.end()).unwrap_or(0);
        if mat_end <= end {
            return parse_using(src, start, content_start, mat_end, end, caps, leading, next_id);
        }
    }

    if content.starts_with('[') {
        return parse_attributed(src, start, content_start, end, leading, next_id);
    }

    match first_word(content) {
        Some("namespace") => parse_namespace(src, start, content_start, end, leading, next_id),
        Some(word) if MODIFIER_KEYWORDS.contains(&word) || TYPE_KEYWORDS.contains(&word) => {
            match parse_type_decl(src, start, content_start, end, leading.clone(), next_id) {
                Some(result) => result,
                None => parse_statement(src, start, content_start, end, leading, next_id),
            }
        }
        _ => parse_statement(src, start, content_start, end, leading, next_id),
    }
}

#[allow(clippy::too_many_arguments)]
fn parse_using(
    src: &str,
    start: usize,
    content_start: usize,
    semi_end: usize,
    end: usize,
    caps: regex::Captures<'_>,
    leading: Vec<Trivia>,
    next_id: &mut NodeId,
) -> (Item, usize) {
    let name: String = caps["name"].chars().filter(|c| !c.is_whitespace()).collect();
    let alias = caps.name("alias").map(|m| m.as_str().to_string());
    let is_static = caps.name("static").is_some();
    let is_global = caps.name("global").is_some();

    let le = line_end(src, semi_end).min(end);
    let le_incl = line_end_incl(src, semi_end).min(end);
    let tail = &src[semi_end..le];
    let tail_trimmed = tail.trim();

    let (body_end, trailing_comment) = if tail_trimmed.is_empty() {
        (le_incl, None)
    } else if tail_trimmed.starts_with("//") {
        (le_incl, Some(tail_trimmed.to_string()))
    } else if tail_trimmed.starts_with("/*") {
        let first = semi_end + (tail.len() - tail.trim_start().len());
        let after = skip_noncode(src, first);
        if after <= le && src[after..le].trim().is_empty() {
            (le_incl, Some(src[first..after].to_string()))
        } else {
            (semi_end, None)
        }
    } else {
        (semi_end, None)
    };

    let using = UsingDirective {
        id: bump(next_id),
        span: Span::new(content_start, semi_end),
        leading,
        body: SourceText::Slice(Span::new(start, body_end)),
        name,
        alias,
        is_static,
        is_global,
        trailing_comment,
    };
    (Item::Using(using), body_end)
}

fn parse_namespace(
    src: &str,
    start: usize,
    content_start: usize,
    end: usize,
    leading: Vec<Trivia>,
    next_id: &mut NodeId,
) -> (Item, usize) {
    // Collect the dotted name, stopping at `{` or `;`.
    let mut i = content_start + "namespace".len();
    let mut name = String::new();
    let delimiter = loop {
        if i >= end {
            break None;
        }
        let skipped = skip_noncode(src, i);
        if skipped > i {
            i = skipped;
            continue;
        }
        let c = src[i..].chars().next().unwrap_or('\0');
        match c {
            '{' | ';' => break Some((c, i)),
            c if c.is_alphanumeric() || c == '_' || c == '.' || c == '@' => {
                name.push(c);
                i += c.len_utf8();
            }
            c if c.is_whitespace() => i += c.len_utf8(),
            _ => break None,
        }
    };

    let Some((delim, delim_idx)) = delimiter else {
        return parse_statement(src, start, content_start, end, leading, next_id);
    };
    if name.is_empty() {
        return parse_statement(src, start, content_start, end, leading, next_id);
    }

    let id = bump(next_id);
    if delim == ';' {
        // File-scoped namespace: everything that follows belongs to it.
        let header_end = extend_through_eol(src, delim_idx + 1, end);
        let (items, inner_trailing, inner_pos) = parse_items(src, header_end, end, next_id);
        let ns = NamespaceDecl {
            id,
            span: Span::new(start, inner_pos),
            leading,
            name,
            header: SourceText::Slice(Span::new(start, header_end)),
            items,
            inner_trailing,
            footer: None,
            file_scoped: true,
        };
        return (Item::Namespace(ns), inner_pos);
    }

    let header_end = extend_through_eol(src, delim_idx + 1, end);
    let close = find_matching(src, delim_idx, b'{', b'}', end);
    let Some(close) = close else {
        // Unterminated block; absorb the remainder.
        let (items, inner_trailing, inner_pos) = parse_items(src, header_end, end, next_id);
        let ns = NamespaceDecl {
            id,
            span: Span::new(start, inner_pos),
            leading,
            name,
            header: SourceText::Slice(Span::new(start, header_end)),
            items,
            inner_trailing,
            footer: None,
            file_scoped: false,
        };
        return (Item::Namespace(ns), inner_pos);
    };

    // If the close brace only has whitespace before it on its line, the
    // footer starts at the line start so indentation is preserved with it.
    let close_ls = scan::line_start(src, close);
    let footer_start = if close_ls >= header_end && src[close_ls..close].trim().is_empty() {
        close_ls
    } else {
        close
    };
    let footer_end = extend_through_eol(src, close + 1, end);

    let (items, inner_trailing, _) = parse_items(src, header_end, footer_start, next_id);
    let ns = NamespaceDecl {
        id,
        span: Span::new(start, footer_end),
        leading,
        name,
        header: SourceText::Slice(Span::new(start, header_end)),
        items,
        inner_trailing,
        footer: Some(SourceText::Slice(Span::new(footer_start, footer_end))),
        file_scoped: false,
    };
    (Item::Namespace(ns), footer_end)
}

fn parse_attributed(
    src: &str,
    start: usize,
    content_start: usize,
    end: usize,
    leading: Vec<Trivia>,
    next_id: &mut NodeId,
) -> (Item, usize) {
    let Some(close) = find_matching(src, content_start, b'[', b']', end) else {
        return parse_statement(src, start, content_start, end, leading, next_id);
    };
    let inner = src[content_start + 1..close].trim_start();
    let is_file_level = ["assembly", "module"].iter().any(|target| {
        inner
            .strip_prefix(target)
            .map(|rest| rest.trim_start().starts_with(':'))
            .unwrap_or(false)
    });

    if is_file_level {
        let body_end = extend_through_eol(src, close + 1, end);
        let raw = RawItem {
            id: bump(next_id),
            span: Span::new(content_start, close + 1),
            leading,
            body: SourceText::Slice(Span::new(start, body_end)),
        };
        return (Item::Attribute(raw), body_end);
    }

    // Attribute list attached to a declaration: consume any further
    // attribute groups, then parse the declaration itself and fold the
    // attributes into its span.
    let mut i = close + 1;
    loop {
        while i < end {
            let c = src.as_bytes()[i];
            if c == b' ' || c == b'\t' || c == b'\n' || c == b'\r' {
                i += 1;
            } else {
                break;
            }
        }
        if i < end && src.as_bytes()[i] == b'[' {
            match find_matching(src, i, b'[', b']', end) {
                Some(c) => i = c + 1,
                None => break,
            }
        } else {
            break;
        }
    }
    if i >= end {
        return parse_statement(src, start, content_start, end, leading, next_id);
    }
    let (inner_item, after) = parse_item(src, i, end, Vec::new(), next_id);
    let body_span = SourceText::Slice(Span::new(start, after));
    let raw = RawItem {
        id: inner_item.id(),
        span: Span::new(content_start, after),
        leading,
        body: body_span,
    };
    let item = match inner_item {
        Item::Type(_) => Item::Type(raw),
        _ => Item::Statement(raw),
    };
    (item, after)
}

/// Parses a (possibly modifier-prefixed) type declaration. Returns `None`
/// when the word sequence turns out not to introduce a type.
fn parse_type_decl(
    src: &str,
    start: usize,
    content_start: usize,
    end: usize,
    leading: Vec<Trivia>,
    next_id: &mut NodeId,
) -> Option<(Item, usize)> {
    let mut i = content_start;
    let mut saw_type_keyword = false;
    for _ in 0..8 {
        while i < end && src.as_bytes()[i].is_ascii_whitespace() {
            i += 1;
        }
        let word_end = i + src[i..end]
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(end - i);
        if word_end == i {
            break;
        }
        let word = &src[i..word_end];
        i = word_end;
        if TYPE_KEYWORDS.contains(&word) {
            saw_type_keyword = true;
            break;
        }
        if !MODIFIER_KEYWORDS.contains(&word) {
            return None;
        }
    }
    if !saw_type_keyword {
        return None;
    }

    // Scan for the body brace or a terminating semicolon (delegates,
    // primary-constructor records).
    let mut j = i;
    let body_open = loop {
        if j >= end {
            return None;
        }
        let skipped = skip_noncode(src, j);
        if skipped > j {
            j = skipped;
            continue;
        }
        match src.as_bytes()[j] {
            b'{' => break Some(j),
            b';' => break None,
            b'}' => return None,
            _ => j = scan::advance(src.as_bytes(), j),
        }
    };

    let decl_end = match body_open {
        Some(open) => find_matching(src, open, b'{', b'}', end)? + 1,
        None => j + 1,
    };
    let body_end = extend_through_eol(src, decl_end, end);
    let raw = RawItem {
        id: bump(next_id),
        span: Span::new(content_start, decl_end),
        leading,
        body: SourceText::Slice(Span::new(start, body_end)),
    };
    Some((Item::Type(raw), body_end))
}

fn parse_statement(
    src: &str,
    start: usize,
    content_start: usize,
    end: usize,
    leading: Vec<Trivia>,
    next_id: &mut NodeId,
) -> (Item, usize) {
    let stmt_end = scan_statement_end(src, content_start, end).max(content_start + 1);
    let body_end = extend_through_eol(src, stmt_end, end);
    let raw = RawItem {
        id: bump(next_id),
        span: Span::new(content_start, stmt_end.min(end)),
        leading,
        body: SourceText::Slice(Span::new(start, body_end.min(end))),
    };
    (Item::Statement(raw), body_end.min(end).max(start + 1))
}

/// If everything between `pos` and the end of its line is whitespace,
/// returns the position past the line terminator; otherwise returns `pos`.
fn extend_through_eol(src: &str, pos: usize, end: usize) -> usize {
    let le = line_end(src, pos.min(end)).min(end);
    if src[pos.min(end)..le].trim().is_empty() {
        line_end_incl(src, pos.min(end)).min(end)
    } else {
        pos
    }
}

fn first_word(content: &str) -> Option<&str> {
    let end = content
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(content.len());
    if end == 0 {
        None
    } else {
        Some(&content[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::super::{render, Item, TriviaKind};
    use super::*;

    fn parse_ok(src: &str) -> SourceFile {
        let file = parse(src);
        assert_eq!(render(&file), src, "round trip must be exact");
        file
    }

    #[test]
    fn parses_plain_using() {
        let file = parse_ok("using System.Threading;\n");
        let usings = file.usings();
        assert_eq!(usings.len(), 1);
        assert_eq!(usings[0].using.name, "System.Threading");
        assert!(!usings[0].using.is_static);
        assert!(usings[0].using.alias.is_none());
    }

    #[test]
    fn parses_using_variants() {
        let src = "global using System;\nusing static System.Math;\nusing IO = System.IO;\n";
        let file = parse_ok(src);
        let usings = file.usings();
        assert_eq!(usings.len(), 3);
        assert!(usings[0].using.is_global);
        assert!(usings[1].using.is_static);
        assert_eq!(usings[2].using.alias.as_deref(), Some("IO"));
    }

    #[test]
    fn generic_alias_target_is_a_using() {
        let file = parse_ok("using IntList = System.Collections.Generic.List<int>;\n");
        let usings = file.usings();
        assert_eq!(usings.len(), 1);
        assert_eq!(usings[0].using.name, "System.Collections.Generic.List<int>");
    }

    #[test]
    fn using_statement_is_not_a_directive() {
        let src = "using var f = File.Open(path);\nusing (var g = Open()) { }\n";
        let file = parse_ok(src);
        assert!(file.usings().is_empty());
        assert!(file.has_top_level_statements());
    }

    #[test]
    fn namespace_block_members_are_scoped() {
        let src = "namespace A.B\n{\n    using System;\n\n    class C { }\n}\n";
        let file = parse_ok(src);
        let namespaces = file.top_level_namespaces();
        assert_eq!(namespaces.len(), 1);
        assert_eq!(namespaces[0].name, "A.B");
        let usings = file.usings();
        assert_eq!(usings.len(), 1);
        assert_eq!(usings[0].scope, Some(namespaces[0].id));
        assert_eq!(usings[0].depth, 1);
    }

    #[test]
    fn file_scoped_namespace_owns_the_rest() {
        let src = "namespace A.B;\n\nusing System;\n\nclass C { }\n";
        let file = parse_ok(src);
        let namespaces = file.top_level_namespaces();
        assert_eq!(namespaces.len(), 1);
        assert!(namespaces[0].file_scoped);
        assert_eq!(file.usings()[0].scope, Some(namespaces[0].id));
    }

    #[test]
    fn file_level_attribute_is_detected() {
        let src = "using System;\n[assembly: InternalsVisibleTo(\"Tests\")]\n";
        let file = parse_ok(src);
        assert!(file.has_file_level_attributes());
    }

    #[test]
    fn attributed_class_is_one_type_item() {
        let src = "[Serializable]\n[Obsolete]\nclass C\n{\n}\n";
        let file = parse_ok(src);
        assert_eq!(file.items.len(), 1);
        assert!(matches!(file.items[0], Item::Type(_)));
        assert!(!file.has_file_level_attributes());
    }

    #[test]
    fn leading_trivia_is_attached() {
        let src = "// banner\n\n#if DEBUG\nusing System;\n#endif\n";
        let file = parse_ok(src);
        let usings = file.usings();
        assert_eq!(usings.len(), 1);
        let kinds: Vec<_> = usings[0].using.leading.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TriviaKind::Comment,
                TriviaKind::BlankLine,
                TriviaKind::Directive(DirectiveKind::If),
            ]
        );
        assert_eq!(file.trailing.len(), 1);
        assert!(file.trailing[0].is_directive());
    }

    #[test]
    fn trailing_comment_is_captured() {
        let src = "using System; // core\n";
        let file = parse_ok(src);
        assert_eq!(
            file.usings()[0].using.trailing_comment.as_deref(),
            Some("// core")
        );
    }

    #[test]
    fn nested_namespaces_round_trip() {
        let src = "namespace A\n{\n    namespace B\n    {\n        using System;\n    }\n}\n";
        let file = parse_ok(src);
        let usings = file.usings();
        assert_eq!(usings.len(), 1);
        assert_eq!(usings[0].depth, 2);
    }

    #[test]
    fn garbage_still_round_trips() {
        let src = "??? what { is ; this\nusing System;\n";
        let file = parse(src);
        assert_eq!(render(&file), src);
    }

    #[test]
    fn top_level_statements_are_flagged() {
        let src = "using System;\nConsole.WriteLine(\"hi\");\n";
        let file = parse_ok(src);
        assert!(file.has_top_level_statements());
        assert_eq!(file.usings().len(), 1);
    }
}
