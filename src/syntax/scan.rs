//! Low-level text scanning shared by the parser and the region tree
//! builder. All routines are aware of C# comments, string literals
//! (regular, verbatim, interpolated, raw) and char literals, so braces and
//! semicolons inside them never confuse structural scanning.

use super::DirectiveKind;

/// A preprocessor directive found in the file, independent of where it sits
/// structurally. The region tree is built from the full-file sequence of
/// these, so directives inside opaque type bodies still count.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveToken {
    pub kind: DirectiveKind,
    /// Start of the line carrying the directive.
    pub line_start: usize,
    /// Offset of the `#` itself.
    pub hash_offset: usize,
}

/// Position just past the character starting at `i`. Keeps scanning loops
/// on UTF-8 boundaries without decoding.
pub(crate) fn advance(bytes: &[u8], i: usize) -> usize {
    let b = bytes[i];
    if b < 0x80 {
        i + 1
    } else if b < 0xE0 {
        i + 2
    } else if b < 0xF0 {
        i + 3
    } else {
        i + 4
    }
}

/// Byte index of the start of the line containing `pos`.
pub fn line_start(src: &str, pos: usize) -> usize {
    src[..pos].rfind('\n').map(|p| p + 1).unwrap_or(0)
}

/// Byte index of the `\n` ending the line containing `pos`, or `src.len()`.
pub fn line_end(src: &str, pos: usize) -> usize {
    src[pos..].find('\n').map(|p| pos + p).unwrap_or(src.len())
}

/// Like [`line_end`], but past the terminator.
pub fn line_end_incl(src: &str, pos: usize) -> usize {
    let end = line_end(src, pos);
    if end < src.len() {
        end + 1
    } else {
        end
    }
}

/// If `pos` begins a comment or a string/char literal, returns the position
/// just past it; otherwise returns `pos` unchanged.
pub fn skip_noncode(src: &str, pos: usize) -> usize {
    let bytes = src.as_bytes();
    let rest = &src[pos..];

    if rest.starts_with("//") {
        return line_end(src, pos);
    }
    if rest.starts_with("/*") {
        return match rest[2..].find("*/") {
            Some(p) => pos + 2 + p + 2,
            None => src.len(),
        };
    }
    // Raw string literal: """ ... """ (C# 11). Checked before the regular
    // string case so the opening quotes are not read as an empty string.
    if rest.starts_with("\"\"\"") {
        return match rest[3..].find("\"\"\"") {
            Some(p) => pos + 3 + p + 3,
            None => src.len(),
        };
    }
    // Verbatim string: @"..." or $@"..." / @$"...", where "" escapes a quote.
    let verbatim_prefix = ["@\"", "@$\"", "$@\""]
        .iter()
        .find(|p| rest.starts_with(**p))
        .map(|p| p.len());
    if let Some(prefix) = verbatim_prefix {
        let mut i = pos + prefix;
        while i < src.len() {
            if bytes[i] == b'"' {
                if i + 1 < src.len() && bytes[i + 1] == b'"' {
                    i += 2;
                    continue;
                }
                return i + 1;
            }
            i += 1;
        }
        return src.len();
    }
    // Regular or interpolated string. Does not span lines; bail at EOL so a
    // stray quote cannot swallow the rest of the file.
    if rest.starts_with('"') || rest.starts_with("$\"") {
        let mut i = pos + if rest.starts_with('$') { 2 } else { 1 };
        while i < src.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'"' => return i + 1,
                b'\n' => return i,
                _ => i += 1,
            }
        }
        return src.len();
    }
    if rest.starts_with('\'') {
        let mut i = pos + 1;
        while i < src.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'\'' => return i + 1,
                b'\n' => return i,
                _ => i += 1,
            }
        }
        return src.len();
    }
    pos
}

/// Scans the whole file for preprocessor directives in order. A directive
/// is a `#` that is the first non-whitespace character on its line and not
/// inside a comment or string.
pub fn scan_directives(src: &str) -> Vec<DirectiveToken> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    let mut only_ws_on_line = true;
    let mut current_line_start = 0;

    while i < src.len() {
        let skipped = skip_noncode(src, i);
        if skipped > i {
            // A comment or literal disqualifies the rest of this line, and
            // any lines it spans, from starting a directive.
            i = skipped;
            only_ws_on_line = false;
            continue;
        }
        match bytes[i] {
            b'\n' => {
                i += 1;
                only_ws_on_line = true;
                current_line_start = i;
            }
            b' ' | b'\t' | b'\r' => i += 1,
            b'#' if only_ws_on_line => {
                out.push(DirectiveToken {
                    kind: directive_kind(src, i),
                    line_start: current_line_start,
                    hash_offset: i,
                });
                i = line_end(src, i);
                only_ws_on_line = false;
            }
            _ => {
                i = advance(bytes, i);
                only_ws_on_line = false;
            }
        }
    }
    out
}

/// Classifies the directive whose `#` sits at `hash_offset`.
pub fn directive_kind(src: &str, hash_offset: usize) -> DirectiveKind {
    let rest = src[hash_offset + 1..].trim_start_matches([' ', '\t']);
    let word_end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    match &rest[..word_end] {
        "if" => DirectiveKind::If,
        "elif" => DirectiveKind::Elif,
        "else" => DirectiveKind::Else,
        "endif" => DirectiveKind::Endif,
        _ => DirectiveKind::Other,
    }
}

/// Finds the close delimiter matching the open delimiter at `open_idx`,
/// scanning no further than `end`. Returns the index of the close
/// delimiter itself.
pub fn find_matching(src: &str, open_idx: usize, open: u8, close: u8, end: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    debug_assert_eq!(bytes[open_idx], open);
    let mut depth = 1usize;
    let mut i = open_idx + 1;
    while i < end {
        let skipped = skip_noncode(src, i);
        if skipped > i {
            i = skipped;
            continue;
        }
        let b = bytes[i];
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i = advance(bytes, i);
    }
    None
}

/// Scans an opaque statement starting at `start` and returns the position
/// just past it: past a `;` at zero nesting depth, or past a `}` that
/// closes a block the statement itself opened (unless a `;` immediately
/// follows, as in object initializers). Stops before an unmatched `}`.
pub fn scan_statement_end(src: &str, start: usize, end: usize) -> usize {
    let bytes = src.as_bytes();
    let mut paren = 0i32;
    let mut bracket = 0i32;
    let mut brace = 0i32;
    let mut i = start;
    while i < end {
        let skipped = skip_noncode(src, i);
        if skipped > i {
            i = skipped;
            continue;
        }
        match bytes[i] {
            b'(' => paren += 1,
            b')' => paren -= 1,
            b'[' => bracket += 1,
            b']' => bracket -= 1,
            b'{' => brace += 1,
            b'}' => {
                if brace == 0 {
                    // Enclosing scope's close brace; the statement ends here.
                    return i;
                }
                brace -= 1;
                if brace == 0 && paren == 0 && bracket == 0 {
                    let mut j = i + 1;
                    while j < end && (bytes[j] == b' ' || bytes[j] == b'\t') {
                        j += 1;
                    }
                    if j < end && bytes[j] == b';' {
                        i = j;
                    }
                    return i + 1;
                }
            }
            b';' if paren == 0 && bracket == 0 && brace == 0 => return i + 1,
            _ => {}
        }
        i = advance(bytes, i);
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_ignore_strings_and_comments() {
        let src = "#if DEBUG\nvar s = \"#else\";\n// #endif in comment\n#endif\n";
        let tokens = scan_directives(src);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, DirectiveKind::If);
        assert_eq!(tokens[1].kind, DirectiveKind::Endif);
    }

    #[test]
    fn directives_allow_leading_whitespace() {
        let src = "    #if A\n  #endif\n";
        let tokens = scan_directives(src);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].line_start, 0);
        assert_eq!(tokens[0].hash_offset, 4);
    }

    #[test]
    fn matching_brace_skips_literal_content() {
        let src = "class A { string s = \"}\"; char c = '}'; }";
        let open = src.find('{').unwrap();
        let close = find_matching(src, open, b'{', b'}', src.len()).unwrap();
        assert_eq!(close, src.len() - 1);
    }

    #[test]
    fn statement_end_handles_block_statements() {
        let src = "if (x) { y(); }\nz();\n";
        let end = scan_statement_end(src, 0, src.len());
        assert_eq!(&src[..end], "if (x) { y(); }");
    }

    #[test]
    fn statement_end_keeps_initializer_semicolon() {
        let src = "var a = new A { X = 1 };\nnext();\n";
        let end = scan_statement_end(src, 0, src.len());
        assert_eq!(&src[..end], "var a = new A { X = 1 };");
    }

    #[test]
    fn statement_stops_before_enclosing_close_brace() {
        let src = "x() }";
        let end = scan_statement_end(src, 0, src.len());
        assert_eq!(&src[..end], "x() ");
    }

    #[test]
    fn verbatim_string_with_escaped_quote() {
        let src = r#"@"a""b" rest"#;
        let skipped = skip_noncode(src, 0);
        assert_eq!(&src[skipped..], " rest");
    }
}
