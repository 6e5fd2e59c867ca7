//! Trivia carry-over policy for moved and removed using directives.
//!
//! Preprocessor directive trivia denotes live conditional structure and
//! must survive in place even when the directive that carried it is
//! stripped; ordinary comments travel with the using they annotate; blank
//! lines are dropped, since separators are re-synthesized at the insertion
//! point.

use crate::syntax::{Trivia, TriviaKind, UsingDirective};

/// Comments to attach to the replacement node of a moved using,
/// re-indented for the target context. Blank lines are truncated.
pub fn carried_comments(using: &UsingDirective, indent: &str) -> Vec<Trivia> {
    using
        .leading
        .iter()
        .filter(|t| t.is_comment())
        .map(|t| reindent_comment(t, indent))
        .collect()
}

/// Directive trivia attached to a using, in order. Goes onto the pending
/// queue when the using is stripped.
pub fn directive_trivia(using: &UsingDirective) -> Vec<Trivia> {
    using
        .leading
        .iter()
        .filter(|t| t.is_directive())
        .cloned()
        .collect()
}

fn reindent_comment(trivia: &Trivia, indent: &str) -> Trivia {
    let mut text = String::with_capacity(trivia.text.len() + indent.len());
    for line in trivia.text.split_inclusive('\n') {
        let stripped = line.trim_start_matches([' ', '\t']);
        if !stripped.is_empty() && stripped != "\n" {
            text.push_str(indent);
        }
        text.push_str(stripped);
    }
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Trivia {
        kind: TriviaKind::Comment,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    #[test]
    fn comments_are_reindented_and_blanks_dropped() {
        let src = "    // keep me\n\n    using System;\n";
        let file = parse(src);
        let usings = file.usings();
        let carried = carried_comments(usings[0].using, "        ");
        assert_eq!(carried.len(), 1);
        assert_eq!(carried[0].text, "        // keep me\n");
    }

    #[test]
    fn directives_are_not_comments() {
        let src = "#if A\n// note\nusing System;\n#endif\n";
        let file = parse(src);
        let usings = file.usings();
        assert_eq!(carried_comments(usings[0].using, "").len(), 1);
        assert_eq!(directive_trivia(usings[0].using).len(), 1);
    }

    #[test]
    fn no_comments_means_nothing_carried() {
        let src = "\nusing System;\n";
        let file = parse(src);
        let usings = file.usings();
        assert!(carried_comments(usings[0].using, "").is_empty());
    }
}
