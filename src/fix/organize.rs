//! Per-bucket ordering, deduplication and replacement-node synthesis.

use std::cmp::Ordering;

use ahash::AHashSet;

use crate::config::ImportsConfig;
use crate::syntax::{NodeId, SourceText, Span, Trivia, TriviaKind, UsingDirective};

use super::classify::{ClassifiedUsing, ImportGroup};
use super::trivia::carried_comments;

/// Component-wise dotted-path comparison: ordinal, case-sensitive, with
/// diacritics folded to their base letter.
pub fn cmp_dotted(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match cmp_component(x, y) {
                Ordering::Equal => {}
                other => return other,
            },
        }
    }
}

fn cmp_component(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().map(fold_diacritic);
    let mut right = b.chars().map(fold_diacritic);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                if x != y {
                    return (x as u32).cmp(&(y as u32));
                }
            }
        }
    }
}

/// Case-insensitive ordinal comparison of alias identifiers.
pub fn cmp_alias(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().flat_map(char::to_lowercase);
    let mut right = b.chars().flat_map(char::to_lowercase);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                if x != y {
                    return (x as u32).cmp(&(y as u32));
                }
            }
        }
    }
}

/// Latin-1 diacritic folding; everything else compares by scalar value.
fn fold_diacritic(c: char) -> char {
    match c {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => c,
    }
}

/// Duplicate identity: the unaliased target plus staticness. A plain and a
/// static using of the same path are never duplicates of each other.
fn dup_key(u: &UsingDirective) -> (String, bool) {
    (u.name.clone(), u.is_static)
}

/// Indices (into `entries`, document order) surviving deduplication.
///
/// Per key: every distinct alias keeps its first occurrence; unaliased
/// forms survive only when no aliased form exists, and then only the first.
pub fn dedup_survivors(entries: &[ClassifiedUsing<'_>]) -> Vec<usize> {
    let mut key_has_alias: AHashSet<(String, bool)> = AHashSet::new();
    for c in entries {
        if c.using().alias.is_some() {
            key_has_alias.insert(dup_key(c.using()));
        }
    }

    let mut seen_aliases: AHashSet<(String, bool, String)> = AHashSet::new();
    let mut seen_unaliased: AHashSet<(String, bool)> = AHashSet::new();
    let mut out = Vec::with_capacity(entries.len());
    for (i, c) in entries.iter().enumerate() {
        let key = dup_key(c.using());
        match &c.using().alias {
            Some(alias) => {
                if seen_aliases.insert((key.0, key.1, alias.clone())) {
                    out.push(i);
                }
            }
            None => {
                if !key_has_alias.contains(&key) && seen_unaliased.insert(key) {
                    out.push(i);
                }
            }
        }
    }
    out
}

fn cmp_entries(a: &ClassifiedUsing<'_>, b: &ClassifiedUsing<'_>, cfg: &ImportsConfig) -> Ordering {
    if cfg.separate_groups {
        a.group.cmp(&b.group).then_with(|| match a.group {
            ImportGroup::Alias => cmp_alias(
                a.using().alias.as_deref().unwrap_or(""),
                b.using().alias.as_deref().unwrap_or(""),
            )
            .then_with(|| cmp_dotted(&a.using().name, &b.using().name)),
            _ => cmp_dotted(&a.using().name, &b.using().name),
        })
    } else {
        // Merged run: alphabetical by target, core-library precedence kept.
        let rank = |g: ImportGroup| usize::from(g != ImportGroup::CoreLibrary);
        rank(a.group)
            .cmp(&rank(b.group))
            .then_with(|| cmp_dotted(&a.using().name, &b.using().name))
    }
}

/// Index of the first entry that sits out of place in its bucket, if any.
/// Used by the detection rules; the fix itself re-derives the full order.
pub fn out_of_order_index(entries: &[ClassifiedUsing<'_>], cfg: &ImportsConfig) -> Option<usize> {
    entries
        .windows(2)
        .position(|w| cmp_entries(&w[0], &w[1], cfg) == Ordering::Greater)
        .map(|i| i + 1)
}

/// Checks the blank-line separators the bucket would need to be considered
/// already organized: one or more blank lines wherever adjacent survivors
/// change group (only meaningful with `separate_groups`).
pub fn separators_ok(entries: &[ClassifiedUsing<'_>], cfg: &ImportsConfig) -> bool {
    if !cfg.separate_groups {
        return true;
    }
    entries.windows(2).all(|w| {
        w[0].group == w[1].group
            || w[1]
                .using()
                .leading
                .iter()
                .any(|t| t.kind == TriviaKind::BlankLine)
    })
}

/// Sorts and deduplicates one bucket, producing replacement nodes indented
/// for the target context.
///
/// Returns `None` when the bucket is already organized and `force` is off,
/// so untouched buckets keep their original formatting. `force` is used on
/// hoisted runs, which must be re-emitted at the insertion point
/// regardless.
pub fn organize_bucket(
    entries: &[ClassifiedUsing<'_>],
    cfg: &ImportsConfig,
    indent: &str,
    next_id: &mut NodeId,
    force: bool,
) -> Option<Vec<UsingDirective>> {
    if entries.is_empty() {
        return None;
    }

    let survivors = dedup_survivors(entries);
    let mut ordered: Vec<&ClassifiedUsing<'_>> = survivors.iter().map(|&i| &entries[i]).collect();
    ordered.sort_by(|a, b| cmp_entries(a, b, cfg));

    if !force {
        let unchanged = survivors.len() == entries.len()
            && ordered
                .iter()
                .zip(entries.iter())
                .all(|(a, b)| a.using().id == b.using().id)
            && separators_ok(entries, cfg);
        if unchanged {
            return None;
        }
    }

    let mut out = Vec::with_capacity(ordered.len());
    let mut prev_group: Option<ImportGroup> = None;
    for c in &ordered {
        let u = c.using();
        let mut leading = Vec::new();
        if cfg.separate_groups && prev_group.is_some() && prev_group != Some(c.group) {
            leading.push(Trivia::blank_line());
        }
        leading.extend(carried_comments(u, indent));
        out.push(UsingDirective {
            id: {
                let id = *next_id;
                *next_id += 1;
                id
            },
            span: Span::new(0, 0),
            leading,
            body: SourceText::Owned(render_directive(u, indent)),
            name: u.name.clone(),
            alias: u.alias.clone(),
            is_static: u.is_static,
            is_global: u.is_global,
            trailing_comment: u.trailing_comment.clone(),
        });
        prev_group = Some(c.group);
    }
    Some(out)
}

/// Canonical single-line rendering of a directive.
fn render_directive(u: &UsingDirective, indent: &str) -> String {
    let mut s = String::with_capacity(indent.len() + u.name.len() + 24);
    s.push_str(indent);
    if u.is_global {
        s.push_str("global ");
    }
    s.push_str("using ");
    if u.is_static {
        s.push_str("static ");
    }
    if let Some(alias) = &u.alias {
        s.push_str(alias);
        s.push_str(" = ");
    }
    s.push_str(&u.name);
    s.push(';');
    if let Some(comment) = &u.trailing_comment {
        s.push(' ');
        s.push_str(comment);
    }
    s.push('\n');
    s
}

/// Duplicate entries that deduplication would remove, as indices into
/// `entries`. Used by the duplicate-detection rule.
pub fn dedup_dropped(entries: &[ClassifiedUsing<'_>]) -> Vec<usize> {
    let survivors: AHashSet<usize> = dedup_survivors(entries).into_iter().collect();
    (0..entries.len()).filter(|i| !survivors.contains(i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_comparison_is_component_wise() {
        assert_eq!(cmp_dotted("System", "System.Threading"), Ordering::Less);
        assert_eq!(cmp_dotted("System.IO", "System.IO"), Ordering::Equal);
        assert_eq!(cmp_dotted("A.B", "AB"), Ordering::Less);
    }

    #[test]
    fn diacritics_fold_to_base_letters() {
        assert_eq!(cmp_dotted("Ärgern", "Argern"), Ordering::Equal);
        assert_eq!(cmp_dotted("École", "Ecole"), Ordering::Equal);
    }

    #[test]
    fn alias_comparison_ignores_case() {
        assert_eq!(cmp_alias("io", "IO"), Ordering::Equal);
        assert_eq!(cmp_alias("Alpha", "beta"), Ordering::Less);
    }
}
