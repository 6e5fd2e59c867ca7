//! The strip/replace/splice rewriter: one structure-preserving pass over
//! the original tree, consulting tables keyed by node identity, producing a
//! new tree. No re-analysis happens here; if the hoist anchor cannot be
//! found, the whole transform is a no-op returning the input unchanged.

use ahash::{AHashMap, AHashSet};

use crate::syntax::{Item, NamespaceDecl, NodeId, SourceFile, Trivia, UsingDirective};

use super::trivia::directive_trivia;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoistAnchor {
    FileTop,
    /// Just inside the top-level namespace with this id.
    ScopeBody(NodeId),
}

#[derive(Debug, Default)]
pub struct RewritePlan {
    /// Directives deleted in place (moved or deduplicated away).
    pub strip: AHashSet<NodeId>,
    /// Directives replaced in place by a freshly sorted node.
    pub replace: AHashMap<NodeId, UsingDirective>,
    /// Consolidated run spliced at the resolved insertion point.
    pub hoist: Option<(HoistAnchor, Vec<UsingDirective>)>,
}

impl RewritePlan {
    pub fn is_empty(&self) -> bool {
        self.strip.is_empty() && self.replace.is_empty() && self.hoist.is_none()
    }
}

/// Applies the plan. Pure: the input tree is never mutated.
pub fn apply(file: &SourceFile, plan: &RewritePlan) -> SourceFile {
    // Anchor validation up front keeps the no-op guarantee simple: either
    // the whole plan applies or none of it does.
    if let Some((HoistAnchor::ScopeBody(id), _)) = &plan.hoist {
        let anchored = file.top_level_namespaces().iter().any(|ns| ns.id == *id);
        if !anchored {
            return file.clone();
        }
    }

    let mut pending: Vec<Trivia> = Vec::new();
    let mut items = Vec::with_capacity(file.items.len() + 4);

    if let Some((HoistAnchor::FileTop, hoisted)) = &plan.hoist {
        items.extend(hoisted.iter().cloned().map(Item::Using));
    }

    rewrite_items(&file.items, plan, &mut pending, &mut items);

    let mut trailing = Vec::with_capacity(file.trailing.len() + pending.len());
    trailing.append(&mut pending);
    trailing.extend(file.trailing.iter().cloned());

    SourceFile::new(file.src.clone(), items, trailing, next_id_after(file, plan))
}

fn next_id_after(file: &SourceFile, plan: &RewritePlan) -> NodeId {
    let mut max = file.node_count();
    for u in plan.replace.values() {
        max = max.max(u.id + 1);
    }
    if let Some((_, hoisted)) = &plan.hoist {
        for u in hoisted {
            max = max.max(u.id + 1);
        }
    }
    max
}

fn rewrite_items(
    items: &[Item],
    plan: &RewritePlan,
    pending: &mut Vec<Trivia>,
    out: &mut Vec<Item>,
) {
    for item in items {
        match item {
            Item::Using(u) if plan.strip.contains(&u.id) => {
                // Only directive trivia survives a strip; it reattaches to
                // the next surviving item.
                pending.extend(directive_trivia(u));
            }
            Item::Using(u) => {
                if let Some(replacement) = plan.replace.get(&u.id) {
                    let mut replacement = replacement.clone();
                    let mut leading = std::mem::take(pending);
                    // Directive trivia at a replaced position stays put;
                    // comments belong to whichever using now carries them.
                    leading.extend(directive_trivia(u));
                    leading.append(&mut replacement.leading);
                    replacement.leading = leading;
                    out.push(Item::Using(replacement));
                } else {
                    let mut kept = u.clone();
                    prepend(&mut kept.leading, pending);
                    out.push(Item::Using(kept));
                }
            }
            Item::Namespace(ns) => {
                out.push(Item::Namespace(rewrite_namespace(ns, plan, pending)));
            }
            other => {
                let mut kept = other.clone();
                prepend(kept.leading_mut(), pending);
                out.push(kept);
            }
        }
    }
}

fn rewrite_namespace(
    ns: &NamespaceDecl,
    plan: &RewritePlan,
    pending: &mut Vec<Trivia>,
) -> NamespaceDecl {
    let mut leading = ns.leading.clone();
    prepend(&mut leading, pending);

    let mut inner = Vec::with_capacity(ns.items.len() + 4);
    if let Some((HoistAnchor::ScopeBody(id), hoisted)) = &plan.hoist {
        if *id == ns.id {
            inner.extend(hoisted.iter().cloned().map(Item::Using));
        }
    }

    let mut inner_pending: Vec<Trivia> = Vec::new();
    rewrite_items(&ns.items, plan, &mut inner_pending, &mut inner);

    // Directive trivia stripped near the end of the scope stays inside it.
    let mut inner_trailing = inner_pending;
    inner_trailing.extend(ns.inner_trailing.iter().cloned());

    NamespaceDecl {
        id: ns.id,
        span: ns.span,
        leading,
        name: ns.name.clone(),
        header: ns.header.clone(),
        items: inner,
        inner_trailing,
        footer: ns.footer.clone(),
        file_scoped: ns.file_scoped,
    }
}

fn prepend(leading: &mut Vec<Trivia>, pending: &mut Vec<Trivia>) {
    if pending.is_empty() {
        return;
    }
    let mut merged = std::mem::take(pending);
    merged.extend(leading.drain(..));
    *leading = merged;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{parse, render, SourceText, Span};

    fn replacement_like(u: &UsingDirective, id: NodeId, text: &str) -> UsingDirective {
        UsingDirective {
            id,
            span: Span::new(0, 0),
            leading: Vec::new(),
            body: SourceText::Owned(text.to_string()),
            name: u.name.clone(),
            alias: u.alias.clone(),
            is_static: u.is_static,
            is_global: u.is_global,
            trailing_comment: None,
        }
    }

    #[test]
    fn empty_plan_is_identity() {
        let src = "using B;\nusing A;\nclass C { }\n";
        let file = parse(src);
        let out = apply(&file, &RewritePlan::default());
        assert_eq!(render(&out), src);
    }

    #[test]
    fn strip_carries_directive_trivia_to_next_item() {
        let src = "#if X\nusing A;\nclass C { }\n";
        let file = parse(src);
        let id = file.usings()[0].using.id;
        let mut plan = RewritePlan::default();
        plan.strip.insert(id);
        let out = apply(&file, &plan);
        assert_eq!(render(&out), "#if X\nclass C { }\n");
    }

    #[test]
    fn strip_at_end_moves_directives_to_trailing() {
        let src = "class C { }\n#if X\nusing A;\n";
        let file = parse(src);
        let id = file.usings()[0].using.id;
        let mut plan = RewritePlan::default();
        plan.strip.insert(id);
        let out = apply(&file, &plan);
        assert_eq!(render(&out), "class C { }\n#if X\n");
    }

    #[test]
    fn missing_scope_anchor_is_a_no_op() {
        let src = "using A;\nclass C { }\n";
        let file = parse(src);
        let u = file.usings()[0].using.clone();
        let mut plan = RewritePlan::default();
        plan.strip.insert(u.id);
        plan.hoist = Some((
            HoistAnchor::ScopeBody(9999),
            vec![replacement_like(&u, 100, "using A;\n")],
        ));
        let out = apply(&file, &plan);
        assert_eq!(render(&out), src);
    }

    #[test]
    fn hoist_to_scope_splices_at_body_head() {
        let src = "using A;\nnamespace N\n{\n    class C { }\n}\n";
        let file = parse(src);
        let u = file.usings()[0].using.clone();
        let ns_id = file.top_level_namespaces()[0].id;
        let mut plan = RewritePlan::default();
        plan.strip.insert(u.id);
        plan.hoist = Some((
            HoistAnchor::ScopeBody(ns_id),
            vec![replacement_like(&u, 100, "    using A;\n")],
        ));
        let out = apply(&file, &plan);
        assert_eq!(
            render(&out),
            "namespace N\n{\n    using A;\n    class C { }\n}\n"
        );
    }
}
