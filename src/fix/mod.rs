//! The using-directive reorganization engine.
//!
//! A fix application is a pure function over one parsed file: classify
//! every directive into its (scope, region, global-ness) bucket, decide
//! the file's insertion point once, sort and deduplicate each bucket, then
//! rewrite the tree in a single strip/replace/splice pass. Anything the
//! engine cannot safely rewrite degrades to leaving the input unchanged.

pub mod classify;
pub mod organize;
pub mod placement;
pub mod regions;
pub mod rewrite;
pub mod trivia;

use crate::config::ImportsConfig;
use crate::syntax::{parse, render, scan_directives, NodeId, SourceFile};

pub use classify::{classify_file, group_of, BucketKey, ClassifiedUsing, ImportGroup};
pub use placement::{resolve, InsertionDecision};
pub use regions::{RegionTree, ROOT_REGION};
pub use rewrite::{HoistAnchor, RewritePlan};

/// Reorganizes every using directive in the file (the fix-all path).
/// Returns `None` when the file is already organized.
pub fn organize_file(file: &SourceFile, cfg: &ImportsConfig) -> Option<SourceFile> {
    apply_plan(file, build_plan(file, cfg, None)?)
}

/// Reorganizes only the bucket containing `offset` (the single-fix path).
pub fn organize_at(file: &SourceFile, cfg: &ImportsConfig, offset: usize) -> Option<SourceFile> {
    apply_plan(file, build_plan(file, cfg, Some(offset))?)
}

/// Convenience text-to-text entry point.
pub fn organize_text(src: &str, cfg: &ImportsConfig) -> Option<String> {
    let file = parse(src);
    organize_file(&file, cfg).map(|fixed| render(&fixed))
}

fn apply_plan(file: &SourceFile, plan: RewritePlan) -> Option<SourceFile> {
    let rewritten = rewrite::apply(file, &plan);
    let new_text = render(&rewritten);
    if new_text == *file.src {
        None
    } else {
        Some(rewritten)
    }
}

/// Groups classified directives into buckets, preserving document order
/// both across and within buckets.
pub fn group_buckets<'a>(classified: &[ClassifiedUsing<'a>]) -> Vec<Vec<ClassifiedUsing<'a>>> {
    let mut buckets: Vec<(BucketKey, Vec<ClassifiedUsing<'a>>)> = Vec::new();
    for c in classified {
        match buckets.iter_mut().find(|(key, _)| *key == c.key()) {
            Some((_, entries)) => entries.push(*c),
            None => buckets.push((c.key(), vec![*c])),
        }
    }
    buckets.into_iter().map(|(_, entries)| entries).collect()
}

fn indent_for(cfg: &ImportsConfig, depth: usize) -> String {
    " ".repeat(cfg.indent_width * depth)
}

fn build_plan(file: &SourceFile, cfg: &ImportsConfig, trigger: Option<usize>) -> Option<RewritePlan> {
    let directives = scan_directives(&file.src);
    let tree = RegionTree::build(&directives, file.src.len());
    let classified = classify_file(file, &tree, cfg);
    if classified.is_empty() {
        return None;
    }

    let decision = placement::resolve(file, cfg);
    let (anchor, residence_scope) = match decision {
        InsertionDecision::LeaveInRegions => (None, None),
        InsertionDecision::HoistToScope(id) => (Some(HoistAnchor::ScopeBody(id)), Some(id)),
        InsertionDecision::HoistToFileTop => (Some(HoistAnchor::FileTop), None),
    };
    // With a hoist in effect, directives already living at the target scope
    // and those at the other end of the move both consolidate.
    let single_namespace = file.top_level_namespaces().first().map(|ns| ns.id);
    let hoistable = |c: &ClassifiedUsing<'_>| {
        anchor.is_some()
            && c.region == ROOT_REGION
            && !c.using().is_global
            && (c.entry.scope.is_none() || c.entry.scope == single_namespace)
    };

    let mut hoist_run: Vec<ClassifiedUsing<'_>> = Vec::new();
    let mut rest: Vec<ClassifiedUsing<'_>> = Vec::new();
    for c in &classified {
        if hoistable(c) {
            hoist_run.push(*c);
        } else {
            rest.push(*c);
        }
    }

    // Single-fix scoping: keep only the work touching the trigger's bucket.
    let trigger_region = trigger.map(|offset| tree.region_at(offset));
    let trigger_key = trigger.and_then(|offset| {
        classified
            .iter()
            .find(|c| c.using().span.contains(offset))
            .map(|c| c.key())
    });
    let bucket_selected = |key: BucketKey| match (trigger_key, trigger_region) {
        (Some(selected), _) => key == selected,
        (None, Some(region)) => key.region == region,
        (None, None) => true,
    };
    let hoist_selected = match (trigger_key, trigger_region) {
        (Some(selected), _) => selected.region == ROOT_REGION && !selected.is_global,
        (None, Some(region)) => region == ROOT_REGION,
        (None, None) => true,
    };

    let mut next_id: NodeId = file.node_count();
    let mut plan = RewritePlan::default();

    if let Some(anchor) = anchor.filter(|_| hoist_selected && !hoist_run.is_empty()) {
        let depth = placement::target_depth(file, decision);
        let indent = indent_for(cfg, depth);
        let already_at_target = hoist_run.iter().all(|c| c.entry.scope == residence_scope);
        if already_at_target {
            // Nothing crosses a scope boundary; sort in place like any
            // other bucket.
            plan_in_place(&hoist_run, cfg, &indent, &mut next_id, &mut plan);
        } else if let Some(replacements) =
            organize::organize_bucket(&hoist_run, cfg, &indent, &mut next_id, true)
        {
            for c in &hoist_run {
                plan.strip.insert(c.using().id);
            }
            plan.hoist = Some((anchor, replacements));
        }
    }

    for bucket in group_buckets(&rest) {
        if !bucket_selected(bucket[0].key()) {
            continue;
        }
        let indent = indent_for(cfg, bucket[0].entry.depth);
        plan_in_place(&bucket, cfg, &indent, &mut next_id, &mut plan);
    }

    if plan.is_empty() {
        None
    } else {
        Some(plan)
    }
}

/// Replaces a bucket's directives at their existing positions: the first k
/// positions take the k sorted survivors, the rest are stripped.
fn plan_in_place(
    entries: &[ClassifiedUsing<'_>],
    cfg: &ImportsConfig,
    indent: &str,
    next_id: &mut NodeId,
    plan: &mut RewritePlan,
) {
    let Some(replacements) = organize::organize_bucket(entries, cfg, indent, next_id, false) else {
        return;
    };
    for (i, c) in entries.iter().enumerate() {
        match replacements.get(i) {
            Some(replacement) => {
                plan.replace.insert(c.using().id, replacement.clone());
            }
            None => {
                plan.strip.insert(c.using().id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Placement;

    fn cfg(placement: Placement) -> ImportsConfig {
        ImportsConfig {
            placement,
            ..ImportsConfig::default()
        }
    }

    #[test]
    fn sorted_file_needs_no_fix() {
        let src = "using System;\n\nusing Alpha;\n";
        assert!(organize_text(src, &cfg(Placement::Preserve)).is_none());
    }

    #[test]
    fn preserve_sorts_within_top_level() {
        let src = "using Beta;\nusing Alpha;\n";
        let fixed = organize_text(src, &cfg(Placement::Preserve)).unwrap();
        assert_eq!(fixed, "using Alpha;\nusing Beta;\n");
    }

    #[test]
    fn single_fix_leaves_other_regions_alone() {
        let src = "#if A\nusing B;\nusing A;\n#endif\n#if C\nusing D;\nusing C;\n#endif\n";
        let file = parse(src);
        let offset = src.find("using B").unwrap();
        let fixed = organize_at(&file, &cfg(Placement::Preserve), offset).unwrap();
        let text = render(&fixed);
        assert_eq!(
            text,
            "#if A\nusing A;\nusing B;\n#endif\n#if C\nusing D;\nusing C;\n#endif\n"
        );
    }
}
