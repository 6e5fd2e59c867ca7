//! Once-per-file decision on where sorted using directives are emitted.

use crate::config::{ImportsConfig, Placement};
use crate::syntax::{NodeId, SourceFile};

/// Resolved insertion target for a file's local using directives. Global
/// directives are never affected by this decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionDecision {
    /// Sort and deduplicate within existing regions and scopes only.
    LeaveInRegions,
    /// Consolidate root-region directives just inside the named scope.
    HoistToScope(NodeId),
    /// Consolidate root-region directives at the top of the file.
    HoistToFileTop,
}

/// Applies the structural guards, then the configured placement. Any guard
/// hit resolves deterministically to `LeaveInRegions`; this is documented
/// behavior, not an error path.
pub fn resolve(file: &SourceFile, cfg: &ImportsConfig) -> InsertionDecision {
    let namespaces = file.top_level_namespaces();
    if cfg.placement == Placement::Preserve
        || namespaces.len() > 1
        || file.has_file_level_attributes()
        || file.has_top_level_statements()
    {
        return InsertionDecision::LeaveInRegions;
    }
    match cfg.placement {
        Placement::Inside => match namespaces.as_slice() {
            [only] => InsertionDecision::HoistToScope(only.id),
            _ => InsertionDecision::LeaveInRegions,
        },
        Placement::Outside => InsertionDecision::HoistToFileTop,
        Placement::Preserve => InsertionDecision::LeaveInRegions,
    }
}

/// Indentation depth of the hoist target: members of a block namespace are
/// one level in, file scope and file-scoped namespaces are at column zero.
pub fn target_depth(file: &SourceFile, decision: InsertionDecision) -> usize {
    match decision {
        InsertionDecision::HoistToScope(id) => file
            .top_level_namespaces()
            .iter()
            .find(|ns| ns.id == id)
            .map(|ns| usize::from(!ns.file_scoped))
            .unwrap_or(0),
        _ => 0,
    }
}
