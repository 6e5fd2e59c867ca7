use super::{Fix, Issue, Location, Rule, RuleContext, Severity};
use crate::config::ImportsConfig;
use crate::fix::{
    classify_file, group_buckets, organize, placement, ClassifiedUsing, InsertionDecision,
    RegionTree, ROOT_REGION,
};
use crate::syntax::scan_directives;

fn classified_buckets<'a>(
    ctx: &'a RuleContext,
    cfg: &ImportsConfig,
) -> (RegionTree, Vec<Vec<ClassifiedUsing<'a>>>) {
    let directives = scan_directives(&ctx.tree.src);
    let tree = RegionTree::build(&directives, ctx.tree.src.len());
    let classified = classify_file(&ctx.tree, &tree, cfg);
    let buckets = group_buckets(&classified);
    (tree, buckets)
}

fn issue_at(ctx: &RuleContext, rule: &'static str, severity: Severity, message: String, offset: usize) -> Issue {
    let (line, column) = ctx.line_col(offset);
    Issue {
        rule: rule.to_string(),
        severity,
        message,
        location: Location { line, column },
        fix: Some(Fix {
            description: "Reorganize using directives".to_string(),
        }),
    }
}

/// Flags using directives that are out of order within their bucket, and
/// missing blank lines between groups.
pub struct UsingOrderRule {
    imports: ImportsConfig,
}

impl UsingOrderRule {
    pub fn new(imports: ImportsConfig) -> Self {
        Self { imports }
    }
}

impl Rule for UsingOrderRule {
    fn name(&self) -> &'static str {
        "using-order"
    }

    fn check(&self, ctx: &mut RuleContext) {
        let (_, buckets) = classified_buckets(ctx, &self.imports);
        let mut issues_to_report = Vec::new();

        for bucket in &buckets {
            if let Some(i) = organize::out_of_order_index(bucket, &self.imports) {
                let using = bucket[i].using();
                issues_to_report.push(issue_at(
                    ctx,
                    self.name(),
                    Severity::Warning,
                    format!("Using directive '{}' is out of order", using.name),
                    using.span.start,
                ));
            } else if !organize::separators_ok(bucket, &self.imports) {
                let using = bucket[0].using();
                issues_to_report.push(issue_at(
                    ctx,
                    self.name(),
                    Severity::Info,
                    "Using groups should be separated by a single blank line".to_string(),
                    using.span.start,
                ));
            }
        }

        for issue in issues_to_report {
            ctx.report(issue);
        }
    }
}

/// Flags semantically duplicate using directives within one bucket.
pub struct UsingDuplicateRule {
    imports: ImportsConfig,
}

impl UsingDuplicateRule {
    pub fn new(imports: ImportsConfig) -> Self {
        Self { imports }
    }
}

impl Rule for UsingDuplicateRule {
    fn name(&self) -> &'static str {
        "using-duplicate"
    }

    fn check(&self, ctx: &mut RuleContext) {
        let (_, buckets) = classified_buckets(ctx, &self.imports);
        let mut issues_to_report = Vec::new();

        for bucket in &buckets {
            for i in organize::dedup_dropped(bucket) {
                let using = bucket[i].using();
                issues_to_report.push(issue_at(
                    ctx,
                    self.name(),
                    Severity::Warning,
                    format!("Duplicate using directive for '{}'", using.name),
                    using.span.start,
                ));
            }
        }

        for issue in issues_to_report {
            ctx.report(issue);
        }
    }
}

/// Flags local using directives on the wrong side of the namespace for the
/// configured placement. Structural guards (multiple namespaces, file-level
/// attributes, top-level statements) silence the rule entirely.
pub struct UsingPlacementRule {
    imports: ImportsConfig,
}

impl UsingPlacementRule {
    pub fn new(imports: ImportsConfig) -> Self {
        Self { imports }
    }
}

impl Rule for UsingPlacementRule {
    fn name(&self) -> &'static str {
        "using-placement"
    }

    fn check(&self, ctx: &mut RuleContext) {
        let decision = placement::resolve(&ctx.tree, &self.imports);
        let residence = match decision {
            InsertionDecision::LeaveInRegions => return,
            InsertionDecision::HoistToScope(id) => Some(id),
            InsertionDecision::HoistToFileTop => None,
        };

        let directives = scan_directives(&ctx.tree.src);
        let tree = RegionTree::build(&directives, ctx.tree.src.len());
        let classified = classify_file(&ctx.tree, &tree, &self.imports);
        let mut issues_to_report = Vec::new();

        for c in &classified {
            if c.region != ROOT_REGION || c.using().is_global {
                continue;
            }
            if c.entry.scope != residence {
                let place = match residence {
                    Some(_) => "inside the namespace",
                    None => "outside the namespace",
                };
                issues_to_report.push(issue_at(
                    ctx,
                    self.name(),
                    Severity::Warning,
                    format!("Using directive '{}' should be placed {}", c.using().name, place),
                    c.using().span.start,
                ));
            }
        }

        for issue in issues_to_report {
            ctx.report(issue);
        }
    }
}
