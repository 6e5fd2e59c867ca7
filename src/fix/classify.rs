//! Using-directive classification: owning region and group.

use crate::config::ImportsConfig;
use crate::syntax::{NodeId, SourceFile, UsingDirective, UsingEntry};

use super::regions::{RegionId, RegionTree};

/// Mutually exclusive directive groups, in their output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ImportGroup {
    /// Imports rooted at the configured standard-library namespace, when
    /// `standard_first` is enabled.
    CoreLibrary,
    Plain,
    Alias,
    Static,
}

impl ImportGroup {
    pub fn label(self) -> &'static str {
        match self {
            ImportGroup::CoreLibrary => "core-library",
            ImportGroup::Plain => "plain",
            ImportGroup::Alias => "alias",
            ImportGroup::Static => "static",
        }
    }
}

/// Derives the group for one directive. First match wins: static, alias,
/// core-library, plain.
pub fn group_of(using: &UsingDirective, cfg: &ImportsConfig) -> ImportGroup {
    if using.is_static {
        ImportGroup::Static
    } else if using.alias.is_some() {
        ImportGroup::Alias
    } else if cfg.standard_first && using.root_segment() == cfg.standard_library_root {
        ImportGroup::CoreLibrary
    } else {
        ImportGroup::Plain
    }
}

/// Bucket identity: directives sharing scope, region and global-ness are
/// sorted and deduplicated together. Group membership deliberately is not
/// part of the key, since alias-preference dedup compares across groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketKey {
    pub scope: Option<NodeId>,
    pub region: RegionId,
    pub is_global: bool,
}

/// A classified directive, annotated with everything bucketing needs.
#[derive(Debug, Clone, Copy)]
pub struct ClassifiedUsing<'a> {
    pub entry: UsingEntry<'a>,
    pub region: RegionId,
    pub group: ImportGroup,
}

impl<'a> ClassifiedUsing<'a> {
    pub fn using(&self) -> &'a UsingDirective {
        self.entry.using
    }

    pub fn key(&self) -> BucketKey {
        BucketKey {
            scope: self.entry.scope,
            region: self.region,
            is_global: self.entry.using.is_global,
        }
    }
}

/// Classifies every using directive in the file, in document order.
pub fn classify_file<'a>(
    file: &'a SourceFile,
    tree: &RegionTree,
    cfg: &ImportsConfig,
) -> Vec<ClassifiedUsing<'a>> {
    file.usings()
        .into_iter()
        .map(|entry| ClassifiedUsing {
            region: tree.region_at(entry.using.span.start),
            group: group_of(entry.using, cfg),
            entry,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportsConfig;
    use crate::syntax::{parse, scan_directives};

    fn classify(src: &str, cfg: &ImportsConfig) -> Vec<(String, ImportGroup)> {
        let file = parse(src);
        let tree = RegionTree::build(&scan_directives(src), src.len());
        classify_file(&file, &tree, cfg)
            .iter()
            .map(|c| (c.using().name.clone(), c.group))
            .collect()
    }

    #[test]
    fn derivation_order_is_static_alias_core_plain() {
        let cfg = ImportsConfig::default();
        let src = "using static System.Math;\nusing S = System.String;\nusing System.IO;\nusing Newtonsoft.Json;\n";
        let groups = classify(src, &cfg);
        assert_eq!(groups[0].1, ImportGroup::Static);
        assert_eq!(groups[1].1, ImportGroup::Alias);
        assert_eq!(groups[2].1, ImportGroup::CoreLibrary);
        assert_eq!(groups[3].1, ImportGroup::Plain);
    }

    #[test]
    fn standard_first_off_disables_core_library() {
        let cfg = ImportsConfig {
            standard_first: false,
            ..ImportsConfig::default()
        };
        let groups = classify("using System.IO;\n", &cfg);
        assert_eq!(groups[0].1, ImportGroup::Plain);
    }

    #[test]
    fn core_library_requires_exact_root_segment() {
        let cfg = ImportsConfig::default();
        let groups = classify("using SystemX.IO;\nusing System;\n", &cfg);
        assert_eq!(groups[0].1, ImportGroup::Plain);
        assert_eq!(groups[1].1, ImportGroup::CoreLibrary);
    }

    #[test]
    fn region_and_scope_shape_the_bucket_key() {
        let cfg = ImportsConfig::default();
        let src = "using A;\n#if X\nusing B;\n#endif\nnamespace N\n{\n    using C;\n}\n";
        let file = parse(src);
        let tree = RegionTree::build(&scan_directives(src), src.len());
        let classified = classify_file(&file, &tree, &cfg);
        assert_eq!(classified.len(), 3);
        let keys: Vec<_> = classified.iter().map(|c| c.key()).collect();
        assert_ne!(keys[0], keys[1], "conditional region splits the bucket");
        assert_ne!(keys[0], keys[2], "namespace scope splits the bucket");
    }

    #[test]
    fn global_usings_partition_separately() {
        let cfg = ImportsConfig::default();
        let src = "global using A;\nusing A;\n";
        let file = parse(src);
        let tree = RegionTree::build(&scan_directives(src), src.len());
        let classified = classify_file(&file, &tree, &cfg);
        assert_ne!(classified[0].key(), classified[1].key());
    }
}
