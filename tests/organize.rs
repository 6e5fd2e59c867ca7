//! End-to-end tests of the reorganization engine: sorting, deduplication,
//! placement, trivia handling and the fixed-point property.

use usort::config::{ImportsConfig, Placement};
use usort::fix::organize_text;
use usort::syntax::{parse, render, scan_directives};

fn cfg(placement: Placement) -> ImportsConfig {
    ImportsConfig {
        placement,
        ..ImportsConfig::default()
    }
}

fn fixed(src: &str, cfg: &ImportsConfig) -> String {
    organize_text(src, cfg).unwrap_or_else(|| src.to_string())
}

#[test]
fn outside_hoist_empties_the_namespace() {
    let src = "namespace N\n{\n    using System.Threading;\n    using System;\n}\n";
    let out = fixed(src, &cfg(Placement::Outside));
    assert_eq!(
        out,
        "using System;\nusing System.Threading;\nnamespace N\n{\n}\n"
    );
}

#[test]
fn adjacent_regions_sort_independently() {
    let src = "#if A\nusing B;\nusing A;\n#endif\n#if C\nusing D;\nusing C;\n#endif\n";
    let out = fixed(src, &cfg(Placement::Preserve));
    assert_eq!(
        out,
        "#if A\nusing A;\nusing B;\n#endif\n#if C\nusing C;\nusing D;\n#endif\n"
    );
}

#[test]
fn alias_form_wins_over_plain_duplicate() {
    let src = "using X;\nusing A = X;\n";
    let out = fixed(src, &cfg(Placement::Preserve));
    assert_eq!(out, "using A = X;\n");
}

#[test]
fn conflicting_aliases_are_both_kept() {
    let src = "using B = X;\nusing A = X;\n";
    let out = fixed(src, &cfg(Placement::Preserve));
    assert_eq!(out, "using A = X;\nusing B = X;\n");
}

#[test]
fn static_and_plain_of_same_target_are_not_duplicates() {
    let src = "using static System.Math;\nusing System.Math;\n";
    let out = fixed(src, &cfg(Placement::Preserve));
    assert!(out.contains("using System.Math;"));
    assert!(out.contains("using static System.Math;"));
}

#[test]
fn name_set_is_preserved_modulo_duplicates() {
    let src = "using B;\nusing A;\nusing B;\nusing C;\nusing A = D;\n";
    let out = fixed(src, &cfg(Placement::Preserve));

    let names = |text: &str| {
        let file = parse(text);
        let mut names: Vec<String> = file.usings().iter().map(|u| u.using.name.clone()).collect();
        names.sort();
        names
    };
    let mut expected = names(src);
    expected.dedup();
    assert_eq!(names(&out), expected);
}

#[test]
fn groups_are_ordered_and_separated() {
    let src = "using S = Zebra.S;\nusing Beta;\nusing System;\n";
    let out = fixed(src, &cfg(Placement::Preserve));
    assert_eq!(out, "using System;\n\nusing Beta;\n\nusing S = Zebra.S;\n");
}

#[test]
fn merged_run_when_groups_are_not_separated() {
    let imports = ImportsConfig {
        placement: Placement::Preserve,
        separate_groups: false,
        ..ImportsConfig::default()
    };
    let src = "using static Zeta.M;\nusing Alpha;\nusing System;\n";
    let out = fixed(src, &imports);
    assert_eq!(out, "using System;\nusing Alpha;\nusing static Zeta.M;\n");
}

#[test]
fn global_usings_never_merge_with_local_ones() {
    let src = "global using G = Target.Ns;\nusing L = Target.Ns;\nusing Apple;\n";
    let out = fixed(src, &cfg(Placement::Preserve));
    assert_eq!(
        out,
        "global using G = Target.Ns;\nusing Apple;\n\nusing L = Target.Ns;\n"
    );
}

#[test]
fn preserve_sorts_each_scope_separately() {
    let src = "using B;\nusing A;\nnamespace N\n{\n    using D;\n    using C;\n}\n";
    let out = fixed(src, &cfg(Placement::Preserve));
    assert_eq!(
        out,
        "using A;\nusing B;\nnamespace N\n{\n    using C;\n    using D;\n}\n"
    );
}

#[test]
fn inside_hoist_consolidates_at_namespace_head() {
    let src = "using B;\nusing A;\n\nnamespace N\n{\n    class C { }\n}\n";
    let out = fixed(src, &cfg(Placement::Inside));
    assert_eq!(out, "\nnamespace N\n{\n    using A;\n    using B;\n    class C { }\n}\n");
}

#[test]
fn file_level_attribute_blocks_hoisting() {
    let src = "[assembly: Info]\nnamespace N\n{\n    using B;\n    using A;\n}\n";
    let out = fixed(src, &cfg(Placement::Outside));
    assert_eq!(
        out,
        "[assembly: Info]\nnamespace N\n{\n    using A;\n    using B;\n}\n"
    );
}

#[test]
fn top_level_statements_block_hoisting() {
    let src = "using B;\nusing A;\nConsole.WriteLine(1);\nnamespace N { }\n";
    let out = fixed(src, &cfg(Placement::Inside));
    assert_eq!(out, "using A;\nusing B;\nConsole.WriteLine(1);\nnamespace N { }\n");
}

#[test]
fn multiple_namespaces_block_hoisting() {
    let src = "namespace A\n{\n    using Z;\n    using Y;\n}\nnamespace B\n{\n    using X;\n}\n";
    let out = fixed(src, &cfg(Placement::Outside));
    assert_eq!(
        out,
        "namespace A\n{\n    using Y;\n    using Z;\n}\nnamespace B\n{\n    using X;\n}\n"
    );
}

#[test]
fn directive_trivia_survives_deduplication() {
    let src = "using A;\n#if X\n#endif\nusing A;\nclass C { }\n";
    let out = fixed(src, &cfg(Placement::Preserve));
    assert_eq!(out, "using A;\n#if X\n#endif\nclass C { }\n");
}

#[test]
fn directive_trivia_survives_in_place_sorting() {
    let src = "#if DEBUG\nusing Dbg;\n#endif\nusing B;\nusing A;\n";
    let out = fixed(src, &cfg(Placement::Preserve));
    assert_eq!(out, "#if DEBUG\nusing Dbg;\n#endif\nusing A;\nusing B;\n");
}

#[test]
fn comments_travel_with_a_hoisted_using() {
    let src = "namespace N\n{\n    // core collections\n    using System.Collections;\n}\n";
    let out = fixed(src, &cfg(Placement::Outside));
    assert_eq!(
        out,
        "// core collections\nusing System.Collections;\nnamespace N\n{\n}\n"
    );
}

#[test]
fn trailing_comment_stays_on_its_directive() {
    let src = "using B; // second\nusing A; // first\n";
    let out = fixed(src, &cfg(Placement::Preserve));
    assert_eq!(out, "using A; // first\nusing B; // second\n");
}

#[test]
fn unterminated_region_recovers_at_eof() {
    let src = "#if X\nusing B;\nusing A;\n";
    let out = fixed(src, &cfg(Placement::Preserve));
    assert_eq!(out, "#if X\nusing A;\nusing B;\n");
}

#[test]
fn preserve_never_changes_owning_regions() {
    let src = "using Z;\n#if A\nusing M;\nusing L;\n#if B\nusing K;\n#endif\n#endif\nusing Y;\n";
    let out = fixed(src, &cfg(Placement::Preserve));

    let region_map = |text: &str| {
        let file = parse(text);
        let tree = usort::fix::RegionTree::build(&scan_directives(text), text.len());
        file.usings()
            .iter()
            .map(|u| (u.using.name.clone(), tree.region_at(u.using.span.start)))
            .collect::<std::collections::BTreeMap<_, _>>()
    };
    assert_eq!(region_map(src), region_map(&out));
}

#[test]
fn fix_is_idempotent_across_placements() {
    let src = "// banner\nusing Zebra;\nusing System.IO;\n#if DEBUG\nusing Debug.B;\nusing Debug.A;\n#endif\nusing Alpha;\nusing S = System.String;\n\nnamespace Product.Core\n{\n    using Inner.B;\n    using Inner.A;\n\n    class C { }\n}\n";

    for placement in [Placement::Preserve, Placement::Inside, Placement::Outside] {
        let imports = cfg(placement);
        let once = fixed(src, &imports);
        assert!(
            organize_text(&once, &imports).is_none(),
            "placement {:?} did not reach a fixed point:\n{}",
            placement,
            once
        );
    }

    let merged = ImportsConfig {
        placement: Placement::Preserve,
        separate_groups: false,
        standard_first: false,
        ..ImportsConfig::default()
    };
    let once = fixed(src, &merged);
    assert!(organize_text(&once, &merged).is_none());
}

#[test]
fn organized_file_needs_no_fix() {
    let src = "using System;\nusing System.IO;\n\nusing Alpha;\nusing Beta;\n\nusing Z = Alpha.Z;\n";
    assert!(organize_text(src, &cfg(Placement::Preserve)).is_none());
}

#[test]
fn render_of_untouched_parse_is_identity() {
    let src = "// header\n#if A\nusing B;\n#endif\nnamespace N\n{\n    using C;\n\n    class K\n    {\n        void M() { var s = \"}\"; }\n    }\n}\n";
    let file = parse(src);
    assert_eq!(render(&file), src);
}

#[test]
fn empty_and_usingless_files_are_untouched() {
    assert!(organize_text("", &cfg(Placement::Preserve)).is_none());
    assert!(organize_text("class C { }\n", &cfg(Placement::Outside)).is_none());
}
