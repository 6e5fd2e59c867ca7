//! Tree-to-text rendering. Untouched nodes re-emit their original slices,
//! synthesized nodes their owned text, so rendering is the identity on an
//! unmodified parse.

use super::{Item, SourceFile, Trivia};

pub fn render(file: &SourceFile) -> String {
    let mut out = String::with_capacity(file.src.len() + 128);
    for item in &file.items {
        render_item(&mut out, item, &file.src);
    }
    render_trivia(&mut out, &file.trailing);
    out
}

fn render_item(out: &mut String, item: &Item, src: &str) {
    render_trivia(out, item.leading());
    match item {
        Item::Using(u) => out.push_str(u.body.resolve(src)),
        Item::Namespace(ns) => {
            out.push_str(ns.header.resolve(src));
            for inner in &ns.items {
                render_item(out, inner, src);
            }
            render_trivia(out, &ns.inner_trailing);
            if let Some(footer) = &ns.footer {
                out.push_str(footer.resolve(src));
            }
        }
        Item::Attribute(r) | Item::Type(r) | Item::Statement(r) => {
            out.push_str(r.body.resolve(src));
        }
    }
}

fn render_trivia(out: &mut String, trivia: &[Trivia]) {
    for t in trivia {
        out.push_str(&t.text);
    }
}
