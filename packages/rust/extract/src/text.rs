//! Text collection over the parsed DOM.
//!
//! HTML whitespace inside text nodes is insignificant and collapses to a
//! single space; only `<br>` produces a line break.

use scraper::{ElementRef, Node};

/// Lines of an element's text, whitespace-collapsed, trimmed, empty lines dropped.
///
/// When `skip` is given, that descendant's subtree contributes nothing.
pub(crate) fn text_lines(el: ElementRef<'_>, skip: Option<ElementRef<'_>>) -> Vec<String> {
    let mut raw = String::new();
    push_text(el, skip, &mut raw);
    raw.split('\n').filter_map(collapse).collect()
}

/// Single-line text of an element (lines joined with a space).
pub(crate) fn inline_text(el: ElementRef<'_>) -> String {
    text_lines(el, None).join(" ")
}

fn push_text(el: ElementRef<'_>, skip: Option<ElementRef<'_>>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
            }
            Node::Element(element) if element.name() == "br" => out.push('\n'),
            Node::Element(_) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                if skip.is_some_and(|s| s.id() == child_el.id()) {
                    continue;
                }
                push_text(child_el, skip, out);
            }
            _ => {}
        }
    }
}

fn collapse(line: &str) -> Option<String> {
    let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Whether the element carries the given CSS class.
pub(crate) fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}
