//! Modern layout: `block-title` markers followed by sibling content.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use lekcjonarz_shared::{ReadingBlock, SiglaRules};

use super::{BlockBuilder, LayoutParser};
use crate::text::{has_class, inline_text};

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.block-title, h3.block-title").expect("valid selector"));

const PARAGRAPH_LIKE: [&str; 4] = ["p", "div", "blockquote", "span"];

/// Parser for pages with explicit `block-title` markers.
pub struct ModernParser;

impl LayoutParser for ModernParser {
    fn detect(&self, container: ElementRef<'_>) -> bool {
        container.select(&TITLE).next().is_some()
    }

    fn parse(&self, container: ElementRef<'_>, rules: &SiglaRules) -> Vec<ReadingBlock> {
        container
            .select(&TITLE)
            .map(|title| parse_section(title, rules))
            .collect()
    }

    fn name(&self) -> &str {
        "modern"
    }
}

/// Walk the siblings after one title marker up to the next marker.
fn parse_section(title: ElementRef<'_>, rules: &SiglaRules) -> ReadingBlock {
    let mut block = BlockBuilder::new(&inline_text(title), rules);

    let siblings = title
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take_while(|el| !has_class(*el, "block-title"));

    for (index, el) in siblings.enumerate() {
        if has_class(el, "bible-verse") {
            block.offer_sigla(inline_text(el));
            continue;
        }
        if index == 0 && el.value().name() == "p" && block.try_sigla(&inline_text(el)) {
            continue;
        }
        if PARAGRAPH_LIKE.contains(&el.value().name()) {
            block.absorb_paragraph(el);
        }
    }

    block.finish()
}
