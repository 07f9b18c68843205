//! Legacy layout: a flat paragraph list where a bold paragraph opens a reading.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use lekcjonarz_shared::{ReadingBlock, SiglaRules};

use super::{BlockBuilder, LayoutParser, has_closing_phrase};
use crate::text::{inline_text, text_lines};

static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("valid selector"));
static TITLE_MARKER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong").expect("valid selector"));

const BANNER: &str = "Liturgia Słowa";

/// Parser for pages without `block-title` markers.
pub struct LegacyParser;

impl LayoutParser for LegacyParser {
    fn detect(&self, container: ElementRef<'_>) -> bool {
        container.select(&PARAGRAPH).any(is_title_paragraph)
    }

    fn parse(&self, container: ElementRef<'_>, rules: &SiglaRules) -> Vec<ReadingBlock> {
        let paragraphs: Vec<ElementRef<'_>> = container.select(&PARAGRAPH).collect();
        let mut blocks = Vec::new();
        let mut i = 0;

        while i < paragraphs.len() {
            let heading = paragraphs[i];
            i += 1;
            if !is_title_paragraph(heading) {
                continue;
            }

            let lines = text_lines(heading, None);
            let Some((title, rest)) = lines.split_first() else {
                continue;
            };
            if title.starts_with(BANNER) {
                continue;
            }

            let mut block = BlockBuilder::new(title, rules);
            let mut rest = rest.iter();
            let mut remaining: Vec<String> = Vec::new();
            if let Some(second) = rest.next() {
                if !block.try_sigla(second) {
                    remaining.push(second.clone());
                }
            }
            remaining.extend(rest.cloned());
            block.push_paragraph(remaining);

            if !block.has_sigla() {
                if let Some(next) = paragraphs.get(i).filter(|p| !is_title_paragraph(**p)) {
                    if block.try_sigla(&inline_text(*next)) {
                        i += 1;
                    }
                }
            }

            let mut closed = false;
            while let Some(paragraph) = paragraphs.get(i).filter(|p| !is_title_paragraph(**p)) {
                if !closed {
                    block.absorb_paragraph(*paragraph);
                    closed = has_closing_phrase(&inline_text(*paragraph));
                }
                i += 1;
            }

            blocks.push(block.finish());
        }

        blocks
    }

    fn name(&self) -> &str {
        "legacy"
    }
}

fn is_title_paragraph(paragraph: ElementRef<'_>) -> bool {
    paragraph.select(&TITLE_MARKER).next().is_some()
}
