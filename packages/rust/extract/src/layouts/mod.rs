//! Layout classification and the reading parsers.
//!
//! Pages come in two mutually exclusive structures: the modern one marks
//! each reading with a `block-title` element followed by sibling content,
//! the legacy one is a flat paragraph list where a bold paragraph opens a
//! reading.

mod legacy;
mod modern;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use lekcjonarz_shared::{ACCLAMATION, PSALM_RESPONSORY, ReadingBlock, SiglaRules};

use crate::sigla::matches_sigla;
use crate::text::{inline_text, text_lines};

pub use legacy::LegacyParser;
pub use modern::ModernParser;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// The two observed page structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Modern,
    Legacy,
}

impl Layout {
    /// Parser for this layout.
    pub fn parser(self) -> &'static dyn LayoutParser {
        match self {
            Layout::Modern => &ModernParser,
            Layout::Legacy => &LegacyParser,
        }
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layout::Modern => f.write_str("modern"),
            Layout::Legacy => f.write_str("legacy"),
        }
    }
}

/// Turns a content container into raw, unconsolidated reading blocks.
pub trait LayoutParser: Send + Sync {
    /// Whether this parser recognises the container's structure.
    fn detect(&self, container: ElementRef<'_>) -> bool;

    /// Blocks in document order, one per title marker.
    fn parse(&self, container: ElementRef<'_>, rules: &SiglaRules) -> Vec<ReadingBlock>;

    /// Layout name for tracing.
    fn name(&self) -> &str;
}

/// Classify a content container.
///
/// Only the modern markers are probed. Legacy is the fallback for everything
/// else, so [`LegacyParser::detect`] is not consulted here; a container
/// without bold title paragraphs simply parses to no blocks.
pub fn classify_layout(container: ElementRef<'_>) -> Layout {
    if ModernParser.detect(container) {
        Layout::Modern
    } else {
        Layout::Legacy
    }
}

// ---------------------------------------------------------------------------
// Block building (shared by both parsers)
// ---------------------------------------------------------------------------

static EMPHASIS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("em, i, b").expect("valid selector"));

static CLOSING_PHRASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*Oto słowo (Boże|Pańskie)\.?\s*$").expect("valid regex"));

const INTRO_PREFIXES: [&str; 2] = ["Czytanie z ", "Słowa Ewangelii według "];

/// Normalize a raw title: collapse whitespace, uppercase, canonical names.
pub(crate) fn normalize_title(raw: &str) -> String {
    let title = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
    if title.contains("ŚPIEW PRZED EWANGELIĄ") {
        ACCLAMATION.to_string()
    } else if title.contains(PSALM_RESPONSORY) {
        PSALM_RESPONSORY.to_string()
    } else {
        title
    }
}

/// Whether a paragraph carries the canonical closing phrase.
pub(crate) fn has_closing_phrase(text: &str) -> bool {
    text.contains("Oto słowo Boże") || text.contains("Oto słowo Pańskie")
}

/// A reading block under construction.
pub(crate) struct BlockBuilder<'r> {
    block: ReadingBlock,
    fragments: Vec<String>,
    rules: &'r SiglaRules,
}

impl<'r> BlockBuilder<'r> {
    pub(crate) fn new(raw_title: &str, rules: &'r SiglaRules) -> Self {
        Self {
            block: ReadingBlock::titled(normalize_title(raw_title)),
            fragments: Vec::new(),
            rules,
        }
    }

    pub(crate) fn has_sigla(&self) -> bool {
        !self.block.sigla.is_empty()
    }

    /// Set the citation unless one is already present.
    pub(crate) fn offer_sigla(&mut self, text: String) {
        if !self.has_sigla() && !text.is_empty() {
            self.block.sigla = text;
        }
    }

    /// Take `text` as the citation if it passes the heuristic and none is set yet.
    pub(crate) fn try_sigla(&mut self, text: &str) -> bool {
        if self.has_sigla() || !matches_sigla(text, self.rules) {
            return false;
        }
        self.block.sigla = text.trim().to_string();
        true
    }

    /// Append one paragraph: its `<br>` lines stay newline-separated, intro
    /// lines are dropped.
    pub(crate) fn push_paragraph(&mut self, lines: impl IntoIterator<Item = String>) {
        let kept: Vec<String> = lines
            .into_iter()
            .filter(|line| !INTRO_PREFIXES.iter().any(|p| line.starts_with(p)))
            .collect();
        if !kept.is_empty() {
            self.fragments.push(kept.join("\n"));
        }
    }

    /// Classify a body paragraph: the first emphasised run becomes the
    /// description, everything else is body text.
    pub(crate) fn absorb_paragraph(&mut self, el: ElementRef<'_>) {
        if self.block.opis.is_empty() {
            if let Some(emphasis) = el.select(&EMPHASIS).next() {
                let description = inline_text(emphasis);
                if !description.is_empty() {
                    self.block.opis = description;
                    self.push_paragraph(text_lines(el, Some(emphasis)));
                    return;
                }
            }
        }
        self.push_paragraph(text_lines(el, None));
    }

    /// Join paragraphs: verse-like types put each on its own line, prose
    /// paragraphs are joined with spaces and lose the closing phrase.
    pub(crate) fn finish(mut self) -> ReadingBlock {
        if self.block.is_verse_like() {
            self.block.tekst = self.fragments.join("\n");
        } else {
            let prose = self.fragments.join(" ");
            self.block.tekst = CLOSING_PHRASE_RE.replace(&prose, "").trim().to_string();
        }
        self.block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn container(doc: &Html) -> ElementRef<'_> {
        doc.select(&Selector::parse("div.txt__rich-area").unwrap())
            .next()
            .unwrap()
    }

    #[test]
    fn classifies_by_title_markers() {
        let modern = Html::parse_fragment(
            r#"<div class="txt__rich-area"><h3 class="block-title">EWANGELIA</h3><p>x</p></div>"#,
        );
        let legacy = Html::parse_fragment(
            r#"<div class="txt__rich-area"><p><strong>EWANGELIA</strong></p><p>x</p></div>"#,
        );
        assert_eq!(classify_layout(container(&modern)), Layout::Modern);
        assert_eq!(classify_layout(container(&legacy)), Layout::Legacy);
        assert_eq!(Layout::Legacy.parser().name(), "legacy");
        assert!(LegacyParser.detect(container(&legacy)));
        assert!(!LegacyParser.detect(container(&modern)));
    }

    #[test]
    fn title_normalization() {
        assert_eq!(normalize_title("Śpiew przed Ewangelią"), ACCLAMATION);
        assert_eq!(normalize_title("  Psalm   responsoryjny (Ps 23) "), PSALM_RESPONSORY);
        assert_eq!(normalize_title("Pierwsze  czytanie"), "PIERWSZE CZYTANIE");
    }

    #[test]
    fn prose_is_space_joined_without_closing_phrase() {
        let rules = SiglaRules::default();
        let mut builder = BlockBuilder::new("Ewangelia", &rules);
        builder.push_paragraph(vec!["Słowa Ewangelii według świętego Jana".to_string()]);
        builder.push_paragraph(vec![
            "Jezus powiedział:".to_string(),
            "«Ja jestem dobrym pasterzem».".to_string(),
        ]);
        builder.push_paragraph(vec!["Dobry pasterz daje życie.".to_string()]);
        builder.push_paragraph(vec!["Oto słowo Pańskie.".to_string()]);
        let block = builder.finish();
        assert_eq!(
            block.tekst,
            "Jezus powiedział:\n«Ja jestem dobrym pasterzem». Dobry pasterz daje życie."
        );
    }

    #[test]
    fn verse_keeps_line_breaks() {
        let rules = SiglaRules::default();
        let mut builder = BlockBuilder::new("Psalm responsoryjny", &rules);
        builder.push_paragraph(vec!["Pan jest moim pasterzem,".into(), "niczego mi nie braknie.".into()]);
        assert_eq!(
            builder.finish().tekst,
            "Pan jest moim pasterzem,\nniczego mi nie braknie."
        );
    }

    #[test]
    fn first_sigla_wins() {
        let rules = SiglaRules::default();
        let mut builder = BlockBuilder::new("Ewangelia", &rules);
        assert!(builder.try_sigla("J 10, 11-18"));
        assert!(!builder.try_sigla("Mt 5, 1-12"));
        builder.offer_sigla("Łk 2, 1".into());
        assert_eq!(builder.finish().sigla, "J 10, 11-18");
    }
}
