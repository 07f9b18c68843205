//! Reading extraction from liturgy pages.
//!
//! Pure HTML-to-data transformation: locate the article, its heading and the
//! content container, drop decorative widgets, classify the layout, run the
//! matching parser and consolidate the result. No I/O happens here.

pub mod consolidate;
pub mod layouts;
pub mod sigla;
mod text;

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use lekcjonarz_shared::{
    DaySet, LekcjonarzError, ReadingBlock, Result, SiglaRules, StructureFault,
};

pub use consolidate::{CANONICAL_ACCLAMATION, consolidate};
pub use layouts::{Layout, LayoutParser, LegacyParser, ModernParser, classify_layout};
pub use sigla::{is_sigla, matches_sigla};

static DECORATION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        ".content_index, span.content_index_elemenet, .doc_content_video_preview, \
         .content_ext_plugin, span[style*=\"font-size\"]",
    )
    .expect("valid selector")
});
static ARTICLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.cf.txt").expect("valid selector"));
static HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("valid selector"));
static RICH_AREA: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.txt__rich-area").expect("valid selector"));
static PLAIN_AREA: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.txt__content").expect("valid selector"));

/// Raw readings of a single page, before consolidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReadings {
    /// The page heading.
    pub title: String,
    /// Which parser produced the blocks.
    pub layout: Layout,
    /// Blocks in document order.
    pub blocks: Vec<ReadingBlock>,
}

impl PageReadings {
    /// Consolidate the blocks into the output record for `url`.
    pub fn into_day(self, url: impl Into<String>) -> DaySet {
        DaySet {
            url: url.into(),
            tytul_dnia: self.title,
            czytania: consolidate(self.blocks),
        }
    }
}

/// Parse one page into its raw (unconsolidated) reading blocks.
///
/// Missing article, heading or container is a [`LekcjonarzError::Structure`];
/// a page where neither parser finds a title marker is
/// [`LekcjonarzError::ParseEmpty`].
pub fn read_page(html: &str, rules: &SiglaRules) -> Result<PageReadings> {
    let mut doc = Html::parse_document(html);
    strip_decorations(&mut doc);

    let article = doc
        .select(&ARTICLE)
        .next()
        .ok_or(LekcjonarzError::Structure(StructureFault::MissingArticle))?;

    let title = article
        .select(&HEADING)
        .next()
        .map(text::inline_text)
        .filter(|t| !t.is_empty())
        .ok_or(LekcjonarzError::Structure(StructureFault::MissingTitle))?;

    let container = content_container(article)
        .ok_or(LekcjonarzError::Structure(StructureFault::MissingContainer))?;

    let layout = classify_layout(container);
    let parser = layout.parser();
    let blocks: Vec<ReadingBlock> = parser
        .parse(container, rules)
        .into_iter()
        .filter(|b| !b.typ.trim().is_empty())
        .collect();

    debug!(%title, layout = parser.name(), blocks = blocks.len(), "page parsed");

    if blocks.is_empty() {
        return Err(LekcjonarzError::ParseEmpty);
    }

    Ok(PageReadings {
        title,
        layout,
        blocks,
    })
}

/// Parse and consolidate one page into its output record.
pub fn extract_day(url: &str, html: &str, rules: &SiglaRules) -> Result<DaySet> {
    read_page(html, rules).map(|page| page.into_day(url))
}

fn content_container(article: ElementRef<'_>) -> Option<ElementRef<'_>> {
    article
        .select(&RICH_AREA)
        .next()
        .or_else(|| article.select(&PLAIN_AREA).next())
}

fn strip_decorations(doc: &mut Html) {
    let ids: Vec<_> = doc.select(&DECORATION).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        let path = format!("{}/../../../fixtures/html/{name}", env!("CARGO_MANIFEST_DIR"));
        std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("fixture {path}: {e}"))
    }

    fn rules() -> SiglaRules {
        SiglaRules::default()
    }

    #[test]
    fn modern_fixture_extracts_full_day() {
        let day = extract_day("https://liturgia.wiara.pl/doc/1", &fixture("modern.html"), &rules())
            .unwrap();

        assert_eq!(day.tytul_dnia, "I Niedziela Adwentu, rok A");
        let types: Vec<&str> = day.czytania.iter().map(|b| b.typ.as_str()).collect();
        assert_eq!(
            types,
            vec![
                "PIERWSZE CZYTANIE",
                "PSALM RESPONSORYJNY",
                "DRUGIE CZYTANIE",
                "AKLAMACJA",
                "EWANGELIA"
            ]
        );

        let first = &day.czytania[0];
        assert_eq!(first.sigla, "Iz 2, 1-5");
        assert_eq!(first.opis, "Pokój królestwa Bożego");
        assert!(!first.tekst.contains("Oto słowo Boże"));
        assert!(!first.tekst.contains("Czytanie z Księgi"));

        let psalm = &day.czytania[1];
        assert_eq!(psalm.sigla, "Ps 122, 1-2. 4-5. 6-7. 8-9");
        assert!(psalm.tekst.contains('\n'));

        let acclamation = &day.czytania[3];
        assert_eq!(acclamation.opis, CANONICAL_ACCLAMATION);
        assert_eq!(
            acclamation.tekst,
            "Okaż nam, Panie, łaskę swoją\ni daj nam swoje zbawienie."
        );

        let gospel = &day.czytania[4];
        assert_eq!(gospel.sigla, "Mt 24, 37-44");
        assert!(!gospel.tekst.contains("Słowa Ewangelii według"));
        assert!(!gospel.tekst.contains("Spis treści"));
    }

    #[test]
    fn legacy_fixture_extracts_full_day() {
        let page = read_page(&fixture("legacy.html"), &rules()).unwrap();
        assert_eq!(page.layout, Layout::Legacy);
        assert_eq!(page.title, "Wtorek I tygodnia Adwentu");

        let day = extract_day("https://liturgia.wiara.pl/doc/2", &fixture("legacy.html"), &rules())
            .unwrap();
        let types: Vec<&str> = day.czytania.iter().map(|b| b.typ.as_str()).collect();
        assert_eq!(
            types,
            vec!["PIERWSZE CZYTANIE", "PSALM RESPONSORYJNY", "AKLAMACJA", "EWANGELIA"]
        );
        assert_eq!(day.czytania[0].sigla, "Iz 11, 1-10");
        assert_eq!(day.czytania[1].sigla, "Ps 72, 1-2. 7-8. 12-13. 17");
        assert_eq!(day.czytania[3].sigla, "Łk 10, 21-24");
        assert!(!day.czytania[0].tekst.contains("Komentarz"));
        assert_eq!(
            day.czytania[0].tekst,
            "Wyrośnie różdżka z pnia Jessego,\nwypuści się odrośl z jego korzeni."
        );
        assert_eq!(page.into_day("https://liturgia.wiara.pl/doc/2"), day);
    }

    #[test]
    fn output_is_deterministic() {
        let html = fixture("modern.html");
        let a = serde_json::to_string(&extract_day("u", &html, &rules()).unwrap()).unwrap();
        let b = serde_json::to_string(&extract_day("u", &html, &rules()).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_article_is_structure_error() {
        let err = read_page("<html><body><p>nic</p></body></html>", &rules()).unwrap_err();
        assert!(matches!(
            err,
            LekcjonarzError::Structure(StructureFault::MissingArticle)
        ));
    }

    #[test]
    fn missing_heading_is_structure_error() {
        let html = r#"<div class="cf txt"><div class="txt__content"><p>x</p></div></div>"#;
        let err = read_page(html, &rules()).unwrap_err();
        assert!(matches!(
            err,
            LekcjonarzError::Structure(StructureFault::MissingTitle)
        ));
    }

    #[test]
    fn missing_container_is_structure_error() {
        let html = r#"<div class="cf txt"><h1>Dzień</h1><p>x</p></div>"#;
        let err = read_page(html, &rules()).unwrap_err();
        assert!(matches!(
            err,
            LekcjonarzError::Structure(StructureFault::MissingContainer)
        ));
    }

    #[test]
    fn no_markers_is_parse_empty() {
        let html = r#"<div class="cf txt"><h1>Dzień</h1>
            <div class="txt__rich-area"><p>Tylko tekst.</p></div></div>"#;
        let err = read_page(html, &rules()).unwrap_err();
        assert!(matches!(err, LekcjonarzError::ParseEmpty));
        assert!(err.is_job_scoped());
    }

    #[test]
    fn decorations_removed_before_parsing() {
        let html = r#"<div class="cf txt"><h1>Dzień</h1>
            <div class="txt__rich-area">
              <div class="content_ext_plugin"><h3 class="block-title">Wideo</h3></div>
              <p><strong>Ewangelia</strong><br>J 1, 1-5</p>
              <p>Na początku było Słowo<span style="font-size: 10px"> (przypis)</span>.</p>
            </div></div>"#;
        let page = read_page(html, &rules()).unwrap();
        assert_eq!(page.layout, Layout::Legacy);
        assert_eq!(page.blocks.len(), 1);
        assert_eq!(page.blocks[0].tekst, "Na początku było Słowo.");
    }
}
