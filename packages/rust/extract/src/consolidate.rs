//! Reading consolidation.
//!
//! Every block first gets a line cleanup: an "albo: Alleluja" alternative
//! moves from the text into the description, and short all-caps lines in
//! psalms are title-cased. Contiguous psalm and refrain fragments then
//! collapse into one `PSALM RESPONSORYJNY` block, and acclamation bodies lose
//! their "Alleluja" lines in favour of a canonical description.

use std::sync::LazyLock;

use regex::Regex;

use lekcjonarz_shared::{ACCLAMATION, PSALM_RESPONSORY, ReadingBlock};

/// Description every normalized acclamation carries.
pub const CANONICAL_ACCLAMATION: &str = "Aklamacja: Alleluja, alleluja, alleluja.";

/// Suffix appended to the description when the text offers "albo: Alleluja".
const ALTERNATIVE_ALLELUIA: &str = "(albo: Alleluja)";

/// Psalm lines with fewer words than this are candidates for title-casing.
const SHORT_LINE_WORDS: usize = 5;

static ALLELUIA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(Aklamacja:?\s*)?(Alleluja,?\s*)+(\.)?$").expect("valid regex")
});

/// Consolidate one page's (or one group's concatenated) raw blocks.
///
/// Idempotent: consolidating already-consolidated output changes nothing.
pub fn consolidate(blocks: Vec<ReadingBlock>) -> Vec<ReadingBlock> {
    let mut out = Vec::with_capacity(blocks.len());
    let mut psalm: Option<ReadingBlock> = None;

    for mut block in blocks {
        if block.typ.trim().is_empty() {
            continue;
        }
        clean_lines(&mut block);
        if block.typ == ACCLAMATION {
            normalize_acclamation(&mut block);
        }

        if block.is_psalm_part() {
            match psalm.as_mut() {
                Some(open) => merge_into(open, block),
                None => psalm = Some(open_psalm(block)),
            }
        } else {
            out.extend(psalm.take());
            out.push(block);
        }
    }

    out.extend(psalm);
    out
}

/// Per-block line pass: drop the "albo: Alleluja" alternative into the
/// description and title-case short shouted lines of psalm fragments
/// (refrains included, since they end up in the psalm).
fn clean_lines(block: &mut ReadingBlock) {
    let psalm = block.is_psalm_part();
    let mut alternative = false;
    let lines: Vec<String> = block
        .tekst
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            let hit = line.contains("albo: Alleluja");
            alternative |= hit;
            !hit
        })
        .map(|line| {
            if psalm {
                title_case_short(line)
            } else {
                line.to_string()
            }
        })
        .collect();

    block.tekst = lines.join("\n");
    if alternative && !block.opis.ends_with(ALTERNATIVE_ALLELUIA) {
        if !block.opis.is_empty() {
            block.opis.push(' ');
        }
        block.opis.push_str(ALTERNATIVE_ALLELUIA);
    }
}

/// Title-case `line` when it is all uppercase and shorter than
/// [`SHORT_LINE_WORDS`] words; otherwise return it unchanged.
fn title_case_short(line: &str) -> String {
    let shouted = line.chars().any(char::is_uppercase) && !line.chars().any(char::is_lowercase);
    if !shouted || line.split_whitespace().count() >= SHORT_LINE_WORDS {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len());
    let mut word_start = true;
    for c in line.chars() {
        if word_start {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        word_start = !c.is_alphabetic();
    }
    out
}

fn open_psalm(block: ReadingBlock) -> ReadingBlock {
    let tekst = fragment_text(&block);
    ReadingBlock {
        typ: PSALM_RESPONSORY.to_string(),
        sigla: block.sigla,
        opis: block.opis,
        tekst,
    }
}

fn merge_into(psalm: &mut ReadingBlock, block: ReadingBlock) {
    let text = fragment_text(&block);
    if psalm.sigla.is_empty() {
        psalm.sigla = block.sigla;
    }
    if psalm.opis.is_empty() {
        psalm.opis = block.opis;
    }
    if !text.is_empty() {
        if !psalm.tekst.is_empty() {
            psalm.tekst.push('\n');
        }
        psalm.tekst.push_str(&text);
    }
}

/// Body contributed by a fragment. A refrain whose title carries the refrain
/// words ("REFREN: PAN MNIE PROWADZI") contributes that title too, cased
/// like any other psalm line.
fn fragment_text(block: &ReadingBlock) -> String {
    let label = refrain_label(&block.typ).map(title_case_short);
    match (label, block.tekst.is_empty()) {
        (Some(label), true) => label,
        (Some(label), false) => format!("{label}\n{}", block.tekst),
        (None, _) => block.tekst.clone(),
    }
}

fn refrain_label(typ: &str) -> Option<&str> {
    if !typ.to_uppercase().starts_with("REFREN") {
        return None;
    }
    let words = typ.get("REFREN".len()..)?.trim().trim_start_matches(':').trim();
    (!words.is_empty()).then_some(typ.trim())
}

fn normalize_acclamation(block: &mut ReadingBlock) {
    let mut matched = false;
    let kept: Vec<&str> = block
        .tekst
        .lines()
        .filter(|line| {
            let hit = ALLELUIA_RE.is_match(line.trim());
            matched |= hit;
            !hit
        })
        .collect();

    if matched {
        block.opis = CANONICAL_ACCLAMATION.to_string();
        block.tekst = kept.join("\n").trim().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(typ: &str, sigla: &str, tekst: &str) -> ReadingBlock {
        ReadingBlock {
            typ: typ.into(),
            sigla: sigla.into(),
            opis: String::new(),
            tekst: tekst.into(),
        }
    }

    #[test]
    fn psalm_run_collapses_to_one_block() {
        let out = consolidate(vec![
            block("PIERWSZE CZYTANIE", "Iz 2, 1-5", "Widzenie."),
            block("PSALM RESPONSORYJNY", "", "Ucieszyłem się."),
            block("REFREN", "Ps 122, 1", "Idźmy z radością."),
            block("PSALM", "Ps 122, 2", "Już stoją nasze stopy."),
            block("EWANGELIA", "Mt 24, 37-44", "Czuwajcie."),
        ]);

        let types: Vec<&str> = out.iter().map(|b| b.typ.as_str()).collect();
        assert_eq!(types, vec!["PIERWSZE CZYTANIE", PSALM_RESPONSORY, "EWANGELIA"]);
        assert_eq!(out[1].sigla, "Ps 122, 1");
        assert_eq!(
            out[1].tekst,
            "Ucieszyłem się.\nIdźmy z radością.\nJuż stoją nasze stopy."
        );
    }

    #[test]
    fn trailing_psalm_flushed_once() {
        let out = consolidate(vec![
            block("EWANGELIA", "", "x"),
            block("REFREN:", "", "a"),
            block("PSALM", "", "b"),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].typ, PSALM_RESPONSORY);
        assert_eq!(out[1].tekst, "a\nb");
    }

    #[test]
    fn separate_runs_stay_separate() {
        let out = consolidate(vec![
            block("PSALM", "", "a"),
            block("EWANGELIA", "", "x"),
            block("PSALM", "", "b"),
        ]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[2].tekst, "b");
    }

    #[test]
    fn refrain_words_in_title_are_kept() {
        let out = consolidate(vec![
            block("PSALM RESPONSORYJNY", "Ps 23, 1-6", "Pan jest moim pasterzem."),
            block("REFREN: PAN MNIE PROWADZI", "", "Niczego mi nie braknie."),
        ]);
        assert_eq!(
            out[0].tekst,
            "Pan jest moim pasterzem.\nRefren: Pan Mnie Prowadzi\nNiczego mi nie braknie."
        );
    }

    #[test]
    fn acclamation_is_canonicalized() {
        let mut input = block(
            ACCLAMATION,
            "J 10, 27",
            "Aklamacja: Alleluja, alleluja, alleluja.\nBłogosławieni, którzy...",
        );
        input.opis = "Śpiew".into();
        let out = consolidate(vec![input]);
        assert_eq!(out[0].opis, CANONICAL_ACCLAMATION);
        assert_eq!(out[0].tekst, "Błogosławieni, którzy...");
    }

    #[test]
    fn acclamation_without_alleluia_untouched() {
        let input = block(ACCLAMATION, "", "Chwała Tobie, Słowo Boże.");
        let out = consolidate(vec![input.clone()]);
        assert_eq!(out[0], input);
    }

    #[test]
    fn consolidation_is_idempotent() {
        let input = vec![
            block("PSALM RESPONSORYJNY", "", "a"),
            block("REFREN: SŁOWA", "Ps 1, 1", "b"),
            block(ACCLAMATION, "", "Alleluja, alleluja, alleluja.\nWerset."),
            block("EWANGELIA", "", "x"),
        ];
        let once = consolidate(input);
        let twice = consolidate(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn alternative_alleluia_moves_to_description() {
        let mut input = block(
            "PSALM RESPONSORYJNY",
            "Ps 118, 1-2",
            "Dziękujcie Panu, bo jest dobry.\nalbo: Alleluja.",
        );
        input.opis = "Refren:".into();
        let out = consolidate(vec![input]);
        assert_eq!(out[0].tekst, "Dziękujcie Panu, bo jest dobry.");
        assert_eq!(out[0].opis, "Refren: (albo: Alleluja)");

        let bare = consolidate(vec![block("PSALM", "", "a\nalbo: Alleluja.")]);
        assert_eq!(bare[0].opis, "(albo: Alleluja)");
        assert_eq!(consolidate(bare.clone()), bare);
    }

    #[test]
    fn short_shouted_psalm_lines_are_title_cased() {
        let out = consolidate(vec![
            block(
                "PSALM RESPONSORYJNY",
                "",
                "PAN MOIM PASTERZEM\nNICZEGO MI NIE BRAKNIE, PANIE BOŻE\nŚPIEWAJCIE PANU",
            ),
            block("REFREN", "", "ALLELUJA"),
            block("EWANGELIA", "", "AMEN"),
        ]);
        assert_eq!(
            out[0].tekst,
            "Pan Moim Pasterzem\nNICZEGO MI NIE BRAKNIE, PANIE BOŻE\nŚpiewajcie Panu\nAlleluja"
        );
        assert_eq!(out[1].tekst, "AMEN");
    }

    #[test]
    fn title_case_rules() {
        assert_eq!(title_case_short("BÓG-CZŁOWIEK ŻYJE"), "Bóg-Człowiek Żyje");
        assert_eq!(title_case_short("Pan jest"), "Pan jest");
        assert_eq!(title_case_short("123"), "123");
    }

    #[test]
    fn blank_types_dropped() {
        let out = consolidate(vec![block("  ", "", "x"), block("EWANGELIA", "", "y")]);
        assert_eq!(out.len(), 1);
    }
}
