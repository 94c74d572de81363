//! Block classification over normalized text.
//!
//! All heuristics are driven by the declarative tables at the top of this
//! module (Unicode ranges, marker sets, lexicons, thresholds) so they can be
//! tuned per corpus without touching control flow.

use std::sync::LazyLock;

use regex::Regex;

use crate::corpus::BlockType;

/// Arabic script ranges counted by the Arabic-heavy rule.
pub const ARABIC_RANGES: &[(u32, u32)] = &[
    (0x0600, 0x06FF),
    (0x0750, 0x077F),
    (0x08A0, 0x08FF),
    (0xFB50, 0xFDFF),
    (0xFE70, 0xFEFF),
];

/// Harakah (vowel diacritic) range, fathatan through sukun.
pub const HARAKAH_RANGE: (u32, u32) = (0x064B, 0x0652);

/// Qur'an structure markers: ornate parentheses, end-of-ayah, rub el hizb.
/// The escape hatch for undiacritized Qur'anic excerpts.
pub const QURAN_MARKERS: &[char] = &['\u{FD3F}', '\u{FD3E}', '\u{06DD}', '\u{06DE}'];

/// Ordinal words used in section titles, base and tens forms.
pub const ORDINAL_WORDS: &[&str] = &[
    "Birinci", "İkinci", "Üçüncü", "Dördüncü", "Beşinci", "Altıncı", "Yedinci", "Sekizinci",
    "Dokuzuncu", "Onuncu", "Yirminci", "Otuzuncu",
];

/// Domain nouns that follow an ordinal in a section title.
pub const SECTION_NOUNS: &[&str] = &[
    "Söz", "Mektup", "Lem'a", "Şua", "Mesele", "Makam", "Nokta", "Nükte", "Hakikat", "Pencere",
    "Bab", "Kısım",
];

const ARABIC_RATIO_MIN: f64 = 0.35;
const HARAKAH_RATIO_MIN: f64 = 0.08;
const ARABIC_CHARS_MIN: usize = 12;
const ARABIC_WORDS_MIN: usize = 2;
const HEADING_MAX_CHARS: usize = 60;

static HEADING_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    // "Birinci Söz", "Yirmi İkinci Mektup", "On Dördüncü Lem'a" ...
    let ordinals = ORDINAL_WORDS.join("|");
    let nouns = SECTION_NOUNS
        .iter()
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"^(?:(?:On|Yirmi|Otuz|Kırk)\s+)?(?:{ordinals})\s+(?:{nouns})\b"
    ))
    .unwrap()
});

/// Assign a semantic type to normalized text. An explicit valid type from the
/// source transcript wins over the heuristics.
pub fn classify(text: &str, explicit: Option<BlockType>) -> BlockType {
    if let Some(t) = explicit {
        return t;
    }
    if is_arabic_heavy(text) {
        return BlockType::ArabicBlock;
    }
    BlockType::Paragraph
}

pub fn is_arabic(c: char) -> bool {
    let cp = c as u32;
    ARABIC_RANGES.iter().any(|&(lo, hi)| cp >= lo && cp <= hi)
}

pub fn is_harakah(c: char) -> bool {
    let cp = c as u32;
    cp >= HARAKAH_RANGE.0 && cp <= HARAKAH_RANGE.1
}

/// Compound Arabic-heavy rule. The ratio threshold alone would misclassify
/// short inline Arabic phrases embedded in Turkish prose, so a diacritic
/// density (or Qur'an marker) condition and a minimum-mass condition are
/// required as well.
pub fn is_arabic_heavy(text: &str) -> bool {
    let letters = text.chars().filter(|c| !c.is_whitespace()).count();
    if letters == 0 {
        return false;
    }

    let arabic_chars = text.chars().filter(|&c| is_arabic(c)).count();
    let harakah = text.chars().filter(|&c| is_harakah(c)).count();
    let arabic_words = text
        .split_whitespace()
        .filter(|w| {
            let total = w.chars().count();
            let arabic = w.chars().filter(|&c| is_arabic(c)).count();
            arabic * 2 > total
        })
        .count();

    let arabic_ratio = arabic_chars as f64 / letters as f64;
    let harakah_ratio = harakah as f64 / letters as f64;
    let has_marker = text.chars().any(|c| QURAN_MARKERS.contains(&c));

    arabic_ratio >= ARABIC_RATIO_MIN
        && (harakah_ratio >= HARAKAH_RATIO_MIN || has_marker)
        && (arabic_chars >= ARABIC_CHARS_MIN || arabic_words >= ARABIC_WORDS_MIN)
}

/// Heading heuristics, used by the content-quality validator (not by the
/// ingestion default path): ordinal + section-noun title, trailing colon, or
/// a short ALL-CAPS line.
pub fn looks_like_heading(text: &str) -> bool {
    if text.is_empty() || text.chars().count() > HEADING_MAX_CHARS {
        return false;
    }
    if HEADING_TITLE_RE.is_match(text) {
        return true;
    }
    if text.ends_with(':') && !text.contains('\n') {
        return true;
    }
    let mut has_alpha = false;
    let all_caps = text.chars().all(|c| {
        if c.is_alphabetic() {
            has_alpha = true;
            c.is_uppercase()
        } else {
            true
        }
    });
    all_caps && has_alpha
}

// ── Tests ──
