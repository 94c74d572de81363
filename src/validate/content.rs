//! Heuristic content-quality scan over persisted pages.
//!
//! Runs the classifier over what is already on disk (not a fresh ingestion)
//! and flags two known segmentation regressions without fixing them. Output
//! is a standing report artifact, warnings only; nothing here blocks a build
//! gate unless the caller opts in with the critical set.

use std::path::Path;

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::corpus::{BlockType, CorpusStore, ManifestEntry, Segment};
use crate::pipeline::classify;
use crate::pipeline::glue;
use crate::validate::IssueCode;

/// Issue types that fail a `--ci` run.
pub const CRITICAL_CODES: &[IssueCode] =
    &[IssueCode::FragmentedParagraph, IssueCode::OrphanConjunction];

/// A non-Arabic paragraph this short between two Arabic blocks is almost
/// always a segmentation artifact, not real prose.
const FRAGMENT_MAX_CHARS: usize = 80;

const EXCERPT_MAX_CHARS: usize = 120;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedSection {
    pub book_id: String,
    pub page_id: String,
    pub block_id: String,
    pub issue_type: IssueCode,
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub scanned: usize,
    pub flagged: usize,
    pub critical: usize,
    pub warnings: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentReport {
    pub generated_at: String,
    pub schema_version: u32,
    pub summary: ContentSummary,
    pub sections: Vec<FlaggedSection>,
}

impl ContentReport {
    pub fn has_critical(&self) -> bool {
        self.summary.critical > 0
    }
}

/// Scan books (all, or one selected by ID). Books are disjoint, so the scan
/// runs per-book in parallel; the final list is sorted by (bookId, pageId,
/// blockId) so output stays deterministic.
pub fn scan_corpus(store: &CorpusStore, book: Option<&str>, show_progress: bool) -> ContentReport {
    let entries: Vec<&ManifestEntry> = store
        .manifest
        .books
        .iter()
        .filter(|e| book.map_or(true, |id| e.book_id == id))
        .collect();

    let pb = if show_progress && entries.len() > 1 {
        let pb = ProgressBar::new(entries.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} books")
                .expect("static template"),
        );
        Some(pb)
    } else {
        None
    };

    let per_book: Vec<(Vec<FlaggedSection>, usize)> = entries
        .par_iter()
        .map(|entry| {
            let result = scan_book(store, entry);
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            result
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let mut sections = Vec::new();
    let mut scanned = 0;
    for (flagged, count) in per_book {
        sections.extend(flagged);
        scanned += count;
    }
    sections.sort_by(|a, b| {
        (&a.book_id, &a.page_id, &a.block_id).cmp(&(&b.book_id, &b.page_id, &b.block_id))
    });

    let critical = sections
        .iter()
        .filter(|s| CRITICAL_CODES.contains(&s.issue_type))
        .count();
    let flagged = sections.len();
    info!("content scan: {} segments, {} flagged", scanned, flagged);

    ContentReport {
        generated_at: Utc::now().to_rfc3339(),
        schema_version: store.manifest.schema_version,
        summary: ContentSummary {
            scanned,
            flagged,
            critical,
            warnings: flagged - critical,
        },
        sections,
    }
}

/// Returns flagged sections and the number of segments scanned.
fn scan_book(store: &CorpusStore, entry: &ManifestEntry) -> (Vec<FlaggedSection>, usize) {
    let mut flagged = Vec::new();
    let mut scanned = 0;

    let page_paths = store.page_paths(entry).unwrap_or_default();
    for path in &page_paths {
        // Unreadable pages are the integrity validator's concern.
        let Ok(page) = store.load_page(path) else {
            continue;
        };

        let types: Vec<BlockType> = page.segments.iter().map(effective_type).collect();
        scanned += page.segments.len();

        for (i, segment) in page.segments.iter().enumerate() {
            let text = segment.text.as_deref().unwrap_or_default();

            if is_orphan_conjunction(types[i], text) {
                flagged.push(flag(entry, &page.page_id, segment, IssueCode::OrphanConjunction));
            } else if i > 0
                && i + 1 < types.len()
                && is_fragment_between(types[i - 1], types[i], types[i + 1], text)
            {
                flagged.push(flag(
                    entry,
                    &page.page_id,
                    segment,
                    IssueCode::FragmentedParagraph,
                ));
            }
        }
    }

    (flagged, scanned)
}

/// Persisted type when valid, otherwise reclassified from the text.
fn effective_type(segment: &Segment) -> BlockType {
    BlockType::from_label(&segment.segment_type)
        .unwrap_or_else(|| classify::classify(segment.text.as_deref().unwrap_or_default(), None))
}

/// A segment whose entire text is one connective word: the glue merger was
/// bypassed somewhere upstream.
fn is_orphan_conjunction(block_type: BlockType, text: &str) -> bool {
    block_type == BlockType::Paragraph
        && text.split_whitespace().count() == 1
        && glue::is_glue(text)
}

/// A short non-Arabic paragraph sandwiched directly between two Arabic
/// blocks. Lines that read as section titles are exempt: an unlabeled
/// heading between two Arabic quotations is legitimate structure.
fn is_fragment_between(prev: BlockType, current: BlockType, next: BlockType, text: &str) -> bool {
    current == BlockType::Paragraph
        && prev == BlockType::ArabicBlock
        && next == BlockType::ArabicBlock
        && !text.is_empty()
        && text.chars().count() <= FRAGMENT_MAX_CHARS
        && !classify::is_arabic_heavy(text)
        && !classify::looks_like_heading(text)
}

fn flag(entry: &ManifestEntry, page_id: &str, segment: &Segment, code: IssueCode) -> FlaggedSection {
    let text = segment.text.as_deref().unwrap_or_default();
    FlaggedSection {
        book_id: entry.book_id.clone(),
        page_id: page_id.to_string(),
        block_id: segment.segment_id.clone(),
        issue_type: code,
        text: excerpt(text),
    }
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_MAX_CHARS {
        text.to_string()
    } else {
        text.chars().take(EXCERPT_MAX_CHARS).collect()
    }
}

/// Write the standing artifact (default `FLAGGED_SECTIONS.json`).
pub fn write_report(report: &ContentReport, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn bad_store() -> CorpusStore {
        CorpusStore::open(Path::new("tests/fixtures/corpus_bad")).unwrap()
    }

    #[test]
    fn clean_corpus_has_no_flags() {
        let store = CorpusStore::open(Path::new("tests/fixtures/corpus_ok")).unwrap();
        let report = scan_corpus(&store, None, false);
        assert_eq!(report.summary.flagged, 0);
        assert!(!report.has_critical());
        assert!(report.summary.scanned > 0);
    }

    #[test]
    fn flags_orphan_conjunction_and_fragment() {
        let report = scan_corpus(&bad_store(), None, false);
        let kinds: Vec<IssueCode> = report.sections.iter().map(|s| s.issue_type).collect();
        assert!(kinds.contains(&IssueCode::OrphanConjunction));
        assert!(kinds.contains(&IssueCode::FragmentedParagraph));
        assert_eq!(report.summary.critical, report.summary.flagged);
        assert_eq!(report.summary.warnings, 0);
    }

    #[test]
    fn heading_between_arabic_blocks_is_not_a_fragment() {
        let sandwich = |text| {
            is_fragment_between(
                BlockType::ArabicBlock,
                BlockType::Paragraph,
                BlockType::ArabicBlock,
                text,
            )
        };
        assert!(sandwich("kardeşim"));
        assert!(!sandwich("Birinci Söz"));
        assert!(!sandwich("İHTAR"));
    }

    #[test]
    fn book_filter_limits_scan() {
        let report = scan_corpus(&bad_store(), Some("mektubat"), false);
        assert_eq!(report.summary.flagged, 0);
        assert!(report.summary.scanned > 0);
    }

    #[test]
    fn sections_are_sorted() {
        let report = scan_corpus(&bad_store(), None, false);
        let keys: Vec<(&str, &str)> = report
            .sections
            .iter()
            .map(|s| (s.book_id.as_str(), s.page_id.as_str()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn artifact_round_trips_expected_shape() {
        let report = scan_corpus(&bad_store(), None, false);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("FLAGGED_SECTIONS.json");
        write_report(&report, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["generatedAt"].is_string());
        assert!(value["summary"]["scanned"].as_u64().unwrap() > 0);
        let first = &value["sections"][0];
        assert!(first["issueType"].is_string());
        assert!(first["bookId"].is_string());
    }
}
