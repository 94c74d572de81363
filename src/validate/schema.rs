//! Strict segment-shape validation: the closed segment-type enum plus
//! per-type shape rules, itemized per segment index.

use crate::corpus::{CorpusStore, ManifestEntry, Segment};
use crate::validate::{IntegrityReport, Issue, IssueCode};

/// Closed set of persisted segment types: the six block types plus `poetry`,
/// which only exists on disk (the pipeline renders poetry line by line).
pub const SEGMENT_TYPES: &[&str] = &[
    "paragraph",
    "arabic_block",
    "heading",
    "footnote",
    "label",
    "divider",
    "poetry",
];

pub fn validate_corpus(store: &CorpusStore) -> IntegrityReport {
    let mut report = IntegrityReport::default();
    for entry in &store.manifest.books {
        report.merge(validate_book(store, entry));
    }
    report.sort();
    report
}

pub fn validate_book(store: &CorpusStore, entry: &ManifestEntry) -> IntegrityReport {
    let mut report = IntegrityReport::default();

    let page_paths = match store.page_paths(entry) {
        Ok(paths) => paths,
        Err(_) => return report, // no pages directory; integrity check owns that defect
    };

    for path in &page_paths {
        let page = match store.load_page(path) {
            Ok(page) => page,
            Err(e) => {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                report.push(
                    Issue::error(
                        IssueCode::UnparsablePage,
                        &entry.book_id,
                        format!("unparsable page file: {e}"),
                    )
                    .on_page(stem),
                );
                continue;
            }
        };

        for (index, segment) in page.segments.iter().enumerate() {
            check_segment(&mut report, &entry.book_id, &page.page_id, index, segment);
        }
    }

    report
}

fn check_segment(
    report: &mut IntegrityReport,
    book_id: &str,
    page_id: &str,
    index: usize,
    segment: &Segment,
) {
    let push = |report: &mut IntegrityReport, code, detail: String| {
        report.push(
            Issue::error(code, book_id, detail)
                .on_page(page_id)
                .on_block(&segment.segment_id),
        );
    };

    if !SEGMENT_TYPES.contains(&segment.segment_type.as_str()) {
        push(
            report,
            IssueCode::UnknownSegmentType,
            format!("segment {}: unknown type '{}'", index, segment.segment_type),
        );
        return;
    }

    match segment.segment_type.as_str() {
        "poetry" => {
            let lines = segment.lines.as_deref().unwrap_or_default();
            if lines.is_empty() {
                push(
                    report,
                    IssueCode::MissingPoetryLines,
                    format!("segment {index}: poetry segment has no lines"),
                );
                return;
            }
            for (line_index, line) in lines.iter().enumerate() {
                let empty = line.text.as_deref().map_or(true, |t| t.trim().is_empty());
                if empty {
                    push(
                        report,
                        IssueCode::EmptyPoetryLine,
                        format!("segment {index} line {line_index}: empty text"),
                    );
                }
            }
        }
        // Dividers carry no text.
        "divider" => {}
        _ => {
            let empty = segment.text.as_deref().map_or(true, |t| t.trim().is_empty());
            if empty {
                push(
                    report,
                    IssueCode::MissingSegmentText,
                    format!(
                        "segment {}: '{}' segment has no text",
                        index, segment.segment_type
                    ),
                );
            }
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::PoetryLine;
    use std::path::Path;

    fn segment(segment_type: &str, text: Option<&str>) -> Segment {
        Segment {
            segment_id: "seg-1".into(),
            segment_type: segment_type.into(),
            text: text.map(String::from),
            lang: None,
            lines: None,
        }
    }

    fn run(seg: &Segment) -> IntegrityReport {
        let mut report = IntegrityReport::default();
        check_segment(&mut report, "sozler", "0001", 0, seg);
        report
    }

    #[test]
    fn poetry_with_one_empty_line_is_exactly_one_error() {
        let mut seg = segment("poetry", None);
        seg.lines = Some(vec![
            PoetryLine {
                text: Some("a".into()),
            },
            PoetryLine { text: None },
        ]);
        let report = run(&seg);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, IssueCode::EmptyPoetryLine);
        assert!(report.errors[0].detail.contains("line 1"));
    }

    #[test]
    fn poetry_without_lines() {
        let report = run(&segment("poetry", None));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, IssueCode::MissingPoetryLines);
    }

    #[test]
    fn unknown_type_is_flagged_once() {
        let report = run(&segment("verse", Some("metin")));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, IssueCode::UnknownSegmentType);
    }

    #[test]
    fn divider_needs_no_text() {
        assert!(run(&segment("divider", None)).is_clean());
    }

    #[test]
    fn paragraph_needs_text() {
        assert!(run(&segment("paragraph", Some("metin"))).is_clean());
        let report = run(&segment("paragraph", Some("   ")));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, IssueCode::MissingSegmentText);
    }

    #[test]
    fn bad_fixture_totals() {
        let store = CorpusStore::open(Path::new("tests/fixtures/corpus_bad")).unwrap();
        let report = validate_corpus(&store);
        let codes: Vec<IssueCode> = report.errors.iter().map(|i| i.code).collect();
        assert!(codes.contains(&IssueCode::EmptyPoetryLine));
        assert!(codes.contains(&IssueCode::UnknownSegmentType));
        // the broken page file in lemalar surfaces here too
        assert!(codes.contains(&IssueCode::UnparsablePage));
    }
}
