//! Referential integrity checks over the persisted corpus tree. Batch, read
//! only, independent of any live ingestion run.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::corpus::{CorpusStore, ManifestEntry};
use crate::validate::{IntegrityReport, Issue, IssueCode};

/// Validate every book the manifest declares. All checks run to completion;
/// the report is sorted for deterministic output.
pub fn validate_corpus(store: &CorpusStore) -> IntegrityReport {
    let mut report = IntegrityReport::default();
    for entry in &store.manifest.books {
        report.merge(validate_book(store, entry));
    }
    report.sort();
    report
}

/// Validate one book: book.json presence and identity, page-file count,
/// per-page section/book references, segment ID uniqueness, section spans.
pub fn validate_book(store: &CorpusStore, entry: &ManifestEntry) -> IntegrityReport {
    let mut report = IntegrityReport::default();

    let book = match store.load_book(entry) {
        Ok(book) => book,
        Err(e) => {
            warn!("{}: unreadable book.json: {}", entry.book_id, e);
            report.push(Issue::error(
                IssueCode::MissingBook,
                &entry.book_id,
                format!("book.json missing or unreadable: {e}"),
            ));
            return report;
        }
    };

    if book.book_id != entry.book_id {
        report.push(Issue::error(
            IssueCode::BookIdMismatch,
            &entry.book_id,
            format!(
                "book.json declares '{}' but manifest declares '{}'",
                book.book_id, entry.book_id
            ),
        ));
    }

    let page_paths = match store.page_paths(entry) {
        Ok(paths) => paths,
        Err(e) => {
            warn!("{}: unreadable pages directory: {}", entry.book_id, e);
            Vec::new()
        }
    };
    // Non-page .json files do not count toward page_count, but they are
    // suspicious enough to surface.
    for stray in store.stray_page_files(entry).unwrap_or_default() {
        let name = stray
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        report.push(Issue::warning(
            IssueCode::StrayPageFile,
            &entry.book_id,
            format!("'{name}' in pages/ does not match the <nnnn>.json naming scheme"),
        ));
    }

    if page_paths.len() as u32 != book.page_count {
        report.push(Issue::error(
            IssueCode::PageCountMismatch,
            &entry.book_id,
            format!(
                "book.json declares {} pages, found {} page files",
                book.page_count,
                page_paths.len()
            ),
        ));
    }

    // sections.json is optional; when absent, the dangling-reference check is
    // skipped because there is no section set to check against.
    let sections_file = match store.load_sections(entry) {
        Ok(file) => file,
        Err(e) => {
            report.push(Issue::error(
                IssueCode::UnparsableSections,
                &entry.book_id,
                format!("sections.json unreadable: {e}"),
            ));
            None
        }
    };
    let section_ids: Option<HashSet<&str>> = sections_file
        .as_ref()
        .map(|f| f.sections.iter().map(|s| s.section_id.as_str()).collect());

    // segment_id → page_id of first occurrence, for duplicate detection
    // across all pages of the book.
    let mut seen_segments: HashMap<String, String> = HashMap::new();

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

        if let Some(ids) = &section_ids {
            if !ids.contains(page.section_id.as_str()) {
                report.push(
                    Issue::error(
                        IssueCode::DanglingSectionRef,
                        &entry.book_id,
                        format!("sectionId '{}' not found in sections.json", page.section_id),
                    )
                    .on_page(&page.page_id),
                );
            }
        }

        if page.book_id != book.book_id {
            report.push(
                Issue::error(
                    IssueCode::PageBookMismatch,
                    &entry.book_id,
                    format!(
                        "page declares bookId '{}' but belongs to '{}'",
                        page.book_id, book.book_id
                    ),
                )
                .on_page(&page.page_id),
            );
        }

        for segment in &page.segments {
            if let Some(first_page) =
                seen_segments.insert(segment.segment_id.clone(), page.page_id.clone())
            {
                report.push(
                    Issue::error(
                        IssueCode::DuplicateSegmentId,
                        &entry.book_id,
                        format!(
                            "segmentId '{}' appears on pages '{}' and '{}'",
                            segment.segment_id, first_page, page.page_id
                        ),
                    )
                    .on_page(&page.page_id)
                    .on_block(&segment.segment_id),
                );
            }
        }
    }

    if let Some(file) = &sections_file {
        for section in &file.sections {
            if section.end_page < section.start_page {
                report.push(Issue::error(
                    IssueCode::SectionSpanInverted,
                    &entry.book_id,
                    format!(
                        "section '{}': endPage {} < startPage {}",
                        section.section_id, section.end_page, section.start_page
                    ),
                ));
            }
            if section.end_page > book.page_count {
                report.push(Issue::error(
                    IssueCode::SectionSpanOutOfRange,
                    &entry.book_id,
                    format!(
                        "section '{}': endPage {} exceeds pageCount {}",
                        section.section_id, section.end_page, book.page_count
                    ),
                ));
            }
        }
    }

    report
}

// ── Tests ──
