pub mod content;
pub mod integrity;
pub mod schema;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    MissingBook,
    BookIdMismatch,
    PageCountMismatch,
    UnparsablePage,
    UnparsableSections,
    DanglingSectionRef,
    PageBookMismatch,
    DuplicateSegmentId,
    SectionSpanInverted,
    SectionSpanOutOfRange,
    StrayPageFile,
    UnknownSegmentType,
    MissingSegmentText,
    MissingPoetryLines,
    EmptyPoetryLine,
    FragmentedParagraph,
    OrphanConjunction,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingBook => "MISSING_BOOK",
            Self::BookIdMismatch => "BOOK_ID_MISMATCH",
            Self::PageCountMismatch => "PAGE_COUNT_MISMATCH",
            Self::UnparsablePage => "UNPARSABLE_PAGE",
            Self::UnparsableSections => "UNPARSABLE_SECTIONS",
            Self::DanglingSectionRef => "DANGLING_SECTION_REF",
            Self::PageBookMismatch => "PAGE_BOOK_MISMATCH",
            Self::DuplicateSegmentId => "DUPLICATE_SEGMENT_ID",
            Self::SectionSpanInverted => "SECTION_SPAN_INVERTED",
            Self::SectionSpanOutOfRange => "SECTION_SPAN_OUT_OF_RANGE",
            Self::StrayPageFile => "STRAY_PAGE_FILE",
            Self::UnknownSegmentType => "UNKNOWN_SEGMENT_TYPE",
            Self::MissingSegmentText => "MISSING_SEGMENT_TEXT",
            Self::MissingPoetryLines => "MISSING_POETRY_LINES",
            Self::EmptyPoetryLine => "EMPTY_POETRY_LINE",
            Self::FragmentedParagraph => "FRAGMENTED_PARAGRAPH",
            Self::OrphanConjunction => "ORPHAN_CONJUNCTION",
        }
    }
}

impl std::fmt::Display for IssueCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accumulated defect. Never raised as an error: validators run to
/// completion and report everything they find in one pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub severity: Severity,
    pub code: IssueCode,
    pub book_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    pub detail: String,
}

impl Issue {
    pub fn error(code: IssueCode, book_id: &str, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            book_id: book_id.to_string(),
            page_id: None,
            block_id: None,
            detail: detail.into(),
        }
    }

    pub fn warning(code: IssueCode, book_id: &str, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            book_id: book_id.to_string(),
            page_id: None,
            block_id: None,
            detail: detail.into(),
        }
    }

    pub fn on_page(mut self, page_id: impl Into<String>) -> Self {
        self.page_id = Some(page_id.into());
        self
    }

    pub fn on_block(mut self, block_id: impl Into<String>) -> Self {
        self.block_id = Some(block_id.into());
        self
    }
}

/// Full-run report. Always complete: one malformed file never aborts the
/// rest of the book or corpus.
#[derive(Debug, Default, Serialize)]
pub struct IntegrityReport {
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl IntegrityReport {
    pub fn push(&mut self, issue: Issue) {
        match issue.severity {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
        }
    }

    pub fn merge(&mut self, other: IntegrityReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Deterministic ordering regardless of scan order: bookId, then pageId,
    /// then blockId, then code.
    pub fn sort(&mut self) {
        let key = |i: &Issue| {
            (
                i.book_id.clone(),
                i.page_id.clone().unwrap_or_default(),
                i.block_id.clone().unwrap_or_default(),
                i.code.as_str(),
            )
        };
        self.errors.sort_by_key(key);
        self.warnings.sort_by_key(key);
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

// ── Tests ──
