//! On-disk corpus schema and the manifest-indexed store.
//!
//! The corpus is a JSON file tree with no database engine behind it:
//!
//! ```text
//! <root>/manifest.json
//! <root>/<book.path>/book.json
//! <root>/<book.path>/sections.json      (optional)
//! <root>/<book.path>/pages/<nnnn>.json
//! ```
//!
//! Validators consume this module's loaders rather than walking directories
//! themselves, so the manifest stays the single source of truth for which
//! books exist.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CorpusError;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const BOOK_FILE: &str = "book.json";
pub const SECTIONS_FILE: &str = "sections.json";
pub const PAGES_DIR: &str = "pages";

/// Semantic type of a classified block, the unit exposed to readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Paragraph,
    ArabicBlock,
    Heading,
    Footnote,
    Label,
    Divider,
}

impl BlockType {
    /// Parse an explicit type label from source data. Unknown labels return
    /// `None` and fall through to heuristic classification.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "paragraph" => Some(Self::Paragraph),
            "arabic_block" => Some(Self::ArabicBlock),
            "heading" => Some(Self::Heading),
            "footnote" => Some(Self::Footnote),
            "label" => Some(Self::Label),
            "divider" => Some(Self::Divider),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::ArabicBlock => "arabic_block",
            Self::Heading => "heading",
            Self::Footnote => "footnote",
            Self::Label => "label",
            Self::Divider => "divider",
        }
    }
}

/// Raw transcription unit fed into the pipeline, roughly one paragraph/line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSegment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub segment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

/// Classified output unit. Once a block leaves the pipeline its text is
/// always normalized, never raw.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_glue: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Main,
    Sub,
    Footnote,
}

/// Table-of-contents entry. Invariant: `start_page <= end_page <= book.page_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub section_id: String,
    pub title: String,
    pub order: u32,
    pub start_page: u32,
    pub end_page: u32,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionsFile {
    pub sections: Vec<Section>,
}

/// Invariant: `page_count` equals the number of persisted page files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub book_id: String,
    pub title: String,
    pub page_count: u32,
}

/// One line of a `poetry` segment. `text` stays optional at parse time so the
/// schema validator can itemize empty lines instead of rejecting the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoetryLine {
    #[serde(default)]
    pub text: Option<String>,
}

/// Persisted page segment. `segment_type` is a free string here; the closed
/// enum is enforced by the schema validator, not by serde, so one unknown
/// type never makes a whole page unreadable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub segment_id: String,
    #[serde(rename = "type")]
    pub segment_type: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<PoetryLine>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub page_id: String,
    pub page_index: u32,
    pub book_id: String,
    pub section_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub book_id: String,
    pub title: String,
    pub path: String,
}

/// The single index the validators treat as ground truth for which books exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub corpus_id: String,
    pub schema_version: u32,
    pub books: Vec<ManifestEntry>,
}

#[derive(Debug)]
pub struct CorpusStore {
    root: PathBuf,
    pub manifest: Manifest,
}

impl CorpusStore {
    /// Open a corpus root. A missing or unparsable manifest is the one fatal
    /// error in the crate: with no index there is nothing to validate against.
    pub fn open(root: &Path) -> Result<Self, CorpusError> {
        let path = root.join(MANIFEST_FILE);
        let raw = fs::read_to_string(&path).map_err(|source| CorpusError::ManifestRead {
            path: path.clone(),
            source,
        })?;
        let manifest =
            serde_json::from_str(&raw).map_err(|source| CorpusError::ManifestParse { path, source })?;
        Ok(Self {
            root: root.to_path_buf(),
            manifest,
        })
    }

    pub fn book_dir(&self, entry: &ManifestEntry) -> PathBuf {
        self.root.join(&entry.path)
    }

    pub fn load_book(&self, entry: &ManifestEntry) -> Result<Book, CorpusError> {
        read_json(&self.book_dir(entry).join(BOOK_FILE))
    }

    /// `sections.json` is optional; `Ok(None)` means the book has no table of
    /// contents, which is distinct from a present-but-broken file.
    pub fn load_sections(&self, entry: &ManifestEntry) -> Result<Option<SectionsFile>, CorpusError> {
        let path = self.book_dir(entry).join(SECTIONS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    /// Page file paths for a book, sorted by file name so batch output is
    /// deterministically ordered. Only files matching the `<nnnn>.json`
    /// naming scheme count as pages; anything else in the directory is
    /// reported by `stray_page_files` instead of skewing the page count.
    pub fn page_paths(&self, entry: &ManifestEntry) -> Result<Vec<PathBuf>, CorpusError> {
        Ok(self
            .pages_dir_entries(entry)?
            .into_iter()
            .filter(|p| is_page_file(p))
            .collect())
    }

    /// `.json` files in `pages/` that do not follow the page naming scheme.
    pub fn stray_page_files(&self, entry: &ManifestEntry) -> Result<Vec<PathBuf>, CorpusError> {
        Ok(self
            .pages_dir_entries(entry)?
            .into_iter()
            .filter(|p| p.extension().is_some_and(|ext| ext == "json") && !is_page_file(p))
            .collect())
    }

    fn pages_dir_entries(&self, entry: &ManifestEntry) -> Result<Vec<PathBuf>, CorpusError> {
        let dir = self.book_dir(entry).join(PAGES_DIR);
        let entries = fs::read_dir(&dir).map_err(|source| CorpusError::Read {
            path: dir.clone(),
            source,
        })?;
        let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
        paths.sort();
        Ok(paths)
    }

    pub fn load_page(&self, path: &Path) -> Result<Page, CorpusError> {
        read_json(path)
    }
}

fn is_page_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
        && path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CorpusError> {
    let raw = fs::read_to_string(path).map_err(|source| CorpusError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CorpusError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ──
