//! Fatal error types. Non-fatal defects (referential errors, schema errors,
//! content warnings) are accumulated as report issues, not raised as errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("cannot read manifest at {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest at {path} is not valid JSON: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
