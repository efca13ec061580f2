use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while merging against an existing output file.
///
/// Stub classification never fails: an ambiguous body is kept, not reported.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The existing output file exists but could not be read.
    #[error("failed to read existing output `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, MergeError>;
