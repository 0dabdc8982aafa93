use thiserror::Error;

/// Errors raised while scanning alignment or rearrangement text.
///
/// Parse errors are fatal and carry the offending token or line; filter
/// decisions are never errors.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unrecognized line: {0:?}")]
    BadLine(String),

    #[error("bad field {field:?} in line: {line:?}")]
    BadField { field: String, line: String },

    #[error("bad rearrangement types {0:?}: want a subset of \"CSNG\"")]
    BadTypes(String),

    #[error("alignment row before any '# PART' name: {0:?}")]
    UnnamedRow(String),

    #[error("bad range {0:?}")]
    BadRange(String),

    #[error("zero-length segment {0:?}")]
    EmptySegment(String),

    #[error("no case files given")]
    NoCaseFiles,
}

impl ScanError {
    pub(crate) fn bad_field(field: impl Into<String>, line: impl Into<String>) -> Self {
        ScanError::BadField {
            field: field.into(),
            line: line.into(),
        }
    }
}
