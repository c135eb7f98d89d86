//! Error types for pdfworks.
//!
//! Every transform reports failure through [`PdfWorksError`]. Errors carry a
//! human-readable message and never leave a source document half-modified:
//! each operation builds a fresh output and aborts on the first failure.
//!
//! # Error Categories
//!
//! - **Input errors**: unreadable documents, bad ranges or selections,
//!   oversized or unsupported inputs
//! - **Conversion errors**: HTML loading, raster encoding
//! - **Output errors**: serialization and filesystem writes

use std::io;
use std::path::PathBuf;

/// Result type alias for pdfworks operations.
pub type Result<T> = std::result::Result<T, PdfWorksError>;

/// Main error type for pdfworks operations.
#[derive(Debug, thiserror::Error)]
pub enum PdfWorksError {
    /// Input bytes could not be parsed as a document.
    #[error("Failed to read document '{name}'\n  Reason: {reason}")]
    ParseError {
        /// Display name of the input.
        name: String,
        /// Parser message.
        reason: String,
    },

    /// Page range is outside the document or reversed.
    #[error(
        "Invalid page range {from}-{to}\n  \
         Document has {total} page(s). Use 1 <= from <= to <= {total}"
    )]
    InvalidRange {
        /// First requested page (1-based).
        from: u32,
        /// Last requested page (1-based).
        to: u32,
        /// Pages in the document.
        total: u32,
    },

    /// Selection cannot be used for the requested operation.
    #[error("Invalid page selection: {reason}")]
    InvalidSelection {
        /// Why the selection was rejected.
        reason: String,
    },

    /// Operation needs at least one selected page.
    #[error("No pages selected")]
    EmptySelection,

    /// Too few inputs were supplied.
    #[error("At least {required} input(s) required, got {actual}")]
    InsufficientInputs {
        /// Minimum number of inputs.
        required: usize,
        /// Number of inputs supplied.
        actual: usize,
    },

    /// Input exceeds the configured size limit.
    #[error("File '{name}' is too large ({size} bytes)\n  Maximum allowed size is {limit} bytes")]
    FileTooLarge {
        /// Display name of the input.
        name: String,
        /// Size of the input in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// Input media type is not accepted.
    #[error("Unsupported file type '{media_type}' for '{name}'\n  Expected {expected}")]
    UnsupportedType {
        /// Display name of the input.
        name: String,
        /// Detected or declared media type.
        media_type: String,
        /// Accepted media type(s).
        expected: String,
    },

    /// URL content could not be read because of origin restrictions.
    #[error("Cannot access '{url}' due to cross-origin restrictions")]
    CrossOriginBlocked {
        /// Requested URL.
        url: String,
    },

    /// Loading did not finish within the allowed time.
    #[error("{what} timed out after {seconds:.1}s")]
    Timeout {
        /// What was being waited on.
        what: String,
        /// Elapsed limit in seconds.
        seconds: f64,
    },

    /// Raster decoding, encoding or embedding failed.
    #[error("Image encoding failed: {reason}")]
    EncodeError {
        /// Underlying reason.
        reason: String,
    },

    /// Output could not be serialized or written.
    #[error("Failed to write output{}\n  Reason: {reason}", .path.as_ref().map(|p| format!(": {}", p.display())).unwrap_or_default())]
    WriteError {
        /// Destination path, when writing to disk.
        path: Option<PathBuf>,
        /// Underlying reason.
        reason: String,
    },

    /// A required capability is not available in this build.
    #[error("{operation} is not supported: {hint}")]
    Unsupported {
        /// Operation that needed the capability.
        operation: String,
        /// How to enable it.
        hint: String,
    },

    /// Invalid configuration or arguments.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {}\n  \
         Use --force to overwrite or choose a different output path",
        .path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// The user declined to continue.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<lopdf::Error> for PdfWorksError {
    fn from(err: lopdf::Error) -> Self {
        Self::write_error(err.to_string())
    }
}

impl From<image::ImageError> for PdfWorksError {
    fn from(err: image::ImageError) -> Self {
        Self::encode_error(err.to_string())
    }
}

impl From<zip::result::ZipError> for PdfWorksError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::write_error(format!("archive: {err}"))
    }
}

impl From<anyhow::Error> for PdfWorksError {
    fn from(err: anyhow::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl PdfWorksError {
    /// Create a ParseError.
    pub fn parse_error(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParseError {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidSelection error.
    pub fn invalid_selection(reason: impl Into<String>) -> Self {
        Self::InvalidSelection {
            reason: reason.into(),
        }
    }

    /// Create an EncodeError.
    pub fn encode_error(reason: impl Into<String>) -> Self {
        Self::EncodeError {
            reason: reason.into(),
        }
    }

    /// Create a WriteError without a destination path.
    pub fn write_error(reason: impl Into<String>) -> Self {
        Self::WriteError {
            path: None,
            reason: reason.into(),
        }
    }

    /// Create a WriteError for a file on disk.
    pub fn write_error_at(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::WriteError {
            path: Some(path),
            reason: reason.into(),
        }
    }

    /// Create an Unsupported error.
    pub fn unsupported(operation: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
            hint: hint.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if the error was caused by the caller's input or parameters.
    ///
    /// User errors can be retried with corrected parameters; the rest point
    /// at the environment or a missing capability.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::ParseError { .. }
                | Self::InvalidRange { .. }
                | Self::InvalidSelection { .. }
                | Self::EmptySelection
                | Self::InsufficientInputs { .. }
                | Self::FileTooLarge { .. }
                | Self::UnsupportedType { .. }
                | Self::CrossOriginBlocked { .. }
                | Self::InvalidConfig { .. }
                | Self::OutputExists { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidRange { .. }
            | Self::InvalidSelection { .. }
            | Self::EmptySelection
            | Self::InsufficientInputs { .. }
            | Self::InvalidConfig { .. } => 1,
            Self::FileTooLarge { .. } | Self::UnsupportedType { .. } => 2,
            Self::ParseError { .. } => 3,
            Self::OutputExists { .. } => 4,
            Self::WriteError { .. } | Self::Io { .. } => 5,
            Self::EncodeError { .. } => 6,
            Self::CrossOriginBlocked { .. } | Self::Timeout { .. } => 7,
            Self::Unsupported { .. } => 8,
            Self::Cancelled => 130,
            Self::Other { .. } => 1,
        }
    }
}
