//! Error taxonomy shared by the Thrift primitives and the index builder/splicer.

/// Errors raised by index generation and projection.
///
/// Every variant is fatal to the call that raised it (§5, §7 of the design):
/// there is no local recovery, and the caller is responsible for retrying or
/// falling back to parsing the source Parquet file's footer directly.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum PalletJackError {
    /// File open/read/write failure, or a truncated read.
    IoError(String),
    /// Index file header is malformed: wrong magic, or a length mismatch
    /// between the declared header sizes and the file's actual length.
    FormatError(String),
    /// Offset table the builder computed does not match the §3.2 invariants
    /// (wrong element counts, missing required fields).
    ValidationError(String),
    /// A requested row-group or column index is out of bounds.
    RangeError(String),
    /// Both `column_indices` and `column_names` were non-empty, or a
    /// requested column name has no match in the schema.
    ArgumentError(String),
    /// The Thrift Compact bytes being walked are malformed or exceed a size
    /// guard (§6.3).
    ThriftError(String),
}

impl std::error::Error for PalletJackError {}

impl std::fmt::Display for PalletJackError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PalletJackError::IoError(message) => write!(fmt, "I/O error: {}", message),
            PalletJackError::FormatError(message) => write!(fmt, "format error: {}", message),
            PalletJackError::ValidationError(message) => {
                write!(fmt, "validation error: {}", message)
            }
            PalletJackError::RangeError(message) => write!(fmt, "range error: {}", message),
            PalletJackError::ArgumentError(message) => write!(fmt, "argument error: {}", message),
            PalletJackError::ThriftError(message) => write!(fmt, "thrift error: {}", message),
        }
    }
}

impl From<std::io::Error> for PalletJackError {
    fn from(e: std::io::Error) -> PalletJackError {
        PalletJackError::IoError(format!("underlying IO error: {}", e))
    }
}

/// A specialized `Result` for `palletjack` errors.
pub type Result<T> = std::result::Result<T, PalletJackError>;

macro_rules! io_err {
    ($fmt:expr) => (crate::error::PalletJackError::IoError($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::error::PalletJackError::IoError(format!($fmt, $($args),*)));
}

macro_rules! format_err {
    ($fmt:expr) => (crate::error::PalletJackError::FormatError($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::error::PalletJackError::FormatError(format!($fmt, $($args),*)));
}

macro_rules! validation_err {
    ($fmt:expr) => (crate::error::PalletJackError::ValidationError($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::error::PalletJackError::ValidationError(format!($fmt, $($args),*)));
}

macro_rules! range_err {
    ($fmt:expr) => (crate::error::PalletJackError::RangeError($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::error::PalletJackError::RangeError(format!($fmt, $($args),*)));
}

macro_rules! argument_err {
    ($fmt:expr) => (crate::error::PalletJackError::ArgumentError($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::error::PalletJackError::ArgumentError(format!($fmt, $($args),*)));
}

macro_rules! thrift_err {
    ($fmt:expr) => (crate::error::PalletJackError::ThriftError($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::error::PalletJackError::ThriftError(format!($fmt, $($args),*)));
}
