use std::fmt;
use std::io;

/// Bail out of a chunk decoder with a [`AxmlError::MalformedChunk`].
macro_rules! malformed {
    ($chunk:expr, $msg:literal) => {
        return Err(AxmlError::MalformedChunk { chunk_type: $chunk, message: $msg.to_string() })
    };
    ($chunk:expr, $fmtstr:literal, $($args:tt)*) => {
        return Err(AxmlError::MalformedChunk { chunk_type: $chunk, message: format!($fmtstr, $($args)*) })
    };
}

/// Result alias for binary XML operations.
pub type AxmlResult<T> = Result<T, AxmlError>;

/// Errors surfaced while decoding a binary XML document.
#[derive(Debug)]
pub enum AxmlError {
    /// The byte source ended cleanly on a chunk boundary.
    TruncatedInput,
    /// A chunk header is incomplete or declares sizes the stream cannot satisfy.
    MalformedHeader(String),
    /// A chunk body contradicts its own header.
    MalformedChunk { chunk_type: u16, message: String },
    /// A string, attribute or style index is past the end of its collection.
    IndexOutOfRange { index: u64, len: u64 },
    /// The accessor does not apply to the current event.
    NoCurrentEvent,
    /// The parser has been closed.
    Closed,
    /// A singleton chunk appeared twice and the parser was configured to reject it.
    DuplicateChunk(u16),
    /// Failure of the underlying byte source.
    Io(io::Error),
}

impl AxmlError {
    pub(crate) fn out_of_range(index: impl Into<u64>, len: usize) -> Self {
        AxmlError::IndexOutOfRange { index: index.into(), len: len as u64 }
    }
}

impl fmt::Display for AxmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxmlError::TruncatedInput => write!(f, "Unexpected end of binary XML"),
            AxmlError::MalformedHeader(msg) => write!(f, "Malformed chunk header: {msg}"),
            AxmlError::MalformedChunk { chunk_type, message } => {
                write!(f, "Malformed chunk 0x{chunk_type:04x}: {message}")
            }
            AxmlError::IndexOutOfRange { index, len } => {
                write!(f, "Index {index} out of range (len {len})")
            }
            AxmlError::NoCurrentEvent => write!(f, "No current event for this accessor"),
            AxmlError::Closed => write!(f, "Parser is closed"),
            AxmlError::DuplicateChunk(chunk_type) => {
                write!(f, "Duplicate chunk of type 0x{chunk_type:04x}")
            }
            AxmlError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for AxmlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AxmlError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AxmlError {
    fn from(value: io::Error) -> Self {
        AxmlError::Io(value)
    }
}
