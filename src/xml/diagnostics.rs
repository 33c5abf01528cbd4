use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recoverable oddities met while parsing. None of them stop the parse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Warning {
    /// A chunk type the parser does not handle was skipped whole.
    SkippedChunk { chunk_type: u16, size: u32 },
    /// A handled chunk had bytes left over after decoding.
    TrailingBytes { chunk_type: u16, count: u64 },
    /// A second string pool or resource map replaced the first.
    ReplacedChunk { chunk_type: u16 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::SkippedChunk { chunk_type, size } => {
                write!(f, "skipping chunk of type 0x{chunk_type:04x} ({size} bytes)")
            }
            Warning::TrailingBytes { chunk_type, count } => {
                write!(f, "skipping {count} bytes at the end of a 0x{chunk_type:04x} chunk")
            }
            Warning::ReplacedChunk { chunk_type } => {
                write!(f, "chunk of type 0x{chunk_type:04x} replaces an earlier one")
            }
        }
    }
}

/// Receives the warnings of one parser.
pub trait Diagnostics {
    fn warning(&mut self, warning: Warning);
}

/// Forwards warnings to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn warning(&mut self, warning: Warning) {
        warn!("[axml] {}", warning);
    }
}

/// Collects warnings for later inspection.
impl Diagnostics for Vec<Warning> {
    fn warning(&mut self, warning: Warning) {
        self.push(warning);
    }
}

/// Drops warnings.
impl Diagnostics for () {
    fn warning(&mut self, _warning: Warning) {}
}
