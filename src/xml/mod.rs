//! Event-level view of a binary XML document.

pub mod config;
pub mod diagnostics;
pub mod parser;

pub use config::{DuplicatePolicy, ParserConfig};
pub use diagnostics::{Diagnostics, LogDiagnostics, Warning};
pub use parser::{AttributeInfo, EventCode, XmlParser};
