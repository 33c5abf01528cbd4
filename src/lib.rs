//! # AXML
//!
//! A pull parser for Android's compiled binary XML, the format aapt produces for
//! `AndroidManifest.xml` and layout resources.
//!
//! The document is decoded one chunk at a time. [`XmlParser::next`] returns an
//! [`EventCode`] and the accessors of the parser expose the current event, with string
//! references resolved through the document's [`StringPool`].
//!
//! # Examples
//!
//! ```no_run
//!  use axml::{EventCode, XmlParser};
//!  use std::fs::File;
//!  use std::io::BufReader;
//!
//!  let file = File::open("AndroidManifest.xml").unwrap();
//!  let mut parser = XmlParser::new(BufReader::new(file));
//!  while parser.next().unwrap() != EventCode::EndDocument {
//!      if parser.event_code() == EventCode::StartTag {
//!          println!("{} has {} attributes", parser.element_name().unwrap(), parser.attribute_count());
//!      }
//!  }
//! ```

pub mod res;
pub mod xml;
#[cfg(test)]
mod tests;

pub use res::{AxmlError, AxmlResult, ResValue, StringPool, StringRef, StyleSpan, Value};
pub use xml::{
    AttributeInfo, Diagnostics, DuplicatePolicy, EventCode, LogDiagnostics, ParserConfig, Warning, XmlParser,
};
