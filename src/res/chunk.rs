use crate::res::bounded::overrun_of;
use crate::res::error::{AxmlError, AxmlResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{ErrorKind, Read};

pub const RES_NULL_TYPE: u16 = 0x0000;
pub const RES_STRING_POOL_TYPE: u16 = 0x0001;
pub const RES_TABLE_TYPE: u16 = 0x0002;
pub const RES_XML_TYPE: u16 = 0x0003;
pub const RES_XML_START_NAMESPACE_TYPE: u16 = 0x0100;
pub const RES_XML_END_NAMESPACE_TYPE: u16 = 0x0101;
pub const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;
pub const RES_XML_END_ELEMENT_TYPE: u16 = 0x0103;
pub const RES_XML_CDATA_TYPE: u16 = 0x0104;
pub const RES_XML_RESOURCE_MAP_TYPE: u16 = 0x0180;

/// Size of the preamble shared by every chunk.
pub const CHUNK_HEADER_SIZE: u16 = 8;

/// Chunk type codes relevant to binary XML documents.
///
/// Codes outside this set are kept verbatim in [`ChunkType::Unknown`]; deciding what
/// to do with them is up to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkType {
    Null,
    StringPool,
    Table,
    Xml,
    XmlStartNamespace,
    XmlEndNamespace,
    XmlStartElement,
    XmlEndElement,
    XmlCdata,
    XmlResourceMap,
    Unknown(u16),
}

impl ChunkType {
    pub fn from_code(code: u16) -> Self {
        match code {
            RES_NULL_TYPE => ChunkType::Null,
            RES_STRING_POOL_TYPE => ChunkType::StringPool,
            RES_TABLE_TYPE => ChunkType::Table,
            RES_XML_TYPE => ChunkType::Xml,
            RES_XML_START_NAMESPACE_TYPE => ChunkType::XmlStartNamespace,
            RES_XML_END_NAMESPACE_TYPE => ChunkType::XmlEndNamespace,
            RES_XML_START_ELEMENT_TYPE => ChunkType::XmlStartElement,
            RES_XML_END_ELEMENT_TYPE => ChunkType::XmlEndElement,
            RES_XML_CDATA_TYPE => ChunkType::XmlCdata,
            RES_XML_RESOURCE_MAP_TYPE => ChunkType::XmlResourceMap,
            other => ChunkType::Unknown(other),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            ChunkType::Null => RES_NULL_TYPE,
            ChunkType::StringPool => RES_STRING_POOL_TYPE,
            ChunkType::Table => RES_TABLE_TYPE,
            ChunkType::Xml => RES_XML_TYPE,
            ChunkType::XmlStartNamespace => RES_XML_START_NAMESPACE_TYPE,
            ChunkType::XmlEndNamespace => RES_XML_END_NAMESPACE_TYPE,
            ChunkType::XmlStartElement => RES_XML_START_ELEMENT_TYPE,
            ChunkType::XmlEndElement => RES_XML_END_ELEMENT_TYPE,
            ChunkType::XmlCdata => RES_XML_CDATA_TYPE,
            ChunkType::XmlResourceMap => RES_XML_RESOURCE_MAP_TYPE,
            ChunkType::Unknown(code) => code,
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkType::Unknown(code) => write!(f, "Unknown (0x{code:04x})"),
            known => write!(f, "{known:?} (0x{:04x})", known.code()),
        }
    }
}

/// The `ResChunk_header` preamble.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    pub chunk_type: ChunkType,
    pub header_size: u16,
    pub total_size: u32,
}

impl ChunkHeader {
    /// Bytes that follow the 8-byte preamble, including the rest of the header.
    pub fn body_size(&self) -> u64 {
        u64::from(self.total_size.saturating_sub(u32::from(CHUNK_HEADER_SIZE)))
    }

    /// Bytes of type-specific header that follow the preamble.
    pub fn extended_header_size(&self) -> u64 {
        u64::from(self.header_size.saturating_sub(CHUNK_HEADER_SIZE))
    }
}

/// Read one chunk preamble.
///
/// A source that is already exhausted yields [`AxmlError::TruncatedInput`], which is how a
/// document normally ends. A source that runs dry part way through the preamble is corrupt
/// and yields [`AxmlError::MalformedHeader`].
pub fn read_chunk_header<R: Read>(source: &mut R) -> AxmlResult<ChunkHeader> {
    let mut buf = [0u8; CHUNK_HEADER_SIZE as usize];
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                return Err(match overrun_of(&err) {
                    Some(overrun) => AxmlError::MalformedHeader(overrun.to_string()),
                    None => AxmlError::Io(err),
                })
            }
        }
    }

    if filled == 0 {
        return Err(AxmlError::TruncatedInput);
    }
    if filled < buf.len() {
        return Err(AxmlError::MalformedHeader(format!(
            "only {filled} of {} header bytes available",
            buf.len()
        )));
    }

    let code = u16::from_le_bytes([buf[0], buf[1]]);
    let header_size = u16::from_le_bytes([buf[2], buf[3]]);
    let total_size = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);

    if header_size < CHUNK_HEADER_SIZE {
        return Err(AxmlError::MalformedHeader(format!(
            "chunk 0x{code:04x} header size {header_size} is smaller than the preamble"
        )));
    }
    if total_size < u32::from(header_size) {
        return Err(AxmlError::MalformedHeader(format!(
            "chunk 0x{code:04x} size {total_size} is smaller than its header size {header_size}"
        )));
    }

    Ok(ChunkHeader {
        chunk_type: ChunkType::from_code(code),
        header_size,
        total_size,
    })
}
