use crate::res::bounded::BoundedReader;
use crate::res::chunk::{ChunkHeader, ChunkType};
use crate::res::error::{AxmlError, AxmlResult};
use crate::res::string_pool::StringRef;
use crate::res::value::ResValue;
use std::io::Read;

/// Size of `ResXMLTree_node`, preamble included.
pub const XML_NODE_HEADER_SIZE: u16 = 16;
/// Size of the fixed part of `ResXMLTree_attrExt`.
pub const ATTR_EXT_SIZE: u16 = 20;
/// Size of one `ResXMLTree_attribute`.
pub const ATTRIBUTE_SIZE: u16 = 20;

/// `ResXMLTree_node`: the header common to every event chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XmlNode {
    pub line_number: u32,
    pub comment: StringRef,
}

impl XmlNode {
    /// Read the node header and move `body` to the start of the extension.
    pub(crate) fn read<R: Read>(body: &mut BoundedReader<R>, chunk: &ChunkHeader) -> AxmlResult<Self> {
        if chunk.header_size < XML_NODE_HEADER_SIZE {
            malformed!(
                body.chunk_type(),
                "node header size {} is smaller than {}",
                chunk.header_size,
                XML_NODE_HEADER_SIZE
            );
        }
        let line_number = body.read_u32()?;
        let comment = StringRef::from_raw(body.read_u32()?);
        body.skip_to(chunk.extended_header_size())?;
        Ok(XmlNode {
            line_number,
            comment,
        })
    }
}

/// `ResXMLTree_namespaceExt`, shared by start and end namespace chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NamespaceExt {
    pub prefix: StringRef,
    pub uri: StringRef,
}

impl NamespaceExt {
    pub(crate) fn read<R: Read>(body: &mut BoundedReader<R>) -> AxmlResult<Self> {
        Ok(NamespaceExt {
            prefix: StringRef::from_raw(body.read_u32()?),
            uri: StringRef::from_raw(body.read_u32()?),
        })
    }
}

/// `ResXMLTree_attribute`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub namespace: StringRef,
    pub name: StringRef,
    pub raw_value: StringRef,
    pub typed_value: ResValue,
}

impl Attribute {
    pub(crate) fn read<R: Read>(body: &mut BoundedReader<R>) -> AxmlResult<Self> {
        Ok(Attribute {
            namespace: StringRef::from_raw(body.read_u32()?),
            name: StringRef::from_raw(body.read_u32()?),
            raw_value: StringRef::from_raw(body.read_u32()?),
            typed_value: ResValue::read(body)?,
        })
    }
}

/// `ResXMLTree_attrExt` together with the attribute records it describes.
///
/// `id_index`, `class_index` and `style_index` are 1-based; 0 means the element has no
/// such attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartElementExt {
    pub namespace: StringRef,
    pub name: StringRef,
    pub attribute_start: u16,
    pub attribute_size: u16,
    pub attribute_count: u16,
    pub id_index: u16,
    pub class_index: u16,
    pub style_index: u16,
    pub attributes: Vec<Attribute>,
}

impl StartElementExt {
    /// Attribute records are located by `attribute_start` and strided by
    /// `attribute_size`, both relative to the start of the extension.
    pub(crate) fn read<R: Read>(body: &mut BoundedReader<R>) -> AxmlResult<Self> {
        let origin = body.consumed();
        let namespace = StringRef::from_raw(body.read_u32()?);
        let name = StringRef::from_raw(body.read_u32()?);
        let attribute_start = body.read_u16()?;
        let attribute_size = body.read_u16()?;
        let attribute_count = body.read_u16()?;
        let id_index = body.read_u16()?;
        let class_index = body.read_u16()?;
        let style_index = body.read_u16()?;

        let mut attributes = Vec::with_capacity(attribute_count as usize);
        if attribute_count > 0 {
            if attribute_start < ATTR_EXT_SIZE {
                malformed!(
                    body.chunk_type(),
                    "attributes start at {} inside the {}-byte element header",
                    attribute_start,
                    ATTR_EXT_SIZE
                );
            }
            if attribute_size < ATTRIBUTE_SIZE {
                malformed!(
                    body.chunk_type(),
                    "attribute size {} is smaller than {}",
                    attribute_size,
                    ATTRIBUTE_SIZE
                );
            }
            for index in 0..u64::from(attribute_count) {
                body.skip_to(origin + u64::from(attribute_start) + index * u64::from(attribute_size))?;
                attributes.push(Attribute::read(body)?);
            }
        }

        Ok(StartElementExt {
            namespace,
            name,
            attribute_start,
            attribute_size,
            attribute_count,
            id_index,
            class_index,
            style_index,
            attributes,
        })
    }
}

/// `ResXMLTree_endElementExt`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndElementExt {
    pub namespace: StringRef,
    pub name: StringRef,
}

impl EndElementExt {
    pub(crate) fn read<R: Read>(body: &mut BoundedReader<R>) -> AxmlResult<Self> {
        Ok(EndElementExt {
            namespace: StringRef::from_raw(body.read_u32()?),
            name: StringRef::from_raw(body.read_u32()?),
        })
    }
}

/// `ResXMLTree_cdataExt`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CdataExt {
    pub data: StringRef,
    pub typed_value: ResValue,
}

impl CdataExt {
    pub(crate) fn read<R: Read>(body: &mut BoundedReader<R>) -> AxmlResult<Self> {
        Ok(CdataExt {
            data: StringRef::from_raw(body.read_u32()?),
            typed_value: ResValue::read(body)?,
        })
    }
}

/// The extension record of the current event, by chunk type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeExtension {
    StartNamespace(NamespaceExt),
    EndNamespace(NamespaceExt),
    StartElement(StartElementExt),
    EndElement(EndElementExt),
    Cdata(CdataExt),
}

impl NodeExtension {
    /// Decode node header and extension for an event chunk.
    ///
    /// Returns `Ok(None)` without consuming anything for chunk types that carry no event.
    pub(crate) fn read<R: Read>(
        body: &mut BoundedReader<R>,
        chunk: &ChunkHeader,
    ) -> AxmlResult<Option<(XmlNode, NodeExtension)>> {
        let is_event = matches!(
            chunk.chunk_type,
            ChunkType::XmlStartNamespace
                | ChunkType::XmlEndNamespace
                | ChunkType::XmlStartElement
                | ChunkType::XmlEndElement
                | ChunkType::XmlCdata
        );
        if !is_event {
            return Ok(None);
        }

        let node = XmlNode::read(body, chunk)?;
        let extension = match chunk.chunk_type {
            ChunkType::XmlStartNamespace => NodeExtension::StartNamespace(NamespaceExt::read(body)?),
            ChunkType::XmlEndNamespace => NodeExtension::EndNamespace(NamespaceExt::read(body)?),
            ChunkType::XmlStartElement => NodeExtension::StartElement(StartElementExt::read(body)?),
            ChunkType::XmlEndElement => NodeExtension::EndElement(EndElementExt::read(body)?),
            _ => NodeExtension::Cdata(CdataExt::read(body)?),
        };
        Ok(Some((node, extension)))
    }
}
