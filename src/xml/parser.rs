use crate::res::bounded::BoundedReader;
use crate::res::chunk::{read_chunk_header, ChunkHeader, ChunkType, RES_XML_TYPE};
use crate::res::error::{AxmlError, AxmlResult};
use crate::res::resource_map::ResourceMap;
use crate::res::string_pool::StringPool;
use crate::res::tree::{Attribute, NodeExtension, StartElementExt, XmlNode};
use crate::res::value::{ResValue, Value};
use crate::xml::config::{DuplicatePolicy, ParserConfig};
use crate::xml::diagnostics::{Diagnostics, LogDiagnostics, Warning};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use std::mem;

/// What the parser is positioned on after a call to [`XmlParser::next`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCode {
    NotStarted,
    BadDocument,
    StartDocument,
    EndDocument,
    Closed,
    StartNamespace,
    EndNamespace,
    StartTag,
    EndTag,
    Text,
}

/// The byte source, before and after the document chunk has been entered.
enum Source<R> {
    Unbound(R),
    /// Scoped to the body of the `RES_XML_TYPE` chunk.
    Document(BoundedReader<R>),
    Released,
}

impl<R: Read> Read for Source<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Source::Unbound(inner) => inner.read(buf),
            Source::Document(document) => document.read(buf),
            Source::Released => Ok(0),
        }
    }
}

enum Decoded {
    Strings(StringPool),
    ResourceMap(ResourceMap),
    Event(XmlNode, NodeExtension),
    Skipped,
}

/// A forward-only pull parser over a binary XML document.
///
/// Every call to [`next`](XmlParser::next) decodes chunks until one of them produces an
/// event. The node of that event stays available through the accessors until the next
/// call replaces it.
///
/// ```
/// use axml::{EventCode, XmlParser};
/// # fn dump(bytes: &[u8]) -> axml::AxmlResult<()> {
/// let mut parser = XmlParser::new(bytes);
/// loop {
///     match parser.next()? {
///         EventCode::StartTag => println!("<{}>", parser.element_name()?),
///         EventCode::EndDocument => break,
///         _ => {}
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct XmlParser<R, D = LogDiagnostics> {
    source: Source<R>,
    config: ParserConfig,
    diagnostics: D,
    event_code: EventCode,
    strings: Option<StringPool>,
    resource_map: Option<ResourceMap>,
    node: Option<XmlNode>,
    extension: Option<NodeExtension>,
}

impl<R: Read> XmlParser<R, LogDiagnostics> {
    pub fn new(source: R) -> Self {
        Self::with_config(source, ParserConfig::default(), LogDiagnostics)
    }
}

impl<R: Read, D: Diagnostics> XmlParser<R, D> {
    pub fn with_diagnostics(source: R, diagnostics: D) -> Self {
        Self::with_config(source, ParserConfig::default(), diagnostics)
    }

    pub fn with_config(source: R, config: ParserConfig, diagnostics: D) -> Self {
        XmlParser {
            source: Source::Unbound(source),
            config,
            diagnostics,
            event_code: EventCode::NotStarted,
            strings: None,
            resource_map: None,
            node: None,
            extension: None,
        }
    }

    /// Advance to the next event.
    ///
    /// Once the document has ended this keeps returning [`EventCode::EndDocument`]. A decode
    /// failure is returned once, after which the parser reports [`EventCode::BadDocument`].
    pub fn next(&mut self) -> AxmlResult<EventCode> {
        match self.event_code {
            EventCode::Closed => return Err(AxmlError::Closed),
            EventCode::EndDocument | EventCode::BadDocument => return Ok(self.event_code),
            _ => {}
        }
        match self.advance() {
            Ok(code) => {
                self.event_code = code;
                Ok(code)
            }
            Err(err) => {
                self.clear_event();
                self.event_code = EventCode::BadDocument;
                Err(err)
            }
        }
    }

    /// Release the byte source. Calling it again does nothing.
    pub fn close(&mut self) {
        if self.event_code == EventCode::Closed {
            return;
        }
        self.event_code = EventCode::Closed;
        self.clear_event();
        self.source = Source::Released;
    }

    fn advance(&mut self) -> AxmlResult<EventCode> {
        loop {
            self.clear_event();
            let header = match read_chunk_header(&mut self.source) {
                Ok(header) => header,
                Err(AxmlError::TruncatedInput) => return Ok(EventCode::EndDocument),
                Err(err) => return Err(err),
            };
            debug!("[axml] chunk {} ({} bytes)", header.chunk_type, header.total_size);

            if let Source::Unbound(_) = self.source {
                self.enter_document(&header)?;
                return Ok(EventCode::StartDocument);
            }

            let chunk_type = header.chunk_type.code();
            let mut body = BoundedReader::new(&mut self.source, chunk_type, header.body_size());
            let decoded = decode_chunk(&mut body, &header)?;
            let junk = body.drain()?;

            match decoded {
                Decoded::Skipped => {
                    self.diagnostics.warning(Warning::SkippedChunk {
                        chunk_type,
                        size: header.total_size,
                    });
                    continue;
                }
                _ if junk > 0 => {
                    self.diagnostics.warning(Warning::TrailingBytes {
                        chunk_type,
                        count: junk,
                    });
                }
                _ => {}
            }

            match decoded {
                Decoded::Strings(pool) => {
                    let previous = self.strings.is_some();
                    self.check_duplicate(chunk_type, previous)?;
                    self.strings = Some(pool);
                }
                Decoded::ResourceMap(map) => {
                    let previous = self.resource_map.is_some();
                    self.check_duplicate(chunk_type, previous)?;
                    self.resource_map = Some(map);
                }
                Decoded::Event(node, extension) => {
                    let code = event_code_of(&extension);
                    self.node = Some(node);
                    self.extension = Some(extension);
                    return Ok(code);
                }
                Decoded::Skipped => {}
            }
        }
    }

    /// Narrow the source to the document chunk so later headers are read inside it.
    fn enter_document(&mut self, header: &ChunkHeader) -> AxmlResult<()> {
        if header.chunk_type != ChunkType::Xml {
            return Err(AxmlError::MalformedHeader(format!(
                "document starts with chunk {}, expected RES_XML_TYPE",
                header.chunk_type
            )));
        }
        let Source::Unbound(inner) = mem::replace(&mut self.source, Source::Released) else {
            return Err(AxmlError::MalformedHeader("document chunk entered twice".to_string()));
        };
        let mut document = BoundedReader::new(inner, RES_XML_TYPE, header.body_size());
        document.skip(header.extended_header_size())?;
        self.source = Source::Document(document);
        Ok(())
    }

    fn check_duplicate(&mut self, chunk_type: u16, previous: bool) -> AxmlResult<()> {
        if !previous {
            return Ok(());
        }
        match self.config.duplicate_chunks {
            DuplicatePolicy::Replace => {
                self.diagnostics.warning(Warning::ReplacedChunk { chunk_type });
                Ok(())
            }
            DuplicatePolicy::Reject => Err(AxmlError::DuplicateChunk(chunk_type)),
        }
    }
}

impl<R, D> XmlParser<R, D> {
    fn clear_event(&mut self) {
        self.node = None;
        self.extension = None;
    }

    pub fn event_code(&self) -> EventCode {
        self.event_code
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    pub fn strings(&self) -> Option<&StringPool> {
        self.strings.as_ref()
    }

    pub fn resource_map(&self) -> Option<&ResourceMap> {
        self.resource_map.as_ref()
    }

    pub fn line_number(&self) -> Option<u32> {
        self.node.map(|node| node.line_number)
    }

    pub fn comment_id(&self) -> Option<u32> {
        self.node.and_then(|node| node.comment.index())
    }

    pub fn comment(&self) -> AxmlResult<&str> {
        self.string(self.comment_id())
    }

    pub fn namespace_prefix_id(&self) -> Option<u32> {
        match &self.extension {
            Some(NodeExtension::StartNamespace(ext)) | Some(NodeExtension::EndNamespace(ext)) => {
                ext.prefix.index()
            }
            _ => None,
        }
    }

    pub fn namespace_prefix(&self) -> AxmlResult<&str> {
        self.string(self.namespace_prefix_id())
    }

    pub fn namespace_uri_id(&self) -> Option<u32> {
        match &self.extension {
            Some(NodeExtension::StartNamespace(ext)) | Some(NodeExtension::EndNamespace(ext)) => {
                ext.uri.index()
            }
            _ => None,
        }
    }

    pub fn namespace_uri(&self) -> AxmlResult<&str> {
        self.string(self.namespace_uri_id())
    }

    pub fn cdata_id(&self) -> Option<u32> {
        match &self.extension {
            Some(NodeExtension::Cdata(ext)) => ext.data.index(),
            _ => None,
        }
    }

    /// Text of the current [`EventCode::Text`] event.
    pub fn cdata(&self) -> AxmlResult<&str> {
        self.string(self.cdata_id())
    }

    pub fn cdata_value(&self) -> Option<ResValue> {
        match &self.extension {
            Some(NodeExtension::Cdata(ext)) => Some(ext.typed_value),
            _ => None,
        }
    }

    pub fn element_namespace_id(&self) -> Option<u32> {
        match &self.extension {
            Some(NodeExtension::StartElement(ext)) => ext.namespace.index(),
            Some(NodeExtension::EndElement(ext)) => ext.namespace.index(),
            _ => None,
        }
    }

    pub fn element_namespace(&self) -> AxmlResult<&str> {
        self.string(self.element_namespace_id())
    }

    pub fn element_name_id(&self) -> Option<u32> {
        match &self.extension {
            Some(NodeExtension::StartElement(ext)) => ext.name.index(),
            Some(NodeExtension::EndElement(ext)) => ext.name.index(),
            _ => None,
        }
    }

    pub fn element_name(&self) -> AxmlResult<&str> {
        self.string(self.element_name_id())
    }

    /// Index of the element's `id` attribute.
    pub fn element_id_index(&self) -> Option<usize> {
        self.special_index(|ext| ext.id_index)
    }

    pub fn element_id(&self) -> Option<AttributeInfo<'_>> {
        self.element_id_index().and_then(|index| self.attribute(index).ok())
    }

    /// Index of the element's `class` attribute.
    pub fn element_class_index(&self) -> Option<usize> {
        self.special_index(|ext| ext.class_index)
    }

    pub fn element_class(&self) -> Option<AttributeInfo<'_>> {
        self.element_class_index().and_then(|index| self.attribute(index).ok())
    }

    /// Index of the element's `style` attribute.
    pub fn element_style_index(&self) -> Option<usize> {
        self.special_index(|ext| ext.style_index)
    }

    pub fn element_style(&self) -> Option<AttributeInfo<'_>> {
        self.element_style_index().and_then(|index| self.attribute(index).ok())
    }

    pub fn attribute_count(&self) -> usize {
        self.current_attributes().map_or(0, |attrs| attrs.len())
    }

    pub fn attribute(&self, index: usize) -> AxmlResult<AttributeInfo<'_>> {
        let attributes = self.current_attributes().ok_or(AxmlError::NoCurrentEvent)?;
        let attribute = attributes
            .get(index)
            .ok_or_else(|| AxmlError::out_of_range(index as u64, attributes.len()))?;
        Ok(self.attribute_info(attribute))
    }

    pub fn attributes(&self) -> impl Iterator<Item = AttributeInfo<'_>> + '_ {
        self.current_attributes()
            .unwrap_or(&[])
            .iter()
            .map(move |attribute| self.attribute_info(attribute))
    }

    /// Position of the attribute named `name` in namespace `namespace`.
    ///
    /// An empty `namespace` matches attributes without one. Both strings are looked up in
    /// the pool first; a name missing from the pool never matches.
    pub fn index_of_attribute(&self, namespace: &str, name: &str) -> Option<usize> {
        let strings = self.strings.as_ref()?;
        let namespace_id = strings.index_of_string(namespace);
        let name_id = strings.index_of_string(name)?;
        self.current_attributes()?.iter().position(|attr| {
            attr.namespace.index() == namespace_id && attr.name.index() == Some(name_id)
        })
    }

    fn current_attributes(&self) -> Option<&[Attribute]> {
        match &self.extension {
            Some(NodeExtension::StartElement(ext)) => Some(&ext.attributes),
            _ => None,
        }
    }

    fn special_index(&self, field: impl Fn(&StartElementExt) -> u16) -> Option<usize> {
        match &self.extension {
            Some(NodeExtension::StartElement(ext)) => match field(ext) {
                0 => None,
                index => Some(usize::from(index) - 1),
            },
            _ => None,
        }
    }

    fn attribute_info<'a>(&'a self, attribute: &'a Attribute) -> AttributeInfo<'a> {
        AttributeInfo {
            strings: self.strings.as_ref(),
            resource_map: self.resource_map.as_ref(),
            attribute,
        }
    }

    fn string(&self, index: Option<u32>) -> AxmlResult<&str> {
        resolve(self.strings.as_ref(), index)
    }
}

/// A resolved view of one attribute of the current start tag.
#[derive(Clone, Copy, Debug)]
pub struct AttributeInfo<'a> {
    strings: Option<&'a StringPool>,
    resource_map: Option<&'a ResourceMap>,
    attribute: &'a Attribute,
}

impl<'a> AttributeInfo<'a> {
    pub fn raw(&self) -> &'a Attribute {
        self.attribute
    }

    pub fn namespace_id(&self) -> Option<u32> {
        self.attribute.namespace.index()
    }

    pub fn namespace(&self) -> AxmlResult<&'a str> {
        resolve(self.strings, self.namespace_id())
    }

    pub fn name_id(&self) -> Option<u32> {
        self.attribute.name.index()
    }

    pub fn name(&self) -> AxmlResult<&'a str> {
        resolve(self.strings, self.name_id())
    }

    pub fn value_string_id(&self) -> Option<u32> {
        self.attribute.raw_value.index()
    }

    pub fn value_string(&self) -> AxmlResult<&'a str> {
        resolve(self.strings, self.value_string_id())
    }

    pub fn typed_value(&self) -> ResValue {
        self.attribute.typed_value
    }

    pub fn value(&self) -> Value {
        self.attribute.typed_value.decode()
    }

    /// Resource ID of the attribute name, from the resource map. Zero counts as absent.
    pub fn resource_id(&self) -> Option<u32> {
        let name_id = self.name_id()?;
        self.resource_map?.get(name_id).filter(|id| *id != 0)
    }

    /// The raw string value if present, otherwise the typed value in textual form.
    pub fn value_text(&self) -> AxmlResult<String> {
        if self.value_string_id().is_some() {
            return self.value_string().map(str::to_string);
        }
        match self.value() {
            Value::String(reference) => resolve(self.strings, reference.index()).map(str::to_string),
            other => Ok(other.to_string()),
        }
    }
}

fn resolve(strings: Option<&StringPool>, index: Option<u32>) -> AxmlResult<&str> {
    match (strings, index) {
        (_, None) => Ok(""),
        (Some(pool), index) => pool.get_string(index),
        (None, Some(index)) => Err(AxmlError::out_of_range(index, 0)),
    }
}

fn decode_chunk<R: Read>(body: &mut BoundedReader<R>, header: &ChunkHeader) -> AxmlResult<Decoded> {
    match header.chunk_type {
        ChunkType::StringPool => Ok(Decoded::Strings(StringPool::read(body, header)?)),
        ChunkType::XmlResourceMap => Ok(Decoded::ResourceMap(ResourceMap::read(body, header)?)),
        _ => Ok(match NodeExtension::read(body, header)? {
            Some((node, extension)) => Decoded::Event(node, extension),
            None => Decoded::Skipped,
        }),
    }
}

fn event_code_of(extension: &NodeExtension) -> EventCode {
    match extension {
        NodeExtension::StartNamespace(_) => EventCode::StartNamespace,
        NodeExtension::EndNamespace(_) => EventCode::EndNamespace,
        NodeExtension::StartElement(_) => EventCode::StartTag,
        NodeExtension::EndElement(_) => EventCode::EndTag,
        NodeExtension::Cdata(_) => EventCode::Text,
    }
}
