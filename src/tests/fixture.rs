//! Test-only encoder for small binary XML documents.

use crate::res::chunk::{
    RES_STRING_POOL_TYPE, RES_XML_CDATA_TYPE, RES_XML_END_ELEMENT_TYPE, RES_XML_END_NAMESPACE_TYPE,
    RES_XML_RESOURCE_MAP_TYPE, RES_XML_START_ELEMENT_TYPE, RES_XML_START_NAMESPACE_TYPE, RES_XML_TYPE,
};
use crate::res::value::ResValue;

pub(crate) const NO_INDEX: u32 = 0xFFFF_FFFF;

pub(crate) fn write_u8(buf: &mut Vec<u8>, value: u8) {
    buf.push(value);
}

pub(crate) fn write_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn align_to_four(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

fn begin_chunk(buf: &mut Vec<u8>, chunk_type: u16, header_size: u16) -> usize {
    let start = buf.len();
    write_u16(buf, chunk_type);
    write_u16(buf, header_size);
    write_u32(buf, 0); // placeholder for chunk size
    start
}

fn finalize_chunk(buf: &mut Vec<u8>, chunk_start: usize) {
    align_to_four(buf);
    let size = (buf.len() - chunk_start) as u32;
    buf[chunk_start + 4..chunk_start + 8].copy_from_slice(&size.to_le_bytes());
}

fn write_utf16_string(buf: &mut Vec<u8>, text: &str) {
    let units: Vec<u16> = text.encode_utf16().collect();
    let len = units.len();
    if len < 0x8000 {
        write_u16(buf, len as u16);
    } else {
        write_u16(buf, 0x8000 | ((len >> 16) as u16 & 0x7FFF));
        write_u16(buf, (len & 0xFFFF) as u16);
    }
    for unit in units {
        write_u16(buf, unit);
    }
    write_u16(buf, 0);
}

fn write_utf8_length(buf: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        write_u8(buf, len as u8);
    } else {
        write_u8(buf, 0x80 | ((len >> 8) as u8 & 0x7F));
        write_u8(buf, (len & 0xFF) as u8);
    }
}

fn write_utf8_string(buf: &mut Vec<u8>, text: &str) {
    write_utf8_length(buf, text.encode_utf16().count());
    write_utf8_length(buf, text.len());
    buf.extend_from_slice(text.as_bytes());
    write_u8(buf, 0);
}

/// One styled run, as `(name string index, first char, last char)`.
pub(crate) type SpanSpec = (u32, u32, u32);

pub(crate) struct PoolBuilder {
    strings: Vec<String>,
    styles: Vec<Vec<SpanSpec>>,
    utf8: bool,
    sorted: bool,
}

impl PoolBuilder {
    pub(crate) fn utf16() -> Self {
        PoolBuilder {
            strings: Vec::new(),
            styles: Vec::new(),
            utf8: false,
            sorted: false,
        }
    }

    pub(crate) fn utf8() -> Self {
        PoolBuilder {
            utf8: true,
            ..PoolBuilder::utf16()
        }
    }

    pub(crate) fn sorted(mut self) -> Self {
        self.sorted = true;
        self
    }

    /// Append `value` even if it is already present.
    pub(crate) fn push(&mut self, value: &str) -> u32 {
        self.strings.push(value.to_string());
        (self.strings.len() - 1) as u32
    }

    /// Index of `value`, appending it if needed.
    pub(crate) fn intern(&mut self, value: &str) -> u32 {
        match self.strings.iter().position(|s| s == value) {
            Some(idx) => idx as u32,
            None => self.push(value),
        }
    }

    /// Attach spans to `string_index`. Strings before it get empty span lists.
    pub(crate) fn style(&mut self, string_index: u32, spans: &[SpanSpec]) {
        let idx = string_index as usize;
        if self.styles.len() <= idx {
            self.styles.resize(idx + 1, Vec::new());
        }
        self.styles[idx] = spans.to_vec();
    }

    pub(crate) fn to_chunk(&self) -> Vec<u8> {
        let string_count = self.strings.len() as u32;
        let style_count = self.styles.len() as u32;
        let header_size = 28u16;

        let mut string_data = Vec::new();
        let mut string_offsets = Vec::with_capacity(self.strings.len());
        for s in &self.strings {
            string_offsets.push(string_data.len() as u32);
            if self.utf8 {
                write_utf8_string(&mut string_data, s);
            } else {
                write_utf16_string(&mut string_data, s);
            }
        }
        align_to_four(&mut string_data);

        let mut style_data = Vec::new();
        let mut style_offsets = Vec::with_capacity(self.styles.len());
        for spans in &self.styles {
            style_offsets.push(style_data.len() as u32);
            for (name, first, last) in spans {
                write_u32(&mut style_data, *name);
                write_u32(&mut style_data, *first);
                write_u32(&mut style_data, *last);
            }
            for _ in 0..3 {
                write_u32(&mut style_data, NO_INDEX);
            }
        }

        let strings_start = u32::from(header_size) + (string_count + style_count) * 4;
        let styles_start = if style_count > 0 {
            strings_start + string_data.len() as u32
        } else {
            0
        };
        let mut flags = 0u32;
        if self.utf8 {
            flags |= 0x100;
        }
        if self.sorted {
            flags |= 0x1;
        }

        let mut chunk = Vec::new();
        let start = begin_chunk(&mut chunk, RES_STRING_POOL_TYPE, header_size);
        write_u32(&mut chunk, string_count);
        write_u32(&mut chunk, style_count);
        write_u32(&mut chunk, flags);
        write_u32(&mut chunk, strings_start);
        write_u32(&mut chunk, styles_start);
        for offset in string_offsets {
            write_u32(&mut chunk, offset);
        }
        for offset in style_offsets {
            write_u32(&mut chunk, offset);
        }
        chunk.extend_from_slice(&string_data);
        chunk.extend_from_slice(&style_data);
        finalize_chunk(&mut chunk, start);
        chunk
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct FixtureAttr {
    pub namespace: Option<u32>,
    pub name: u32,
    pub raw_value: Option<u32>,
    pub value: ResValue,
}

impl FixtureAttr {
    pub(crate) fn new(namespace: Option<u32>, name: u32, raw_value: Option<u32>, value: ResValue) -> Self {
        FixtureAttr {
            namespace,
            name,
            raw_value,
            value,
        }
    }
}

/// `[id_index, class_index, style_index]`, 1-based.
pub(crate) type SpecialIndices = [u16; 3];

/// Builds the chunk sequence inside a `RES_XML_TYPE` document.
pub(crate) struct AxmlBuilder {
    body: Vec<u8>,
    comment: Option<u32>,
}

impl AxmlBuilder {
    pub(crate) fn new() -> Self {
        AxmlBuilder {
            body: Vec::new(),
            comment: None,
        }
    }

    pub(crate) fn string_pool(&mut self, pool: &PoolBuilder) -> &mut Self {
        self.body.extend_from_slice(&pool.to_chunk());
        self
    }

    pub(crate) fn resource_map(&mut self, ids: &[u32]) -> &mut Self {
        let start = begin_chunk(&mut self.body, RES_XML_RESOURCE_MAP_TYPE, 8);
        for id in ids {
            write_u32(&mut self.body, *id);
        }
        finalize_chunk(&mut self.body, start);
        self
    }

    /// Comment attached to the next node chunk.
    pub(crate) fn comment(&mut self, comment: u32) -> &mut Self {
        self.comment = Some(comment);
        self
    }

    pub(crate) fn start_namespace(&mut self, line: u32, prefix: u32, uri: u32) -> &mut Self {
        self.namespace(RES_XML_START_NAMESPACE_TYPE, line, prefix, uri)
    }

    pub(crate) fn end_namespace(&mut self, line: u32, prefix: u32, uri: u32) -> &mut Self {
        self.namespace(RES_XML_END_NAMESPACE_TYPE, line, prefix, uri)
    }

    pub(crate) fn start_element(
        &mut self,
        line: u32,
        namespace: Option<u32>,
        name: u32,
        attrs: &[FixtureAttr],
    ) -> &mut Self {
        self.start_element_with(line, namespace, name, attrs, [0; 3], &[])
    }

    /// Start element with explicit special indices and bytes appended after the attributes.
    pub(crate) fn start_element_with(
        &mut self,
        line: u32,
        namespace: Option<u32>,
        name: u32,
        attrs: &[FixtureAttr],
        special: SpecialIndices,
        trailing: &[u8],
    ) -> &mut Self {
        let start = self.begin_node(RES_XML_START_ELEMENT_TYPE, line);
        write_u32(&mut self.body, namespace.unwrap_or(NO_INDEX));
        write_u32(&mut self.body, name);
        write_u16(&mut self.body, 20); // attributeStart
        write_u16(&mut self.body, 20); // attributeSize
        write_u16(&mut self.body, attrs.len() as u16);
        for index in special {
            write_u16(&mut self.body, index);
        }
        for attr in attrs {
            write_u32(&mut self.body, attr.namespace.unwrap_or(NO_INDEX));
            write_u32(&mut self.body, attr.name);
            write_u32(&mut self.body, attr.raw_value.unwrap_or(NO_INDEX));
            write_res_value(&mut self.body, attr.value);
        }
        self.body.extend_from_slice(trailing);
        finalize_chunk(&mut self.body, start);
        self
    }

    pub(crate) fn end_element(&mut self, line: u32, namespace: Option<u32>, name: u32) -> &mut Self {
        let start = self.begin_node(RES_XML_END_ELEMENT_TYPE, line);
        write_u32(&mut self.body, namespace.unwrap_or(NO_INDEX));
        write_u32(&mut self.body, name);
        finalize_chunk(&mut self.body, start);
        self
    }

    pub(crate) fn cdata(&mut self, line: u32, data: u32, value: ResValue) -> &mut Self {
        let start = self.begin_node(RES_XML_CDATA_TYPE, line);
        write_u32(&mut self.body, data);
        write_res_value(&mut self.body, value);
        finalize_chunk(&mut self.body, start);
        self
    }

    /// A chunk with a bare 8-byte header and an opaque payload.
    pub(crate) fn raw_chunk(&mut self, chunk_type: u16, payload: &[u8]) -> &mut Self {
        let start = begin_chunk(&mut self.body, chunk_type, 8);
        self.body.extend_from_slice(payload);
        finalize_chunk(&mut self.body, start);
        self
    }

    /// Bytes placed between chunks, not wrapped in any chunk.
    pub(crate) fn raw_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.body.extend_from_slice(bytes);
        self
    }

    pub(crate) fn finish(&self) -> Vec<u8> {
        let mut document = Vec::new();
        let start = begin_chunk(&mut document, RES_XML_TYPE, 8);
        document.extend_from_slice(&self.body);
        finalize_chunk(&mut document, start);
        document
    }

    fn namespace(&mut self, chunk_type: u16, line: u32, prefix: u32, uri: u32) -> &mut Self {
        let start = self.begin_node(chunk_type, line);
        write_u32(&mut self.body, prefix);
        write_u32(&mut self.body, uri);
        finalize_chunk(&mut self.body, start);
        self
    }

    fn begin_node(&mut self, chunk_type: u16, line: u32) -> usize {
        let start = begin_chunk(&mut self.body, chunk_type, 16);
        write_u32(&mut self.body, line);
        write_u32(&mut self.body, self.comment.take().unwrap_or(NO_INDEX));
        start
    }
}

fn write_res_value(buf: &mut Vec<u8>, value: ResValue) {
    write_u16(buf, value.size);
    write_u8(buf, 0);
    write_u8(buf, value.data_type.code());
    write_u32(buf, value.data);
}
