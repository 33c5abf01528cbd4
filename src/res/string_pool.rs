use crate::res::bounded::BoundedReader;
use crate::res::chunk::{ChunkHeader, CHUNK_HEADER_SIZE, RES_STRING_POOL_TYPE};
use crate::res::error::{AxmlError, AxmlResult};
use bitflags::bitflags;
use nom::bytes::complete::take;
use nom::multi::count;
use nom::number::complete::{le_u16, le_u32, le_u8};
use nom::sequence::tuple;
use nom::IResult;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::slice;

/// Index value meaning "no string".
pub const NO_ENTRY_INDEX: u32 = 0xFFFF_FFFF;

/// Name index that terminates the span list of one string.
pub const SPAN_END: u32 = 0xFFFF_FFFF;

/// Size of `ResStringPool_header`, preamble included.
pub const STRING_POOL_HEADER_SIZE: u16 = 28;

bitflags! {
    /// `ResStringPool_header::flags`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct StringPoolFlags: u32 {
        const SORTED = 0x0000_0001;
        const UTF8 = 0x0000_0100;
    }
}

/// A `ResStringPool_ref`: an index into the document's string pool, or nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StringRef(Option<u32>);

impl StringRef {
    pub const NONE: StringRef = StringRef(None);

    pub fn new(index: u32) -> Self {
        StringRef(Some(index))
    }

    /// Interpret a raw field, mapping [`NO_ENTRY_INDEX`] to `None`.
    pub fn from_raw(raw: u32) -> Self {
        if raw == NO_ENTRY_INDEX {
            StringRef(None)
        } else {
            StringRef(Some(raw))
        }
    }

    pub fn index(self) -> Option<u32> {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0.is_none()
    }
}

/// One `ResStringPool_span`: a named markup run over characters of a pooled string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSpan {
    pub name: StringRef,
    pub first_char: u32,
    pub last_char: u32,
}

impl StyleSpan {
    /// Marks the end of the spans belonging to one string.
    pub const END: StyleSpan = StyleSpan {
        name: StringRef::NONE,
        first_char: SPAN_END,
        last_char: SPAN_END,
    };

    pub fn is_end(&self) -> bool {
        *self == StyleSpan::END
    }
}

/// The fields of `ResStringPool_header` after the chunk preamble.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StringPoolHeader {
    pub string_count: u32,
    pub style_count: u32,
    pub flags: StringPoolFlags,
    /// Offset of string data from the start of the chunk.
    pub strings_start: u32,
    /// Offset of style data from the start of the chunk.
    pub styles_start: u32,
}

/// A decoded string pool.
///
/// Strings and style spans are decoded once and never change afterwards, so indices stay
/// valid for the lifetime of the pool.
#[derive(Clone, Debug)]
pub struct StringPool {
    header: StringPoolHeader,
    strings: Vec<String>,
    styles: Vec<StyleSpan>,
}

impl StringPool {
    /// Decode the body of a `RES_STRING_POOL_TYPE` chunk.
    ///
    /// `body` must be positioned right after the chunk preamble. The whole chunk is
    /// consumed since string records are located through offsets, not read in order.
    pub(crate) fn read<R: Read>(body: &mut BoundedReader<R>, chunk: &ChunkHeader) -> AxmlResult<Self> {
        if chunk.header_size < STRING_POOL_HEADER_SIZE {
            malformed!(
                RES_STRING_POOL_TYPE,
                "header size {} is smaller than {}",
                chunk.header_size,
                STRING_POOL_HEADER_SIZE
            );
        }

        let header = StringPoolHeader {
            string_count: body.read_u32()?,
            style_count: body.read_u32()?,
            flags: StringPoolFlags::from_bits_retain(body.read_u32()?),
            strings_start: body.read_u32()?,
            styles_start: body.read_u32()?,
        };

        let data = PoolData {
            base: CHUNK_HEADER_SIZE as usize + body.consumed() as usize,
            bytes: body.read_remaining()?,
        };

        let tables = data.at(chunk.header_size as usize)?;
        let table_bytes = (header.string_count as usize + header.style_count as usize) * 4;
        if table_bytes > tables.len() {
            malformed!(
                RES_STRING_POOL_TYPE,
                "index tables need {} bytes, chunk has {}",
                table_bytes,
                tables.len()
            );
        }
        let (tables, string_offsets) = count(le_u32, header.string_count as usize)(tables)
            .map_err(|err| parse_error("string index table", err))?;
        let (_, style_offsets) = count(le_u32, header.style_count as usize)(tables)
            .map_err(|err| parse_error("style index table", err))?;

        let utf8 = header.flags.contains(StringPoolFlags::UTF8);
        let mut strings = Vec::with_capacity(string_offsets.len());
        for (index, offset) in string_offsets.iter().enumerate() {
            let record = data.at(header.strings_start as usize + *offset as usize)?;
            let text = if utf8 {
                decode_utf8(record)
            } else {
                decode_utf16(record)
            };
            strings.push(text.map_err(|err| match err {
                AxmlError::MalformedChunk { chunk_type, message } => AxmlError::MalformedChunk {
                    chunk_type,
                    message: format!("{message} (string {index})"),
                },
                other => other,
            })?);
        }

        let mut styles = Vec::new();
        for offset in style_offsets {
            let mut input = data.at(header.styles_start as usize + offset as usize)?;
            loop {
                let (rest, span) = style_span(input).map_err(|err| parse_error("style span", err))?;
                input = rest;
                styles.push(span);
                if span.is_end() {
                    break;
                }
            }
        }

        Ok(StringPool {
            header,
            strings,
            styles,
        })
    }

    pub fn header(&self) -> &StringPoolHeader {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn is_utf8(&self) -> bool {
        self.header.flags.contains(StringPoolFlags::UTF8)
    }

    pub fn is_sorted(&self) -> bool {
        self.header.flags.contains(StringPoolFlags::SORTED)
    }

    /// Resolve an optional index; `None` is the empty string.
    pub fn get_string(&self, index: Option<u32>) -> AxmlResult<&str> {
        match index {
            None => Ok(""),
            Some(index) => self
                .strings
                .get(index as usize)
                .map(String::as_str)
                .ok_or_else(|| AxmlError::out_of_range(index, self.strings.len())),
        }
    }

    pub fn resolve(&self, reference: StringRef) -> AxmlResult<&str> {
        self.get_string(reference.index())
    }

    /// Index of the first string equal to `target`. Empty targets never match.
    pub fn index_of_string(&self, target: &str) -> Option<u32> {
        if target.is_empty() {
            return None;
        }
        self.strings
            .iter()
            .position(|s| s == target)
            .map(|index| index as u32)
    }

    /// The spans attached to `string_index`, in stored order.
    ///
    /// Every call walks the style data from the start, so the result does not depend on
    /// earlier calls.
    pub fn get_styles(&self, string_index: u32) -> AxmlResult<Styles<'_>> {
        if string_index as usize >= self.strings.len() {
            return Err(AxmlError::out_of_range(string_index, self.strings.len()));
        }
        Ok(Styles {
            spans: self.styles.iter(),
            current: 0,
            target: string_index,
            done: false,
        })
    }

    /// Every decoded span, end markers included.
    pub fn styles_raw(&self) -> &[StyleSpan] {
        &self.styles
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.strings
            .iter()
            .enumerate()
            .map(|(index, s)| (index as u32, s.as_str()))
    }
}

/// Iterator returned by [`StringPool::get_styles`].
pub struct Styles<'a> {
    spans: slice::Iter<'a, StyleSpan>,
    current: u32,
    target: u32,
    done: bool,
}

impl<'a> Iterator for Styles<'a> {
    type Item = &'a StyleSpan;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        for span in self.spans.by_ref() {
            if span.is_end() {
                self.current += 1;
                if self.current > self.target {
                    break;
                }
            } else if self.current == self.target {
                return Some(span);
            }
        }
        self.done = true;
        None
    }
}

/// The chunk bytes following the fixed pool header, addressed by chunk offset.
struct PoolData {
    base: usize,
    bytes: Vec<u8>,
}

impl PoolData {
    fn at(&self, chunk_offset: usize) -> AxmlResult<&[u8]> {
        if chunk_offset < self.base || chunk_offset - self.base > self.bytes.len() {
            malformed!(
                RES_STRING_POOL_TYPE,
                "offset {} lies outside the chunk ({}..{})",
                chunk_offset,
                self.base,
                self.base + self.bytes.len()
            );
        }
        Ok(&self.bytes[chunk_offset - self.base..])
    }
}

fn parse_error(what: &str, err: nom::Err<nom::error::Error<&[u8]>>) -> AxmlError {
    let message = match err {
        nom::Err::Incomplete(_) => format!("{what} is truncated"),
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            format!("{what} is truncated ({:?} with {} bytes left)", e.code, e.input.len())
        }
    };
    AxmlError::MalformedChunk {
        chunk_type: RES_STRING_POOL_TYPE,
        message,
    }
}

fn utf8_length(input: &[u8]) -> IResult<&[u8], usize> {
    let (input, first) = le_u8(input)?;
    if first & 0x80 == 0 {
        return Ok((input, usize::from(first)));
    }
    let (input, second) = le_u8(input)?;
    Ok((input, (usize::from(first & 0x7F) << 8) | usize::from(second)))
}

fn utf16_length(input: &[u8]) -> IResult<&[u8], usize> {
    let (input, first) = le_u16(input)?;
    if first & 0x8000 == 0 {
        return Ok((input, usize::from(first)));
    }
    let (input, second) = le_u16(input)?;
    Ok((input, (usize::from(first & 0x7FFF) << 16) | usize::from(second)))
}

/// UTF-16 unit count, then byte count, then the bytes.
fn utf8_record(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, _units) = utf8_length(input)?;
    let (input, byte_len) = utf8_length(input)?;
    take(byte_len)(input)
}

fn utf16_record(input: &[u8]) -> IResult<&[u8], Vec<u16>> {
    let (input, units) = utf16_length(input)?;
    count(le_u16, units)(input)
}

fn decode_utf8(record: &[u8]) -> AxmlResult<String> {
    let (_, bytes) = utf8_record(record).map_err(|err| parse_error("UTF-8 string", err))?;
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }
    match cesu8::from_java_cesu8(bytes) {
        Ok(text) => Ok(text.into_owned()),
        Err(_) => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Unpaired surrogates become U+FFFD; only a record overrunning the chunk is an error.
fn decode_utf16(record: &[u8]) -> AxmlResult<String> {
    let (_, units) = utf16_record(record).map_err(|err| parse_error("UTF-16 string", err))?;
    Ok(String::from_utf16_lossy(&units))
}

fn style_span(input: &[u8]) -> IResult<&[u8], StyleSpan> {
    let (input, name) = le_u32(input)?;
    if name == SPAN_END {
        return Ok((input, StyleSpan::END));
    }
    let (input, (first_char, last_char)) = tuple((le_u32, le_u32))(input)?;
    Ok((
        input,
        StyleSpan {
            name: StringRef::new(name),
            first_char,
            last_char,
        },
    ))
}
