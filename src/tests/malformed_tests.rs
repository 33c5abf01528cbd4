use crate::res::AxmlError;
use crate::tests::fixture::{write_u16, write_u32, AxmlBuilder, PoolBuilder, NO_INDEX};
use crate::xml::{EventCode, Warning, XmlParser};

fn parser_for(bytes: &[u8]) -> XmlParser<&[u8], Vec<Warning>> {
    XmlParser::with_diagnostics(bytes, Vec::new())
}

fn namespace_document() -> Vec<u8> {
    let mut pool = PoolBuilder::utf16();
    let prefix = pool.intern("p");
    let uri = pool.intern("urn:p");
    AxmlBuilder::new()
        .string_pool(&pool)
        .start_namespace(1, prefix, uri)
        .finish()
}

#[test]
fn first_chunk_must_be_a_document() {
    let mut pool = PoolBuilder::utf16();
    pool.intern("a");
    let bytes = pool.to_chunk();
    let mut parser = parser_for(&bytes);
    assert!(matches!(parser.next(), Err(AxmlError::MalformedHeader(_))));
    assert_eq!(parser.next().expect("bad"), EventCode::BadDocument);
}

#[test]
fn truncated_stream_is_a_header_error() {
    let mut bytes = namespace_document();
    bytes.truncate(bytes.len() - 6);

    let mut parser = parser_for(&bytes);
    assert_eq!(parser.next().expect("start"), EventCode::StartDocument);
    assert!(matches!(parser.next(), Err(AxmlError::MalformedHeader(_))));
    assert_eq!(parser.event_code(), EventCode::BadDocument);
    assert_eq!(parser.line_number(), None);
    for _ in 0..3 {
        assert_eq!(parser.next().expect("still bad"), EventCode::BadDocument);
    }
}

#[test]
fn chunk_larger_than_its_document_is_a_header_error() {
    let mut bytes = namespace_document();
    let last = bytes.len() - 24;
    bytes[last + 4..last + 8].copy_from_slice(&64u32.to_le_bytes());

    let mut parser = parser_for(&bytes);
    assert_eq!(parser.next().expect("start"), EventCode::StartDocument);
    assert!(matches!(parser.next(), Err(AxmlError::MalformedHeader(_))));
    assert_eq!(parser.next().expect("bad"), EventCode::BadDocument);
}

#[test]
fn partial_header_inside_document() {
    let bytes = AxmlBuilder::new().raw_bytes(&[1, 2, 3]).finish();
    let mut parser = parser_for(&bytes);
    assert_eq!(parser.next().expect("start"), EventCode::StartDocument);
    assert!(matches!(parser.next(), Err(AxmlError::MalformedHeader(_))));
}

#[test]
fn header_size_smaller_than_preamble() {
    let mut bytes = Vec::new();
    write_u16(&mut bytes, 0x0003);
    write_u16(&mut bytes, 4);
    write_u32(&mut bytes, 8);
    let mut parser = parser_for(&bytes);
    assert!(matches!(parser.next(), Err(AxmlError::MalformedHeader(_))));
}

#[test]
fn string_offset_outside_pool_is_a_chunk_error() {
    let mut chunk = Vec::new();
    write_u16(&mut chunk, 0x0001);
    write_u16(&mut chunk, 28);
    write_u32(&mut chunk, 32);
    write_u32(&mut chunk, 1); // stringCount
    write_u32(&mut chunk, 0); // styleCount
    write_u32(&mut chunk, 0); // flags
    write_u32(&mut chunk, 32); // stringsStart
    write_u32(&mut chunk, 0); // stylesStart
    write_u32(&mut chunk, 0x1000);
    let bytes = AxmlBuilder::new().raw_bytes(&chunk).finish();

    let mut parser = parser_for(&bytes);
    parser.next().expect("start");
    assert!(matches!(
        parser.next(),
        Err(AxmlError::MalformedChunk { chunk_type: 0x0001, .. })
    ));
    assert_eq!(parser.next().expect("bad"), EventCode::BadDocument);
}

#[test]
fn short_attribute_stride_is_a_chunk_error() {
    let mut chunk = Vec::new();
    write_u16(&mut chunk, 0x0102);
    write_u16(&mut chunk, 16);
    write_u32(&mut chunk, 56);
    write_u32(&mut chunk, 1);
    write_u32(&mut chunk, NO_INDEX);
    write_u32(&mut chunk, NO_INDEX);
    write_u32(&mut chunk, 0);
    write_u16(&mut chunk, 20);
    write_u16(&mut chunk, 12); // attributeSize
    write_u16(&mut chunk, 1);
    write_u16(&mut chunk, 0);
    write_u16(&mut chunk, 0);
    write_u16(&mut chunk, 0);
    chunk.resize(56, 0);
    let bytes = AxmlBuilder::new().raw_bytes(&chunk).finish();

    let mut parser = parser_for(&bytes);
    parser.next().expect("start");
    assert!(matches!(
        parser.next(),
        Err(AxmlError::MalformedChunk { chunk_type: 0x0102, .. })
    ));
}
