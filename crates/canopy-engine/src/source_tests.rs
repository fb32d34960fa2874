use crate::source::{ByteReader, ChunkedSource, TextSource};

#[test]
fn str_source_serves_whole_tail() {
    let source = "hello";
    assert_eq!(TextSource::len(&source), 5);
    assert_eq!(source.chunk_at(0), b"hello");
    assert_eq!(source.chunk_at(3), b"lo");
    assert_eq!(source.chunk_at(5), b"");
    assert_eq!(source.chunk_at(99), b"");
}

#[test]
fn chunked_source_spans_pieces() {
    let source = ChunkedSource::new(vec![b"ab".to_vec(), b"".to_vec(), b"cde".to_vec()]);

    assert_eq!(TextSource::len(&source), 5);
    assert_eq!(source.chunk_at(0), b"ab");
    assert_eq!(source.chunk_at(1), b"b");
    assert_eq!(source.chunk_at(2), b"cde");
    assert_eq!(source.chunk_at(4), b"e");
    assert_eq!(source.chunk_at(5), b"");
}

#[test]
fn byte_reader_crosses_chunk_boundaries() {
    let source = ChunkedSource::new(vec![b"ab".to_vec(), b"cd".to_vec()]);
    let mut reader = ByteReader::new(&source);

    assert_eq!(reader.byte_at(0), Some(b'a'));
    assert_eq!(reader.byte_at(2), Some(b'c'));
    assert_eq!(reader.byte_at(1), Some(b'b'));
    assert_eq!(reader.byte_at(3), Some(b'd'));
    assert_eq!(reader.byte_at(4), None);
}

#[test]
fn byte_reader_slice_collects_across_chunks() {
    let source = ChunkedSource::new(vec![b"abc".to_vec(), b"def".to_vec()]);
    let mut reader = ByteReader::new(&source);

    assert_eq!(reader.slice(1, 5), b"bcde");
    assert_eq!(reader.slice(0, 6), b"abcdef");
    assert_eq!(reader.slice(5, 5), b"");
}
