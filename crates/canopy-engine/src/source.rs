//! Pull-based byte sources.
//!
//! The engine never performs its own I/O: callers hand it something that
//! can serve byte chunks on demand, and the lexer pulls as it scans.
//! Contiguous sources serve themselves in one chunk; chunked sources are
//! for callers assembling text from pieces (ropes, network buffers).

/// A synchronous, caller-paced byte source.
///
/// `chunk_at(offset)` returns a slice starting at `offset` (any non-empty
/// prefix of the remaining bytes is fine) and an empty slice at or past
/// the end.
pub trait TextSource {
    fn len(&self) -> usize;

    fn chunk_at(&self, offset: usize) -> &[u8];

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TextSource for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn chunk_at(&self, offset: usize) -> &[u8] {
        self.get(offset..).unwrap_or(&[])
    }
}

impl TextSource for &[u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn chunk_at(&self, offset: usize) -> &[u8] {
        self.get(offset..).unwrap_or(&[])
    }
}

impl TextSource for str {
    fn len(&self) -> usize {
        self.as_bytes().len()
    }

    fn chunk_at(&self, offset: usize) -> &[u8] {
        self.as_bytes().get(offset..).unwrap_or(&[])
    }
}

impl TextSource for &str {
    fn len(&self) -> usize {
        self.as_bytes().len()
    }

    fn chunk_at(&self, offset: usize) -> &[u8] {
        self.as_bytes().get(offset..).unwrap_or(&[])
    }
}

impl TextSource for String {
    fn len(&self) -> usize {
        self.as_bytes().len()
    }

    fn chunk_at(&self, offset: usize) -> &[u8] {
        self.as_bytes().get(offset..).unwrap_or(&[])
    }
}

impl TextSource for Vec<u8> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn chunk_at(&self, offset: usize) -> &[u8] {
        self.get(offset..).unwrap_or(&[])
    }
}

/// A source assembled from separately owned pieces.
pub struct ChunkedSource {
    chunks: Vec<Vec<u8>>,
    /// Start offset of each chunk, plus a total-length sentinel.
    offsets: Vec<usize>,
}

impl ChunkedSource {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        let mut offsets = Vec::with_capacity(chunks.len() + 1);
        let mut total = 0;
        for chunk in &chunks {
            offsets.push(total);
            total += chunk.len();
        }
        offsets.push(total);
        Self { chunks, offsets }
    }
}

impl TextSource for ChunkedSource {
    fn len(&self) -> usize {
        *self.offsets.last().unwrap_or(&0)
    }

    fn chunk_at(&self, offset: usize) -> &[u8] {
        if offset >= self.len() {
            return &[];
        }
        // Last chunk starting at or before `offset`.
        let index = match self.offsets.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        // Skip empty chunks sitting at this offset.
        let mut index = index.min(self.chunks.len() - 1);
        while self.chunks[index].is_empty() && index + 1 < self.chunks.len() {
            index += 1;
        }
        &self.chunks[index][offset - self.offsets[index]..]
    }
}

/// Byte-at-a-time reader over a [`TextSource`], caching the current chunk.
pub(crate) struct ByteReader<'s> {
    source: &'s dyn TextSource,
    chunk: &'s [u8],
    chunk_start: usize,
    len: usize,
}

impl<'s> ByteReader<'s> {
    pub fn new(source: &'s dyn TextSource) -> Self {
        let len = source.len();
        Self {
            source,
            chunk: &[],
            chunk_start: 0,
            len,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// The byte at `offset`, or None at end of input.
    #[inline]
    pub fn byte_at(&mut self, offset: usize) -> Option<u8> {
        if offset >= self.len {
            return None;
        }
        let rel = offset.wrapping_sub(self.chunk_start);
        if rel < self.chunk.len() {
            return Some(self.chunk[rel]);
        }
        self.chunk = self.source.chunk_at(offset);
        self.chunk_start = offset;
        self.chunk.first().copied()
    }

    /// Copy `range` out of the source.
    pub fn slice(&mut self, start: usize, end: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(end.saturating_sub(start));
        let mut pos = start;
        while pos < end {
            let chunk = self.source.chunk_at(pos);
            if chunk.is_empty() {
                break;
            }
            let take = chunk.len().min(end - pos);
            out.extend_from_slice(&chunk[..take]);
            pos += take;
        }
        out
    }
}
