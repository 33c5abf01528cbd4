use crate::res::error::{AxmlError, AxmlResult};
use std::fmt;
use std::io::{self, ErrorKind, Read};

/// Raised through `io::Error` when the underlying source ends before a chunk's
/// declared size has been delivered.
#[derive(Debug)]
pub(crate) struct ChunkOverrun {
    chunk_type: u16,
    declared: u64,
    delivered: u64,
}

impl fmt::Display for ChunkOverrun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chunk 0x{:04x} declares {} bytes but the stream ended after {}",
            self.chunk_type, self.declared, self.delivered
        )
    }
}

impl std::error::Error for ChunkOverrun {}

/// Upper bound on buffers reserved from a declared size before the bytes have arrived.
pub(crate) const PREALLOC_LIMIT: u64 = 64 * 1024;

pub(crate) fn overrun_of(err: &io::Error) -> Option<&ChunkOverrun> {
    err.get_ref().and_then(|inner| inner.downcast_ref::<ChunkOverrun>())
}

/// A view over `inner` that delivers exactly `limit` bytes.
///
/// Reads past the limit report end-of-data even when `inner` holds more. An `inner` that
/// runs out first is an error, never a short chunk.
pub(crate) struct BoundedReader<R> {
    inner: R,
    chunk_type: u16,
    limit: u64,
    remaining: u64,
}

impl<R: Read> BoundedReader<R> {
    pub(crate) fn new(inner: R, chunk_type: u16, limit: u64) -> Self {
        BoundedReader {
            inner,
            chunk_type,
            limit,
            remaining: limit,
        }
    }

    pub(crate) fn chunk_type(&self) -> u16 {
        self.chunk_type
    }

    pub(crate) fn remaining(&self) -> u64 {
        self.remaining
    }

    pub(crate) fn consumed(&self) -> u64 {
        self.limit - self.remaining
    }

    pub(crate) fn read_u8(&mut self) -> AxmlResult<u8> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf)?;
        Ok(buf[0])
    }

    pub(crate) fn read_u16(&mut self) -> AxmlResult<u16> {
        let mut buf = [0u8; 2];
        self.fill(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub(crate) fn read_u32(&mut self) -> AxmlResult<u32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Discard `count` bytes, failing if the chunk ends first.
    pub(crate) fn skip(&mut self, count: u64) -> AxmlResult<()> {
        if count > self.remaining {
            malformed!(
                self.chunk_type,
                "cannot skip {} bytes with {} left in the chunk",
                count,
                self.remaining
            );
        }
        let copied = io::copy(&mut self.by_ref().take(count), &mut io::sink());
        let skipped = copied.map_err(|err| self.decode_error(err))?;
        debug_assert_eq!(skipped, count);
        Ok(())
    }

    /// Move the read position to `offset` bytes from the start of the bounded view.
    pub(crate) fn skip_to(&mut self, offset: u64) -> AxmlResult<()> {
        let consumed = self.consumed();
        if offset < consumed {
            malformed!(
                self.chunk_type,
                "offset {} lies before the read position {}",
                offset,
                consumed
            );
        }
        self.skip(offset - consumed)
    }

    /// Read everything up to the limit.
    pub(crate) fn read_remaining(&mut self) -> AxmlResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.remaining.min(PREALLOC_LIMIT) as usize);
        self.read_to_end(&mut buf)
            .map_err(|err| self.decode_error(err))?;
        Ok(buf)
    }

    /// Consume whatever is left of the view, returning how many bytes were discarded.
    pub(crate) fn drain(&mut self) -> AxmlResult<u64> {
        io::copy(self, &mut io::sink()).map_err(|err| self.decode_error(err))
    }

    fn fill(&mut self, buf: &mut [u8]) -> AxmlResult<()> {
        self.read_exact(buf).map_err(|err| self.decode_error(err))
    }

    fn decode_error(&self, err: io::Error) -> AxmlError {
        if let Some(overrun) = overrun_of(&err) {
            return AxmlError::MalformedHeader(overrun.to_string());
        }
        if err.kind() == ErrorKind::UnexpectedEof {
            return AxmlError::MalformedChunk {
                chunk_type: self.chunk_type,
                message: format!("chunk body ends after {} bytes", self.limit),
            };
        }
        AxmlError::Io(err)
    }
}

impl<R: Read> Read for BoundedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let max = buf.len().min(self.remaining.min(usize::MAX as u64) as usize);
        let n = self.inner.read(&mut buf[..max])?;
        if n == 0 {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                ChunkOverrun {
                    chunk_type: self.chunk_type,
                    declared: self.limit,
                    delivered: self.consumed(),
                },
            ));
        }
        self.remaining -= n as u64;
        Ok(n)
    }
}
