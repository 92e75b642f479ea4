//! Seekable in-memory body stream.
//!
//! Route targets write their output straight into the response body; the
//! router appends whatever the target returns after it. The stream keeps a
//! cursor so middleware can rewind and re-read what was produced.

use std::borrow::Cow;
use std::io::{self, Read, Seek, SeekFrom, Write};

use bytes::{Bytes, BytesMut};

/// A message body backed by a growable byte buffer and a cursor.
#[derive(Clone, Debug, Default)]
pub struct Body {
    buf: BytesMut,
    pos: usize,
    closed: bool,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `data` at the cursor, overwriting or extending, and advances it.
    pub fn write(&mut self, data: impl AsRef<[u8]>) -> io::Result<usize> {
        self.ensure_open()?;
        let data = data.as_ref();
        let end = self.pos + data.len();

        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(data);
        self.pos = end;
        Ok(data.len())
    }

    /// Reads up to `n` bytes from the cursor.
    pub fn read(&mut self, n: usize) -> io::Result<Bytes> {
        self.ensure_open()?;
        let start = self.pos.min(self.buf.len());
        let end = (start + n).min(self.buf.len());
        self.pos = end;
        Ok(Bytes::copy_from_slice(&self.buf[start..end]))
    }

    /// Moves the cursor to an absolute offset, clamped to the length.
    pub fn seek(&mut self, offset: usize) -> io::Result<()> {
        self.ensure_open()?;
        self.pos = offset.min(self.buf.len());
        Ok(())
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// The whole buffer, regardless of the cursor.
    pub fn contents(&self) -> &[u8] {
        &self.buf
    }

    /// The whole buffer as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buf)
    }

    /// Discards the content and rewinds.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.pos = 0;
    }

    /// Releases the buffer. Every later read, write or seek fails.
    pub fn close(&mut self) {
        self.buf = BytesMut::new();
        self.pos = 0;
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    fn ensure_open(&self) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "body stream is closed"));
        }
        Ok(())
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::from(text.as_bytes().to_vec())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::from(text.into_bytes())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        let pos = bytes.len();
        Self { buf: BytesMut::from(bytes.as_slice()), pos, closed: false }
    }
}

impl Read for Body {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let chunk = Body::read(self, out.len())?;
        out[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}

impl Write for Body {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        Body::write(self, data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.ensure_open()
    }
}

impl Seek for Body {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => i64::try_from(n).unwrap_or(i64::MAX),
            SeekFrom::End(n) => self.buf.len() as i64 + n,
            SeekFrom::Current(n) => self.pos as i64 + n,
        };
        if target < 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "seek before start of body"));
        }
        Body::seek(self, usize::try_from(target).unwrap_or(usize::MAX))?;
        Ok(self.pos as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_rewind_and_read() {
        let mut body = Body::new();
        body.write("Hello world").unwrap();
        assert!(body.eof());

        body.seek(6).unwrap();
        assert_eq!(&body.read(3).unwrap()[..], b"wor");
        assert_eq!(&body.read(100).unwrap()[..], b"ld");
        assert!(body.eof());
        assert_eq!(body.text(), "Hello world");
    }

    #[test]
    fn write_after_seek_overwrites() {
        let mut body = Body::from("abcdef");
        body.seek(2).unwrap();
        body.write("XY").unwrap();
        assert_eq!(body.contents(), b"abXYef");
        assert_eq!(body.position(), 4);
    }

    #[test]
    fn io_traits_cooperate() {
        let mut body = Body::new();
        write!(body, "{}-{}", 1, 2).unwrap();
        body.rewind().unwrap();

        let mut text = String::new();
        body.read_to_string(&mut text).unwrap();
        assert_eq!(text, "1-2");
    }

    #[test]
    fn closed_body_rejects_io() {
        let mut body = Body::from("data");
        body.close();
        assert!(body.is_closed());
        assert!(body.is_empty());
        assert_eq!(body.write("x").unwrap_err().kind(), io::ErrorKind::BrokenPipe);
        assert!(body.read(1).is_err());
    }
}
