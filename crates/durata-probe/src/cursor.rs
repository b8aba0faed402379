//! Bounded read/seek cursor over a byte stream.
//!
//! Every traversal function threads a [`ByteCursor`] explicitly; nothing in
//! the crate relies on ambient stream position. Skipping seeks forward
//! without reading, so irrelevant subtrees cost the same regardless of size.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{Error, Result};

/// Read/seek cursor with an explicitly tracked absolute position.
pub struct ByteCursor<R> {
    inner: R,
    pos: u64,
}

impl<R: Read + Seek> ByteCursor<R> {
    /// Wrap a stream, adopting its current position.
    pub fn new(mut inner: R) -> Result<Self> {
        let pos = inner.stream_position()?;
        Ok(Self { inner, pos })
    }

    /// Current absolute offset.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Total stream length. Restores the current position.
    pub fn stream_len(&mut self) -> Result<u64> {
        let len = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(self.pos))?;
        Ok(len)
    }

    /// Fill `buf` completely, or fail with [`Error::TruncatedStream`] if the
    /// stream ends first.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.pos += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(Error::TruncatedStream)
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Seek forward by `n` bytes without reading them.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        self.seek_to(self.pos + n)
    }

    /// Seek to an absolute offset.
    pub fn seek_to(&mut self, pos: u64) -> Result<()> {
        if pos != self.pos {
            self.inner.seek(SeekFrom::Start(pos))?;
            self.pos = pos;
        }
        Ok(())
    }

    /// Rewind to the start of the stream.
    pub fn rewind(&mut self) -> Result<()> {
        self.seek_to(0)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.read_exact(&mut b)?;
        Ok(b[0])
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        let mut b = [0u8; 2];
        self.read_exact(&mut b)?;
        Ok(u16::from_be_bytes(b))
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        self.read_exact(&mut b)?;
        Ok(u32::from_be_bytes(b))
    }

    pub fn read_u64_be(&mut self) -> Result<u64> {
        let mut b = [0u8; 8];
        self.read_exact(&mut b)?;
        Ok(u64::from_be_bytes(b))
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        let mut b = [0u8; 2];
        self.read_exact(&mut b)?;
        Ok(u16::from_le_bytes(b))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        self.read_exact(&mut b)?;
        Ok(u32::from_le_bytes(b))
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        let mut b = [0u8; 8];
        self.read_exact(&mut b)?;
        Ok(u64::from_le_bytes(b))
    }

    /// Read a 4-byte tag.
    pub fn read_tag(&mut self) -> Result<[u8; 4]> {
        let mut b = [0u8; 4];
        self.read_exact(&mut b)?;
        Ok(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_tracks_position() {
        let mut cur = ByteCursor::new(Cursor::new(vec![1u8, 2, 3, 4, 5, 6])).unwrap();
        assert_eq!(cur.position(), 0);
        assert_eq!(cur.read_u32_be().unwrap(), 0x0102_0304);
        assert_eq!(cur.position(), 4);
    }

    #[test]
    fn test_short_read_is_truncated_stream() {
        let mut cur = ByteCursor::new(Cursor::new(vec![1u8, 2])).unwrap();
        assert!(matches!(cur.read_u32_be(), Err(Error::TruncatedStream)));
    }

    #[test]
    fn test_skip_and_seek() {
        let mut cur = ByteCursor::new(Cursor::new(vec![0u8; 64])).unwrap();
        cur.skip(10).unwrap();
        assert_eq!(cur.position(), 10);
        cur.seek_to(3).unwrap();
        assert_eq!(cur.position(), 3);
        assert_eq!(cur.stream_len().unwrap(), 64);
        assert_eq!(cur.position(), 3);
    }

    #[test]
    fn test_skip_past_end_is_allowed_until_read() {
        // Seeking beyond the end is legal; the next read reports truncation.
        let mut cur = ByteCursor::new(Cursor::new(vec![0u8; 4])).unwrap();
        cur.skip(100).unwrap();
        assert!(matches!(cur.read_u8(), Err(Error::TruncatedStream)));
    }
}
