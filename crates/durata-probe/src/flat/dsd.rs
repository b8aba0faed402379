//! DSF (DSD stream file) duration from the `fmt ` chunk.

use std::io::{Read, Seek};

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};

/// Extract the duration in seconds from a DSF stream.
///
/// The `DSD ` chunk is skipped via its own 64-bit size; the `fmt ` chunk
/// that follows carries the sample frequency and total sample count per
/// channel.
pub fn duration<R: Read + Seek>(reader: &mut R) -> Result<f64> {
    let mut cursor = ByteCursor::new(reader)?;

    if cursor.read_tag()? != *b"DSD " {
        return Err(Error::Malformed("missing DSD chunk marker"));
    }
    let chunk_size = cursor.read_u64_le()?;
    if chunk_size < 12 {
        return Err(Error::Malformed("DSD chunk too short"));
    }
    // Remainder of the DSD chunk: total file size + metadata pointer.
    cursor.skip(chunk_size - 12)?;

    if cursor.read_tag()? != *b"fmt " {
        return Err(Error::Malformed("missing fmt chunk"));
    }
    cursor.skip(8)?; // fmt chunk size
    cursor.skip(16)?; // format version, format id, channel type, channel num
    let sample_rate = cursor.read_u32_le()?;
    cursor.skip(4)?; // bits per sample
    let sample_count = cursor.read_u64_le()?;

    if sample_rate == 0 {
        return Err(Error::Malformed("fmt chunk sample frequency is zero"));
    }
    Ok(sample_count as f64 / f64::from(sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn dsf(sample_rate: u32, sample_count: u64) -> Vec<u8> {
        let mut v = b"DSD ".to_vec();
        v.extend_from_slice(&28u64.to_le_bytes()); // DSD chunk size
        v.extend_from_slice(&0u64.to_le_bytes()); // total file size
        v.extend_from_slice(&0u64.to_le_bytes()); // metadata pointer
        v.extend_from_slice(b"fmt ");
        v.extend_from_slice(&52u64.to_le_bytes()); // fmt chunk size
        v.extend_from_slice(&1u32.to_le_bytes()); // format version
        v.extend_from_slice(&0u32.to_le_bytes()); // format id
        v.extend_from_slice(&2u32.to_le_bytes()); // channel type
        v.extend_from_slice(&2u32.to_le_bytes()); // channel num
        v.extend_from_slice(&sample_rate.to_le_bytes());
        v.extend_from_slice(&1u32.to_le_bytes()); // bits per sample
        v.extend_from_slice(&sample_count.to_le_bytes());
        v.extend_from_slice(&4096u32.to_le_bytes()); // block size per channel
        v.extend_from_slice(&0u32.to_le_bytes()); // reserved
        v
    }

    #[test]
    fn test_dsf_duration() {
        let data = dsf(2_822_400, 28_224_000);
        let d = duration(&mut Cursor::new(data)).unwrap();
        assert!((d - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_dsd_marker() {
        let err = duration(&mut Cursor::new(b"RIFFxxxxxxxx".to_vec())).unwrap_err();
        assert!(matches!(err, Error::Malformed("missing DSD chunk marker")));
    }

    #[test]
    fn test_zero_sample_rate() {
        let data = dsf(0, 28_224_000);
        let err = duration(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
    }
}
