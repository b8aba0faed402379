//! Ogg Vorbis duration from page granule positions.

use std::io::{Read, Seek};

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};

const IDENT_MAGIC: &[u8; 7] = b"\x01vorbis";

/// Minimum size of a Vorbis identification header packet.
const IDENT_LEN: u64 = 30;

/// End-of-stream flag in the page header type field.
const EOS: u8 = 0x04;

/// Extract the duration in seconds from an Ogg Vorbis stream.
///
/// The identification header gives the sample rate; the end-of-stream page's
/// granule position is the total sample count. Page payloads are skipped via
/// the segment table, not read.
pub fn duration<R: Read + Seek>(reader: &mut R) -> Result<f64> {
    let mut cursor = ByteCursor::new(reader)?;
    let len = cursor.stream_len()?;

    let mut samples: u64 = 0;
    let mut sample_rate: u32 = 0;

    while cursor.position() + 27 <= len {
        let mut header = [0u8; 27];
        cursor.read_exact(&mut header)?;
        if &header[0..4] != b"OggS" {
            return Err(Error::Malformed("missing OggS capture pattern"));
        }
        let header_type = header[5];
        let granule = u64::from_le_bytes(header[6..14].try_into().unwrap());
        let page_segments = usize::from(header[26]);

        let mut segment_table = [0u8; 255];
        cursor.read_exact(&mut segment_table[..page_segments])?;
        let data_size: u64 = segment_table[..page_segments]
            .iter()
            .map(|&b| u64::from(b))
            .sum();

        if header_type & EOS != 0 {
            samples = granule;
        }

        let data_start = cursor.position();
        if sample_rate == 0 && data_size >= IDENT_LEN {
            let mut magic = [0u8; 7];
            cursor.read_exact(&mut magic)?;
            if &magic == IDENT_MAGIC {
                cursor.skip(5)?; // vorbis_version + audio_channels
                sample_rate = cursor.read_u32_le()?;
            }
        }
        cursor.seek_to(data_start + data_size)?;
    }

    if sample_rate == 0 {
        return Err(Error::Malformed("missing Vorbis identification header"));
    }
    Ok(samples as f64 / f64::from(sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn page(header_type: u8, granule: u64, payload: &[u8]) -> Vec<u8> {
        assert!(payload.len() <= 255);
        let mut v = b"OggS".to_vec();
        v.push(0); // version
        v.push(header_type);
        v.extend_from_slice(&granule.to_le_bytes());
        v.extend_from_slice(&1u32.to_le_bytes()); // bitstream serial
        v.extend_from_slice(&0u32.to_le_bytes()); // page sequence
        v.extend_from_slice(&0u32.to_le_bytes()); // checksum
        v.push(1); // one segment
        v.push(payload.len() as u8);
        v.extend_from_slice(payload);
        v
    }

    fn ident_packet(sample_rate: u32) -> Vec<u8> {
        let mut p = IDENT_MAGIC.to_vec();
        p.extend_from_slice(&0u32.to_le_bytes()); // vorbis_version
        p.push(2); // audio_channels
        p.extend_from_slice(&sample_rate.to_le_bytes());
        p.extend_from_slice(&[0u8; 12]); // bitrate max/nominal/min
        p.push(0xB8); // blocksizes
        p.push(1); // framing flag
        p
    }

    #[test]
    fn test_granule_over_sample_rate() {
        let mut data = page(0x02, 0, &ident_packet(44100));
        data.extend(page(0x00, 44_100, &[0u8; 64]));
        data.extend(page(EOS, 88_200, &[0u8; 64]));
        let d = duration(&mut Cursor::new(data)).unwrap();
        assert!((d - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_ident_header() {
        let data = page(EOS, 88_200, &[0u8; 64]);
        let err = duration(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
    }

    #[test]
    fn test_not_ogg() {
        let err = duration(&mut Cursor::new(vec![0u8; 64])).unwrap_err();
        assert!(matches!(err, Error::Malformed("missing OggS capture pattern")));
    }
}
