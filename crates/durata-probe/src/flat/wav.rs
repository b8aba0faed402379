//! WAV duration from the RIFF/WAVE chunk list.

use std::io::{Read, Seek};

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};

/// Extract the duration in seconds from a RIFF/WAVE stream.
///
/// Scans the flat chunk list for `fmt ` (byte rate) and `data` (payload
/// size); duration is their quotient. Works for PCM and non-PCM encodings
/// alike since only the average byte rate is consulted.
pub fn duration<R: Read + Seek>(reader: &mut R) -> Result<f64> {
    let mut cursor = ByteCursor::new(reader)?;
    let len = cursor.stream_len()?;

    if cursor.read_tag()? != *b"RIFF" {
        return Err(Error::Malformed("missing RIFF marker"));
    }
    cursor.skip(4)?; // RIFF size
    if cursor.read_tag()? != *b"WAVE" {
        return Err(Error::Malformed("missing WAVE marker"));
    }

    let mut byte_rate: Option<u32> = None;
    let mut data_size: Option<u32> = None;

    while cursor.position() + 8 <= len {
        let chunk_id = cursor.read_tag()?;
        let chunk_size = cursor.read_u32_le()?;

        match &chunk_id {
            b"fmt " => {
                if chunk_size < 16 {
                    return Err(Error::Malformed("fmt chunk too short"));
                }
                cursor.skip(8)?; // format, channels, sample rate
                byte_rate = Some(cursor.read_u32_le()?);
                cursor.skip(4)?; // block align, bits per sample
                cursor.skip(u64::from(chunk_size) - 16)?;
            }
            b"data" => {
                data_size = Some(chunk_size);
                if byte_rate.is_some() {
                    break;
                }
                cursor.skip(u64::from(chunk_size))?;
            }
            _ => cursor.skip(u64::from(chunk_size))?,
        }

        if byte_rate.is_some() && data_size.is_some() {
            break;
        }
        // RIFF chunks are word aligned; odd sizes are followed by a pad byte.
        if chunk_size % 2 == 1 {
            cursor.skip(1)?;
        }
    }

    let byte_rate = byte_rate.ok_or(Error::Malformed("missing fmt chunk"))?;
    let data_size = data_size.ok_or(Error::Malformed("missing data chunk"))?;
    if byte_rate == 0 {
        return Err(Error::Malformed("fmt chunk byte rate is zero"));
    }
    Ok(f64::from(data_size) / f64::from(byte_rate))
}
