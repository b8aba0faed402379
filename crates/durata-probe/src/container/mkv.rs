//! Matroska/WebM element-tree duration extraction.
//!
//! The duration-bearing path is Segment → Info → {Duration, TimecodeScale}.
//! Duration is a float in timecode-scale ticks; the timecode scale is
//! nanoseconds per tick and defaults to 1,000,000 when absent.

use std::io::{Read, Seek};

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::tree::{walk, Action, ByteRange, Element, HeaderDecoder};

const ID_EBML: u64 = 0x1A45DFA3;
const ID_SEGMENT: u64 = 0x18538067;
const ID_INFO: u64 = 0x1549A966;
const ID_DURATION: u64 = 0x4489;
const ID_TIMECODE_SCALE: u64 = 0x2AD7B1;

/// Nanoseconds per tick when no TimecodeScale element is present.
const DEFAULT_TIMECODE_SCALE: u64 = 1_000_000;

/// Decoder for EBML element headers.
///
/// Both the identifier and the size are variable-length integers whose first
/// set bit encodes the total byte length (1 to 8). Identifiers keep their
/// length-marker bits as part of the value; sizes mask the marker out. A size
/// with all data bits set means "unknown": the content extends to the end of
/// the enclosing range.
pub struct EbmlHeaderDecoder;

impl HeaderDecoder for EbmlHeaderDecoder {
    type Id = u64;

    fn decode<R: Read + Seek>(
        &self,
        cursor: &mut ByteCursor<R>,
        enclosing: ByteRange,
    ) -> Result<Element<u64>> {
        let (id, _) = read_vint(cursor, false)?;
        let (size, unknown) = read_vint(cursor, true)?;

        let start = cursor.position();
        let end = if unknown { enclosing.end } else { start + size };
        Ok(Element {
            id,
            content: ByteRange::new(start, end.max(start)),
        })
    }
}

/// Decode one variable-length integer. With `mask` the length-marker bit is
/// cleared from the first byte (size encoding); without it the raw bytes are
/// the value (identifier encoding). The second return is the all-data-bits-set
/// "unknown" sentinel, only meaningful for sizes.
fn read_vint<R: Read + Seek>(cursor: &mut ByteCursor<R>, mask: bool) -> Result<(u64, bool)> {
    let first = header_byte(cursor)?;
    let length = first.leading_zeros() + 1;
    if length > 8 {
        return Err(Error::InvalidHeader("VINT length exceeds 8 bytes"));
    }

    let mut value = if mask {
        u64::from(first) & (0xFFu64 >> length)
    } else {
        u64::from(first)
    };
    for _ in 1..length {
        value = (value << 8) | u64::from(header_byte(cursor)?);
    }

    let data_bits = 7 * length;
    let all_ones = mask && value == (1u64 << data_bits) - 1;
    Ok((value, all_ones))
}

/// A truncated element header is a malformed header, never an allowed EOF.
fn header_byte<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<u8> {
    match cursor.read_u8() {
        Err(Error::TruncatedStream) => Err(Error::InvalidHeader("stream exhausted mid-header")),
        other => other,
    }
}

/// Extract the duration in seconds from a Matroska/WebM stream.
///
/// The stream must be positioned at the start of the container and open with
/// an EBML identification element, else the call fails [`Error::NotEbml`]
/// without reading further.
pub fn duration<R: Read + Seek>(reader: &mut R) -> Result<f64> {
    let mut cursor = ByteCursor::new(reader)?;
    let result = resolve(&mut cursor);
    if result.is_err() {
        let _ = cursor.rewind();
    }
    result
}

fn resolve<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<f64> {
    let range = ByteRange::new(cursor.position(), cursor.stream_len()?);

    let identification = match EbmlHeaderDecoder.decode(cursor, range) {
        Ok(elem) if elem.id == ID_EBML => elem,
        Ok(_) => return Err(Error::NotEbml),
        Err(Error::InvalidHeader(_)) => return Err(Error::NotEbml),
        Err(e) => return Err(e),
    };
    if identification.content.end > range.end {
        return Err(Error::InvalidContainerSize {
            child_end: identification.content.end,
            parent_end: range.end,
        });
    }
    cursor.seek_to(identification.content.end)?;

    let rest = ByteRange::new(identification.content.end, range.end);
    let classify = |id: u64| match id {
        ID_SEGMENT => Action::Enter,
        ID_INFO => Action::Leaf,
        _ => Action::Skip,
    };
    let found = walk(
        cursor,
        rest,
        &EbmlHeaderDecoder,
        &classify,
        &mut |cur, elem| info_duration(cur, elem.content),
    )?;
    found.ok_or(Error::DurationNotFound)
}

/// Scan one Info block for the duration and timecode-scale leaves, in either
/// order, stopping as soon as both have been seen. An Info block without a
/// duration yields `None` and the outer scan continues.
fn info_duration<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    range: ByteRange,
) -> Result<Option<f64>> {
    let mut raw_duration: Option<f64> = None;
    let mut timecode_scale: Option<u64> = None;

    let classify = |id: u64| match id {
        ID_DURATION | ID_TIMECODE_SCALE => Action::Leaf,
        _ => Action::Skip,
    };
    let _: Option<()> = walk(
        cursor,
        range,
        &EbmlHeaderDecoder,
        &classify,
        &mut |cur, elem| {
            match elem.id {
                ID_DURATION => {
                    raw_duration = Some(read_float(cur, elem.content)?);
                }
                ID_TIMECODE_SCALE => {
                    let scale = read_uint(cur, elem.content)?;
                    if scale == 0 {
                        return Err(Error::InvalidTimescale);
                    }
                    timecode_scale = Some(scale);
                }
                _ => {}
            }
            Ok(if raw_duration.is_some() && timecode_scale.is_some() {
                Some(())
            } else {
                None
            })
        },
    )?;

    let scale = timecode_scale.unwrap_or(DEFAULT_TIMECODE_SCALE);
    Ok(raw_duration.map(|ticks| ticks * scale as f64 / 1e9))
}

/// Duration leaf: 4-byte or 8-byte big-endian IEEE-754 float.
fn read_float<R: Read + Seek>(cursor: &mut ByteCursor<R>, content: ByteRange) -> Result<f64> {
    match content.len() {
        4 => Ok(f64::from(f32::from_bits(cursor.read_u32_be()?))),
        8 => Ok(f64::from_bits(cursor.read_u64_be()?)),
        len => Err(Error::UnsupportedEncoding {
            element: "Duration",
            len,
        }),
    }
}

/// TimecodeScale leaf: 1 to 8 byte big-endian unsigned integer.
fn read_uint<R: Read + Seek>(cursor: &mut ByteCursor<R>, content: ByteRange) -> Result<u64> {
    let len = content.len();
    if len == 0 || len > 8 {
        return Err(Error::UnsupportedEncoding {
            element: "TimecodeScale",
            len,
        });
    }
    let mut buf = [0u8; 8];
    cursor.read_exact(&mut buf[..len as usize])?;
    let mut value = 0u64;
    for &b in &buf[..len as usize] {
        value = (value << 8) | u64::from(b);
    }
    Ok(value)
}
