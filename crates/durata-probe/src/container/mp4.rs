//! MP4/MOV box-tree duration extraction.
//!
//! The duration-bearing path is `moov.trak.mdia.{hdlr,mdhd}` with an optional
//! `edts.elst` override. Only audio tracks (`soun` handler) are considered;
//! everything else, including the sample data, is skipped without reading.

use std::io::{Read, Seek};

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::tree::{walk, Action, ByteRange, Element, HeaderDecoder};

/// Four-character box type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxType(pub [u8; 4]);

impl BoxType {
    pub const FTYP: Self = Self(*b"ftyp");
    pub const MOOV: Self = Self(*b"moov");
    pub const MDAT: Self = Self(*b"mdat");
    pub const FREE: Self = Self(*b"free");
    pub const MVHD: Self = Self(*b"mvhd");
    pub const TRAK: Self = Self(*b"trak");
    pub const MDIA: Self = Self(*b"mdia");
    pub const MDHD: Self = Self(*b"mdhd");
    pub const HDLR: Self = Self(*b"hdlr");
    pub const MINF: Self = Self(*b"minf");
    pub const STBL: Self = Self(*b"stbl");
    pub const EDTS: Self = Self(*b"edts");
    pub const ELST: Self = Self(*b"elst");

    /// Get the 4-char code as a string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl std::fmt::Display for BoxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Handler type carried by a track's `hdlr` box.
const SOUND_HANDLER: [u8; 4] = *b"soun";

/// Decoder for ISO box headers.
///
/// Layout: 32-bit big-endian size + 4-byte type tag. A size of 1 switches to
/// a trailing 64-bit size (16-byte header); a size of 0 means the box runs to
/// the end of its enclosing range.
pub struct BoxHeaderDecoder;

impl HeaderDecoder for BoxHeaderDecoder {
    type Id = BoxType;

    fn decode<R: Read + Seek>(
        &self,
        cursor: &mut ByteCursor<R>,
        enclosing: ByteRange,
    ) -> Result<Element<BoxType>> {
        let header_start = cursor.position();
        let size32 = cursor.read_u32_be()?;
        let id = BoxType(cursor.read_tag()?);

        let (size, header_len) = if size32 == 1 {
            (cursor.read_u64_be()?, 16u64)
        } else {
            (u64::from(size32), 8u64)
        };

        let content_start = header_start + header_len;
        let content_end = if size32 == 0 {
            enclosing.end
        } else {
            if size < header_len {
                return Err(Error::InvalidHeader("box size smaller than its header"));
            }
            header_start + size
        };
        if content_end < content_start {
            return Err(Error::InvalidHeader("box size smaller than its header"));
        }

        Ok(Element {
            id,
            content: ByteRange::new(content_start, content_end),
        })
    }
}

/// Per-track accumulator, alive for one `trak` subtree.
#[derive(Debug, Default)]
struct TrackState {
    is_audio: bool,
    media_timescale: Option<u64>,
    media_duration: Option<u64>,
    /// Summed normal-rate edit durations, in movie-timescale units.
    edit_total: Option<u64>,
}

/// Extract the audio duration in seconds from an MP4/MOV stream.
///
/// The stream must be positioned at the start of the container. Returns the
/// first audio track's duration in document order, preferring the edit-list
/// total over the media header when both are usable.
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
    let mut movie_timescale: Option<u32> = None;

    let classify = |id: BoxType| match id {
        BoxType::MOOV => Action::Enter,
        BoxType::MVHD | BoxType::TRAK => Action::Leaf,
        _ => Action::Skip,
    };

    let found = walk(
        cursor,
        range,
        &BoxHeaderDecoder,
        &classify,
        &mut |cur, elem| match elem.id {
            BoxType::MVHD => {
                movie_timescale = Some(read_mvhd_timescale(cur, elem.content)?);
                Ok(None)
            }
            BoxType::TRAK => track_duration(cur, elem.content, movie_timescale),
            _ => Ok(None),
        },
    )?;

    found.ok_or(Error::DurationNotFound)
}

/// Scan one `trak` subtree and resolve its duration, if it is an audio track
/// with a usable one.
fn track_duration<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    range: ByteRange,
    movie_timescale: Option<u32>,
) -> Result<Option<f64>> {
    let mut track = TrackState::default();

    let classify = |id: BoxType| match id {
        BoxType::MDIA | BoxType::MINF | BoxType::STBL | BoxType::EDTS => Action::Enter,
        BoxType::HDLR | BoxType::MDHD | BoxType::ELST => Action::Leaf,
        _ => Action::Skip,
    };

    let _: Option<()> = walk(
        cursor,
        range,
        &BoxHeaderDecoder,
        &classify,
        &mut |cur, elem| {
            match elem.id {
                BoxType::HDLR => {
                    // QuickTime tracks carry a second, data-handler hdlr
                    // inside minf; the sound tag from either marks audio.
                    track.is_audio |= read_handler_is_audio(cur, elem.content)?;
                }
                BoxType::MDHD => {
                    let (timescale, duration) = read_mdhd(cur, elem.content)?;
                    track.media_timescale = Some(timescale);
                    track.media_duration = Some(duration);
                }
                BoxType::ELST => {
                    // A track seen before the movie header cannot express its
                    // edit list in movie-timescale units.
                    if movie_timescale.is_some() {
                        track.edit_total = read_elst_total(cur, elem.content)?;
                    }
                }
                _ => {}
            }
            Ok(None)
        },
    )?;

    if !track.is_audio {
        return Ok(None);
    }
    if let (Some(total), Some(scale)) = (track.edit_total, movie_timescale) {
        if scale > 0 {
            return Ok(Some(total as f64 / f64::from(scale)));
        }
    }
    match (track.media_duration, track.media_timescale) {
        (Some(duration), Some(timescale)) if timescale > 0 => {
            Ok(Some(duration as f64 / timescale as f64))
        }
        _ => Ok(None),
    }
}

/// `mvhd`: version 1 carries 8-byte timestamps, version 0 carries 4-byte
/// ones; only the 32-bit movie timescale is retained.
fn read_mvhd_timescale<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    content: ByteRange,
) -> Result<u32> {
    let version = read_full_box_version(cursor, content, "mvhd")?;
    let needed = if version == 1 { 24 } else { 16 };
    if content.len() < needed {
        return Err(Error::UnsupportedEncoding {
            element: "mvhd",
            len: content.len(),
        });
    }
    cursor.skip(if version == 1 { 16 } else { 8 })?;
    cursor.read_u32_be()
}

/// `mdhd`: same version split as `mvhd`, yielding the track's own timescale
/// and duration.
fn read_mdhd<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    content: ByteRange,
) -> Result<(u64, u64)> {
    let version = read_full_box_version(cursor, content, "mdhd")?;
    let needed = if version == 1 { 32 } else { 20 };
    if content.len() < needed {
        return Err(Error::UnsupportedEncoding {
            element: "mdhd",
            len: content.len(),
        });
    }
    if version == 1 {
        cursor.skip(16)?;
        let timescale = u64::from(cursor.read_u32_be()?);
        let duration = cursor.read_u64_be()?;
        Ok((timescale, duration))
    } else {
        cursor.skip(8)?;
        let timescale = u64::from(cursor.read_u32_be()?);
        let duration = u64::from(cursor.read_u32_be()?);
        Ok((timescale, duration))
    }
}

/// `hdlr`: the handler tag at offset 8 declares the track's media type.
fn read_handler_is_audio<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    content: ByteRange,
) -> Result<bool> {
    if content.len() < 12 {
        return Err(Error::UnsupportedEncoding {
            element: "hdlr",
            len: content.len(),
        });
    }
    cursor.skip(8)?;
    Ok(cursor.read_tag()? == SOUND_HANDLER)
}

/// `elst`: sum the durations of normal-rate entries, in movie-timescale
/// units. Entries with a rate other than exactly 1 are ignored.
fn read_elst_total<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    content: ByteRange,
) -> Result<Option<u64>> {
    let version = read_full_box_version(cursor, content, "elst")?;
    if content.len() < 8 {
        return Err(Error::UnsupportedEncoding {
            element: "elst",
            len: content.len(),
        });
    }
    let entry_count = u64::from(cursor.read_u32_be()?);
    let entry_size: u64 = if version == 1 { 20 } else { 12 };
    if 8 + entry_count * entry_size > content.len() {
        return Err(Error::UnsupportedEncoding {
            element: "elst",
            len: content.len(),
        });
    }

    let mut total: u64 = 0;
    for _ in 0..entry_count {
        let segment_duration = if version == 1 {
            let d = cursor.read_u64_be()?;
            cursor.skip(8)?; // media_time
            d
        } else {
            let d = u64::from(cursor.read_u32_be()?);
            cursor.skip(4)?; // media_time
            d
        };
        let rate_integer = cursor.read_u16_be()? as i16;
        cursor.skip(2)?; // media_rate_fraction
        if rate_integer == 1 {
            total += segment_duration;
        }
    }

    Ok(if total > 0 { Some(total) } else { None })
}

/// Read the leading version byte of a full box, skipping the 3 flag bytes.
fn read_full_box_version<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    content: ByteRange,
    element: &'static str,
) -> Result<u8> {
    if content.len() < 4 {
        return Err(Error::UnsupportedEncoding {
            element,
            len: content.len(),
        });
    }
    let version = cursor.read_u8()?;
    cursor.skip(3)?;
    Ok(version)
}
