//! # durata-probe
//!
//! Pure Rust audio duration probing.
//!
//! This crate extracts the playback duration of audio-bearing files without
//! decoding or buffering the audio payload. Tree-structured containers
//! (MP4/MOV boxes, Matroska/WebM EBML elements) are navigated down the one
//! duration-bearing path, skipping irrelevant subtrees in constant time;
//! flat formats (MP3, ADTS AAC, FLAC, WAV, DSF, Ogg Vorbis) are scanned
//! linearly over their frame or chunk structure.
//!
//! ## Example
//!
//! ```no_run
//! let seconds = durata_probe::duration_of_file("audiobook.m4a").unwrap();
//! println!("{seconds:.3}s");
//! ```
//!
//! Streams already open elsewhere go through the dispatcher directly:
//!
//! ```no_run
//! use durata_probe::FileType;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! let mut reader = BufReader::new(File::open("talk.webm").unwrap());
//! let seconds = durata_probe::duration(&mut reader, FileType::Matroska).unwrap();
//! ```

pub mod container;
pub mod cursor;
pub mod error;
pub mod flat;
pub mod tree;

pub use error::{Error, Result};

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// Recognized file types, keyed by the caller's declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Raw AAC ADTS stream (.aac)
    Aac,
    /// DSD stream file (.dsf)
    Dsd,
    /// FLAC (.flac)
    Flac,
    /// Matroska and WebM (.mkv, .mka, .webm)
    Matroska,
    /// MPEG audio (.mp3, .mp2)
    Mp3,
    /// MPEG-4 Part 14 (.mp4, .m4a, .m4b, .mov)
    Mp4,
    /// Ogg Vorbis (.ogg)
    Ogg,
    /// RIFF/WAVE (.wav)
    Wav,
}

impl FileType {
    /// Get the file type from a path's extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "aac" => Some(Self::Aac),
            "dsf" => Some(Self::Dsd),
            "flac" => Some(Self::Flac),
            "mkv" | "mka" | "mk3d" | "webm" => Some(Self::Matroska),
            "mp3" | "mp2" => Some(Self::Mp3),
            "mp4" | "m4a" | "m4b" | "m4v" | "mov" => Some(Self::Mp4),
            "ogg" | "oga" => Some(Self::Ogg),
            "wav" | "wave" => Some(Self::Wav),
            _ => None,
        }
    }

    /// Detect the file type from a stream's magic bytes.
    ///
    /// Rewinds the stream afterward. MP3 and ADTS AAC have no reliable
    /// magic (both may open with an ID3v2 tag or a sync pattern), so they
    /// are never sniffed; use [`FileType::from_extension`] for those.
    pub fn sniff<R: Read + Seek>(reader: &mut R) -> Result<Option<Self>> {
        let mut magic = [0u8; 12];
        let result = reader.read_exact(&mut magic);
        reader.rewind()?;
        match result {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        }

        if magic[0..4] == [0x1A, 0x45, 0xDF, 0xA3] {
            return Ok(Some(Self::Matroska));
        }
        match &magic[4..8] {
            b"ftyp" | b"moov" | b"mdat" | b"free" => return Ok(Some(Self::Mp4)),
            _ => {}
        }
        match &magic[0..4] {
            b"fLaC" => Ok(Some(Self::Flac)),
            b"OggS" => Ok(Some(Self::Ogg)),
            b"DSD " => Ok(Some(Self::Dsd)),
            b"RIFF" if &magic[8..12] == b"WAVE" => Ok(Some(Self::Wav)),
            _ => Ok(None),
        }
    }
}

impl std::str::FromStr for FileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "aac" => Ok(Self::Aac),
            "dsd" | "dsf" => Ok(Self::Dsd),
            "flac" => Ok(Self::Flac),
            "matroska" | "mkv" | "webm" => Ok(Self::Matroska),
            "mp3" => Ok(Self::Mp3),
            "mp4" | "m4a" | "mov" => Ok(Self::Mp4),
            "ogg" => Ok(Self::Ogg),
            "wav" => Ok(Self::Wav),
            _ => Err(Error::UnknownFormat),
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Aac => "AAC",
            Self::Dsd => "DSD",
            Self::Flac => "FLAC",
            Self::Matroska => "Matroska",
            Self::Mp3 => "MP3",
            Self::Mp4 => "MP4",
            Self::Ogg => "Ogg",
            Self::Wav => "WAV",
        };
        write!(f, "{name}")
    }
}

/// Get the duration in seconds of a specific audio file type.
///
/// This is the main dispatcher: it rewinds the stream and routes to the
/// resolver for `file_type`. Calls hold no state beyond the stream itself,
/// so probing identical byte content always yields identical results.
pub fn duration<R: Read + Seek>(reader: &mut R, file_type: FileType) -> Result<f64> {
    reader.rewind()?;
    match file_type {
        FileType::Aac => flat::aac::duration(reader),
        FileType::Dsd => flat::dsd::duration(reader),
        FileType::Flac => flat::flac::duration(reader),
        FileType::Matroska => container::mkv::duration(reader),
        FileType::Mp3 => flat::mp3::duration(reader),
        FileType::Mp4 => container::mp4::duration(reader),
        FileType::Ogg => flat::ogg::duration(reader),
        FileType::Wav => flat::wav::duration(reader),
    }
}

/// Get the duration in seconds of an audio file on disk.
///
/// Detects the format from magic bytes, falling back to the file extension,
/// then dispatches to the matching resolver.
pub fn duration_of_file<P: AsRef<Path>>(path: P) -> Result<f64> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let file_type = match FileType::sniff(&mut reader)? {
        Some(file_type) => file_type,
        None => FileType::from_extension(path).ok_or(Error::UnknownFormat)?,
    };
    duration(&mut reader, file_type)
}
