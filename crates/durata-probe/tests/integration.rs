//! Integration tests for durata-probe.

use durata_probe::{duration, duration_of_file, Error, FileType};
use std::io::{Cursor, Seek, SeekFrom, Write};

/// Minimal FLAC stream: 44.1 kHz, 441000 samples (10 s).
fn flac_fixture() -> Vec<u8> {
    let mut info = [0u8; 18];
    info[10] = 0x0A; // 44100 = 0x0AC44, packed as 20 bits
    info[11] = 0xC4;
    info[12] = 0x40;
    info[14..18].copy_from_slice(&441_000u32.to_be_bytes());
    let mut data = b"fLaC".to_vec();
    data.extend_from_slice(&[0x80, 0x00, 0x00, 18]);
    data.extend_from_slice(&info);
    data
}

/// Minimal WAV stream: 16 kB/s byte rate, 32 kB of data (2 s).
fn wav_fixture() -> Vec<u8> {
    let mut fmt = Vec::new();
    fmt.extend_from_slice(&1u16.to_le_bytes());
    fmt.extend_from_slice(&1u16.to_le_bytes());
    fmt.extend_from_slice(&8000u32.to_le_bytes());
    fmt.extend_from_slice(&16_000u32.to_le_bytes());
    fmt.extend_from_slice(&2u16.to_le_bytes());
    fmt.extend_from_slice(&16u16.to_le_bytes());

    let mut chunks = b"fmt ".to_vec();
    chunks.extend_from_slice(&(fmt.len() as u32).to_le_bytes());
    chunks.extend_from_slice(&fmt);
    chunks.extend_from_slice(b"data");
    chunks.extend_from_slice(&32_000u32.to_le_bytes());
    chunks.extend_from_slice(&vec![0u8; 32_000]);

    let mut data = b"RIFF".to_vec();
    data.extend_from_slice(&((chunks.len() + 4) as u32).to_le_bytes());
    data.extend_from_slice(b"WAVE");
    data.extend_from_slice(&chunks);
    data
}

/// Minimal MP4 stream: one audio track, 48 kHz timescale, 96000 units (2 s).
fn mp4_fixture() -> Vec<u8> {
    fn boxed(tag: &[u8; 4], content: &[u8]) -> Vec<u8> {
        let mut v = ((content.len() + 8) as u32).to_be_bytes().to_vec();
        v.extend_from_slice(tag);
        v.extend_from_slice(content);
        v
    }

    let mut hdlr = vec![0u8; 8];
    hdlr.extend_from_slice(b"soun");
    hdlr.extend_from_slice(&[0u8; 12]);

    let mut mdhd = vec![0u8; 12];
    mdhd.extend_from_slice(&48_000u32.to_be_bytes());
    mdhd.extend_from_slice(&96_000u32.to_be_bytes());

    let mut mvhd = vec![0u8; 12];
    mvhd.extend_from_slice(&600u32.to_be_bytes());
    mvhd.extend_from_slice(&1200u32.to_be_bytes());

    let mut mdia = boxed(b"hdlr", &hdlr);
    mdia.extend(boxed(b"mdhd", &mdhd));
    let mut moov = boxed(b"mvhd", &mvhd);
    moov.extend(boxed(b"trak", &boxed(b"mdia", &mdia)));

    let mut data = boxed(b"ftyp", b"isomisom");
    data.extend(boxed(b"moov", &moov));
    data.extend(boxed(b"mdat", &[0u8; 64]));
    data
}

/// Minimal Matroska stream: timecode scale 1e6, duration 120000 ticks (2 min).
fn mkv_fixture() -> Vec<u8> {
    fn elem(id: &[u8], content: &[u8]) -> Vec<u8> {
        assert!(content.len() < 0x7F);
        let mut v = id.to_vec();
        v.push(0x80 | content.len() as u8);
        v.extend_from_slice(content);
        v
    }

    let mut info = elem(&[0x2A, 0xD7, 0xB1], &1_000_000u32.to_be_bytes()[1..]);
    info.extend(elem(&[0x44, 0x89], &120_000f64.to_bits().to_be_bytes()));
    let segment = elem(&[0x15, 0x49, 0xA9, 0x66], &info);

    let mut data = elem(&[0x1A, 0x45, 0xDF, 0xA3], b"\x42\x82\x88matroska");
    data.extend(elem(&[0x18, 0x53, 0x80, 0x67], &segment));
    data
}

#[test]
fn test_dispatcher_rewinds_before_probing() {
    let mut stream = Cursor::new(flac_fixture());
    stream.seek(SeekFrom::End(0)).unwrap();
    let d = duration(&mut stream, FileType::Flac).unwrap();
    assert!((d - 10.0).abs() < 1e-9);
}

#[test]
fn test_identical_bytes_yield_identical_results() {
    let bytes = mp4_fixture();
    let a = duration(&mut Cursor::new(bytes.clone()), FileType::Mp4).unwrap();
    let b = duration(&mut Cursor::new(bytes.clone()), FileType::Mp4).unwrap();
    assert_eq!(a, b);

    // Same stream, reused: the dispatcher rewinds.
    let mut stream = Cursor::new(bytes);
    let c = duration(&mut stream, FileType::Mp4).unwrap();
    let d = duration(&mut stream, FileType::Mp4).unwrap();
    assert_eq!(c, d);
}

#[test]
fn test_each_fixture_through_dispatcher() {
    let cases: [(Vec<u8>, FileType, f64); 4] = [
        (flac_fixture(), FileType::Flac, 10.0),
        (wav_fixture(), FileType::Wav, 2.0),
        (mp4_fixture(), FileType::Mp4, 2.0),
        (mkv_fixture(), FileType::Matroska, 120.0),
    ];
    for (bytes, file_type, expected) in cases {
        let d = duration(&mut Cursor::new(bytes), file_type).unwrap();
        assert!(
            (d - expected).abs() < 1e-9,
            "{file_type}: expected {expected}, got {d}"
        );
    }
}

#[test]
fn test_sniffing_matches_fixture_types() {
    let cases: [(Vec<u8>, FileType); 4] = [
        (flac_fixture(), FileType::Flac),
        (wav_fixture(), FileType::Wav),
        (mp4_fixture(), FileType::Mp4),
        (mkv_fixture(), FileType::Matroska),
    ];
    for (bytes, expected) in cases {
        let sniffed = FileType::sniff(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(sniffed, Some(expected));
    }
}

#[test]
fn test_duration_of_file_detects_by_magic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.bin"); // extension gives nothing away
    std::fs::write(&path, mkv_fixture()).unwrap();
    let d = duration_of_file(&path).unwrap();
    assert!((d - 120.0).abs() < 1e-9);
}

#[test]
fn test_duration_of_file_falls_back_to_extension() {
    // An ID3-tagged MP3 has no sniffable magic; the extension decides.
    let mut data = b"ID3\x04\x00\x00\x00\x00\x00\x00".to_vec();
    for _ in 0..10 {
        let mut frame = vec![0u8; 417];
        frame[0] = 0xFF;
        frame[1] = 0xFB;
        frame[2] = 0x90;
        data.extend(frame);
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.mp3");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(&data).unwrap();
    drop(file);

    let d = duration_of_file(&path).unwrap();
    assert!((d - 10.0 * 1152.0 / 44100.0).abs() < 1e-6);
}

#[test]
fn test_duration_of_file_unknown_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("README.txt");
    std::fs::write(&path, b"nothing audio about this").unwrap();
    let err = duration_of_file(&path).unwrap_err();
    assert!(matches!(err, Error::UnknownFormat));
}

#[test]
fn test_wrong_dialect_is_a_clean_error() {
    // Probing an MP4 as Matroska reports the missing identification element.
    let err = duration(&mut Cursor::new(mp4_fixture()), FileType::Matroska).unwrap_err();
    assert!(matches!(err, Error::NotEbml));
}
