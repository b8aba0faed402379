//! MPEG audio (MP3) duration from frame headers.
//!
//! Variable-bitrate files carry a Xing/Info or VBRI header with a total
//! frame count; constant-bitrate files are estimated from the stream length
//! and the first frame's parameters.

use std::io::{Read, Seek};

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::flat::id3v2_length;

const MPEG1: u8 = 0b11;
const MPEG2: u8 = 0b10;
const MPEG25: u8 = 0b00;

const LAYER_I: u8 = 0b11;
const LAYER_II: u8 = 0b10;
const LAYER_III: u8 = 0b01;

const SINGLE_CHANNEL: u8 = 0b11;

fn sample_rate(version: u8, index: u8) -> Result<u32> {
    let table: [u32; 3] = match version {
        MPEG1 => [44100, 48000, 32000],
        MPEG2 => [22050, 24000, 16000],
        MPEG25 => [11025, 12000, 8000],
        _ => return Err(Error::Malformed("reserved MPEG version")),
    };
    table
        .get(usize::from(index))
        .copied()
        .ok_or(Error::Malformed("reserved sample rate index"))
}

fn bit_rate_kbps(version: u8, layer: u8, index: u8) -> Result<u32> {
    let table: [u32; 16] = match (version, layer) {
        (MPEG1, LAYER_I) => [
            0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0,
        ],
        (MPEG1, LAYER_II) => [
            0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0,
        ],
        (MPEG1, LAYER_III) => [
            0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0,
        ],
        (MPEG2 | MPEG25, LAYER_I) => [
            0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0,
        ],
        (MPEG2 | MPEG25, LAYER_II | LAYER_III) => [
            0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0,
        ],
        _ => return Err(Error::Malformed("reserved MPEG layer")),
    };
    Ok(table[usize::from(index & 0x0F)])
}

fn samples_per_frame(version: u8, layer: u8) -> Result<u32> {
    match layer {
        LAYER_I => Ok(384),
        LAYER_II => Ok(1152),
        LAYER_III => Ok(if version == MPEG1 { 1152 } else { 576 }),
        _ => Err(Error::Malformed("reserved MPEG layer")),
    }
}

/// Frame length in bytes; zero for the free-format bitrate.
fn frame_length(layer: u8, padding: u8, samples: u32, bit_rate: u32, sample_rate: u32) -> u32 {
    match layer {
        LAYER_I => (12 * bit_rate * 1000 / sample_rate + u32::from(padding)) * 4,
        _ => samples / 8 * bit_rate * 1000 / sample_rate + u32::from(padding),
    }
}

/// Layer III side information length, between the header and any Xing tag.
fn side_info_length(version: u8, mode: u8) -> u64 {
    match (mode, version) {
        (SINGLE_CHANNEL, MPEG1) => 17,
        (SINGLE_CHANNEL, _) => 9,
        (_, MPEG1) => 32,
        (_, _) => 17,
    }
}

/// Extract the duration in seconds from an MP3 stream.
pub fn duration<R: Read + Seek>(reader: &mut R) -> Result<f64> {
    let mut cursor = ByteCursor::new(reader)?;
    let len = cursor.stream_len()?;

    // Jump over ID3v2 tags before dealing with audio data.
    let mut head = [0u8; 10];
    cursor.read_exact(&mut head)?;
    if &head[0..3] == b"ID3" {
        cursor.skip(id3v2_length(&head))?;
    } else {
        cursor.rewind()?;
    }

    // Scan for the frame sync pattern 1111 1111 111x xxxx.
    let mut previous_ff = false;
    let b1 = loop {
        let b = cursor.read_u8()?;
        if previous_ff && b >> 5 == 0b111 {
            break b;
        }
        previous_ff = b == 0xFF;
    };
    let sync_pos = cursor.position() - 2;

    let version = (b1 >> 3) & 0b11;
    let layer = (b1 >> 1) & 0b11;
    let protection = b1 & 0x01;

    let b2 = cursor.read_u8()?;
    let bit_rate_index = b2 >> 4;
    let sample_rate_index = (b2 >> 2) & 0b11;
    let padding = (b2 >> 1) & 0b1;

    let b3 = cursor.read_u8()?;
    let mode = b3 >> 6;

    let sample_rate = sample_rate(version, sample_rate_index)?;
    let samples = samples_per_frame(version, layer)?;
    let bit_rate = bit_rate_kbps(version, layer, bit_rate_index)?;

    // 16-bit CRC after the header, when protection is on.
    if protection == 0 {
        cursor.skip(2)?;
    }
    if layer == LAYER_III {
        cursor.skip(side_info_length(version, mode))?;
    }

    let tag = cursor.read_tag()?;
    match &tag {
        b"Xing" | b"Info" => {
            let flags = cursor.read_u32_be()?;
            if flags & 0x1 == 0 {
                return Err(Error::Malformed("Xing header without a frame count"));
            }
            let frames = cursor.read_u32_be()?;
            return Ok(f64::from(samples) / f64::from(sample_rate) * f64::from(frames));
        }
        b"VBRI" => {
            cursor.skip(6)?; // version, delay, quality
            let _total_bytes = cursor.read_u32_be()?;
            let frames = cursor.read_u32_be()?;
            return Ok(f64::from(samples) / f64::from(sample_rate) * f64::from(frames));
        }
        _ => {}
    }

    // No VBR header: estimate from the audio payload size at a constant
    // bitrate.
    let frame_len = frame_length(layer, padding, samples, bit_rate, sample_rate);
    if frame_len == 0 {
        return Err(Error::Malformed("free-format bitrate is not supported"));
    }
    let audio_size = len.saturating_sub(sync_pos);
    Ok(audio_size as f64 / f64::from(frame_len) * f64::from(samples) / f64::from(sample_rate))
}
