//! Repeating frame records.
//!
//! # Sources
//! ```text
//! O3-style:  [u32 ms][width*height × u16 cell]           repeated
//! V3Native:  [f64 seconds][u32 n][n × u8 cell]           repeated
//! ```
//! Both decoders stop quietly at a record that would run past the end of the
//! input; every whole frame before it is kept.
//!
//! # Targets
//! ```text
//! canonical: [u32 frame index][u32 cell count][count × u16 cell]
//! goggle:    [u32 ms][53*20 × (u8 cell, 0x00)]               = 2124 bytes
//! ```
//! All integers and floats are little-endian.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{self, Cursor, Read, Write};
use tracing::{trace, warn};

use crate::header::{GoggleHeader, Header, SourceVariant};
use crate::remap;
use crate::transpose::clip_to_grid;

pub const O3_RECORD_HEADER_LEN:        usize = 4;
pub const V3_RECORD_HEADER_LEN:        usize = 12;
pub const CANONICAL_RECORD_HEADER_LEN: usize = 8;
pub const GOGGLE_FRAME_LEN:            usize =
    4 + 2 * GoggleHeader::GEOMETRY.width as usize * GoggleHeader::GEOMETRY.height as usize;

/// How the per-frame millisecond field of O3-style records is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampMode {
    /// Each field is the delay since the previous frame; timestamps are the running sum.
    #[default]
    Cumulative,
    /// Each field already is the frame's timestamp.
    Absolute,
}

// ── Frame ────────────────────────────────────────────────────────────────────

/// One decoded frame in canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// `floor(timestamp_secs * fps)`, or the ordinal position when no FPS applies.
    pub index:          u32,
    pub timestamp_secs: f64,
    pub timestamp_ms:   u64,
    /// Row-major cell values. 1-byte sources are widened.
    pub cells:          Vec<u16>,
    /// Byte offset of the record in the input (diagnostics only).
    pub origin_offset:  usize,
}

impl Frame {
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// Result of one decode pass.
#[derive(Debug, Clone, Default)]
pub struct Decoded {
    pub frames:         Vec<Frame>,
    /// Bytes after the last whole frame that were discarded.
    pub trailing_bytes: usize,
}

/// Frame index for a timestamp; the ordinal when there is no FPS.
pub fn frame_index(timestamp_secs: f64, fps: Option<f64>, ordinal: usize) -> u32 {
    match fps {
        Some(fps) => (timestamp_secs * fps).floor() as u32,
        None      => ordinal as u32,
    }
}

fn remaining(cur: &Cursor<&[u8]>) -> usize {
    cur.get_ref().len().saturating_sub(cur.position() as usize)
}

// ── Decode ───────────────────────────────────────────────────────────────────

/// Decode every whole frame following `header`.
pub fn decode_frames(
    bytes:  &[u8],
    header: &Header,
    fps:    Option<f64>,
    mode:   TimestampMode,
) -> io::Result<Decoded> {
    match header.variant {
        SourceVariant::V3Native => decode_v3(bytes, header, fps),
        _                       => decode_o3(bytes, header, fps, mode),
    }
}

fn decode_o3(
    bytes:  &[u8],
    header: &Header,
    fps:    Option<f64>,
    mode:   TimestampMode,
) -> io::Result<Decoded> {
    let cell_count  = header.geometry.cell_count();
    let frame_bytes = cell_count * 2;
    let mut cur = Cursor::new(bytes);
    cur.set_position(header.data_offset as u64);

    let mut frames  = Vec::new();
    let mut elapsed = 0u64;

    while remaining(&cur) >= O3_RECORD_HEADER_LEN {
        let origin = cur.position() as usize;
        let field  = cur.read_u32::<LittleEndian>()?;
        if remaining(&cur) < frame_bytes {
            cur.set_position(origin as u64);
            break;
        }
        let mut cells = vec![0u16; cell_count];
        cur.read_u16_into::<LittleEndian>(&mut cells)?;

        let timestamp_ms = match mode {
            TimestampMode::Cumulative => { elapsed += u64::from(field); elapsed }
            TimestampMode::Absolute   => u64::from(field),
        };
        let timestamp_secs = timestamp_ms as f64 / 1000.0;
        let index = frame_index(timestamp_secs, fps, frames.len());
        trace!(origin, field, index, "o3 frame");

        frames.push(Frame { index, timestamp_secs, timestamp_ms, cells, origin_offset: origin });
    }

    Ok(finish(frames, remaining(&cur)))
}

fn decode_v3(bytes: &[u8], header: &Header, fps: Option<f64>) -> io::Result<Decoded> {
    let mut cur = Cursor::new(bytes);
    cur.set_position(header.data_offset as u64);

    let mut frames = Vec::new();

    while remaining(&cur) >= V3_RECORD_HEADER_LEN {
        let origin         = cur.position() as usize;
        let timestamp_secs = cur.read_f64::<LittleEndian>()?;
        let len            = cur.read_u32::<LittleEndian>()? as usize;
        if remaining(&cur) < len {
            cur.set_position(origin as u64);
            break;
        }
        let mut raw = vec![0u8; len];
        cur.read_exact(&mut raw)?;

        // Negative and NaN timestamps saturate to 0.
        let timestamp_ms = (timestamp_secs * 1000.0).floor() as u64;
        let index = frame_index(timestamp_secs, fps, frames.len());
        trace!(origin, len, index, "v3 frame");

        frames.push(Frame {
            index,
            timestamp_secs,
            timestamp_ms,
            cells: raw.into_iter().map(remap::widen).collect(),
            origin_offset: origin,
        });
    }

    Ok(finish(frames, remaining(&cur)))
}

fn finish(frames: Vec<Frame>, trailing_bytes: usize) -> Decoded {
    if trailing_bytes > 0 {
        warn!(trailing_bytes, frames = frames.len(), "discarding truncated trailing frame data");
    }
    Decoded { frames, trailing_bytes }
}

// ── Encode ───────────────────────────────────────────────────────────────────

/// Canonical v2 record. `cells` are written in the order given.
pub fn write_canonical<W: Write>(index: u32, cells: &[u16], mut writer: W) -> io::Result<()> {
    writer.write_u32::<LittleEndian>(index)?;
    writer.write_u32::<LittleEndian>(cells.len() as u32)?;
    for &cell in cells {
        writer.write_u16::<LittleEndian>(cell)?;
    }
    Ok(())
}

/// Goggle record: `cells` (rows of `src_row_width`) laid onto the 53×20 grid
/// with blank substitution. Always exactly [`GOGGLE_FRAME_LEN`] bytes.
pub fn write_goggle<W: Write>(
    timestamp_ms:  u32,
    cells:         &[u16],
    src_row_width: usize,
    mut writer:    W,
) -> io::Result<()> {
    writer.write_u32::<LittleEndian>(timestamp_ms)?;
    for slot in clip_to_grid(cells, src_row_width, GoggleHeader::GEOMETRY) {
        writer.write_all(&remap::goggle_slot(slot.map(remap::narrow)))?;
    }
    Ok(())
}
