//! Fixed-size preambles for every supported layout.
//!
//! ## Sources
//!
//! | Variant | Preamble | Geometry | Frame data starts at |
//! |---------|----------|----------|----------------------|
//! | `LegacyV1`  | `MSPOSD\0` tag | — (rejected) | — |
//! | `V2Generic` | 40 bytes | bytes `0x24` / `0x26` | 40 |
//! | `V2DJI`     | 40 bytes, `DJO3` at 36 | fixed 53×20 | 40 |
//! | `V3Native`  | 7-byte tag, u16 version, charWidth, charHeight, 11 reserved | stored chars | 20 |
//!
//! ## Targets
//!
//! Canonical v2 (20 bytes):
//! ```text
//! 0   7  "MSPOSD\0"
//! 7   2  version = 2          (LE)
//! 9   1  grid width
//! 10  1  grid height
//! 11  1  font width
//! 12  1  font height
//! 13  2  x offset = 0         (LE)
//! 15  2  y offset = 0         (LE)
//! 17  3  font variant, zero (the nominal 5-byte field is cut off at 20)
//! ```
//!
//! Goggle (40 bytes): `BTFL_DJIO3` at 0, the player marker at 32, zero elsewhere.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{self, Cursor, Read, Write};

use crate::error::ConvertError;
use crate::geometry::{self, FontMetrics, GridGeometry, DJO3_GEOMETRY};

/// Tag of the legacy/canonical MSP OSD layout.
pub const LEGACY_MAGIC:           &[u8; 7]  = b"MSPOSD\0";
/// Anything shorter cannot hold an O3-style header.
pub const MIN_INPUT_LEN:          usize     = 40;
pub const O3_HEADER_LEN:          usize     = 40;
pub const V3_PREAMBLE_LEN:        usize     = 20;
pub const V3_RESERVED_LEN:        usize     = 11;

pub const CANONICAL_HEADER_LEN:   usize     = 20;
pub const CANONICAL_VERSION:      u16       = 2;
pub const CANONICAL_RESERVED_LEN: usize     = CANONICAL_HEADER_LEN - 17;

pub const GOGGLE_HEADER_LEN:      usize     = 40;
pub const GOGGLE_FIRMWARE_TAG:    &[u8; 10] = b"BTFL_DJIO3";
pub const GOGGLE_MARKER_OFFSET:   usize     = 32;
/// Opaque firmware/version marker the goggle player expects at offset 32.
pub const GOGGLE_MARKER:          [u8; 8]   = [0xC9, 0x00, 0x00, 0x00, 0x35, 0x00, 0x14, 0x00];

const TAG_LEN: usize = 7;

// ── SourceVariant ────────────────────────────────────────────────────────────

/// On-disk layout of an input recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceVariant {
    LegacyV1,
    V2Generic,
    #[serde(rename = "v2_dji")]
    V2DJI,
    V3Native,
}

impl SourceVariant {
    /// Human-readable name (diagnostics only).
    pub fn name(self) -> &'static str {
        match self {
            SourceVariant::LegacyV1  => "legacy-v1",
            SourceVariant::V2Generic => "v2-generic",
            SourceVariant::V2DJI     => "v2-dji",
            SourceVariant::V3Native  => "v3-native",
        }
    }

    /// Parse from a CLI string.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "legacy" | "legacy-v1" | "v1"  => Some(SourceVariant::LegacyV1),
            "v2" | "v2-generic" | "o3"     => Some(SourceVariant::V2Generic),
            "v2-dji" | "djo3"              => Some(SourceVariant::V2DJI),
            "v3" | "v3-native"             => Some(SourceVariant::V3Native),
            _                              => None,
        }
    }

    /// O3-style variants store 2-byte cells after a delta timestamp.
    pub fn is_o3_style(self) -> bool {
        matches!(self, SourceVariant::V2Generic | SourceVariant::V2DJI)
    }
}

// ── Decoded header ───────────────────────────────────────────────────────────

/// Variant-tagged view of an input preamble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub variant:     SourceVariant,
    /// First 7 bytes of the file.
    pub tag:         [u8; TAG_LEN],
    /// Only V3Native stores a version.
    pub version:     Option<u16>,
    pub geometry:    GridGeometry,
    /// Derived from `geometry`; no source layout stores it.
    pub font:        FontMetrics,
    pub x_offset:    u16,
    pub y_offset:    u16,
    /// Preamble bytes after the fields above.
    pub tail:        Vec<u8>,
    /// Byte offset of the first frame record.
    pub data_offset: usize,
}

impl Header {
    /// Decode the preamble of `bytes`.
    ///
    /// With `forced = None` the file is treated as O3-style and the `DJO3`
    /// signature decides between `V2Generic` and `V2DJI`. V3Native input is
    /// never guessed; it has to be requested.
    pub fn decode(
        bytes:                 &[u8],
        forced:                Option<SourceVariant>,
        v3_signature_override: bool,
    ) -> Result<Self, ConvertError> {
        if bytes.len() < MIN_INPUT_LEN {
            return Err(ConvertError::TooSmall { len: bytes.len() });
        }
        match forced {
            Some(SourceVariant::V3Native) => Self::decode_v3(bytes, v3_signature_override),
            Some(SourceVariant::LegacyV1) => Err(ConvertError::UnsupportedLegacyFormat),
            Some(_) | None                => Self::decode_o3(bytes),
        }
    }

    fn decode_o3(bytes: &[u8]) -> Result<Self, ConvertError> {
        let tag = read_tag(bytes);
        if &tag == LEGACY_MAGIC {
            return Err(ConvertError::UnsupportedLegacyFormat);
        }
        let preamble = &bytes[..O3_HEADER_LEN];
        let geometry = geometry::resolve_o3(preamble)?;
        let variant = if geometry::has_djo3_signature(preamble) {
            SourceVariant::V2DJI
        } else {
            SourceVariant::V2Generic
        };
        Ok(Self {
            variant,
            tag,
            version:     None,
            geometry,
            font:        geometry::font_metrics(geometry),
            x_offset:    0,
            y_offset:    0,
            tail:        preamble[TAG_LEN..].to_vec(),
            data_offset: O3_HEADER_LEN,
        })
    }

    fn decode_v3(bytes: &[u8], v3_signature_override: bool) -> Result<Self, ConvertError> {
        let mut cur = Cursor::new(bytes);
        let mut tag = [0u8; TAG_LEN];
        cur.read_exact(&mut tag)?;
        let version     = cur.read_u16::<LittleEndian>()?;
        let char_width  = cur.read_u8()?;
        let char_height = cur.read_u8()?;
        let mut tail = vec![0u8; V3_RESERVED_LEN];
        cur.read_exact(&mut tail)?;

        let geometry = geometry::resolve_v3(
            char_width,
            char_height,
            &bytes[..O3_HEADER_LEN],
            v3_signature_override,
        )?;
        Ok(Self {
            variant:     SourceVariant::V3Native,
            tag,
            version:     Some(version),
            geometry,
            font:        geometry::font_metrics(geometry),
            x_offset:    0,
            y_offset:    0,
            tail,
            data_offset: V3_PREAMBLE_LEN,
        })
    }

    /// The tag as text, NULs stripped (diagnostics only).
    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).trim_end_matches('\0').to_string()
    }
}

fn read_tag(bytes: &[u8]) -> [u8; TAG_LEN] {
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&bytes[..TAG_LEN]);
    tag
}

// ── Canonical v2 header ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalHeader {
    pub version:  u16,
    pub geometry: GridGeometry,
    pub font:     FontMetrics,
    pub x_offset: u16,
    pub y_offset: u16,
}

impl CanonicalHeader {
    /// Header for `geometry` with font metrics from the lookup table.
    pub fn for_geometry(geometry: GridGeometry) -> Self {
        Self {
            version:  CANONICAL_VERSION,
            geometry,
            font:     geometry::font_metrics(geometry),
            x_offset: 0,
            y_offset: 0,
        }
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(LEGACY_MAGIC)?;
        writer.write_u16::<LittleEndian>(self.version)?;
        writer.write_u8(self.geometry.width)?;
        writer.write_u8(self.geometry.height)?;
        writer.write_u8(self.font.width)?;
        writer.write_u8(self.font.height)?;
        writer.write_u16::<LittleEndian>(self.x_offset)?;
        writer.write_u16::<LittleEndian>(self.y_offset)?;
        writer.write_all(&[0u8; CANONICAL_RESERVED_LEN])?;
        Ok(())
    }

    pub fn read<R: Read>(mut reader: R) -> Result<Self, ConvertError> {
        let mut magic = [0u8; TAG_LEN];
        reader.read_exact(&mut magic)?;
        if &magic != LEGACY_MAGIC {
            return Err(ConvertError::MalformedHeader("missing MSPOSD tag".into()));
        }
        let version  = reader.read_u16::<LittleEndian>()?;
        let geometry = GridGeometry::new(reader.read_u8()?, reader.read_u8()?);
        let font     = FontMetrics { width: reader.read_u8()?, height: reader.read_u8()? };
        let x_offset = reader.read_u16::<LittleEndian>()?;
        let y_offset = reader.read_u16::<LittleEndian>()?;
        let mut reserved = [0u8; CANONICAL_RESERVED_LEN];
        reader.read_exact(&mut reserved)?;
        Ok(Self { version, geometry, font, x_offset, y_offset })
    }
}

// ── Goggle header ────────────────────────────────────────────────────────────

/// The goggle layout has a single fixed preamble; see [`GOGGLE_MARKER`].
pub struct GoggleHeader;

impl GoggleHeader {
    /// Grid every goggle frame is laid out on.
    pub const GEOMETRY: GridGeometry = DJO3_GEOMETRY;

    pub fn to_bytes() -> [u8; GOGGLE_HEADER_LEN] {
        let mut out = [0u8; GOGGLE_HEADER_LEN];
        out[..GOGGLE_FIRMWARE_TAG.len()].copy_from_slice(GOGGLE_FIRMWARE_TAG);
        out[GOGGLE_MARKER_OFFSET..GOGGLE_MARKER_OFFSET + GOGGLE_MARKER.len()]
            .copy_from_slice(&GOGGLE_MARKER);
        out
    }

    pub fn write<W: Write>(mut writer: W) -> io::Result<()> {
        writer.write_all(&Self::to_bytes())
    }
}
