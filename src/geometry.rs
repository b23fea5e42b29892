//! Character-grid geometry and the font metrics that go with it.
//!
//! # O3-style headers
//! The 40-byte preamble carries the grid width at offset `0x24` and the grid
//! height at offset `0x26`, one byte each. When the four bytes starting at
//! offset 36 spell `DJO3` the stored bytes are ignored and the grid is the
//! fixed DJI O3 layout of 53×20.
//!
//! # V3Native headers
//! Width and height come straight from the `charWidth`/`charHeight` fields of
//! the 20-byte preamble. The `DJO3` rule is only applied when the caller asks
//! for it explicitly.

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// Signature that pins the grid to [`DJO3_GEOMETRY`].
pub const DJO3_SIGNATURE:   &[u8; 4] = b"DJO3";
/// Header offset of the 4-byte signature field.
pub const SIGNATURE_OFFSET: usize    = 36;
/// Header offset of the raw grid-width byte.
pub const WIDTH_OFFSET:     usize    = 0x24;
/// Header offset of the raw grid-height byte.
pub const HEIGHT_OFFSET:    usize    = 0x26;

/// Fixed DJI O3 grid, also the goggle target grid.
pub const DJO3_GEOMETRY: GridGeometry = GridGeometry { width: 53, height: 20 };

// ── GridGeometry ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub width:  u8,
    pub height: u8,
}

impl GridGeometry {
    pub fn new(width: u8, height: u8) -> Self {
        Self { width, height }
    }

    /// Number of cells in one frame.
    #[inline]
    pub fn cell_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Rejects zero-area grids.
    pub fn validated(self) -> Result<Self, ConvertError> {
        if self.cell_count() == 0 {
            return Err(ConvertError::MalformedHeader(format!(
                "zero-area grid {}x{}", self.width, self.height
            )));
        }
        Ok(self)
    }
}

/// True when bytes 36..40 of `header` spell `DJO3`.
pub fn has_djo3_signature(header: &[u8]) -> bool {
    header.get(SIGNATURE_OFFSET..SIGNATURE_OFFSET + DJO3_SIGNATURE.len())
        .map_or(false, |sig| sig == DJO3_SIGNATURE)
}

/// Resolve the grid of an O3-style (V2Generic / V2DJI) header.
pub fn resolve_o3(header: &[u8]) -> Result<GridGeometry, ConvertError> {
    if has_djo3_signature(header) {
        return Ok(DJO3_GEOMETRY);
    }
    let width  = header.get(WIDTH_OFFSET).copied().unwrap_or(0);
    let height = header.get(HEIGHT_OFFSET).copied().unwrap_or(0);
    GridGeometry::new(width, height).validated()
}

/// Resolve the grid of a V3Native header from its stored character fields.
///
/// `honor_signature` applies the `DJO3` override to V3Native input as well.
pub fn resolve_v3(
    char_width:      u8,
    char_height:     u8,
    header:          &[u8],
    honor_signature: bool,
) -> Result<GridGeometry, ConvertError> {
    if honor_signature && has_djo3_signature(header) {
        return Ok(DJO3_GEOMETRY);
    }
    GridGeometry::new(char_width, char_height).validated()
}

// ── Font metrics ─────────────────────────────────────────────────────────────

/// Glyph size in pixels that a player should use for a given grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FontMetrics {
    pub width:  u8,
    pub height: u8,
}

/// Known grids and their font metrics. Anything else maps to 0×0.
pub const FONT_METRICS: [(GridGeometry, FontMetrics); 3] = [
    (GridGeometry { width: 60, height: 22 }, FontMetrics { width: 36, height: 24 }),
    (GridGeometry { width: 53, height: 20 }, FontMetrics { width: 39, height: 26 }),
    (GridGeometry { width: 30, height: 15 }, FontMetrics { width: 54, height: 36 }),
];

pub fn font_metrics(geometry: GridGeometry) -> FontMetrics {
    FONT_METRICS.iter()
        .find(|(g, _)| *g == geometry)
        .map(|(_, m)| *m)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_with(width: u8, height: u8) -> [u8; 40] {
        let mut h = [0u8; 40];
        h[WIDTH_OFFSET]  = width;
        h[HEIGHT_OFFSET] = height;
        h
    }

    #[test]
    fn raw_dimensions_are_read_from_offsets() {
        let g = resolve_o3(&header_with(60, 22)).unwrap();
        assert_eq!(g, GridGeometry::new(60, 22));
    }

    #[test]
    fn djo3_signature_overrides_raw_bytes() {
        let mut h = header_with(0, 0);
        h[36..40].copy_from_slice(DJO3_SIGNATURE);
        assert_eq!(resolve_o3(&h).unwrap(), DJO3_GEOMETRY);
    }

    #[test]
    fn zero_area_is_malformed() {
        assert!(matches!(resolve_o3(&header_with(53, 0)), Err(ConvertError::MalformedHeader(_))));
        assert!(matches!(resolve_v3(0, 20, &[], false), Err(ConvertError::MalformedHeader(_))));
    }

    #[test]
    fn v3_ignores_signature_unless_asked() {
        let mut h = [0u8; 40];
        h[36..40].copy_from_slice(DJO3_SIGNATURE);
        assert_eq!(resolve_v3(60, 22, &h, false).unwrap(), GridGeometry::new(60, 22));
        assert_eq!(resolve_v3(60, 22, &h, true).unwrap(), DJO3_GEOMETRY);
    }

    #[test]
    fn font_table_lookup() {
        assert_eq!(font_metrics(GridGeometry::new(53, 20)), FontMetrics { width: 39, height: 26 });
        assert_eq!(font_metrics(GridGeometry::new(30, 15)), FontMetrics { width: 54, height: 36 });
        assert_eq!(font_metrics(GridGeometry::new(50, 18)), FontMetrics::default());
    }
}
