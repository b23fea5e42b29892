//! One conversion, start to finish.
//!
//! ```text
//! Idle → HeaderDetected → FramesDecoded → Encoded → Done
//!   └──────────┴── Failed (options or header rejected)
//! ```
//!
//! A conversion is a pure function of the input bytes and [`ConvertOptions`]:
//! one pass decodes, one pass encodes, and nothing is shared between calls.
//!
//! ```
//! use osdconv::pipeline::{convert, ConversionRequest, ConvertOptions};
//!
//! let mut input = vec![0u8; 40];
//! input[0x24] = 53;
//! input[0x26] = 20;
//! input.extend_from_slice(&1000u32.to_le_bytes());
//! input.extend(std::iter::repeat(0u8).take(53 * 20 * 2));
//!
//! let opts = ConvertOptions { fps: Some(30.0), ..ConvertOptions::default() };
//! let out  = convert(&ConversionRequest::new(&input, "flight.osd", opts))?;
//! assert_eq!(out.output_bytes.len(), 20 + 8 + 53 * 20 * 2);
//! assert_eq!(out.suggested_file_name, "flight.osd_v2.osd");
//! # Ok::<(), osdconv::ConvertError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::ConvertError;
use crate::frame::{self, Decoded, Frame, TimestampMode, CANONICAL_RECORD_HEADER_LEN, GOGGLE_FRAME_LEN};
use crate::geometry::{FontMetrics, GridGeometry};
use crate::header::{
    CanonicalHeader, GoggleHeader, Header, SourceVariant, CANONICAL_HEADER_LEN, GOGGLE_HEADER_LEN,
};
use crate::transpose::transpose;

// ── Options ──────────────────────────────────────────────────────────────────

/// Output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetVariant {
    /// MSPOSD v2: 20-byte header, indexed column-major frames.
    #[default]
    Canonical,
    /// Walksnail goggle: 40-byte header, fixed 53×20 timestamped frames.
    Goggle,
}

impl TargetVariant {
    pub fn name(self) -> &'static str {
        match self {
            TargetVariant::Canonical => "canonical",
            TargetVariant::Goggle    => "goggle",
        }
    }

    /// Parse from a CLI string.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "canonical" | "v2"         => Some(TargetVariant::Canonical),
            "goggle" | "walksnail"     => Some(TargetVariant::Goggle),
            _                          => None,
        }
    }

    /// Appended to the input name to suggest an output name.
    pub fn file_suffix(self) -> &'static str {
        match self {
            TargetVariant::Canonical => "_v2.osd",
            TargetVariant::Goggle    => "_walksnail.osd",
        }
    }
}

/// Configuration for [`convert`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub target:                TargetVariant,
    /// Frames per second used to turn timestamps into frame indices.
    pub fps:                   Option<f64>,
    /// `None` auto-detects among the O3-style variants.
    pub source:                Option<SourceVariant>,
    pub timestamps:            TimestampMode,
    /// Let a `DJO3` signature override V3Native geometry too.
    pub v3_signature_override: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            target:                TargetVariant::Canonical,
            fps:                   None,
            source:                None,
            timestamps:            TimestampMode::Cumulative,
            v3_signature_override: false,
        }
    }
}

impl ConvertOptions {
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConvertError> {
        serde_json::from_slice(bytes).map_err(|e| ConvertError::InvalidConfig(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConvertError> {
        Self::from_json(&std::fs::read(path)?)
    }

    /// Whether this conversion has to derive frame indices from timestamps.
    ///
    /// O3-style decoding always does; V3Native only for the canonical target.
    pub fn needs_fps(&self) -> bool {
        self.source.map_or(true, SourceVariant::is_o3_style) || self.target == TargetVariant::Canonical
    }

    /// Check the options before any input is parsed.
    pub fn validated_fps(&self) -> Result<Option<f64>, ConvertError> {
        match self.fps {
            Some(fps) if !fps.is_finite() || fps <= 0.0 => Err(ConvertError::InvalidConfig(
                format!("FPS must be a positive number, got {fps}"),
            )),
            None if self.needs_fps() => Err(ConvertError::InvalidConfig(
                "an FPS value is required for this conversion".into(),
            )),
            fps => Ok(fps),
        }
    }
}

// ── Request / result ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ConversionRequest<'a> {
    pub source_bytes: &'a [u8],
    /// Name the input arrived under; only used to suggest an output name.
    pub input_name:   &'a str,
    pub options:      ConvertOptions,
}

impl<'a> ConversionRequest<'a> {
    pub fn new(source_bytes: &'a [u8], input_name: &'a str, options: ConvertOptions) -> Self {
        Self { source_bytes, input_name, options }
    }
}

#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub output_bytes:        Vec<u8>,
    pub suggested_file_name: String,
    pub source_variant:      SourceVariant,
    pub frame_count:         usize,
}

/// `input_name` followed by the target's fixed suffix.
pub fn suggested_file_name(input_name: &str, target: TargetVariant) -> String {
    format!("{input_name}{}", target.file_suffix())
}

// ── Pipeline ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Stage {
    HeaderDetected,
    FramesDecoded,
    Encoded,
}

pub fn convert(req: &ConversionRequest<'_>) -> Result<ConversionResult, ConvertError> {
    let opts = &req.options;
    let fps  = opts.validated_fps()?;

    let header = Header::decode(req.source_bytes, opts.source, opts.v3_signature_override)?;
    debug!(
        stage = ?Stage::HeaderDetected,
        variant = header.variant.name(),
        width = header.geometry.width,
        height = header.geometry.height,
        "header decoded"
    );

    let Decoded { frames, trailing_bytes } =
        frame::decode_frames(req.source_bytes, &header, fps, opts.timestamps)?;
    debug!(stage = ?Stage::FramesDecoded, frames = frames.len(), trailing_bytes, "frames decoded");

    let output_bytes = match opts.target {
        TargetVariant::Canonical => encode_canonical(header.geometry, &frames)?,
        TargetVariant::Goggle    => encode_goggle(header.geometry, &frames)?,
    };
    debug!(stage = ?Stage::Encoded, target = opts.target.name(), bytes = output_bytes.len(), "encoded");

    Ok(ConversionResult {
        output_bytes,
        suggested_file_name: suggested_file_name(req.input_name, opts.target),
        source_variant:      header.variant,
        frame_count:         frames.len(),
    })
}

fn encode_canonical(geometry: GridGeometry, frames: &[Frame]) -> Result<Vec<u8>, ConvertError> {
    let (w, h) = (geometry.width as usize, geometry.height as usize);
    let mut out = Vec::with_capacity(
        CANONICAL_HEADER_LEN + frames.len() * (CANONICAL_RECORD_HEADER_LEN + 2 * w * h),
    );
    CanonicalHeader::for_geometry(geometry).write(&mut out)?;

    let mut grid = Vec::with_capacity(w * h);
    for f in frames {
        // 1-byte sources may store more or fewer cells than the grid holds.
        grid.clear();
        grid.extend_from_slice(&f.cells[..f.cells.len().min(w * h)]);
        grid.resize(w * h, 0);
        frame::write_canonical(f.index, &transpose(&grid, w, h), &mut out)?;
    }
    Ok(out)
}

fn encode_goggle(geometry: GridGeometry, frames: &[Frame]) -> Result<Vec<u8>, ConvertError> {
    let mut out = Vec::with_capacity(GOGGLE_HEADER_LEN + frames.len() * GOGGLE_FRAME_LEN);
    GoggleHeader::write(&mut out)?;
    for f in frames {
        let ms = u32::try_from(f.timestamp_ms).unwrap_or(u32::MAX);
        frame::write_goggle(ms, &f.cells, geometry.width as usize, &mut out)?;
    }
    Ok(out)
}

// ── Inspect ──────────────────────────────────────────────────────────────────

/// What a recording contains, without re-encoding it.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub variant:            SourceVariant,
    pub tag:                String,
    pub version:            Option<u16>,
    pub geometry:           GridGeometry,
    pub font:               FontMetrics,
    pub data_offset:        usize,
    pub frame_count:        usize,
    pub first_timestamp_ms: Option<u64>,
    pub last_timestamp_ms:  Option<u64>,
    pub trailing_bytes:     usize,
}

/// Decode `bytes` and summarise them. FPS is optional here.
pub fn inspect(bytes: &[u8], opts: &ConvertOptions) -> Result<InspectReport, ConvertError> {
    let fps    = opts.fps.filter(|f| f.is_finite() && *f > 0.0);
    let header = Header::decode(bytes, opts.source, opts.v3_signature_override)?;
    let decoded = frame::decode_frames(bytes, &header, fps, opts.timestamps)?;

    Ok(InspectReport {
        variant:            header.variant,
        tag:                header.tag_str(),
        version:            header.version,
        geometry:           header.geometry,
        font:               header.font,
        data_offset:        header.data_offset,
        frame_count:        decoded.frames.len(),
        first_timestamp_ms: decoded.frames.first().map(|f| f.timestamp_ms),
        last_timestamp_ms:  decoded.frames.last().map(|f| f.timestamp_ms),
        trailing_bytes:     decoded.trailing_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(fps: Option<f64>) -> ConvertOptions {
        ConvertOptions { fps, ..ConvertOptions::default() }
    }

    #[test]
    fn fps_required_for_o3_sources() {
        assert!(matches!(opts(None).validated_fps(), Err(ConvertError::InvalidConfig(_))));
        assert!(matches!(opts(Some(0.0)).validated_fps(), Err(ConvertError::InvalidConfig(_))));
        assert!(matches!(opts(Some(-5.0)).validated_fps(), Err(ConvertError::InvalidConfig(_))));
        assert!(matches!(opts(Some(f64::NAN)).validated_fps(), Err(ConvertError::InvalidConfig(_))));
        assert_eq!(opts(Some(60.0)).validated_fps().unwrap(), Some(60.0));
    }

    #[test]
    fn fps_optional_for_v3_to_goggle() {
        let o = ConvertOptions {
            target: TargetVariant::Goggle,
            source: Some(SourceVariant::V3Native),
            ..ConvertOptions::default()
        };
        assert_eq!(o.validated_fps().unwrap(), None);
    }

    #[test]
    fn invalid_config_checked_before_parsing() {
        // Too small as well, but the missing FPS is reported first.
        let err = convert(&ConversionRequest::new(&[0u8; 4], "x", opts(None))).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn options_from_json() {
        let o = ConvertOptions::from_json(
            br#"{"target":"goggle","source":"v3_native","v3_signature_override":true}"#,
        ).unwrap();
        assert_eq!(o.target, TargetVariant::Goggle);
        assert_eq!(o.source, Some(SourceVariant::V3Native));
        assert!(o.v3_signature_override);
        assert_eq!(o.fps, None);
        assert_eq!(o.timestamps, TimestampMode::Cumulative);

        assert!(matches!(ConvertOptions::from_json(b"{"), Err(ConvertError::InvalidConfig(_))));
    }

    #[test]
    fn file_names() {
        assert_eq!(suggested_file_name("a.osd", TargetVariant::Canonical), "a.osd_v2.osd");
        assert_eq!(suggested_file_name("a", TargetVariant::Goggle), "a_walksnail.osd");
    }
}
