pub mod error;
pub mod geometry;
pub mod header;
pub mod frame;
pub mod transpose;
pub mod remap;
pub mod pipeline;
pub mod batch;

pub use error::ConvertError;
pub use geometry::{GridGeometry, FontMetrics};
pub use header::{Header, SourceVariant};
pub use frame::{Frame, TimestampMode};
pub use pipeline::{convert, inspect, ConversionRequest, ConversionResult, ConvertOptions, TargetVariant};
pub use batch::convert_batch;
