pub mod color;
pub mod commands;
mod common;
pub mod disassembly;
pub mod encoder;
pub mod header;
pub mod rasterizer;

use std::io::Cursor;

pub use crate::color::{Color, GradientSpread, GradientStop, Rgba};
pub use crate::commands::Destination;
pub use crate::disassembly::disassemble;
pub use crate::encoder::Encoder;
pub use crate::header::{
    DEFAULT_PALETTE, DEFAULT_VIEW_BOX, Metadata, Palette, Rectangle,
};
pub use crate::rasterizer::Rasterizer;

pub use tiny_skia;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IconVgError {
    #[error("truncated or malformed number at byte offset {0}")]
    InvalidNumber(usize),
    #[error("truncated or malformed color at byte offset {0}")]
    InvalidColor(usize),
    #[error("invalid magic identifier")]
    InvalidMagic,
    #[error("invalid metadata")]
    InvalidMetadata,
    #[error("invalid viewBox")]
    InvalidViewBox,
    #[error("invalid suggested palette")]
    InvalidSuggestedPalette,
    #[error("reserved opcode {opcode:#04x} at byte offset {offset}")]
    ReservedOpcode { opcode: u8, offset: usize },
    #[error("styling ops used in drawing mode")]
    StylingOpsInDrawingMode,
    #[error("drawing ops used in styling mode")]
    DrawingOpsInStylingMode,
    #[error("invalid selector adjustment")]
    InvalidSelectorAdjustment,
    #[error("invalid incrementing adjustment")]
    InvalidIncrementingAdjustment,
    #[error("invalid gradient")]
    InvalidGradient,
}

/// Options for [`decode`].
#[derive(Debug, Default, Clone)]
pub struct DecodeOptions {
    /// An optional 64 color palette. If provided, it replaces the
    /// graphic's suggested palette; entries that are nonsensical as
    /// alpha-premultiplied colors are replaced by opaque black.
    pub palette: Option<Palette>,
}

/// Decodes an IconVG graphic, replaying its styling and drawing
/// operations into `dst`.
///
/// Any error aborts decoding immediately; operations already delivered to
/// the destination are not rolled back.
pub fn decode(
    dst: &mut dyn Destination,
    src: &[u8],
    options: &DecodeOptions,
) -> Result<(), IconVgError> {
    commands::decode_internal(dst, src, options, None)
}

/// Decodes only the magic identifier and metadata of an IconVG graphic.
pub fn decode_metadata(src: &[u8]) -> Result<Metadata, IconVgError> {
    Metadata::parse(&mut Cursor::new(src), None)
}
