use std::io::Cursor;

use byteorder::ReadBytesExt;

use crate::IconVgError;
use crate::color::{
    Color, Rgba, encode_color_1, encode_color_2, encode_color_3_direct, encode_color_4,
    read_color_1, read_color_2, read_color_3_direct, read_color_4,
};
use crate::common::{encode_coordinate, encode_natural, read_coordinate, read_natural};
use crate::disassembly::Printer;

/// An IconVG graphic starts with these four bytes ("\x89IVG").
pub(crate) const MAGIC: [u8; 4] = [0x89, 0x49, 0x56, 0x47];

const MID_VIEW_BOX: u32 = 0;
const MID_SUGGESTED_PALETTE: u32 = 1;

/// The graphic's bounding rectangle in (scalable) vector space. These are
/// abstract units, not necessarily 1:1 with pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rectangle {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Rectangle {
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Rectangle {
        Rectangle {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// A viewBox is invalid if a minimum exceeds its maximum or if any
    /// bound is a NaN or an infinity.
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.min_x <= self.max_x
            && self.min_y <= self.max_y
    }
}

/// The viewBox used when the metadata does not declare one.
pub const DEFAULT_VIEW_BOX: Rectangle = Rectangle::new(-32.0, -32.0, 32.0, 32.0);

/// A custom palette of 64 colors. Black is always fashionable.
pub type Palette = [Rgba; 64];

pub const DEFAULT_PALETTE: Palette = [Rgba::OPAQUE_BLACK; 64];

/// The decoded fixed-format header: viewBox and suggested palette.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Metadata {
    pub view_box: Rectangle,
    pub palette: Palette,
}

impl Default for Metadata {
    fn default() -> Metadata {
        Metadata {
            view_box: DEFAULT_VIEW_BOX,
            palette: DEFAULT_PALETTE,
        }
    }
}

impl Metadata {
    pub(crate) fn parse(
        cursor: &mut Cursor<&[u8]>,
        mut printer: Option<&mut Printer>,
    ) -> Result<Metadata, IconVgError> {
        let src = *cursor.get_ref();

        let mut magic = [0u8; 4];
        std::io::Read::read_exact(cursor, &mut magic).map_err(|_| IconVgError::InvalidMagic)?;
        if magic != MAGIC {
            return Err(IconVgError::InvalidMagic);
        }
        if let Some(p) = printer.as_deref_mut() {
            p.line(&MAGIC, "IconVG Magic identifier");
        }

        let mut metadata = Metadata::default();

        let n_chunks = {
            let start = cursor.position() as usize;
            let n = read_natural(cursor)?;
            if let Some(p) = printer.as_deref_mut() {
                p.line(
                    &src[start..cursor.position() as usize],
                    &format!("Number of metadata chunks: {n}"),
                );
            }
            n
        };

        let mut previous_mid = None;
        for _ in 0..n_chunks {
            metadata.parse_chunk(cursor, &mut previous_mid, printer.as_deref_mut())?;
        }

        Ok(metadata)
    }

    fn parse_chunk(
        &mut self,
        cursor: &mut Cursor<&[u8]>,
        previous_mid: &mut Option<u32>,
        mut printer: Option<&mut Printer>,
    ) -> Result<(), IconVgError> {
        let src = *cursor.get_ref();

        let start = cursor.position() as usize;
        let length = read_natural(cursor)? as u64;
        if let Some(p) = printer.as_deref_mut() {
            p.line(
                &src[start..cursor.position() as usize],
                &format!("Metadata chunk length: {length}"),
            );
        }

        let chunk_start = cursor.position();
        let start = chunk_start as usize;
        let mid = read_natural(cursor)?;
        if let Some(p) = printer.as_deref_mut() {
            let label = match mid {
                MID_VIEW_BOX => " (viewBox)",
                MID_SUGGESTED_PALETTE => " (suggested palette)",
                _ => "",
            };
            p.line(
                &src[start..cursor.position() as usize],
                &format!("Metadata Identifier: {mid}{label}"),
            );
        }

        // Chunks must be presented in increasing MID order, without
        // repeats.
        if previous_mid.is_some_and(|prev| mid <= prev) {
            return Err(IconVgError::InvalidMetadata);
        }
        *previous_mid = Some(mid);

        match mid {
            MID_VIEW_BOX => self.parse_view_box(cursor, printer)?,
            MID_SUGGESTED_PALETTE => self.parse_suggested_palette(cursor, printer)?,
            _ => {
                // Unknown identifiers are skipped using the declared chunk
                // length.
                let consumed = cursor.position() - chunk_start;
                let remaining = length
                    .checked_sub(consumed)
                    .ok_or(IconVgError::InvalidMetadata)?;
                let start = cursor.position() as usize;
                let end = start + remaining as usize;
                if end > src.len() {
                    return Err(IconVgError::InvalidMetadata);
                }
                if let Some(p) = printer.as_deref_mut() {
                    for row in src[start..end].chunks(4) {
                        p.line(row, "(unknown metadata)");
                    }
                }
                cursor.set_position(end as u64);
            }
        }

        if cursor.position() - chunk_start != length {
            return Err(IconVgError::InvalidMetadata);
        }
        Ok(())
    }

    fn parse_view_box(
        &mut self,
        cursor: &mut Cursor<&[u8]>,
        mut printer: Option<&mut Printer>,
    ) -> Result<(), IconVgError> {
        let src = *cursor.get_ref();
        let mut coordinate = |cursor: &mut Cursor<&[u8]>| -> Result<f32, IconVgError> {
            let start = cursor.position() as usize;
            let v = read_coordinate(cursor)?;
            if let Some(p) = printer.as_deref_mut() {
                p.line(&src[start..cursor.position() as usize], &format!("{v:+}"));
            }
            Ok(v)
        };

        let view_box = Rectangle::new(
            coordinate(cursor)?,
            coordinate(cursor)?,
            coordinate(cursor)?,
            coordinate(cursor)?,
        );
        if !view_box.is_valid() {
            return Err(IconVgError::InvalidViewBox);
        }
        self.view_box = view_box;
        Ok(())
    }

    fn parse_suggested_palette(
        &mut self,
        cursor: &mut Cursor<&[u8]>,
        mut printer: Option<&mut Printer>,
    ) -> Result<(), IconVgError> {
        let src = *cursor.get_ref();

        // One header byte: count-1 in the low 6 bits, the per-color width
        // tag in the high 2 bits.
        let start = cursor.position() as usize;
        let header = cursor
            .read_u8()
            .map_err(|_| IconVgError::InvalidSuggestedPalette)?;
        let count = (header & 0x3f) as usize + 1;
        let width_tag = header >> 6;
        if let Some(p) = printer.as_deref_mut() {
            p.line(
                &src[start..cursor.position() as usize],
                &format!(
                    "Suggested palette with {count} colors, {} bytes each",
                    width_tag + 1
                ),
            );
        }

        let read: fn(&mut Cursor<&[u8]>) -> Result<Color, IconVgError> = match width_tag {
            0 => read_color_1,
            1 => read_color_2,
            2 => read_color_3_direct,
            _ => read_color_4,
        };
        for entry in self.palette.iter_mut().take(count) {
            let start = cursor.position() as usize;
            let color = read(cursor).map_err(|_| IconVgError::InvalidSuggestedPalette)?;
            // A 1 byte color that refers to the custom palette or a CREG
            // register resolves to opaque black.
            *entry = match color {
                Color::Rgba(c) => c,
                _ => Rgba::OPAQUE_BLACK,
            };
            if let Some(p) = printer.as_deref_mut() {
                p.line(
                    &src[start..cursor.position() as usize],
                    &format!("{color}"),
                );
            }
        }
        Ok(())
    }
}

/// Appends the magic identifier and the metadata chunks. Chunks are only
/// emitted for non-default values, in increasing MID order.
pub(crate) fn encode_metadata(buf: &mut Vec<u8>, scratch: &mut Vec<u8>, metadata: &Metadata) {
    buf.extend_from_slice(&MAGIC);

    let has_view_box = metadata.view_box != DEFAULT_VIEW_BOX;
    let has_palette = metadata.palette != DEFAULT_PALETTE;
    encode_natural(buf, has_view_box as u32 + has_palette as u32);

    if has_view_box {
        scratch.clear();
        encode_natural(scratch, MID_VIEW_BOX);
        encode_coordinate(scratch, metadata.view_box.min_x);
        encode_coordinate(scratch, metadata.view_box.min_y);
        encode_coordinate(scratch, metadata.view_box.max_x);
        encode_coordinate(scratch, metadata.view_box.max_y);
        encode_natural(buf, scratch.len() as u32);
        buf.extend_from_slice(scratch);
    }

    if has_palette {
        scratch.clear();
        encode_natural(scratch, MID_SUGGESTED_PALETTE);
        encode_suggested_palette(scratch, &metadata.palette);
        encode_natural(buf, scratch.len() as u32);
        buf.extend_from_slice(scratch);
    }
}

/// The canonical palette encoding trims trailing opaque-black entries and
/// uses the narrowest width in which every remaining color is exactly
/// representable.
fn encode_suggested_palette(buf: &mut Vec<u8>, palette: &Palette) {
    let mut count = 64;
    while count > 1 && palette[count - 1] == Rgba::OPAQUE_BLACK {
        count -= 1;
    }
    let colors = &palette[..count];

    let all = |f: fn(Color) -> bool| colors.iter().all(|&c| f(Color::Rgba(c)));
    let width_tag: u8 = if all(|c| encode_color_1(c).is_some()) {
        0
    } else if all(|c| encode_color_2(c).is_some()) {
        1
    } else if all(|c| encode_color_3_direct(c).is_some()) {
        2
    } else {
        3
    };

    buf.push(width_tag << 6 | (count as u8 - 1));
    for &c in colors {
        let c = Color::Rgba(c);
        match width_tag {
            0 => buf.push(encode_color_1(c).unwrap()),
            1 => buf.extend_from_slice(&encode_color_2(c).unwrap()),
            2 => buf.extend_from_slice(&encode_color_3_direct(c).unwrap()),
            _ => buf.extend_from_slice(&encode_color_4(c).unwrap()),
        }
    }
}
