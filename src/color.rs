use std::fmt;
use std::io::Cursor;

use byteorder::ReadBytesExt;

use crate::IconVgError;

/// A 32-bit alpha-premultiplied color: each channel has already been
/// multiplied by the alpha fraction, so `c0000c0`-style values where a
/// channel exceeds the alpha are nonsensical as colors. Some of those
/// nonsensical values are re-purposed as gradient descriptors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const OPAQUE_BLACK: Rgba = Rgba::new(0x00, 0x00, 0x00, 0xff);
    pub const TRANSPARENT: Rgba = Rgba::new(0x00, 0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Rgba {
        Rgba { r, g, b, a }
    }

    /// Whether every channel is at most the alpha channel.
    pub fn is_premultiplied(self) -> bool {
        self.r <= self.a && self.g <= self.a && self.b <= self.a
    }

    /// A color register whose alpha is zero but whose blue value is at
    /// least 128 is a gradient descriptor, not a flat color.
    pub fn is_gradient(self) -> bool {
        self.a == 0x00 && self.b >= 0x80
    }

    /// The gradient's number of color/offset stops (the low 6 bits of the
    /// red value).
    pub fn gradient_stop_count(self) -> usize {
        (self.r & 0x3f) as usize
    }

    /// The gradient's color register base (the low 6 bits of the green
    /// value).
    pub fn gradient_c_base(self) -> u8 {
        self.g & 0x3f
    }

    /// The gradient's number register base (the low 6 bits of the blue
    /// value).
    pub fn gradient_n_base(self) -> u8 {
        self.b & 0x3f
    }

    /// How the gradient spreads past its nominal bounds (the high 2 bits
    /// of the green value).
    pub fn gradient_spread(self) -> GradientSpread {
        match self.g >> 6 {
            0 => GradientSpread::None,
            1 => GradientSpread::Pad,
            2 => GradientSpread::Reflect,
            _ => GradientSpread::Repeat,
        }
    }

    /// Whether the gradient is radial rather than linear (the 0x40 bit of
    /// the blue value).
    pub fn gradient_is_radial(self) -> bool {
        self.b & 0x40 != 0
    }
}

/// How a gradient maps offsets outside [0, 1].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GradientSpread {
    /// Offsets outside [0, 1] map to transparent black.
    None = 0,
    /// Offsets clamp to the colors at 0 and 1.
    Pad = 1,
    /// The offset mapping reflects start-to-end, end-to-start, and so on.
    Reflect = 2,
    /// The offset mapping repeats start-to-end.
    Repeat = 3,
}

/// One color/offset stop of a gradient.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgba,
}

/// A color in the instruction stream. Palette and register references are
/// symbolic; they resolve against the active palette and CREG file at the
/// moment a path is filled, not at decode time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Color {
    /// A flat alpha-premultiplied color (or a gradient descriptor).
    Rgba(Rgba),
    /// An entry of the custom palette, in [0, 64).
    PaletteIndex(u8),
    /// An entry of the CREG color register file, in [0, 64).
    CReg(u8),
    /// A blend of two 1-byte-encoded colors `c0` and `c1`: each resolved
    /// channel is `((255-t)*c0 + t*c1 + 128) / 255`, rounded down.
    Blend { t: u8, c0: u8, c1: u8 },
}

impl Color {
    /// Resolves to a concrete RGBA value against the active palette and
    /// color registers.
    pub fn resolve(self, palette: &[Rgba; 64], creg: &[Rgba; 64]) -> Rgba {
        match self {
            Color::Rgba(c) => c,
            Color::PaletteIndex(i) => palette[(i & 0x3f) as usize],
            Color::CReg(i) => creg[(i & 0x3f) as usize],
            Color::Blend { t, c0, c1 } => {
                let c0 = decode_color_1_value(c0).resolve(palette, creg);
                let c1 = decode_color_1_value(c1).resolve(palette, creg);
                let t = t as u32;
                let blend = |x: u8, y: u8| ((255 - t) * x as u32 + t * y as u32 + 128) / 255;
                Rgba::new(
                    blend(c0.r, c1.r) as u8,
                    blend(c0.g, c1.g) as u8,
                    blend(c0.b, c1.b) as u8,
                    blend(c0.a, c1.a) as u8,
                )
            }
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Color::Rgba(c) => write!(f, "RGBA {:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a),
            Color::PaletteIndex(i) => write!(f, "customPalette[{i}]"),
            Color::CReg(i) => write!(f, "CREG[{i}]"),
            Color::Blend { t, c0, c1 } => {
                write!(f, "blend {t}:{} {c0:#04x}:{c1:#04x}", 255 - t)
            }
        }
    }
}

// The five base-5 channel levels of the 1 byte encoding.
const ONE_BYTE_LEVELS: [u8; 5] = [0x00, 0x40, 0x80, 0xc0, 0xff];

/// Maps a 1 byte color code to its color: [0, 125) is a base-5 RGB
/// encoding over five channel levels, 125 to 127 are fixed grays and
/// transparent, and the upper half references the custom palette or the
/// CREG register file. Blends reuse this for their two nested codes.
fn decode_color_1_value(x: u8) -> Color {
    match x {
        0..=124 => Color::Rgba(Rgba::new(
            ONE_BYTE_LEVELS[(x / 25) as usize],
            ONE_BYTE_LEVELS[((x / 5) % 5) as usize],
            ONE_BYTE_LEVELS[(x % 5) as usize],
            0xff,
        )),
        125 => Color::Rgba(Rgba::new(0xc0, 0xc0, 0xc0, 0xc0)),
        126 => Color::Rgba(Rgba::new(0x80, 0x80, 0x80, 0x80)),
        127 => Color::Rgba(Rgba::TRANSPARENT),
        128..=191 => Color::PaletteIndex(x - 128),
        _ => Color::CReg(x - 192),
    }
}

pub(crate) fn read_color_1(cursor: &mut Cursor<&[u8]>) -> Result<Color, IconVgError> {
    let start = cursor.position() as usize;
    let x = cursor
        .read_u8()
        .map_err(|_| IconVgError::InvalidColor(start))?;
    Ok(decode_color_1_value(x))
}

/// 2 byte colors hold a 4-bit nibble per channel, each replicated to 8
/// bits.
pub(crate) fn read_color_2(cursor: &mut Cursor<&[u8]>) -> Result<Color, IconVgError> {
    let start = cursor.position() as usize;
    let err = |_| IconVgError::InvalidColor(start);
    let x = cursor.read_u8().map_err(err)?;
    let y = cursor.read_u8().map_err(err)?;
    Ok(Color::Rgba(Rgba::new(
        0x11 * (x >> 4),
        0x11 * (x & 0x0f),
        0x11 * (y >> 4),
        0x11 * (y & 0x0f),
    )))
}

/// 3 byte direct colors hold 8-bit red, green and blue; alpha is
/// implicitly 0xff.
pub(crate) fn read_color_3_direct(cursor: &mut Cursor<&[u8]>) -> Result<Color, IconVgError> {
    let start = cursor.position() as usize;
    let err = |_| IconVgError::InvalidColor(start);
    let r = cursor.read_u8().map_err(err)?;
    let g = cursor.read_u8().map_err(err)?;
    let b = cursor.read_u8().map_err(err)?;
    Ok(Color::Rgba(Rgba::new(r, g, b, 0xff)))
}

pub(crate) fn read_color_4(cursor: &mut Cursor<&[u8]>) -> Result<Color, IconVgError> {
    let start = cursor.position() as usize;
    let err = |_| IconVgError::InvalidColor(start);
    let r = cursor.read_u8().map_err(err)?;
    let g = cursor.read_u8().map_err(err)?;
    let b = cursor.read_u8().map_err(err)?;
    let a = cursor.read_u8().map_err(err)?;
    Ok(Color::Rgba(Rgba::new(r, g, b, a)))
}

/// 3 byte indirect colors blend two 1 byte colors by a [0, 255] fraction.
pub(crate) fn read_color_3_indirect(cursor: &mut Cursor<&[u8]>) -> Result<Color, IconVgError> {
    let start = cursor.position() as usize;
    let err = |_| IconVgError::InvalidColor(start);
    let t = cursor.read_u8().map_err(err)?;
    let c0 = cursor.read_u8().map_err(err)?;
    let c1 = cursor.read_u8().map_err(err)?;
    Ok(Color::Blend { t, c0, c1 })
}

fn one_byte_level_index(x: u8) -> Option<u8> {
    ONE_BYTE_LEVELS.iter().position(|&l| l == x).map(|i| i as u8)
}

/// The 1 byte code for a color, if it has one.
pub(crate) fn encode_color_1(c: Color) -> Option<u8> {
    match c {
        Color::Rgba(c) => {
            if c == Rgba::new(0xc0, 0xc0, 0xc0, 0xc0) {
                return Some(125);
            }
            if c == Rgba::new(0x80, 0x80, 0x80, 0x80) {
                return Some(126);
            }
            if c == Rgba::TRANSPARENT {
                return Some(127);
            }
            if c.a != 0xff {
                return None;
            }
            let r = one_byte_level_index(c.r)?;
            let g = one_byte_level_index(c.g)?;
            let b = one_byte_level_index(c.b)?;
            Some(25 * r + 5 * g + b)
        }
        Color::PaletteIndex(i) => Some(128 + (i & 0x3f)),
        Color::CReg(i) => Some(192 + (i & 0x3f)),
        Color::Blend { .. } => None,
    }
}

pub(crate) fn encode_color_2(c: Color) -> Option<[u8; 2]> {
    let Color::Rgba(c) = c else { return None };
    let nibble = |x: u8| (x >> 4 == x & 0x0f).then_some(x & 0x0f);
    let (r, g, b, a) = (nibble(c.r)?, nibble(c.g)?, nibble(c.b)?, nibble(c.a)?);
    Some([r << 4 | g, b << 4 | a])
}

pub(crate) fn encode_color_3_direct(c: Color) -> Option<[u8; 3]> {
    let Color::Rgba(c) = c else { return None };
    (c.a == 0xff).then_some([c.r, c.g, c.b])
}

pub(crate) fn encode_color_4(c: Color) -> Option<[u8; 4]> {
    let Color::Rgba(c) = c else { return None };
    Some([c.r, c.g, c.b, c.a])
}

pub(crate) fn encode_color_3_indirect(c: Color) -> Option<[u8; 3]> {
    let Color::Blend { t, c0, c1 } = c else {
        return None;
    };
    Some([t, c0, c1])
}
