use std::io::Cursor;

use byteorder::ReadBytesExt;

use crate::color::{
    Color, Rgba, read_color_1, read_color_2, read_color_3_direct, read_color_3_indirect,
    read_color_4,
};
use crate::common::{read_coordinate, read_natural, read_real, read_zero_to_one};
use crate::disassembly::Printer;
use crate::header::Metadata;
use crate::{DecodeOptions, IconVgError};

/// The sink that receives decoded (or directly constructed) styling and
/// drawing operations. The interpreter holds no rendering logic of its
/// own; registers, the pen position and smooth-curve state are the
/// destination's responsibility to track if it needs them.
pub trait Destination {
    fn reset(&mut self, metadata: &Metadata);

    fn set_csel(&mut self, csel: u8);
    fn set_nsel(&mut self, nsel: u8);
    /// Sets CREG[CSEL-adj], or CREG[CSEL] with a CSEL post-increment when
    /// `incr` is set (in which case `adj` is zero).
    fn set_creg(&mut self, adj: u8, incr: bool, color: Color);
    fn set_nreg(&mut self, adj: u8, incr: bool, value: f32);
    fn set_lod(&mut self, lod0: f32, lod1: f32);

    /// Switches to drawing mode with an implicit absolute moveto. The
    /// path, once complete, is filled with CREG[CSEL-adj].
    fn start_path(&mut self, adj: u8, x: f32, y: f32);
    fn close_path_end_path(&mut self);
    fn close_path_abs_move_to(&mut self, x: f32, y: f32);
    fn close_path_rel_move_to(&mut self, x: f32, y: f32);

    fn abs_h_line_to(&mut self, x: f32);
    fn rel_h_line_to(&mut self, x: f32);
    fn abs_v_line_to(&mut self, y: f32);
    fn rel_v_line_to(&mut self, y: f32);
    fn abs_line_to(&mut self, x: f32, y: f32);
    fn rel_line_to(&mut self, x: f32, y: f32);
    fn abs_smooth_quad_to(&mut self, x: f32, y: f32);
    fn rel_smooth_quad_to(&mut self, x: f32, y: f32);
    fn abs_quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32);
    fn rel_quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32);
    fn abs_smooth_cube_to(&mut self, x2: f32, y2: f32, x: f32, y: f32);
    fn rel_smooth_cube_to(&mut self, x2: f32, y2: f32, x: f32, y: f32);
    fn abs_cube_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32);
    fn rel_cube_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32);
    #[allow(clippy::too_many_arguments)]
    fn abs_arc_to(
        &mut self,
        rx: f32,
        ry: f32,
        x_axis_rotation: f32,
        large_arc: bool,
        sweep: bool,
        x: f32,
        y: f32,
    );
    #[allow(clippy::too_many_arguments)]
    fn rel_arc_to(
        &mut self,
        rx: f32,
        ry: f32,
        x_axis_rotation: f32,
        large_arc: bool,
        sweep: bool,
        x: f32,
        y: f32,
    );
}

/// Rendering switches between a styling mode, where registers are set,
/// and a drawing mode, where a path's geometry is defined. The virtual
/// machine starts in the styling mode.
#[derive(Debug, Copy, Clone, PartialEq)]
enum Mode {
    Styling,
    Drawing,
}

pub(crate) fn decode_internal(
    dst: &mut dyn Destination,
    src: &[u8],
    options: &DecodeOptions,
    mut printer: Option<&mut Printer>,
) -> Result<(), IconVgError> {
    let mut cursor = Cursor::new(src);

    let mut metadata = Metadata::parse(&mut cursor, printer.as_deref_mut())?;
    if let Some(palette) = &options.palette {
        // A caller-provided palette replaces the suggested one. Entries
        // that are nonsensical as premultiplied colors become opaque
        // black; they are never reinterpreted as gradients.
        for (entry, &given) in metadata.palette.iter_mut().zip(palette.iter()) {
            *entry = if given.is_premultiplied() {
                given
            } else {
                Rgba::OPAQUE_BLACK
            };
        }
    }
    tracing::debug!(
        len = src.len(),
        view_box = ?metadata.view_box,
        "decoding IconVG graphic"
    );
    dst.reset(&metadata);

    let mut mode = Mode::Styling;
    while (cursor.position() as usize) < src.len() {
        mode = match mode {
            Mode::Styling => styling_op(dst, &mut cursor, &mut printer)?,
            Mode::Drawing => drawing_op(dst, &mut cursor, &mut printer)?,
        };
    }
    Ok(())
}

fn print_opcode(printer: &mut Option<&mut Printer>, opcode: u8, text: &str) {
    if let Some(p) = printer.as_deref_mut() {
        p.line(&[opcode], text);
    }
}

fn print_continuation(printer: &mut Option<&mut Printer>, text: &str) {
    if let Some(p) = printer.as_deref_mut() {
        p.line(&[], text);
    }
}

fn read_coordinate_op(
    cursor: &mut Cursor<&[u8]>,
    printer: &mut Option<&mut Printer>,
) -> Result<f32, IconVgError> {
    let src = *cursor.get_ref();
    let start = cursor.position() as usize;
    let v = read_coordinate(cursor)?;
    if let Some(p) = printer.as_deref_mut() {
        p.line(&src[start..cursor.position() as usize], &format!("{v:+}"));
    }
    Ok(v)
}

fn read_real_op(
    cursor: &mut Cursor<&[u8]>,
    printer: &mut Option<&mut Printer>,
) -> Result<f32, IconVgError> {
    let src = *cursor.get_ref();
    let start = cursor.position() as usize;
    let v = read_real(cursor)?;
    if let Some(p) = printer.as_deref_mut() {
        p.line(&src[start..cursor.position() as usize], &format!("{v:+}"));
    }
    Ok(v)
}

fn read_angle_op(
    cursor: &mut Cursor<&[u8]>,
    printer: &mut Option<&mut Printer>,
) -> Result<f32, IconVgError> {
    let src = *cursor.get_ref();
    let start = cursor.position() as usize;
    let v = read_zero_to_one(cursor)?;
    if let Some(p) = printer.as_deref_mut() {
        p.line(
            &src[start..cursor.position() as usize],
            &format!("{v:+} of a full revolution"),
        );
    }
    Ok(v)
}

/// The adjustment value ADJ is the low three bits of a register-setting
/// opcode; the form with all three bits set instead uses the selector
/// as-is and post-increments it.
fn adj_incr(opcode: u8) -> (u8, bool) {
    match opcode & 0x07 {
        7 => (0, true),
        adj => (adj, false),
    }
}

fn styling_op(
    dst: &mut dyn Destination,
    cursor: &mut Cursor<&[u8]>,
    printer: &mut Option<&mut Printer>,
) -> Result<Mode, IconVgError> {
    let src = *cursor.get_ref();
    let offset = cursor.position() as usize;
    let opcode = cursor
        .read_u8()
        .map_err(|_| IconVgError::InvalidNumber(offset))?;

    match opcode {
        0x00..=0x3f => {
            print_opcode(printer, opcode, &format!("Set CSEL = {opcode}"));
            dst.set_csel(opcode);
        }
        0x40..=0x7f => {
            let nsel = opcode & 0x3f;
            print_opcode(printer, opcode, &format!("Set NSEL = {nsel}"));
            dst.set_nsel(nsel);
        }
        0x80..=0xa7 => {
            let (adj, incr) = adj_incr(opcode);
            let (read, what): (
                fn(&mut Cursor<&[u8]>) -> Result<Color, IconVgError>,
                &str,
            ) = match (opcode - 0x80) >> 3 {
                0 => (read_color_1, "1 byte color"),
                1 => (read_color_2, "2 byte color"),
                2 => (read_color_3_direct, "3 byte direct color"),
                3 => (read_color_4, "4 byte color"),
                _ => (read_color_3_indirect, "3 byte indirect color"),
            };
            let text = if incr {
                format!("Set CREG[CSEL] to a {what}; CSEL++")
            } else {
                format!("Set CREG[CSEL-{adj}] to a {what}")
            };
            print_opcode(printer, opcode, &text);

            let start = cursor.position() as usize;
            let color = read(cursor)?;
            if let Some(p) = printer.as_deref_mut() {
                p.line(
                    &src[start..cursor.position() as usize],
                    &format!("{color}"),
                );
            }
            dst.set_creg(adj, incr, color);
        }
        0xa8..=0xbf => {
            let (adj, incr) = adj_incr(opcode);
            let (read, what): (
                fn(&mut Cursor<&[u8]>, &mut Option<&mut Printer>) -> Result<f32, IconVgError>,
                &str,
            ) = match (opcode - 0xa8) >> 3 {
                0 => (read_real_op, "real number"),
                1 => (read_coordinate_op, "coordinate number"),
                _ => (read_angle_op, "zero-to-one number"),
            };
            let text = if incr {
                format!("Set NREG[NSEL] to a {what}; NSEL++")
            } else {
                format!("Set NREG[NSEL-{adj}] to a {what}")
            };
            print_opcode(printer, opcode, &text);

            let value = read(cursor, printer)?;
            dst.set_nreg(adj, incr, value);
        }
        0xc0..=0xc6 => {
            let adj = opcode & 0x07;
            print_opcode(
                printer,
                opcode,
                &format!("Start path, filled with CREG[CSEL-{adj}]; M (absolute moveTo)"),
            );
            let x = read_coordinate_op(cursor, printer)?;
            let y = read_coordinate_op(cursor, printer)?;
            dst.start_path(adj, x, y);
            return Ok(Mode::Drawing);
        }
        0xc7 => {
            print_opcode(printer, opcode, "Set level of detail bounds");
            let lod0 = read_real_op(cursor, printer)?;
            let lod1 = read_real_op(cursor, printer)?;
            dst.set_lod(lod0, lod1);
        }
        _ => return Err(IconVgError::ReservedOpcode { opcode, offset }),
    }
    Ok(Mode::Styling)
}

fn drawing_op(
    dst: &mut dyn Destination,
    cursor: &mut Cursor<&[u8]>,
    printer: &mut Option<&mut Printer>,
) -> Result<Mode, IconVgError> {
    let src = *cursor.get_ref();
    let offset = cursor.position() as usize;
    let opcode = cursor
        .read_u8()
        .map_err(|_| IconVgError::InvalidNumber(offset))?;

    // Opcodes up to 0xdf come in contiguous groups whose low bits encode
    // a repeat count: how often the drawing operation is repeated.
    let (mnemonic, reps) = match opcode {
        0x00..=0x1f => ("L (absolute lineTo)", (opcode & 0x1f) + 1),
        0x20..=0x3f => ("l (relative lineTo)", (opcode & 0x1f) + 1),
        0x40..=0x4f => ("T (absolute smooth quadTo)", (opcode & 0x0f) + 1),
        0x50..=0x5f => ("t (relative smooth quadTo)", (opcode & 0x0f) + 1),
        0x60..=0x6f => ("Q (absolute quadTo)", (opcode & 0x0f) + 1),
        0x70..=0x7f => ("q (relative quadTo)", (opcode & 0x0f) + 1),
        0x80..=0x8f => ("S (absolute smooth cubeTo)", (opcode & 0x0f) + 1),
        0x90..=0x9f => ("s (relative smooth cubeTo)", (opcode & 0x0f) + 1),
        0xa0..=0xaf => ("C (absolute cubeTo)", (opcode & 0x0f) + 1),
        0xb0..=0xbf => ("c (relative cubeTo)", (opcode & 0x0f) + 1),
        0xc0..=0xcf => ("A (absolute arcTo)", (opcode & 0x0f) + 1),
        0xd0..=0xdf => ("a (relative arcTo)", (opcode & 0x0f) + 1),
        0xe1 => {
            print_opcode(printer, opcode, "z (closePath); end path");
            dst.close_path_end_path();
            return Ok(Mode::Styling);
        }
        0xe2 => {
            print_opcode(printer, opcode, "z (closePath); M (absolute moveTo)");
            let x = read_coordinate_op(cursor, printer)?;
            let y = read_coordinate_op(cursor, printer)?;
            dst.close_path_abs_move_to(x, y);
            return Ok(Mode::Drawing);
        }
        0xe3 => {
            print_opcode(printer, opcode, "z (closePath); m (relative moveTo)");
            let x = read_coordinate_op(cursor, printer)?;
            let y = read_coordinate_op(cursor, printer)?;
            dst.close_path_rel_move_to(x, y);
            return Ok(Mode::Drawing);
        }
        0xe6 => {
            print_opcode(printer, opcode, "H (absolute horizontal lineTo)");
            let x = read_coordinate_op(cursor, printer)?;
            dst.abs_h_line_to(x);
            return Ok(Mode::Drawing);
        }
        0xe7 => {
            print_opcode(printer, opcode, "h (relative horizontal lineTo)");
            let x = read_coordinate_op(cursor, printer)?;
            dst.rel_h_line_to(x);
            return Ok(Mode::Drawing);
        }
        0xe8 => {
            print_opcode(printer, opcode, "V (absolute vertical lineTo)");
            let y = read_coordinate_op(cursor, printer)?;
            dst.abs_v_line_to(y);
            return Ok(Mode::Drawing);
        }
        0xe9 => {
            print_opcode(printer, opcode, "v (relative vertical lineTo)");
            let y = read_coordinate_op(cursor, printer)?;
            dst.rel_v_line_to(y);
            return Ok(Mode::Drawing);
        }
        _ => return Err(IconVgError::ReservedOpcode { opcode, offset }),
    };

    print_opcode(printer, opcode, &format!("{mnemonic}, {reps} reps"));
    for rep in 0..reps {
        if rep > 0 {
            print_continuation(printer, &format!("{mnemonic}, implicit"));
        }
        match opcode >> 4 {
            0x0 | 0x1 => {
                let x = read_coordinate_op(cursor, printer)?;
                let y = read_coordinate_op(cursor, printer)?;
                dst.abs_line_to(x, y);
            }
            0x2 | 0x3 => {
                let x = read_coordinate_op(cursor, printer)?;
                let y = read_coordinate_op(cursor, printer)?;
                dst.rel_line_to(x, y);
            }
            0x4 => {
                let x = read_coordinate_op(cursor, printer)?;
                let y = read_coordinate_op(cursor, printer)?;
                dst.abs_smooth_quad_to(x, y);
            }
            0x5 => {
                let x = read_coordinate_op(cursor, printer)?;
                let y = read_coordinate_op(cursor, printer)?;
                dst.rel_smooth_quad_to(x, y);
            }
            0x6 => {
                let x1 = read_coordinate_op(cursor, printer)?;
                let y1 = read_coordinate_op(cursor, printer)?;
                let x = read_coordinate_op(cursor, printer)?;
                let y = read_coordinate_op(cursor, printer)?;
                dst.abs_quad_to(x1, y1, x, y);
            }
            0x7 => {
                let x1 = read_coordinate_op(cursor, printer)?;
                let y1 = read_coordinate_op(cursor, printer)?;
                let x = read_coordinate_op(cursor, printer)?;
                let y = read_coordinate_op(cursor, printer)?;
                dst.rel_quad_to(x1, y1, x, y);
            }
            0x8 => {
                let x2 = read_coordinate_op(cursor, printer)?;
                let y2 = read_coordinate_op(cursor, printer)?;
                let x = read_coordinate_op(cursor, printer)?;
                let y = read_coordinate_op(cursor, printer)?;
                dst.abs_smooth_cube_to(x2, y2, x, y);
            }
            0x9 => {
                let x2 = read_coordinate_op(cursor, printer)?;
                let y2 = read_coordinate_op(cursor, printer)?;
                let x = read_coordinate_op(cursor, printer)?;
                let y = read_coordinate_op(cursor, printer)?;
                dst.rel_smooth_cube_to(x2, y2, x, y);
            }
            0xa => {
                let x1 = read_coordinate_op(cursor, printer)?;
                let y1 = read_coordinate_op(cursor, printer)?;
                let x2 = read_coordinate_op(cursor, printer)?;
                let y2 = read_coordinate_op(cursor, printer)?;
                let x = read_coordinate_op(cursor, printer)?;
                let y = read_coordinate_op(cursor, printer)?;
                dst.abs_cube_to(x1, y1, x2, y2, x, y);
            }
            0xb => {
                let x1 = read_coordinate_op(cursor, printer)?;
                let y1 = read_coordinate_op(cursor, printer)?;
                let x2 = read_coordinate_op(cursor, printer)?;
                let y2 = read_coordinate_op(cursor, printer)?;
                let x = read_coordinate_op(cursor, printer)?;
                let y = read_coordinate_op(cursor, printer)?;
                dst.rel_cube_to(x1, y1, x2, y2, x, y);
            }
            _ => {
                // Arcs carry two radii, a rotation angle, a flag nibble
                // encoded as a natural number, then the end point.
                let rx = read_coordinate_op(cursor, printer)?;
                let ry = read_coordinate_op(cursor, printer)?;
                let angle = read_angle_op(cursor, printer)?;
                let flags = {
                    let start = cursor.position() as usize;
                    let flags = read_natural(cursor)?;
                    if let Some(p) = printer.as_deref_mut() {
                        p.line(
                            &src[start..cursor.position() as usize],
                            &format!("flags: {flags:#04x}"),
                        );
                    }
                    flags
                };
                let x = read_coordinate_op(cursor, printer)?;
                let y = read_coordinate_op(cursor, printer)?;
                let (large_arc, sweep) = (flags & 0x01 != 0, flags & 0x02 != 0);
                if opcode < 0xd0 {
                    dst.abs_arc_to(rx, ry, angle, large_arc, sweep, x, y);
                } else {
                    dst.rel_arc_to(rx, ry, angle, large_arc, sweep, x, y);
                }
            }
        }
    }
    Ok(Mode::Drawing)
}
