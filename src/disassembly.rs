use crate::color::Color;
use crate::commands::{Destination, decode_internal};
use crate::header::Metadata;
use crate::{DecodeOptions, IconVgError};

/// Accumulates the textual disassembly: one line per decoded item, a
/// 14-column hex dump of the item's bytes followed by its meaning.
pub(crate) struct Printer {
    out: String,
}

impl Printer {
    pub(crate) fn new() -> Printer {
        Printer { out: String::new() }
    }

    pub(crate) fn line(&mut self, bytes: &[u8], text: &str) {
        let start = self.out.len();
        for b in bytes {
            self.out.push_str(&format!("{b:02x} "));
        }
        while self.out.len() - start < 14 {
            self.out.push(' ');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}

/// A destination that ignores every operation; disassembly only needs the
/// decode loop's side channel.
struct Discard;

impl Destination for Discard {
    fn reset(&mut self, _metadata: &Metadata) {}
    fn set_csel(&mut self, _csel: u8) {}
    fn set_nsel(&mut self, _nsel: u8) {}
    fn set_creg(&mut self, _adj: u8, _incr: bool, _color: Color) {}
    fn set_nreg(&mut self, _adj: u8, _incr: bool, _value: f32) {}
    fn set_lod(&mut self, _lod0: f32, _lod1: f32) {}
    fn start_path(&mut self, _adj: u8, _x: f32, _y: f32) {}
    fn close_path_end_path(&mut self) {}
    fn close_path_abs_move_to(&mut self, _x: f32, _y: f32) {}
    fn close_path_rel_move_to(&mut self, _x: f32, _y: f32) {}
    fn abs_h_line_to(&mut self, _x: f32) {}
    fn rel_h_line_to(&mut self, _x: f32) {}
    fn abs_v_line_to(&mut self, _y: f32) {}
    fn rel_v_line_to(&mut self, _y: f32) {}
    fn abs_line_to(&mut self, _x: f32, _y: f32) {}
    fn rel_line_to(&mut self, _x: f32, _y: f32) {}
    fn abs_smooth_quad_to(&mut self, _x: f32, _y: f32) {}
    fn rel_smooth_quad_to(&mut self, _x: f32, _y: f32) {}
    fn abs_quad_to(&mut self, _x1: f32, _y1: f32, _x: f32, _y: f32) {}
    fn rel_quad_to(&mut self, _x1: f32, _y1: f32, _x: f32, _y: f32) {}
    fn abs_smooth_cube_to(&mut self, _x2: f32, _y2: f32, _x: f32, _y: f32) {}
    fn rel_smooth_cube_to(&mut self, _x2: f32, _y2: f32, _x: f32, _y: f32) {}
    fn abs_cube_to(&mut self, _x1: f32, _y1: f32, _x2: f32, _y2: f32, _x: f32, _y: f32) {}
    fn rel_cube_to(&mut self, _x1: f32, _y1: f32, _x2: f32, _y2: f32, _x: f32, _y: f32) {}
    fn abs_arc_to(
        &mut self,
        _rx: f32,
        _ry: f32,
        _x_axis_rotation: f32,
        _large_arc: bool,
        _sweep: bool,
        _x: f32,
        _y: f32,
    ) {
    }
    fn rel_arc_to(
        &mut self,
        _rx: f32,
        _ry: f32,
        _x_axis_rotation: f32,
        _large_arc: bool,
        _sweep: bool,
        _x: f32,
        _y: f32,
    ) {
    }
}

/// Returns a line-per-operation hex and mnemonic dump of an encoded
/// graphic. This is a debugging aid, not a stability-guaranteed format.
pub fn disassemble(src: &[u8]) -> Result<String, IconVgError> {
    let mut printer = Printer::new();
    decode_internal(
        &mut Discard,
        src,
        &DecodeOptions::default(),
        Some(&mut printer),
    )?;
    Ok(printer.finish())
}
