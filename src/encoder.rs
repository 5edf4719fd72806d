use crate::IconVgError;
use crate::color::{
    Color, GradientSpread, GradientStop, Rgba, encode_color_1, encode_color_2,
    encode_color_3_direct, encode_color_3_indirect, encode_color_4,
};
use crate::commands::Destination;
use crate::common::{
    encode_coordinate, encode_natural, encode_real, encode_zero_to_one,
};
use crate::header::{MAGIC, Metadata, encode_metadata};

#[derive(Debug, Copy, Clone, PartialEq)]
enum Mode {
    Initial,
    Styling,
    Drawing,
}

/// An IconVG encoder.
///
/// The default value is usable. Calling [`Encoder::reset`], which is
/// optional, sets the metadata for the subsequent encoded form; if it is
/// not called before other methods, the default metadata is implied.
///
/// Every mutation appends the shortest valid encoding of that operation,
/// so replaying a decoded graphic into a fresh encoder reproduces the
/// canonical bytes.
pub struct Encoder {
    /// Whether to encode coordinate numbers for subsequent paths at the
    /// best resolution the graphic format affords.
    ///
    /// By default (false), coordinates are quantized to 1/64th of a unit
    /// when they fall in [-128, +128), so each fits in 1 or 2 bytes. When
    /// true, some coordinates take 4 bytes, giving greater accuracy but
    /// larger files.
    pub high_resolution_coordinates: bool,

    // A copy taken during start_path, so that flipping the public flag
    // mid-path has no effect on the path being drawn.
    high_res: bool,

    buf: Vec<u8>,
    scratch: Vec<u8>,
    error: Option<IconVgError>,

    lod0: f32,
    lod1: f32,
    csel: u8,
    nsel: u8,

    mode: Mode,
    draw_op: u8,
    draw_args: Vec<f32>,
}

impl Default for Encoder {
    fn default() -> Encoder {
        Encoder {
            high_resolution_coordinates: false,
            high_res: false,
            buf: Vec::new(),
            scratch: Vec::new(),
            error: None,
            lod0: 0.0,
            lod1: f32::INFINITY,
            csel: 0,
            nsel: 0,
            mode: Mode::Initial,
            draw_op: 0,
            draw_args: Vec::new(),
        }
    }
}

// (opcode base, maximum repeat count, floats per record) per draw op,
// keyed by the SVG one-letter mnemonic.
fn draw_op_info(op: u8) -> (u8, u8, usize) {
    match op {
        b'L' => (0x00, 32, 2),
        b'l' => (0x20, 32, 2),
        b'T' => (0x40, 16, 2),
        b't' => (0x50, 16, 2),
        b'Q' => (0x60, 16, 4),
        b'q' => (0x70, 16, 4),
        b'S' => (0x80, 16, 4),
        b's' => (0x90, 16, 4),
        b'C' => (0xa0, 16, 6),
        b'c' => (0xb0, 16, 6),
        b'A' => (0xc0, 16, 6),
        b'a' => (0xd0, 16, 6),
        // Z closes the path and then ends it.
        b'Z' => (0xe1, 1, 0),
        // Y/y close the path and then open a new one with a moveto.
        b'Y' => (0xe2, 1, 2),
        b'y' => (0xe3, 1, 2),
        b'H' => (0xe6, 1, 1),
        b'h' => (0xe7, 1, 1),
        b'V' => (0xe8, 1, 1),
        b'v' => (0xe9, 1, 1),
        _ => unreachable!("draw_op_info is only called for known draw ops"),
    }
}

impl Encoder {
    pub fn new() -> Encoder {
        Encoder::default()
    }

    /// Returns the encoded form.
    pub fn bytes(&mut self) -> Result<&[u8], IconVgError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if self.mode == Mode::Initial {
            self.append_default_metadata();
        }
        Ok(&self.buf)
    }

    /// Resets the encoder for the given metadata. The
    /// `high_resolution_coordinates` setting survives the reset, so a
    /// decoded graphic can be replayed at either resolution.
    pub fn reset(&mut self, metadata: Metadata) {
        let high_res = self.high_resolution_coordinates;
        *self = Encoder::default();
        self.high_resolution_coordinates = high_res;
        self.mode = Mode::Styling;
        encode_metadata(&mut self.buf, &mut self.scratch, &metadata);
    }

    fn append_default_metadata(&mut self) {
        self.buf.clear();
        self.buf.extend_from_slice(&MAGIC);
        self.buf.push(0x00); // There are zero metadata chunks.
        self.mode = Mode::Styling;
    }

    pub fn csel(&mut self) -> u8 {
        if self.mode == Mode::Initial {
            self.append_default_metadata();
        }
        self.csel
    }

    pub fn nsel(&mut self) -> u8 {
        if self.mode == Mode::Initial {
            self.append_default_metadata();
        }
        self.nsel
    }

    pub fn lod(&mut self) -> (f32, f32) {
        if self.mode == Mode::Initial {
            self.append_default_metadata();
        }
        (self.lod0, self.lod1)
    }

    fn check_mode_styling(&mut self) {
        match self.mode {
            Mode::Styling => {}
            Mode::Initial => self.append_default_metadata(),
            Mode::Drawing => self.error = Some(IconVgError::StylingOpsInDrawingMode),
        }
    }

    pub fn set_csel(&mut self, csel: u8) {
        self.check_mode_styling();
        if self.error.is_some() {
            return;
        }
        self.csel = csel & 0x3f;
        self.buf.push(self.csel);
    }

    pub fn set_nsel(&mut self, nsel: u8) {
        self.check_mode_styling();
        if self.error.is_some() {
            return;
        }
        self.nsel = nsel & 0x3f;
        self.buf.push(self.nsel | 0x40);
    }

    fn check_adjustment(&mut self, adj: &mut u8, incr: bool) -> bool {
        if *adj > 6 {
            self.error = Some(IconVgError::InvalidSelectorAdjustment);
            return false;
        }
        if incr {
            if *adj != 0 {
                self.error = Some(IconVgError::InvalidIncrementingAdjustment);
                return false;
            }
            *adj = 7;
        }
        true
    }

    pub fn set_creg(&mut self, mut adj: u8, incr: bool, color: Color) {
        self.check_mode_styling();
        if self.error.is_some() || !self.check_adjustment(&mut adj, incr) {
            return;
        }
        if incr {
            self.csel = self.csel.wrapping_add(1) & 0x3f;
        }

        if let Some(x) = encode_color_1(color) {
            self.buf.extend_from_slice(&[adj | 0x80, x]);
        } else if let Some(x) = encode_color_2(color) {
            self.buf.extend_from_slice(&[adj | 0x88, x[0], x[1]]);
        } else if let Some(x) = encode_color_3_direct(color) {
            self.buf.extend_from_slice(&[adj | 0x90, x[0], x[1], x[2]]);
        } else if let Some(x) = encode_color_4(color) {
            self.buf.extend_from_slice(&[adj | 0x98, x[0], x[1], x[2], x[3]]);
        } else if let Some(x) = encode_color_3_indirect(color) {
            self.buf.extend_from_slice(&[adj | 0xa0, x[0], x[1], x[2]]);
        } else {
            unreachable!("every color has a 4 byte or indirect encoding");
        }
    }

    pub fn set_nreg(&mut self, mut adj: u8, incr: bool, value: f32) {
        self.check_mode_styling();
        if self.error.is_some() || !self.check_adjustment(&mut adj, incr) {
            return;
        }
        if incr {
            self.nsel = self.nsel.wrapping_add(1) & 0x3f;
        }

        // Try the three number encodings and keep the first shortest.
        self.scratch.clear();
        let n_real = encode_real(&mut self.scratch, value);
        let n_coord = encode_coordinate(&mut self.scratch, value);
        let n_zto = encode_zero_to_one(&mut self.scratch, value);

        let (opcode, skip, len) = if n_coord < n_real && n_coord <= n_zto {
            (0xb0, n_real, n_coord)
        } else if n_zto < n_real && n_zto < n_coord {
            (0xb8, n_real + n_coord, n_zto)
        } else {
            (0xa8, 0, n_real)
        };
        self.buf.push(adj | opcode);
        self.buf.extend_from_slice(&self.scratch[skip..skip + len]);
    }

    pub fn set_lod(&mut self, lod0: f32, lod1: f32) {
        self.check_mode_styling();
        if self.error.is_some() {
            return;
        }
        self.lod0 = lod0;
        self.lod1 = lod1;
        self.buf.push(0xc7);
        encode_real(&mut self.buf, lod0);
        encode_real(&mut self.buf, lod1);
    }

    pub fn start_path(&mut self, adj: u8, x: f32, y: f32) {
        self.check_mode_styling();
        if self.error.is_some() {
            return;
        }
        if adj > 6 {
            self.error = Some(IconVgError::InvalidSelectorAdjustment);
            return;
        }
        self.high_res = self.high_resolution_coordinates;
        self.buf.push(0xc0 + adj);
        let x = self.quantize(x);
        encode_coordinate(&mut self.buf, x);
        let y = self.quantize(y);
        encode_coordinate(&mut self.buf, y);
        self.mode = Mode::Drawing;
    }

    pub fn abs_h_line_to(&mut self, x: f32) {
        self.draw(b'H', &[x]);
    }

    pub fn rel_h_line_to(&mut self, x: f32) {
        self.draw(b'h', &[x]);
    }

    pub fn abs_v_line_to(&mut self, y: f32) {
        self.draw(b'V', &[y]);
    }

    pub fn rel_v_line_to(&mut self, y: f32) {
        self.draw(b'v', &[y]);
    }

    pub fn abs_line_to(&mut self, x: f32, y: f32) {
        self.draw(b'L', &[x, y]);
    }

    pub fn rel_line_to(&mut self, x: f32, y: f32) {
        self.draw(b'l', &[x, y]);
    }

    pub fn abs_smooth_quad_to(&mut self, x: f32, y: f32) {
        self.draw(b'T', &[x, y]);
    }

    pub fn rel_smooth_quad_to(&mut self, x: f32, y: f32) {
        self.draw(b't', &[x, y]);
    }

    pub fn abs_quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.draw(b'Q', &[x1, y1, x, y]);
    }

    pub fn rel_quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.draw(b'q', &[x1, y1, x, y]);
    }

    pub fn abs_smooth_cube_to(&mut self, x2: f32, y2: f32, x: f32, y: f32) {
        self.draw(b'S', &[x2, y2, x, y]);
    }

    pub fn rel_smooth_cube_to(&mut self, x2: f32, y2: f32, x: f32, y: f32) {
        self.draw(b's', &[x2, y2, x, y]);
    }

    pub fn abs_cube_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.draw(b'C', &[x1, y1, x2, y2, x, y]);
    }

    pub fn rel_cube_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.draw(b'c', &[x1, y1, x2, y2, x, y]);
    }

    pub fn close_path_end_path(&mut self) {
        self.draw(b'Z', &[]);
    }

    pub fn close_path_abs_move_to(&mut self, x: f32, y: f32) {
        self.draw(b'Y', &[x, y]);
    }

    pub fn close_path_rel_move_to(&mut self, x: f32, y: f32) {
        self.draw(b'y', &[x, y]);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn abs_arc_to(
        &mut self,
        rx: f32,
        ry: f32,
        x_axis_rotation: f32,
        large_arc: bool,
        sweep: bool,
        x: f32,
        y: f32,
    ) {
        self.arc_to(b'A', rx, ry, x_axis_rotation, large_arc, sweep, x, y);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rel_arc_to(
        &mut self,
        rx: f32,
        ry: f32,
        x_axis_rotation: f32,
        large_arc: bool,
        sweep: bool,
        x: f32,
        y: f32,
    ) {
        self.arc_to(b'a', rx, ry, x_axis_rotation, large_arc, sweep, x, y);
    }

    #[allow(clippy::too_many_arguments)]
    fn arc_to(
        &mut self,
        op: u8,
        rx: f32,
        ry: f32,
        x_axis_rotation: f32,
        large_arc: bool,
        sweep: bool,
        x: f32,
        y: f32,
    ) {
        let flags = (large_arc as u32 | (sweep as u32) << 1) as f32;
        self.draw(op, &[rx, ry, x_axis_rotation, flags, x, y]);
    }

    fn draw(&mut self, op: u8, args: &[f32]) {
        if self.error.is_some() {
            return;
        }
        if self.mode != Mode::Drawing {
            self.error = Some(IconVgError::DrawingOpsInStylingMode);
            return;
        }
        if self.draw_op != op {
            self.flush_draw_ops();
        }
        self.draw_op = op;
        self.draw_args.extend_from_slice(args);

        match op {
            b'Z' => {
                self.mode = Mode::Styling;
                self.flush_draw_ops();
            }
            b'Y' | b'y' => self.flush_draw_ops(),
            _ => {}
        }
    }

    /// Emits the batched draw ops, packing consecutive identical ops into
    /// maximal repeat counts.
    fn flush_draw_ops(&mut self) {
        if self.draw_op == 0x00 {
            return;
        }

        let (opcode_base, max_reps, n_args) = draw_op_info(self.draw_op);
        if n_args == 0 {
            self.buf.push(opcode_base);
        } else {
            let args = std::mem::take(&mut self.draw_args);
            let mut records = args.chunks_exact(n_args);
            let mut remaining = args.len() / n_args;
            while remaining > 0 {
                let reps = remaining.min(max_reps as usize);
                self.buf.push(opcode_base + reps as u8 - 1);
                for record in records.by_ref().take(reps) {
                    match self.draw_op {
                        b'A' | b'a' => {
                            let rx = self.quantize(record[0]);
                            encode_coordinate(&mut self.buf, rx);
                            let ry = self.quantize(record[1]);
                            encode_coordinate(&mut self.buf, ry);
                            encode_zero_to_one(&mut self.buf, record[2]);
                            encode_natural(&mut self.buf, record[3] as u32);
                            let x = self.quantize(record[4]);
                            encode_coordinate(&mut self.buf, x);
                            let y = self.quantize(record[5]);
                            encode_coordinate(&mut self.buf, y);
                        }
                        _ => {
                            for &arg in record {
                                let arg = self.quantize(arg);
                                encode_coordinate(&mut self.buf, arg);
                            }
                        }
                    }
                }
                remaining -= reps;
            }
            self.draw_args = args;
        }

        self.draw_op = 0x00;
        self.draw_args.clear();
    }

    /// In low-resolution mode, coordinates in [-128, +128) snap to the
    /// nearest 1/64th of a unit before encoding.
    fn quantize(&self, coord: f32) -> f32 {
        if !self.high_res && (-128.0..128.0).contains(&coord) {
            let x = ((coord * 64.0 + 0.5) as f64).floor();
            return x as f32 / 64.0;
        }
        coord
    }

    /// Emits the styling ops that define a gradient and leaves its
    /// descriptor in CREG[CSEL], ready for the next [`Encoder::start_path`].
    ///
    /// The stop colors occupy CREG[c_base + 0], CREG[c_base + 1], and so
    /// on; the stop offsets occupy NREG[n_base ...]; the six affine
    /// coefficients mapping graphic space to gradient space occupy
    /// NREG[n_base - 6] to NREG[n_base - 1].
    pub fn set_gradient(
        &mut self,
        c_base: u8,
        n_base: u8,
        radial: bool,
        transform: [f32; 6],
        spread: GradientSpread,
        stops: &[GradientStop],
    ) {
        self.check_mode_styling();
        if self.error.is_some() {
            return;
        }
        if c_base > 0x3f || n_base > 0x3f || stops.is_empty() || stops.len() > 62 {
            self.error = Some(IconVgError::InvalidGradient);
            return;
        }
        let mut previous_offset = -1.0f32;
        for stop in stops {
            let valid = stop.offset.is_finite()
                && (0.0..=1.0).contains(&stop.offset)
                && stop.offset > previous_offset
                && stop.color.is_premultiplied();
            if !valid {
                self.error = Some(IconVgError::InvalidGradient);
                return;
            }
            previous_offset = stop.offset;
        }

        self.set_csel(c_base);
        self.set_nsel(n_base);
        for (i, &coefficient) in transform.iter().enumerate() {
            self.set_nreg(6 - i as u8, false, coefficient);
        }
        for stop in stops {
            self.set_creg(0, true, Color::Rgba(stop.color));
            self.set_nreg(0, true, stop.offset);
        }

        let descriptor = Rgba::new(
            stops.len() as u8,
            (spread as u8) << 6 | c_base,
            0x80 | (radial as u8) << 6 | n_base,
            0x00,
        );
        self.set_creg(0, false, Color::Rgba(descriptor));
    }

    /// A linear gradient from (x1, y1) to (x2, y2).
    #[allow(clippy::too_many_arguments)]
    pub fn set_linear_gradient(
        &mut self,
        c_base: u8,
        n_base: u8,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        spread: GradientSpread,
        stops: &[GradientStop],
    ) {
        let (dx, dy) = (x2 - x1, y2 - y1);
        let d = dx * dx + dy * dy;
        if !d.is_finite() || d == 0.0 {
            self.error = Some(IconVgError::InvalidGradient);
            return;
        }
        let a = dx / d;
        let b = dy / d;
        let transform = [a, b, -a * x1 - b * y1, 0.0, 0.0, 0.0];
        self.set_gradient(c_base, n_base, false, transform, spread, stops);
    }

    /// A circular gradient centered on (cx, cy) whose radius vector
    /// (rx, ry) puts (cx+rx, cy+ry) on the circle.
    #[allow(clippy::too_many_arguments)]
    pub fn set_circular_gradient(
        &mut self,
        c_base: u8,
        n_base: u8,
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
        spread: GradientSpread,
        stops: &[GradientStop],
    ) {
        let r = (rx * rx + ry * ry).sqrt();
        if !r.is_finite() || r == 0.0 {
            self.error = Some(IconVgError::InvalidGradient);
            return;
        }
        let transform = [1.0 / r, 0.0, -cx / r, 0.0, 1.0 / r, -cy / r];
        self.set_gradient(c_base, n_base, true, transform, spread, stops);
    }

    /// An elliptical gradient centered on (cx, cy) whose axis vectors
    /// (rx, ry) and (sx, sy) put (cx+rx, cy+ry) and (cx+sx, cy+sy) on the
    /// ellipse.
    #[allow(clippy::too_many_arguments)]
    pub fn set_elliptical_gradient(
        &mut self,
        c_base: u8,
        n_base: u8,
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
        sx: f32,
        sy: f32,
        spread: GradientSpread,
        stops: &[GradientStop],
    ) {
        let det = rx * sy - sx * ry;
        if !det.is_finite() || det == 0.0 {
            self.error = Some(IconVgError::InvalidGradient);
            return;
        }
        let a = sy / det;
        let b = -sx / det;
        let d = -ry / det;
        let e = rx / det;
        let transform = [a, b, -a * cx - b * cy, d, e, -d * cx - e * cy];
        self.set_gradient(c_base, n_base, true, transform, spread, stops);
    }
}

impl Destination for Encoder {
    fn reset(&mut self, metadata: &Metadata) {
        Encoder::reset(self, *metadata);
    }

    fn set_csel(&mut self, csel: u8) {
        Encoder::set_csel(self, csel);
    }

    fn set_nsel(&mut self, nsel: u8) {
        Encoder::set_nsel(self, nsel);
    }

    fn set_creg(&mut self, adj: u8, incr: bool, color: Color) {
        Encoder::set_creg(self, adj, incr, color);
    }

    fn set_nreg(&mut self, adj: u8, incr: bool, value: f32) {
        Encoder::set_nreg(self, adj, incr, value);
    }

    fn set_lod(&mut self, lod0: f32, lod1: f32) {
        Encoder::set_lod(self, lod0, lod1);
    }

    fn start_path(&mut self, adj: u8, x: f32, y: f32) {
        Encoder::start_path(self, adj, x, y);
    }

    fn close_path_end_path(&mut self) {
        Encoder::close_path_end_path(self);
    }

    fn close_path_abs_move_to(&mut self, x: f32, y: f32) {
        Encoder::close_path_abs_move_to(self, x, y);
    }

    fn close_path_rel_move_to(&mut self, x: f32, y: f32) {
        Encoder::close_path_rel_move_to(self, x, y);
    }

    fn abs_h_line_to(&mut self, x: f32) {
        Encoder::abs_h_line_to(self, x);
    }

    fn rel_h_line_to(&mut self, x: f32) {
        Encoder::rel_h_line_to(self, x);
    }

    fn abs_v_line_to(&mut self, y: f32) {
        Encoder::abs_v_line_to(self, y);
    }

    fn rel_v_line_to(&mut self, y: f32) {
        Encoder::rel_v_line_to(self, y);
    }

    fn abs_line_to(&mut self, x: f32, y: f32) {
        Encoder::abs_line_to(self, x, y);
    }

    fn rel_line_to(&mut self, x: f32, y: f32) {
        Encoder::rel_line_to(self, x, y);
    }

    fn abs_smooth_quad_to(&mut self, x: f32, y: f32) {
        Encoder::abs_smooth_quad_to(self, x, y);
    }

    fn rel_smooth_quad_to(&mut self, x: f32, y: f32) {
        Encoder::rel_smooth_quad_to(self, x, y);
    }

    fn abs_quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        Encoder::abs_quad_to(self, x1, y1, x, y);
    }

    fn rel_quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        Encoder::rel_quad_to(self, x1, y1, x, y);
    }

    fn abs_smooth_cube_to(&mut self, x2: f32, y2: f32, x: f32, y: f32) {
        Encoder::abs_smooth_cube_to(self, x2, y2, x, y);
    }

    fn rel_smooth_cube_to(&mut self, x2: f32, y2: f32, x: f32, y: f32) {
        Encoder::rel_smooth_cube_to(self, x2, y2, x, y);
    }

    fn abs_cube_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        Encoder::abs_cube_to(self, x1, y1, x2, y2, x, y);
    }

    fn rel_cube_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        Encoder::rel_cube_to(self, x1, y1, x2, y2, x, y);
    }

    fn abs_arc_to(
        &mut self,
        rx: f32,
        ry: f32,
        x_axis_rotation: f32,
        large_arc: bool,
        sweep: bool,
        x: f32,
        y: f32,
    ) {
        Encoder::abs_arc_to(self, rx, ry, x_axis_rotation, large_arc, sweep, x, y);
    }

    fn rel_arc_to(
        &mut self,
        rx: f32,
        ry: f32,
        x_axis_rotation: f32,
        large_arc: bool,
        sweep: bool,
        x: f32,
        y: f32,
    ) {
        Encoder::rel_arc_to(self, rx, ry, x_axis_rotation, large_arc, sweep, x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_encoder_emits_default_metadata() {
        let mut e = Encoder::new();
        assert_eq!(e.bytes().unwrap(), &[0x89, 0x49, 0x56, 0x47, 0x00]);
    }

    #[test]
    fn styling_ops_in_drawing_mode_fail() {
        let mut e = Encoder::new();
        e.start_path(0, 0.0, 0.0);
        e.set_csel(1);
        assert_eq!(e.bytes(), Err(IconVgError::StylingOpsInDrawingMode));
    }

    #[test]
    fn drawing_ops_in_styling_mode_fail() {
        let mut e = Encoder::new();
        e.abs_line_to(1.0, 2.0);
        assert_eq!(e.bytes(), Err(IconVgError::DrawingOpsInStylingMode));
    }

    #[test]
    fn invalid_adjustments_fail() {
        let mut e = Encoder::new();
        e.set_creg(7, false, Color::Rgba(Rgba::OPAQUE_BLACK));
        assert_eq!(e.bytes(), Err(IconVgError::InvalidSelectorAdjustment));

        let mut e = Encoder::new();
        e.set_nreg(3, true, 0.0);
        assert_eq!(e.bytes(), Err(IconVgError::InvalidIncrementingAdjustment));
    }

    #[test]
    fn line_batches_split_at_the_maximum_repeat_count() {
        let mut e = Encoder::new();
        e.start_path(0, 0.0, 0.0);
        for i in 0..40 {
            e.abs_line_to(i as f32, 0.0);
        }
        e.close_path_end_path();
        let bytes = e.bytes().unwrap().to_vec();

        // 32 reps, then 8 reps: opcodes 0x1f and 0x07.
        let tail = &bytes[5..];
        assert_eq!(tail[0], 0xc0);
        assert_eq!(tail[3], 0x1f);
        let after_first_batch = 3 + 1 + 32 * 2;
        assert_eq!(tail[after_first_batch], 0x07);
    }

    #[test]
    fn nreg_prefers_the_real_encoding_on_ties() {
        let mut e = Encoder::new();
        e.set_nreg(0, false, 7.0);
        // Real 7 and coordinate 7 both fit in one byte; the real form wins.
        assert_eq!(&e.bytes().unwrap()[5..], &[0xa8, 0x0e]);

        let mut e = Encoder::new();
        e.set_nreg(0, false, -7.0);
        // Only the coordinate form stays short for negative integers.
        assert_eq!(&e.bytes().unwrap()[5..], &[0xb0, 0x72]);
    }

    #[test]
    fn quantization_only_applies_at_low_resolution() {
        let mut e = Encoder::new();
        e.start_path(0, -11.05, 0.0);
        let lores = e.bytes().unwrap().to_vec();
        // floor(-11.05 * 64 + 0.5) / 64 = -11.046875, a 2 byte coordinate.
        assert_eq!(&lores[5..], &[0xc0, 0xf5, 0x74, 0x80]);

        let mut e = Encoder::new();
        e.high_resolution_coordinates = true;
        e.start_path(0, -11.05, 0.0);
        let hires = e.bytes().unwrap().to_vec();
        assert_eq!(&hires[5..], &[0xc0, 0xcf, 0xcc, 0x30, 0xc1, 0x80]);
    }
}
