use tiny_skia::{
    BlendMode, FillRule, IntRect, Paint, PathBuilder, Pixmap, PremultipliedColorU8, Transform,
};

use crate::color::{Color, Rgba};
use crate::commands::Destination;
use crate::header::Metadata;

#[derive(Debug, Copy, Clone, PartialEq)]
enum Smooth {
    None,
    Quad,
    Cube,
}

/// A [`Destination`] that draws an IconVG graphic onto a raster image.
///
/// The default value is usable, in that it has no raster image to draw
/// onto, so that decoding with it checks the encoded form for errors in
/// the byte code without painting anything. Call
/// [`Rasterizer::set_dst_image`] to choose the raster image, before
/// decoding or between decodes.
///
/// Known limitations, both inherited from the byte format's decode side
/// rather than invented here: elliptical arcs are consumed but produce no
/// geometry, and gradient fills (color registers whose alpha is zero and
/// blue is at least 128) paint nothing.
pub struct Rasterizer<'a> {
    dst: Option<&'a mut Pixmap>,
    rect: Option<IntRect>,
    blend_mode: BlendMode,

    // scale and bias transform the metadata viewBox rectangle to the
    // (0, 0) - (width, height) region rectangle.
    scale_x: f32,
    bias_x: f32,
    scale_y: f32,
    bias_y: f32,

    metadata: Metadata,

    lod0: f32,
    lod1: f32,
    csel: u8,
    nsel: u8,

    disabled: bool,
    first_start_path: bool,
    path_blend_mode: BlendMode,

    prev_smooth: Smooth,
    prev_smooth_point: (f32, f32),

    path: PathBuilder,
    pen: (f32, f32),
    // Where the current subpath began; closing a path returns the pen
    // here, which is what relative movetos after a close are relative to.
    start_point: (f32, f32),

    fill: Rgba,

    creg: [Rgba; 64],
    nreg: [f32; 64],
}

impl Default for Rasterizer<'_> {
    fn default() -> Self {
        Rasterizer {
            dst: None,
            rect: None,
            blend_mode: BlendMode::SourceOver,
            scale_x: 0.0,
            bias_x: 0.0,
            scale_y: 0.0,
            bias_y: 0.0,
            metadata: Metadata::default(),
            lod0: 0.0,
            lod1: f32::INFINITY,
            csel: 0,
            nsel: 0,
            disabled: false,
            first_start_path: true,
            path_blend_mode: BlendMode::SourceOver,
            prev_smooth: Smooth::None,
            prev_smooth_point: (0.0, 0.0),
            path: PathBuilder::new(),
            pen: (0.0, 0.0),
            start_point: (0.0, 0.0),
            fill: Rgba::OPAQUE_BLACK,
            creg: [Rgba::OPAQUE_BLACK; 64],
            nreg: [0.0; 64],
        }
    }
}

impl<'a> Rasterizer<'a> {
    pub fn new() -> Rasterizer<'a> {
        Rasterizer::default()
    }

    /// Directs drawing onto the region `rect` of `dst` with the given
    /// compositing mode.
    ///
    /// The graphic, which has no fixed size in pixels, is scaled to fit
    /// the region; the scaling factors may differ between the two axes.
    pub fn set_dst_image(&mut self, dst: &'a mut Pixmap, rect: IntRect, blend_mode: BlendMode) {
        self.dst = Some(dst);
        self.rect = Some(rect);
        self.blend_mode = blend_mode;
        self.recalc_transform();
    }

    fn width(&self) -> f32 {
        self.rect.map_or(0.0, |r| r.width() as f32)
    }

    fn height(&self) -> f32 {
        self.rect.map_or(0.0, |r| r.height() as f32)
    }

    fn recalc_transform(&mut self) {
        self.scale_x = self.width() / self.metadata.view_box.width();
        self.bias_x = -self.metadata.view_box.min_x;
        self.scale_y = self.height() / self.metadata.view_box.height();
        self.bias_y = -self.metadata.view_box.min_y;
    }

    fn abs_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.scale_x * (x + self.bias_x),
            self.scale_y * (y + self.bias_y),
        )
    }

    fn rel_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.pen.0 + self.scale_x * x,
            self.pen.1 + self.scale_y * y,
        )
    }

    /// The implicit first control point of a smooth curve: the reflection
    /// of the previous curve's last control point about the pen, when the
    /// preceding op was of the same smooth family, and the pen itself
    /// otherwise.
    fn implicit_smooth_point(&self, this: Smooth) -> (f32, f32) {
        if self.prev_smooth != this {
            return self.pen;
        }
        (
            2.0 * self.pen.0 - self.prev_smooth_point.0,
            2.0 * self.pen.1 - self.prev_smooth_point.1,
        )
    }

    fn move_to(&mut self, p: (f32, f32)) {
        self.path.move_to(p.0, p.1);
        self.pen = p;
        self.start_point = p;
    }

    fn line_to(&mut self, p: (f32, f32)) {
        self.path.line_to(p.0, p.1);
        self.pen = p;
    }

    fn quad_to(&mut self, p1: (f32, f32), p: (f32, f32)) {
        self.path.quad_to(p1.0, p1.1, p.0, p.1);
        self.pen = p;
    }

    fn cube_to(&mut self, p1: (f32, f32), p2: (f32, f32), p: (f32, f32)) {
        self.path.cubic_to(p1.0, p1.1, p2.0, p2.1, p.0, p.1);
        self.pen = p;
    }

    fn close_path(&mut self) {
        self.path.close();
        self.pen = self.start_point;
    }

    fn fill_path(&mut self) {
        let builder = std::mem::replace(&mut self.path, PathBuilder::new());
        let (Some(dst), Some(rect)) = (self.dst.as_deref_mut(), self.rect) else {
            return;
        };
        let Some(path) = builder.finish() else {
            return;
        };

        // The disabled check has already ruled out gradients and
        // non-premultiplied colors.
        let premultiplied =
            PremultipliedColorU8::from_rgba(self.fill.r, self.fill.g, self.fill.b, self.fill.a);
        let Some(premultiplied) = premultiplied else {
            return;
        };
        let c = premultiplied.demultiply();

        let mut paint = Paint::default();
        paint.set_color_rgba8(c.red(), c.green(), c.blue(), c.alpha());
        paint.anti_alias = true;
        paint.blend_mode = self.path_blend_mode;

        let transform = Transform::from_translate(rect.x() as f32, rect.y() as f32);
        dst.fill_path(&path, &paint, FillRule::Winding, transform, None);
    }
}

impl Destination for Rasterizer<'_> {
    fn reset(&mut self, metadata: &Metadata) {
        self.metadata = *metadata;
        self.lod0 = 0.0;
        self.lod1 = f32::INFINITY;
        self.csel = 0;
        self.nsel = 0;
        self.disabled = false;
        self.first_start_path = true;
        self.prev_smooth = Smooth::None;
        self.prev_smooth_point = (0.0, 0.0);
        self.path = PathBuilder::new();
        self.pen = (0.0, 0.0);
        self.start_point = (0.0, 0.0);
        self.creg = metadata.palette;
        self.nreg = [0.0; 64];
        self.recalc_transform();
    }

    fn set_csel(&mut self, csel: u8) {
        self.csel = csel & 0x3f;
    }

    fn set_nsel(&mut self, nsel: u8) {
        self.nsel = nsel & 0x3f;
    }

    fn set_creg(&mut self, adj: u8, incr: bool, color: Color) {
        let resolved = color.resolve(&self.metadata.palette, &self.creg);
        self.creg[(self.csel.wrapping_sub(adj) & 0x3f) as usize] = resolved;
        if incr {
            self.csel = self.csel.wrapping_add(1) & 0x3f;
        }
    }

    fn set_nreg(&mut self, adj: u8, incr: bool, value: f32) {
        self.nreg[(self.nsel.wrapping_sub(adj) & 0x3f) as usize] = value;
        if incr {
            self.nsel = self.nsel.wrapping_add(1) & 0x3f;
        }
    }

    fn set_lod(&mut self, lod0: f32, lod1: f32) {
        self.lod0 = lod0;
        self.lod1 = lod1;
    }

    fn start_path(&mut self, adj: u8, x: f32, y: f32) {
        self.fill = self.creg[(self.csel.wrapping_sub(adj) & 0x3f) as usize];

        let h = self.height();
        let lod_visible = self.lod0 <= h && h < self.lod1;
        let paintable = self.fill.a != 0 && self.fill.is_premultiplied();
        self.disabled = !paintable || !lod_visible;
        if self.disabled {
            if !paintable && lod_visible {
                tracing::debug!(
                    fill = ?self.fill,
                    gradient = self.fill.is_gradient(),
                    "skipping fill that is not a paintable flat color"
                );
            }
            return;
        }

        self.path = PathBuilder::new();
        self.path_blend_mode = if self.first_start_path {
            self.first_start_path = false;
            self.blend_mode
        } else {
            BlendMode::SourceOver
        };
        self.prev_smooth = Smooth::None;
        let p = self.abs_point(x, y);
        self.move_to(p);
    }

    fn close_path_end_path(&mut self) {
        if self.disabled {
            return;
        }
        self.close_path();
        self.fill_path();
    }

    fn close_path_abs_move_to(&mut self, x: f32, y: f32) {
        if self.disabled {
            return;
        }
        self.prev_smooth = Smooth::None;
        self.close_path();
        let p = self.abs_point(x, y);
        self.move_to(p);
    }

    fn close_path_rel_move_to(&mut self, x: f32, y: f32) {
        if self.disabled {
            return;
        }
        self.prev_smooth = Smooth::None;
        self.close_path();
        let p = self.rel_point(x, y);
        self.move_to(p);
    }

    fn abs_h_line_to(&mut self, x: f32) {
        if self.disabled {
            return;
        }
        self.prev_smooth = Smooth::None;
        let p = (self.scale_x * (x + self.bias_x), self.pen.1);
        self.line_to(p);
    }

    fn rel_h_line_to(&mut self, x: f32) {
        if self.disabled {
            return;
        }
        self.prev_smooth = Smooth::None;
        let p = (self.pen.0 + self.scale_x * x, self.pen.1);
        self.line_to(p);
    }

    fn abs_v_line_to(&mut self, y: f32) {
        if self.disabled {
            return;
        }
        self.prev_smooth = Smooth::None;
        let p = (self.pen.0, self.scale_y * (y + self.bias_y));
        self.line_to(p);
    }

    fn rel_v_line_to(&mut self, y: f32) {
        if self.disabled {
            return;
        }
        self.prev_smooth = Smooth::None;
        let p = (self.pen.0, self.pen.1 + self.scale_y * y);
        self.line_to(p);
    }

    fn abs_line_to(&mut self, x: f32, y: f32) {
        if self.disabled {
            return;
        }
        self.prev_smooth = Smooth::None;
        let p = self.abs_point(x, y);
        self.line_to(p);
    }

    fn rel_line_to(&mut self, x: f32, y: f32) {
        if self.disabled {
            return;
        }
        self.prev_smooth = Smooth::None;
        let p = self.rel_point(x, y);
        self.line_to(p);
    }

    fn abs_smooth_quad_to(&mut self, x: f32, y: f32) {
        if self.disabled {
            return;
        }
        self.prev_smooth_point = self.implicit_smooth_point(Smooth::Quad);
        self.prev_smooth = Smooth::Quad;
        let p = self.abs_point(x, y);
        self.quad_to(self.prev_smooth_point, p);
    }

    fn rel_smooth_quad_to(&mut self, x: f32, y: f32) {
        if self.disabled {
            return;
        }
        self.prev_smooth_point = self.implicit_smooth_point(Smooth::Quad);
        self.prev_smooth = Smooth::Quad;
        let p = self.rel_point(x, y);
        self.quad_to(self.prev_smooth_point, p);
    }

    fn abs_quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        if self.disabled {
            return;
        }
        self.prev_smooth = Smooth::Quad;
        self.prev_smooth_point = self.abs_point(x1, y1);
        let p = self.abs_point(x, y);
        self.quad_to(self.prev_smooth_point, p);
    }

    fn rel_quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        if self.disabled {
            return;
        }
        self.prev_smooth = Smooth::Quad;
        self.prev_smooth_point = self.rel_point(x1, y1);
        let p = self.rel_point(x, y);
        self.quad_to(self.prev_smooth_point, p);
    }

    fn abs_smooth_cube_to(&mut self, x2: f32, y2: f32, x: f32, y: f32) {
        if self.disabled {
            return;
        }
        let p1 = self.implicit_smooth_point(Smooth::Cube);
        self.prev_smooth = Smooth::Cube;
        self.prev_smooth_point = self.abs_point(x2, y2);
        let p = self.abs_point(x, y);
        self.cube_to(p1, self.prev_smooth_point, p);
    }

    fn rel_smooth_cube_to(&mut self, x2: f32, y2: f32, x: f32, y: f32) {
        if self.disabled {
            return;
        }
        let p1 = self.implicit_smooth_point(Smooth::Cube);
        self.prev_smooth = Smooth::Cube;
        self.prev_smooth_point = self.rel_point(x2, y2);
        let p = self.rel_point(x, y);
        self.cube_to(p1, self.prev_smooth_point, p);
    }

    fn abs_cube_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        if self.disabled {
            return;
        }
        self.prev_smooth = Smooth::Cube;
        self.prev_smooth_point = self.abs_point(x2, y2);
        let p1 = self.abs_point(x1, y1);
        let p = self.abs_point(x, y);
        self.cube_to(p1, self.prev_smooth_point, p);
    }

    fn rel_cube_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        if self.disabled {
            return;
        }
        self.prev_smooth = Smooth::Cube;
        self.prev_smooth_point = self.rel_point(x2, y2);
        let p1 = self.rel_point(x1, y1);
        let p = self.rel_point(x, y);
        self.cube_to(p1, self.prev_smooth_point, p);
    }

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
        if self.disabled {
            return;
        }
        // Elliptical arcs are consumed for stream consistency but produce
        // no geometry.
        self.prev_smooth = Smooth::None;
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
        if self.disabled {
            return;
        }
        self.prev_smooth = Smooth::None;
    }
}
