//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                                                              │
//! │        shapes / particles, seen from the (shaking) camera    │
//! │        fingertip markers over the hands                      │
//! │                                                              │
//! ├──────────────────────────────────────────────────────────────┤
//! │  status bar                                       key legend │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The view area stands in for the camera feed: normalized hand
//! coordinates map onto it edge to edge, so the pointer, the fingertip
//! markers and the shapes all line up.

use std::sync::mpsc::Sender;
use std::time::Duration;

use glam::{Vec2, Vec3};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use sculpt_core::geometry::project_to_view;
use sculpt_core::landmark::fingertip_markers;
use sculpt_core::{GeometryKind, HandFrame, ParticleKind};

use crate::mirror::{ParticleView, SceneMirror, ShapeView};
use crate::source::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:       usize = 960;
pub const WIN_H:       usize = 640;
const STATUS_H:        usize = 36;
pub const VIEW_H:      usize = WIN_H - STATUS_H;
const STATUS_Y:        usize = VIEW_H;
const BG_COLOR:        u32   = 0xFF1A1A2E;
const TEXT_BG:         u32   = 0xFF0F3460;
const OUTLINE_COLOR:   u32   = 0xFF000000;
const THUMB_COLOR:     u32   = 0xFFFFD700;
const INDEX_COLOR:     u32   = 0xFF00E5FF;
const MIDDLE_COLOR:    u32   = 0xFFFF66CC;
const BUSY_COLOR:      u32   = 0xFFFF3300;

/// Half-extent of a unit-scale shape, view units.
const SHAPE_RADIUS:    f32   = 0.5;
/// Half-extent of a unit-scale particle, view units.
const PARTICLE_RADIUS: f32   = 0.04;
const SPREAD_STEP:     f32   = 0.004;

// ════════════════════════════════════════════════════════════════════════════
// Projection
// ════════════════════════════════════════════════════════════════════════════

/// Pinhole camera looking down −z.  Calibrated so that, from its resting
/// distance, the `view_scale`-wide square of the `z = 0` plane fills the
/// view area exactly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    fx: f32,
    fy: f32,
}

impl Projection {
    pub fn new(view_scale: f32, camera_distance: f32) -> Self {
        let half = view_scale / 2.0;
        Projection {
            fx: (WIN_W  as f32 / 2.0) * camera_distance / half,
            fy: (VIEW_H as f32 / 2.0) * camera_distance / half,
        }
    }

    /// Screen position and vertical pixels-per-unit of `p`, or `None` when
    /// it is at or behind the camera.
    pub fn project(&self, p: Vec3, camera: Vec3) -> Option<(Vec2, f32)> {
        let depth = camera.z - p.z;
        if depth <= 1e-3 {
            return None;
        }
        let screen = Vec2::new(
            WIN_W  as f32 / 2.0 + (p.x - camera.x) * self.fx / depth,
            VIEW_H as f32 / 2.0 - (p.y - camera.y) * self.fy / depth,
        );
        Some((screen, self.fy / depth))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

/// One frame's worth of overlay data besides the scene itself.
pub struct Overlay<'a> {
    pub hands:  &'a [HandFrame],
    pub status: &'a str,
    pub busy:   bool,
}

pub struct Visualizer {
    window:     Window,
    buf:        Vec<u32>,
    sim_tx:     Sender<SimInput>,
    projection: Projection,
    view_scale: f32,

    last_pointer: Option<(f32, f32)>,
    mouse_down:   bool,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>, view_scale: f32, camera_distance: f32) -> anyhow::Result<Self> {
        let mut window = Window::new(
            "Pinch Sculpt — pinch to create, snap to destroy",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
            projection: Projection::new(view_scale, camera_distance),
            view_scale,
            last_pointer: None,
            mouse_down:   false,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll mouse and keyboard and translate to [`SimInput`] events.
    /// Returns false when the user asked to quit.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let one_shot = |w: &Window, k: Key| w.is_key_pressed(k, KeyRepeat::No);
        let held     = |w: &Window, k: Key| w.is_key_pressed(k, KeyRepeat::Yes);

        if one_shot(&self.window, Key::Q) || one_shot(&self.window, Key::Escape) {
            let _ = self.sim_tx.send(SimInput::Quit);
            return false;
        }

        let mut inputs = Vec::new();
        if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Clamp) {
            let pointer = (mx / WIN_W as f32, (my / VIEW_H as f32).min(1.0));
            if self.last_pointer != Some(pointer) {
                self.last_pointer = Some(pointer);
                inputs.push(SimInput::Pointer { x: pointer.0, y: pointer.1 });
            }
        }
        let down = self.window.get_mouse_down(MouseButton::Left);
        if down != self.mouse_down {
            self.mouse_down = down;
            inputs.push(SimInput::Pinch(down));
        }

        if one_shot(&self.window, Key::Tab)  { inputs.push(SimInput::ToggleSecondHand); }
        if one_shot(&self.window, Key::S)    { inputs.push(SimInput::Snap); }
        if one_shot(&self.window, Key::H)    { inputs.push(SimInput::ToggleHidden); }
        if held(&self.window, Key::Up)       { inputs.push(SimInput::Spread( SPREAD_STEP)); }
        if held(&self.window, Key::Down)     { inputs.push(SimInput::Spread(-SPREAD_STEP)); }

        for input in inputs {
            let _ = self.sim_tx.send(input);
        }
        true
    }

    /// Render one frame.
    pub fn render(&mut self, scene: &SceneMirror, overlay: &Overlay<'_>) {
        // Clear
        self.buf.fill(BG_COLOR);

        // ── Shapes ────────────────────────────────────────────────────────
        for (_, shape) in scene.visible_shapes() {
            self.draw_shape(shape, scene.camera);
        }

        // ── Particles, far to near ────────────────────────────────────────
        let mut particles: Vec<&ParticleView> = scene.particles.values().collect();
        particles.sort_by(|a, b| a.position.z.total_cmp(&b.position.z));
        for p in particles {
            self.draw_particle(p, scene.camera);
        }

        // ── Fingertip markers ─────────────────────────────────────────────
        for tips in fingertip_markers(overlay.hands) {
            for (lm, color) in [
                (tips.thumb,  THUMB_COLOR),
                (tips.index,  INDEX_COLOR),
                (tips.middle, MIDDLE_COLOR),
            ] {
                let p = project_to_view(lm.xy(), self.view_scale);
                if let Some((s, _)) = self.projection.project(p, scene.camera) {
                    self.draw_ring(s.x, s.y, 5.0, color);
                }
            }
        }

        // ── Flash ─────────────────────────────────────────────────────────
        if let Some(opacity) = scene.flash {
            for px in self.buf[..VIEW_H * WIN_W].iter_mut() {
                *px = blend(*px, 0xFFFFFFFF, opacity);
            }
        }

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, STATUS_H, TEXT_BG);
        self.draw_label(overlay.status, 10, STATUS_Y + 8, 0xFFEEEEEE);
        if overlay.busy {
            self.fill_rect(WIN_W - 18, STATUS_Y + 8, 8, 8, BUSY_COLOR);
        }

        // ── Key legend ────────────────────────────────────────────────────
        self.draw_label(
            "mouse=move  click=pinch  tab=2nd hand  up/down=spread  s=snap  h=hide  q=quit",
            10, WIN_H - 12, 0xFF888888,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Shapes ────────────────────────────────────────────────────────────

    fn draw_shape(&mut self, shape: &ShapeView, camera: Vec3) {
        let Some((c, ppu)) = self.projection.project(shape.position, camera) else { return };
        let r = SHAPE_RADIUS * shape.scale * ppu;
        if r < 0.5 { return; }

        // Spin shows as a turning outline and a brightness pulse.
        let angle = shape.rotation.y;
        let shade = 0.75 + 0.25 * shape.rotation.x.cos();
        let color = blend(0xFF000000, shape.color.to_argb(), shade);

        match shape.kind {
            GeometryKind::Sphere => {
                self.fill_circle(c.x, c.y, r, color);
                self.draw_ring(c.x, c.y, r, OUTLINE_COLOR);
            }
            GeometryKind::Box => {
                let quad = polygon(c, r, angle, &[(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]);
                self.fill_convex(&quad, color);
            }
            GeometryKind::Cone => {
                let tri = polygon(c, r, angle, &[(0.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]);
                self.fill_convex(&tri, color);
            }
            GeometryKind::Cylinder => {
                let quad = polygon(c, r, angle, &[(-0.6, -1.0), (0.6, -1.0), (0.6, 1.0), (-0.6, 1.0)]);
                self.fill_convex(&quad, color);
            }
        }
    }

    fn draw_particle(&mut self, p: &ParticleView, camera: Vec3) {
        let Some((c, ppu)) = self.projection.project(p.position, camera) else { return };
        let r = (PARTICLE_RADIUS * p.scale * ppu).max(1.0);
        let color = blend(BG_COLOR, p.color.to_argb(), p.opacity);
        match p.kind {
            ParticleKind::Sphere => self.fill_circle(c.x, c.y, r, color),
            ParticleKind::Cube   => {
                let quad = polygon(c, r, p.rotation.z, &[(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]);
                self.fill_convex(&quad, color);
            }
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < VIEW_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    fn set_pixel_f(&mut self, x: f32, y: f32, color: u32) {
        if x >= 0.0 && y >= 0.0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    /// Clipped bounding box of a float rect, in pixel indices.
    fn clip(x0: f32, y0: f32, x1: f32, y1: f32) -> Option<(usize, usize, usize, usize)> {
        let (x0, y0) = (x0.floor().max(0.0), y0.floor().max(0.0));
        let (x1, y1) = (x1.ceil().min(WIN_W as f32 - 1.0), y1.ceil().min(VIEW_H as f32 - 1.0));
        if x0 > x1 || y0 > y1 { return None; }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: u32) {
        let Some((x0, y0, x1, y1)) = Self::clip(cx - r, cy - r, cx + r, cy + r) else { return };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
                if dx * dx + dy * dy <= r * r {
                    self.buf[y * WIN_W + x] = color;
                }
            }
        }
    }

    fn draw_ring(&mut self, cx: f32, cy: f32, r: f32, color: u32) {
        let steps = ((r * 8.0) as usize).clamp(16, 720);
        for i in 0..steps {
            let a = i as f32 / steps as f32 * std::f32::consts::TAU;
            self.set_pixel_f(cx + r * a.cos(), cy + r * a.sin(), color);
        }
    }

    /// Fill a convex polygon given in either winding order.
    fn fill_convex(&mut self, pts: &[Vec2], color: u32) {
        let (min, max) = pts.iter().fold(
            (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        );
        let Some((x0, y0, x1, y1)) = Self::clip(min.x, min.y, max.x, max.y) else { return };
        for y in y0..=y1 {
            for x in x0..=x1 {
                if inside_convex(pts, Vec2::new(x as f32 + 0.5, y as f32 + 0.5)) {
                    self.buf[y * WIN_W + x] = color;
                }
            }
        }
        for (i, a) in pts.iter().enumerate() {
            let b = pts[(i + 1) % pts.len()];
            self.draw_line(*a, b, OUTLINE_COLOR);
        }
    }

    fn draw_line(&mut self, a: Vec2, b: Vec2, color: u32) {
        let steps = (a.distance(b).ceil() as usize).max(1);
        for i in 0..=steps {
            let p = a.lerp(b, i as f32 / steps as f32);
            self.set_pixel_f(p.x, p.y, color);
        }
    }

    /// Minimal bitmap font — 3×5 characters for label rendering.
    /// Each character is encoded as 5 rows × 3 bits.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        let (px, py) = (cx + col, y + row);
                        if px < WIN_W && py < WIN_H {
                            self.buf[py * WIN_W + px] = color;
                        }
                    }
                }
            }
            cx += 4; // 3 wide + 1 gap
            if cx + 4 > WIN_W { break; }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Geometry helpers
// ────────────────────────────────────────────────────────────────────────────

/// Unit-space outline scaled by `r`, rotated by `angle`, centred on `c`.
fn polygon(c: Vec2, r: f32, angle: f32, unit: &[(f32, f32)]) -> Vec<Vec2> {
    let rot = Vec2::from_angle(angle);
    unit.iter().map(|&(x, y)| c + rot.rotate(Vec2::new(x, y) * r)).collect()
}

fn inside_convex(pts: &[Vec2], p: Vec2) -> bool {
    let mut sign = 0.0f32;
    for (i, a) in pts.iter().enumerate() {
        let b = pts[(i + 1) % pts.len()];
        let cross = (b - *a).perp_dot(p - *a);
        if cross != 0.0 {
            if sign != 0.0 && cross.signum() != sign { return false; }
            sign = cross.signum();
        }
    }
    true
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: Vec3 = Vec3::new(0.0, 0.0, 5.0);

    #[test]
    fn normalized_frame_fills_the_view() {
        let proj = Projection::new(10.0, 5.0);
        let (centre, ppu) = proj.project(Vec3::ZERO, HOME).unwrap();
        assert_eq!(centre, Vec2::new(WIN_W as f32 / 2.0, VIEW_H as f32 / 2.0));
        assert!((ppu - VIEW_H as f32 / 10.0).abs() < 1e-3);

        // Image corner (0, 0) → top-left of the view.
        let corner = project_to_view(Vec2::ZERO, 10.0);
        let (s, _) = proj.project(corner, HOME).unwrap();
        assert!(s.x.abs() < 1e-3 && s.y.abs() < 1e-3, "{:?}", s);
    }

    #[test]
    fn nearer_points_look_bigger_and_behind_is_culled() {
        let proj = Projection::new(10.0, 5.0);
        let (_, far)  = proj.project(Vec3::new(0.0, 0.0, -1.0), HOME).unwrap();
        let (_, near) = proj.project(Vec3::new(0.0, 0.0,  1.0), HOME).unwrap();
        assert!(near > far);
        assert!(proj.project(Vec3::new(0.0, 0.0, 6.0), HOME).is_none());
    }

    #[test]
    fn camera_shift_moves_scene_the_other_way() {
        let proj = Projection::new(10.0, 5.0);
        let (s, _) = proj.project(Vec3::ZERO, Vec3::new(0.1, 0.0, 5.0)).unwrap();
        assert!(s.x < WIN_W as f32 / 2.0);
    }

    #[test]
    fn convex_containment() {
        let square = polygon(Vec2::ZERO, 1.0, 0.3, &[(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]);
        assert!(inside_convex(&square, Vec2::ZERO));
        assert!(!inside_convex(&square, Vec2::new(2.0, 0.0)));
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 0.0), 0xFF000000);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 2.0), 0xFFFFFFFF);
    }
}
