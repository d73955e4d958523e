//! Shapes and the registry that owns the live ones.

use std::mem;

use glam::Vec3;
use rand::Rng;
use tracing::debug;

use crate::scene::{SceneCommand, SceneSink};

// ════════════════════════════════════════════════════════════════════════════
// Color
// ════════════════════════════════════════════════════════════════════════════

/// Linear RGB, each channel in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };

    /// From a packed `0xRRGGBB` value.
    pub fn from_hex(rgb: u32) -> Self {
        let channel = |shift: u32| ((rgb >> shift) & 0xFF) as f32 / 255.0;
        Color { r: channel(16), g: channel(8), b: channel(0) }
    }

    /// Packed `0xFFRRGGBB`, the layout software framebuffers expect.
    pub fn to_argb(self) -> u32 {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        0xFF00_0000 | (q(self.r) << 16) | (q(self.g) << 8) | q(self.b)
    }

    /// Perturb each channel by a uniform offset in `[-amount, amount)`,
    /// clamped back into range.
    pub fn jitter<R: Rng + ?Sized>(self, amount: f32, rng: &mut R) -> Self {
        let mut shift = |c: f32| {
            let delta = if amount > 0.0 { rng.gen_range(-amount..amount) } else { 0.0 };
            (c + delta).clamp(0.0, 1.0)
        };
        Color { r: shift(self.r), g: shift(self.g), b: shift(self.b) }
    }
}

/// Neon palette handed out round-robin so consecutive shapes differ.
pub const NEON_PALETTE: [u32; 8] = [
    0xFF00FF, 0x00FFFF, 0xFF3300, 0x39FF14,
    0xFF0099, 0x00FF00, 0xFF6600, 0xFFFF00,
];

// ════════════════════════════════════════════════════════════════════════════
// Shape
// ════════════════════════════════════════════════════════════════════════════

/// Stable shape identifier.  Never reused within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryKind {
    Box,
    Sphere,
    Cone,
    Cylinder,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 4] = [
        GeometryKind::Box,
        GeometryKind::Sphere,
        GeometryKind::Cone,
        GeometryKind::Cylinder,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GeometryKind::Box      => "box",
            GeometryKind::Sphere   => "sphere",
            GeometryKind::Cone     => "cone",
            GeometryKind::Cylinder => "cylinder",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub id:       ShapeId,
    pub kind:     GeometryKind,
    pub color:    Color,
    pub position: Vec3,
    /// Uniform scale; 1.0 at creation.
    pub scale:    f32,
    /// Euler angles (radians).
    pub rotation: Vec3,
    pub visible:  bool,
}

impl Shape {
    pub(crate) fn transform_command(&self) -> SceneCommand {
        SceneCommand::SetShapeTransform {
            id:       self.id,
            position: self.position,
            scale:    self.scale,
            rotation: self.rotation,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ShapeRegistry
// ════════════════════════════════════════════════════════════════════════════

/// Owns the live shapes in insertion order.
#[derive(Debug, Default)]
pub struct ShapeRegistry {
    shapes:        Vec<Shape>,
    next_id:       u64,
    palette_index: usize,
}

impl ShapeRegistry {
    pub fn new() -> Self { Self::default() }

    /// Create a shape at `position` with a random geometry kind and the next
    /// palette color, and announce it to the scene.
    pub fn create<R: Rng + ?Sized>(
        &mut self,
        position: Vec3,
        rng:      &mut R,
        scene:    &mut dyn SceneSink,
    ) -> &Shape {
        let kind  = GeometryKind::ALL[rng.gen_range(0..GeometryKind::ALL.len())];
        let color = Color::from_hex(NEON_PALETTE[self.palette_index]);
        self.palette_index = (self.palette_index + 1) % NEON_PALETTE.len();

        let id = ShapeId(self.next_id);
        self.next_id += 1;

        let shape = Shape {
            id,
            kind,
            color,
            position,
            scale:    1.0,
            rotation: Vec3::ZERO,
            visible:  true,
        };
        scene.submit(SceneCommand::AddShape { id, kind, color, position });
        debug!(id = id.0, kind = kind.name(), ?position, "shape created");

        let index = self.shapes.len();
        self.shapes.push(shape);
        &self.shapes[index]
    }

    /// Closest shape strictly within `max_radius` of `position`.
    /// Equal distances resolve to the earliest-created shape.
    pub fn find_nearest(&self, position: Vec3, max_radius: f32) -> Option<&Shape> {
        let mut best: Option<(&Shape, f32)> = None;
        for shape in &self.shapes {
            let d = shape.position.distance(position);
            if d < max_radius && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((shape, d));
            }
        }
        best.map(|(s, _)| s)
    }

    /// Remove one shape from the registry and the scene.
    pub fn remove(&mut self, id: ShapeId, scene: &mut dyn SceneSink) -> Option<Shape> {
        let index = self.shapes.iter().position(|s| s.id == id)?;
        scene.submit(SceneCommand::RemoveShape(id));
        Some(self.shapes.remove(index))
    }

    /// Swap the live collection for an empty one and hand back the old
    /// contents.  The shapes stay on screen; their new owner decides when
    /// they go.
    pub fn drain_all(&mut self) -> Vec<Shape> {
        mem::take(&mut self.shapes)
    }

    /// Ambient rotation for every shape nobody is holding.
    pub fn spin_idle(&mut self, step: f32, held: &[ShapeId], scene: &mut dyn SceneSink) {
        for shape in self.shapes.iter_mut().filter(|s| !held.contains(&s.id)) {
            shape.rotation.x += step;
            shape.rotation.y += step;
            scene.submit(shape.transform_command());
        }
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shape> { self.shapes.iter() }
    pub fn len(&self) -> usize { self.shapes.len() }
    pub fn is_empty(&self) -> bool { self.shapes.is_empty() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NullScene;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng { StdRng::seed_from_u64(11) }

    #[test]
    fn palette_is_round_robin() {
        let mut reg = ShapeRegistry::new();
        let mut rng = rng();
        let colors: Vec<Color> = (0..10)
            .map(|_| reg.create(Vec3::ZERO, &mut rng, &mut NullScene).color)
            .collect();
        assert_eq!(colors[0], Color::from_hex(0xFF00FF));
        assert_eq!(colors[1], Color::from_hex(0x00FFFF));
        assert_eq!(colors[8], colors[0]);
        assert_eq!(colors[9], colors[1]);
        for pair in colors.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn create_announces_shape() {
        let mut reg = ShapeRegistry::new();
        let mut log: Vec<SceneCommand> = Vec::new();
        let id = reg.create(Vec3::new(1.0, 2.0, 0.0), &mut rng(), &mut log).id;
        assert!(matches!(
            log.as_slice(),
            [SceneCommand::AddShape { id: added, .. }] if *added == id
        ));
        let shape = reg.get(id).unwrap();
        assert_eq!(shape.scale, 1.0);
        assert!(shape.visible);
    }

    #[test]
    fn ids_are_unique() {
        let mut reg = ShapeRegistry::new();
        let mut rng = rng();
        let a = reg.create(Vec3::ZERO, &mut rng, &mut NullScene).id;
        reg.drain_all();
        let b = reg.create(Vec3::ZERO, &mut rng, &mut NullScene).id;
        assert_ne!(a, b);
    }

    #[test]
    fn find_nearest_picks_closest_in_radius() {
        let mut reg = ShapeRegistry::new();
        let mut rng = rng();
        let far  = reg.create(Vec3::new(1.0, 0.0, 0.0), &mut rng, &mut NullScene).id;
        let near = reg.create(Vec3::new(0.5, 0.0, 0.0), &mut rng, &mut NullScene).id;
        assert_eq!(reg.find_nearest(Vec3::ZERO, 1.5).map(|s| s.id), Some(near));
        reg.remove(near, &mut NullScene);
        assert_eq!(reg.find_nearest(Vec3::ZERO, 1.5).map(|s| s.id), Some(far));
    }

    #[test]
    fn find_nearest_radius_is_exclusive() {
        let mut reg = ShapeRegistry::new();
        reg.create(Vec3::new(1.5, 0.0, 0.0), &mut rng(), &mut NullScene);
        assert!(reg.find_nearest(Vec3::ZERO, 1.5).is_none());
        assert!(ShapeRegistry::new().find_nearest(Vec3::ZERO, 1.5).is_none());
    }

    #[test]
    fn find_nearest_tie_goes_to_first() {
        let mut reg = ShapeRegistry::new();
        let mut rng = rng();
        let first = reg.create(Vec3::new(-1.0, 0.0, 0.0), &mut rng, &mut NullScene).id;
        reg.create(Vec3::new(1.0, 0.0, 0.0), &mut rng, &mut NullScene);
        assert_eq!(reg.find_nearest(Vec3::ZERO, 1.5).map(|s| s.id), Some(first));
    }

    #[test]
    fn drain_all_empties_and_returns_in_order() {
        let mut reg = ShapeRegistry::new();
        let mut rng = rng();
        let ids: Vec<ShapeId> = (0..3)
            .map(|i| reg.create(Vec3::splat(i as f32), &mut rng, &mut NullScene).id)
            .collect();
        let drained = reg.drain_all();
        assert!(reg.is_empty());
        assert_eq!(drained.iter().map(|s| s.id).collect::<Vec<_>>(), ids);

        let fresh = reg.create(Vec3::ZERO, &mut rng, &mut NullScene).id;
        assert_eq!(reg.len(), 1);
        assert!(!ids.contains(&fresh));
    }

    #[test]
    fn spin_idle_skips_held_shapes() {
        let mut reg = ShapeRegistry::new();
        let mut rng = rng();
        let held = reg.create(Vec3::ZERO, &mut rng, &mut NullScene).id;
        let free = reg.create(Vec3::ONE, &mut rng, &mut NullScene).id;
        let mut log: Vec<SceneCommand> = Vec::new();
        reg.spin_idle(0.01, &[held], &mut log);
        assert_eq!(reg.get(held).unwrap().rotation, Vec3::ZERO);
        assert_eq!(reg.get(free).unwrap().rotation, Vec3::new(0.01, 0.01, 0.0));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn jitter_stays_in_range() {
        let mut rng = rng();
        let base = Color::from_hex(0xFF0000);
        for _ in 0..200 {
            let c = base.jitter(0.1, &mut rng);
            assert!(c.r >= 0.9 && c.r <= 1.0);
            assert!(c.g >= 0.0 && c.g < 0.1);
        }
    }

    #[test]
    fn argb_round_trip() {
        assert_eq!(Color::from_hex(0x39FF14).to_argb(), 0xFF39FF14);
    }
}
