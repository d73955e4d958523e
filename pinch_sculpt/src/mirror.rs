//! Render-side copy of the scene, rebuilt from engine commands.
//!
//! The engine never reads this back.  The visualizer draws whatever the
//! mirror holds at the end of each frame.

use std::collections::BTreeMap;

use glam::Vec3;
use sculpt_core::{Color, GeometryKind, ParticleId, ParticleKind, SceneCommand, SceneSink, ShapeId};
use tracing::warn;

// ════════════════════════════════════════════════════════════════════════════
// Mirrored entities
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct ShapeView {
    pub kind:     GeometryKind,
    pub color:    Color,
    pub position: Vec3,
    pub scale:    f32,
    pub rotation: Vec3,
    pub visible:  bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParticleView {
    pub kind:     ParticleKind,
    pub color:    Color,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale:    f32,
    pub opacity:  f32,
}

// ════════════════════════════════════════════════════════════════════════════
// SceneMirror
// ════════════════════════════════════════════════════════════════════════════

pub struct SceneMirror {
    pub shapes:    BTreeMap<ShapeId, ShapeView>,
    pub particles: BTreeMap<ParticleId, ParticleView>,
    pub camera:    Vec3,
    /// Flash plane opacity; `None` when hidden.
    pub flash:     Option<f32>,
}

impl SceneMirror {
    pub fn new(camera: Vec3) -> Self {
        SceneMirror {
            shapes:    BTreeMap::new(),
            particles: BTreeMap::new(),
            camera,
            flash:     None,
        }
    }

    /// Shapes to draw, back to front.
    pub fn visible_shapes(&self) -> impl Iterator<Item = (&ShapeId, &ShapeView)> {
        self.shapes.iter().filter(|(_, s)| s.visible)
    }
}

impl SceneSink for SceneMirror {
    fn submit(&mut self, command: SceneCommand) {
        match command {
            SceneCommand::AddShape { id, kind, color, position } => {
                self.shapes.insert(id, ShapeView {
                    kind,
                    color,
                    position,
                    scale:    1.0,
                    rotation: Vec3::ZERO,
                    visible:  true,
                });
            }
            SceneCommand::SetShapeTransform { id, position, scale, rotation } => {
                match self.shapes.get_mut(&id) {
                    Some(s) => { s.position = position; s.scale = scale; s.rotation = rotation; }
                    None    => warn!(id = id.0, "transform for unknown shape"),
                }
            }
            SceneCommand::SetShapeVisible { id, visible } => {
                if let Some(s) = self.shapes.get_mut(&id) { s.visible = visible; }
            }
            SceneCommand::RemoveShape(id) => { self.shapes.remove(&id); }

            SceneCommand::AddParticle { id, kind, color } => {
                self.particles.insert(id, ParticleView {
                    kind,
                    color,
                    position: Vec3::ZERO,
                    rotation: Vec3::ZERO,
                    scale:    1.0,
                    opacity:  1.0,
                });
            }
            SceneCommand::SetParticle { id, position, rotation, scale, opacity } => {
                if let Some(p) = self.particles.get_mut(&id) {
                    p.position = position;
                    p.rotation = rotation;
                    p.scale    = scale;
                    p.opacity  = opacity;
                }
            }
            SceneCommand::RemoveParticle(id) => { self.particles.remove(&id); }

            SceneCommand::SetCameraPosition(p) => self.camera = p,

            SceneCommand::ShowFlash { opacity } => self.flash = Some(opacity),
            SceneCommand::SetFlashOpacity(o)    => {
                if self.flash.is_some() { self.flash = Some(o); }
            }
            SceneCommand::HideFlash             => self.flash = None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
