//! Output boundary towards the rendering collaborator.
//!
//! The engine only ever *tells* the renderer what changed.  Renderers keep
//! their own mirror of the scene built from these commands.

use glam::Vec3;

use crate::disintegration::{Particle, ParticleKind};
use crate::shape::{Color, GeometryKind, ShapeId};

/// Identifies one particle for the lifetime of its burst.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId {
    /// The shape whose burst spawned the particle.
    pub burst: ShapeId,
    pub index: u32,
}

/// One imperative mutation of the rendered scene.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneCommand {
    AddShape {
        id:       ShapeId,
        kind:     GeometryKind,
        color:    Color,
        position: Vec3,
    },
    SetShapeTransform {
        id:       ShapeId,
        position: Vec3,
        scale:    f32,
        rotation: Vec3,
    },
    SetShapeVisible { id: ShapeId, visible: bool },
    RemoveShape(ShapeId),

    AddParticle {
        id:    ParticleId,
        kind:  ParticleKind,
        color: Color,
    },
    /// Full particle transform plus its current opacity.
    SetParticle {
        id:       ParticleId,
        position: Vec3,
        rotation: Vec3,
        scale:    f32,
        opacity:  f32,
    },
    RemoveParticle(ParticleId),

    SetCameraPosition(Vec3),

    /// Full-bleed flash plane.
    ShowFlash { opacity: f32 },
    SetFlashOpacity(f32),
    HideFlash,
}

impl SceneCommand {
    pub(crate) fn particle(id: ParticleId, p: &Particle) -> Self {
        SceneCommand::SetParticle {
            id,
            position: p.position,
            rotation: p.rotation,
            scale:    p.scale,
            opacity:  p.opacity,
        }
    }
}

/// Anything that accepts scene commands.
pub trait SceneSink {
    fn submit(&mut self, command: SceneCommand);
}

/// Recording sink, used by tests and by callers that batch commands.
impl SceneSink for Vec<SceneCommand> {
    fn submit(&mut self, command: SceneCommand) {
        self.push(command);
    }
}

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullScene;

impl SceneSink for NullScene {
    fn submit(&mut self, _command: SceneCommand) {}
}
