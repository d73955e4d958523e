//! # sculpt_core
//!
//! Gesture-to-action interaction engine.  A stream of hand-landmark frames
//! (21 normalized keypoints per hand, 0–2 hands per frame) is turned into
//! manipulation of 3D shapes:
//!
//! | Gesture | Hands | Action |
//! |---|---|---|
//! | Pinch (thumb + index) with index tips close together | Both | Create a shape at the midpoint |
//! | Keep pinching, move hands apart / together | Both | Scale the new shape |
//! | Pinch near a shape | One | Select it and drag it with the index tip |
//! | Snap (thumb + middle) | Either | Disintegrate every shape into particles |
//!
//! Rendering is not done here.  Every visible change leaves the engine as a
//! [`SceneCommand`] pushed into a [`SceneSink`]; the engine never reads
//! render state back.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use sculpt_core::{HandFrame, SceneCommand, SculptConfig, Session};
//!
//! let mut session = Session::with_seed(SculptConfig::default(), 7)?;
//! let mut commands: Vec<SceneCommand> = Vec::new();
//!
//! // Inference callback: zero, one or two hands.
//! let hands: Vec<HandFrame> = Vec::new();
//! session.on_landmarks(&hands, Duration::from_millis(1_500), &mut commands);
//!
//! // Render tick (~60 Hz).
//! session.tick(Duration::from_millis(16), &mut commands);
//! # Ok::<(), sculpt_core::Error>(())
//! ```

pub mod config;
pub mod disintegration;
pub mod effects;
pub mod geometry;
pub mod gesture;
pub mod interaction;
pub mod landmark;
pub mod scene;
pub mod scheduler;
pub mod session;
pub mod shape;

pub use config::SculptConfig;
pub use disintegration::{DisintegrationEngine, Particle, ParticleKind, SnapOutcome};
pub use gesture::{Classification, GestureClassifier, GestureEvent};
pub use interaction::{InteractionState, InteractionStateMachine, Mode};
pub use landmark::{fingertip_markers, FingertipMarkers, HandFrame, Landmark, LANDMARK_COUNT};
pub use scene::{NullScene, ParticleId, SceneCommand, SceneSink};
pub use scheduler::{GroupId, Scheduler, TickReport, TimedTask};
pub use session::{FrameReport, Session};
pub use shape::{Color, GeometryKind, Shape, ShapeId, ShapeRegistry};

/// Result type alias for the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised at the engine's fallible boundaries.
///
/// Degenerate gesture input (no hands, no shape in reach, snap while busy)
/// is defined behavior and never surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Landmark count error: expected {expected}, got {found}")]
    LandmarkCount { expected: usize, found: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
