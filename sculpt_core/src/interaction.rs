//! Interaction state machine: creation, scaling and dragging.
//!
//! ```text
//!            both pinch                     one hand pinches near a shape
//!   Idle ───────────────► TwoHandGesture    Idle ─────────────────► SingleHandDrag
//!    ▲                          │             ▲                           │
//!    └──── not both pinching ───┘             └──── pinch released ───────┘
//! ```
//!
//! The state is a plain value owned by the caller and threaded through
//! [`InteractionStateMachine::process`] once per inference frame.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, info};

use crate::config::InteractionConfig;
use crate::geometry::project_to_view;
use crate::gesture::Classification;
use crate::landmark::HandFrame;
use crate::scene::SceneSink;
use crate::shape::{ShapeId, ShapeRegistry};

// ════════════════════════════════════════════════════════════════════════════
// InteractionState
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Idle,
    TwoHandGesture,
    SingleHandDrag,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InteractionState {
    pub mode: Mode,
    /// Shape created by the current two-hand gesture, being scaled.
    pub active_shape: Option<ShapeId>,
    /// Shape following a single pinching hand.
    pub selected_shape: Option<ShapeId>,
    /// 2D index-tip distance when the active shape was created.
    pub original_pinch_distance: Option<f32>,
    /// Session time of the most recent creation; `None` before the first.
    pub last_creation: Option<Duration>,
    pub creation_locked: bool,
}

impl InteractionState {
    /// Shapes that must not take part in ambient rotation.
    pub fn held_shapes(&self) -> Vec<ShapeId> {
        self.active_shape.into_iter().chain(self.selected_shape).collect()
    }
}

/// What one frame did to the registry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepOutcome {
    pub created: Option<ShapeId>,
    /// New uniform scale of the active shape.
    pub scaled:  Option<f32>,
    /// Shape moved under a pinching hand.
    pub dragged: Option<ShapeId>,
}

// ════════════════════════════════════════════════════════════════════════════
// InteractionStateMachine
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default)]
pub struct InteractionStateMachine {
    config: InteractionConfig,
}

impl InteractionStateMachine {
    pub fn new(config: InteractionConfig) -> Self {
        InteractionStateMachine { config }
    }

    fn cooldown_elapsed(&self, state: &InteractionState, now: Duration) -> bool {
        let cooldown = Duration::from_millis(self.config.creation_cooldown_ms);
        state.last_creation.map_or(true, |t| now.saturating_sub(t) > cooldown)
    }

    /// Apply one classified frame.
    ///
    /// `hands` must be the frames `gestures` was classified from.  Snap
    /// frames are expected to be filtered out by the caller.
    #[allow(clippy::too_many_arguments)]
    pub fn process<R: Rng + ?Sized>(
        &self,
        state:    &mut InteractionState,
        hands:    &[HandFrame],
        gestures: &Classification,
        now:      Duration,
        registry: &mut ShapeRegistry,
        rng:      &mut R,
        scene:    &mut dyn SceneSink,
    ) -> StepOutcome {
        let mut outcome = StepOutcome::default();

        // ── Two-hand gesture: create, then scale ──────────────────────────
        if let Some((center, distance, close)) = gestures.two_hand_pinch() {
            if state.mode != Mode::TwoHandGesture {
                if close && !state.creation_locked && self.cooldown_elapsed(state, now) {
                    let position = project_to_view(center, self.config.view_scale);
                    let id = registry.create(position, rng, scene).id;
                    state.active_shape            = Some(id);
                    state.original_pinch_distance = Some(distance);
                    state.creation_locked         = true;
                    state.last_creation           = Some(now);
                    outcome.created = Some(id);
                    info!(id = id.0, distance, "two-hand pinch: shape created");
                }
            } else if let (Some(id), Some(original)) =
                (state.active_shape, state.original_pinch_distance)
            {
                if original > f32::EPSILON {
                    if let Some(shape) = registry.get_mut(id) {
                        shape.scale = distance / original;
                        scene.submit(shape.transform_command());
                        outcome.scaled = Some(shape.scale);
                    }
                }
            }
            state.mode = Mode::TwoHandGesture;
            return outcome;
        }

        // ── Gesture over (or never started) ───────────────────────────────
        state.mode                    = Mode::Idle;
        state.creation_locked         = false;
        state.original_pinch_distance = None;
        state.active_shape            = None;

        // ── Single-hand drag ──────────────────────────────────────────────
        if hands.is_empty() {
            state.selected_shape = None;
        }
        for (i, hand) in hands.iter().take(2).enumerate() {
            if !gestures.is_pinching(i) {
                if let Some(id) = state.selected_shape.take() {
                    debug!(id = id.0, hand = i, "released");
                }
                continue;
            }

            let target = project_to_view(hand.index_tip().xy(), self.config.view_scale);
            if state.selected_shape.is_none() {
                state.selected_shape = registry
                    .find_nearest(target, self.config.grab_radius)
                    .map(|s| s.id);
                if let Some(id) = state.selected_shape {
                    debug!(id = id.0, hand = i, "selected");
                }
            }
            if let Some(id) = state.selected_shape {
                match registry.get_mut(id) {
                    Some(shape) => {
                        shape.position = target;
                        scene.submit(shape.transform_command());
                        outcome.dragged = Some(id);
                    }
                    // Taken by a snap since it was selected.
                    None => state.selected_shape = None,
                }
            }
        }

        if state.selected_shape.is_some() {
            state.mode = Mode::SingleHandDrag;
        }
        outcome
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
