//! Top-level engine.
//!
//! `Session` owns the registry, the interaction state, the scheduler and the
//! random source.  It has two entry points, driven by two unrelated clocks:
//!
//! * [`Session::on_landmarks`] — once per inference result, irregularly.
//! * [`Session::tick`] — once per rendered frame, ~60 Hz.
//!
//! Both run on the caller's thread; neither blocks.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::trace;

use crate::config::SculptConfig;
use crate::disintegration::{DisintegrationEngine, SnapOutcome};
use crate::effects::FeedbackEffects;
use crate::gesture::{Classification, GestureClassifier};
use crate::interaction::{InteractionState, InteractionStateMachine, StepOutcome};
use crate::landmark::HandFrame;
use crate::scene::SceneSink;
use crate::scheduler::{Scheduler, TickReport};
use crate::shape::ShapeRegistry;
use crate::Result;

/// What one inference frame did.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub gestures: Classification,
    /// Set when the frame carried a snap.
    pub snap:     Option<SnapOutcome>,
    pub step:     StepOutcome,
}

pub struct Session {
    config:         SculptConfig,
    classifier:     GestureClassifier,
    machine:        InteractionStateMachine,
    state:          InteractionState,
    registry:       ShapeRegistry,
    disintegration: DisintegrationEngine,
    effects:        FeedbackEffects,
    scheduler:      Scheduler,
    rng:            StdRng,
}

impl Session {
    /// Fails with `Error::Config` when `config` does not validate.
    pub fn new(config: SculptConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic session: same seed, same shapes and particles.
    pub fn with_seed(config: SculptConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SculptConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        Ok(Session {
            classifier:     GestureClassifier::new(config.gesture.clone()),
            machine:        InteractionStateMachine::new(config.interaction.clone()),
            state:          InteractionState::default(),
            registry:       ShapeRegistry::new(),
            disintegration: DisintegrationEngine::new(config.disintegration.clone()),
            effects:        FeedbackEffects::new(config.effects.clone()),
            scheduler:      Scheduler::new(),
            rng,
            config,
        })
    }

    // ── Inference callback ────────────────────────────────────────────────

    /// Feed one inference result.  `now` is session time, monotonic.
    ///
    /// A snap on any hand is handled first and claims the whole frame: the
    /// interaction state is left untouched until the next non-snap frame.
    pub fn on_landmarks(
        &mut self,
        hands: &[HandFrame],
        now:   Duration,
        scene: &mut dyn SceneSink,
    ) -> FrameReport {
        let gestures = self.classifier.classify(hands);
        trace!(hands = hands.len(), ?gestures, "frame");

        if gestures.is_snap() {
            let outcome = self.disintegration.trigger(
                &mut self.registry,
                &mut self.scheduler,
                &self.effects,
                &mut self.rng,
            );
            return FrameReport { gestures, snap: Some(outcome), step: StepOutcome::default() };
        }

        let step = self.machine.process(
            &mut self.state,
            hands,
            &gestures,
            now,
            &mut self.registry,
            &mut self.rng,
            scene,
        );
        FrameReport { gestures, snap: None, step }
    }

    // ── Render tick ───────────────────────────────────────────────────────

    /// Advance animations by `dt`: ambient rotation, bursts, effects.
    pub fn tick(&mut self, dt: Duration, scene: &mut dyn SceneSink) -> TickReport {
        self.registry.spin_idle(
            self.config.interaction.idle_spin,
            &self.state.held_shapes(),
            scene,
        );
        let report = self.scheduler.advance(dt, scene);
        self.disintegration.on_tick(&report);
        report
    }

    /// Abort an in-flight disintegration.  Returns false when none runs.
    pub fn cancel_disintegration(&mut self, scene: &mut dyn SceneSink) -> bool {
        self.disintegration.cancel(&mut self.scheduler, scene)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self)            -> &SculptConfig      { &self.config }
    pub fn registry(&self)          -> &ShapeRegistry     { &self.registry }
    pub fn state(&self)             -> &InteractionState  { &self.state }
    pub fn effects(&self)           -> &FeedbackEffects   { &self.effects }
    pub fn is_disintegrating(&self) -> bool               { self.disintegration.is_busy() }
    pub fn pending_tasks(&self)     -> usize              { self.scheduler.len() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Landmark, INDEX_TIP, LANDMARK_COUNT, MIDDLE_TIP, THUMB_TIP};
    use crate::scene::{NullScene, SceneCommand};
    use crate::interaction::Mode;

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    fn snapping_hand() -> HandFrame {
        let mut lm = [Landmark::new(0.5, 0.7, 0.0); LANDMARK_COUNT];
        lm[INDEX_TIP]  = Landmark::new(0.5, 0.3, 0.0);
        lm[THUMB_TIP]  = Landmark::new(0.5, 0.5, 0.0);
        lm[MIDDLE_TIP] = Landmark::new(0.51, 0.5, 0.0);
        HandFrame::from_array(lm)
    }

    fn pinching_hand(x: f32) -> HandFrame {
        let mut lm = [Landmark::new(x, 0.7, 0.0); LANDMARK_COUNT];
        lm[INDEX_TIP]  = Landmark::new(x, 0.5, 0.0);
        lm[THUMB_TIP]  = Landmark::new(x, 0.52, 0.0);
        lm[MIDDLE_TIP] = Landmark::new(x, 0.4, 0.0);
        HandFrame::from_array(lm)
    }

    #[test]
    fn snap_frame_skips_interaction() {
        let mut session = Session::with_seed(SculptConfig::default(), 1).unwrap();
        let report = session.on_landmarks(&[pinching_hand(0.47), pinching_hand(0.53)], ms(0), &mut NullScene);
        assert!(report.step.created.is_some());
        assert_eq!(session.state().mode, Mode::TwoHandGesture);

        let report = session.on_landmarks(&[snapping_hand()], ms(16), &mut NullScene);
        assert!(matches!(report.snap, Some(SnapOutcome::Started { shapes: 1, .. })));
        assert_eq!(report.step, StepOutcome::default());
        // The state machine never saw the snap frame.
        assert_eq!(session.state().mode, Mode::TwoHandGesture);
        assert!(session.is_disintegrating());
        assert!(session.registry().is_empty());
    }

    #[test]
    fn tick_spins_only_free_shapes() {
        let mut session = Session::with_seed(SculptConfig::default(), 1).unwrap();
        session.on_landmarks(&[pinching_hand(0.47), pinching_hand(0.53)], ms(0), &mut NullScene);

        let mut log: Vec<SceneCommand> = Vec::new();
        session.tick(ms(16), &mut log);
        assert!(log.is_empty(), "active shape must not spin: {:?}", log);

        session.on_landmarks(&[], ms(32), &mut NullScene);
        session.tick(ms(16), &mut log);
        assert_eq!(log.len(), 1);
        let shape = session.registry().iter().next().unwrap();
        assert!(shape.rotation.x > 0.0 && shape.rotation.y > 0.0);
    }

    #[test]
    fn same_seed_same_session() {
        let run = |seed| {
            let mut session = Session::with_seed(SculptConfig::default(), seed).unwrap();
            session.on_landmarks(&[pinching_hand(0.47), pinching_hand(0.53)], ms(0), &mut NullScene);
            let first = session.registry().iter().next().map(|s| (s.kind, s.color));
            first
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SculptConfig::default();
        config.disintegration.grow_probability = 1.5;
        assert!(matches!(Session::with_seed(config.clone(), 1), Err(crate::Error::Config(_))));
        assert!(matches!(Session::new(config), Err(crate::Error::Config(_))));
    }

    #[test]
    fn cancel_clears_busy() {
        let mut session = Session::with_seed(SculptConfig::default(), 3).unwrap();
        session.on_landmarks(&[pinching_hand(0.47), pinching_hand(0.53)], ms(0), &mut NullScene);
        session.on_landmarks(&[snapping_hand()], ms(16), &mut NullScene);
        assert!(session.cancel_disintegration(&mut NullScene));
        assert!(!session.is_disintegrating());
        assert!(!session.cancel_disintegration(&mut NullScene));
    }
}
