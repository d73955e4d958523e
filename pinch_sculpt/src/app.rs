//! Top-level application state.
//!
//! `AppState` owns the engine [`Session`], the render-side [`SceneMirror`]
//! and the most recent hands.  It feeds every [`SourceEvent`] into the
//! session and drives the visualizer each frame.

use std::sync::mpsc::{self, TryRecvError};
use std::time::{Duration, Instant};

use sculpt_core::{
    FrameReport, HandFrame, Mode, SculptConfig, Session, SnapOutcome, TickReport,
};
use anyhow::Context;
use tracing::info;

use crate::mirror::SceneMirror;
use crate::source::{spawn_hand_source, SimInput, SourceEvent};
use crate::visualizer::{Overlay, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub sculpt: SculptConfig,
    /// Fixed seed for reproducible shapes and particles.
    pub seed:   Option<u64>,
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    session: Session,
    mirror:  SceneMirror,
    /// Hands of the latest inference frame, for the overlay.
    hands:   Vec<HandFrame>,
    pub status: String,
}

impl AppState {
    pub fn new(cfg: AppConfig) -> anyhow::Result<Self> {
        let session = match cfg.seed {
            Some(seed) => Session::with_seed(cfg.sculpt, seed),
            None       => Session::new(cfg.sculpt),
        }
        .context("invalid engine configuration")?;
        let mirror = SceneMirror::new(session.effects().camera_home());
        Ok(AppState {
            session,
            mirror,
            hands:  Vec::new(),
            status: "Ready — pinch with both hands to create a shape".to_string(),
        })
    }

    // ── process one inference frame ──────────────────────────────────────

    /// `now` is time since the session started.
    pub fn handle_hands(&mut self, hands: Vec<HandFrame>, now: Duration) -> FrameReport {
        let report = self.session.on_landmarks(&hands, now, &mut self.mirror);
        self.hands = hands;
        if let Some(status) = self.describe(&report) {
            self.status = status;
        }
        report
    }

    fn describe(&self, report: &FrameReport) -> Option<String> {
        if let Some(snap) = report.snap {
            return Some(match snap {
                SnapOutcome::Started { shapes, .. } => format!("SNAP — {} shapes disintegrating", shapes),
                SnapOutcome::IgnoredBusy  => "SNAP ignored — still disintegrating".to_string(),
                SnapOutcome::IgnoredEmpty => "SNAP — nothing to destroy".to_string(),
            });
        }
        let step = &report.step;
        if let Some(id) = step.created {
            let kind = self.session.registry().get(id).map_or("shape", |s| s.kind.name());
            return Some(format!("CREATE {} #{}  ({} shapes)", kind, id.0, self.session.registry().len()));
        }
        if let Some(scale) = step.scaled {
            return Some(format!("SCALE x{:.2}", scale));
        }
        if let Some(id) = step.dragged {
            return Some(format!("DRAG #{}", id.0));
        }
        None
    }

    // ── Per-frame tick ────────────────────────────────────────────────────

    pub fn tick(&mut self, dt: Duration) -> TickReport {
        let was_busy = self.session.is_disintegrating();
        let report = self.session.tick(dt, &mut self.mirror);
        if was_busy && !self.session.is_disintegrating() {
            self.status = format!("Ready — {} shapes", self.session.registry().len());
        }
        report
    }

    // ── Accessors for the render loop ─────────────────────────────────────

    pub fn mirror(&self)   -> &SceneMirror  { &self.mirror }
    pub fn hands(&self)    -> &[HandFrame]  { &self.hands }
    pub fn session(&self)  -> &Session      { &self.session }
    pub fn mode(&self)     -> Mode          { self.session.state().mode }
    pub fn is_busy(&self)  -> bool          { self.session.is_disintegrating() }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// This is the entry point called from `main.rs`.  It creates the visualizer,
/// the hand source (simulation by default, hardware with `--features leap`),
/// and drives the event/render loop at ~60 fps.
pub fn run(cfg: AppConfig) -> anyhow::Result<()> {
    // ── Sim input channel ─────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();

    #[cfg(not(feature = "leap"))]
    let hands_rx = spawn_hand_source(crate::source::SimHandSource::new(sim_rx));
    #[cfg(feature = "leap")]
    let hands_rx = {
        drop(sim_rx);
        spawn_hand_source(crate::source::LeapHandSource)
    };

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(
        sim_tx,
        cfg.sculpt.interaction.view_scale,
        cfg.sculpt.effects.camera_distance,
    )?;

    // ── App state ─────────────────────────────────────────────────────────
    let mut app = AppState::new(cfg)?;
    let started = Instant::now();
    let mut last_tick = started;
    info!("session started");

    // ── Main loop ─────────────────────────────────────────────────────────
    while vis.is_open() {
        // 1. Poll window input → translate to SimInput
        if !vis.poll_input() { break; }

        // 2. Drain inference frames
        loop {
            match hands_rx.try_recv() {
                Ok(SourceEvent::Quit)        => return Ok(()),
                Ok(SourceEvent::Hands(hands)) => { app.handle_hands(hands, started.elapsed()); }
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        // 3. Per-frame animation
        let now = Instant::now();
        app.tick(now - last_tick);
        last_tick = now;

        // 4. Render
        vis.render(app.mirror(), &Overlay {
            hands:  app.hands(),
            status: &app.status,
            busy:   app.is_busy(),
        });
    }

    info!(shapes = app.session().registry().len(), "session ended");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{synth_hand, Pose};

    fn make_app() -> AppState {
        AppState::new(AppConfig { seed: Some(5), ..AppConfig::default() }).unwrap()
    }

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    fn both(pose: Pose, spread: f32) -> Vec<HandFrame> {
        vec![
            synth_hand(0.5 - spread / 2.0, 0.5, -1.0, pose),
            synth_hand(0.5 + spread / 2.0, 0.5,  1.0, pose),
        ]
    }

    #[test]
    fn create_reaches_the_mirror() {
        let mut app = make_app();
        let report = app.handle_hands(both(Pose::Pinch, 0.08), ms(0));
        let id = report.step.created.unwrap();
        assert!(app.mirror().shapes.contains_key(&id));
        assert!(app.status.starts_with("CREATE"));
        assert_eq!(app.mode(), Mode::TwoHandGesture);
        assert_eq!(app.hands().len(), 2);
    }

    #[test]
    fn scaling_updates_status() {
        let mut app = make_app();
        app.handle_hands(both(Pose::Pinch, 0.08), ms(0));
        app.handle_hands(both(Pose::Pinch, 0.16), ms(33));
        assert_eq!(app.status, "SCALE x2.00");
    }

    #[test]
    fn snap_runs_to_completion_in_the_mirror() {
        let mut app = make_app();
        app.handle_hands(both(Pose::Pinch, 0.08), ms(0));
        app.handle_hands(Vec::new(), ms(33));
        app.handle_hands(vec![synth_hand(0.5, 0.5, 1.0, Pose::Snap)], ms(66));
        assert!(app.is_busy());
        assert!(app.status.starts_with("SNAP"));

        // First tick fires the flash and the undelayed bursts.
        app.tick(ms(16));
        assert!(app.mirror().flash.is_some());

        for _ in 0..200 {
            app.tick(ms(16));
        }
        assert!(!app.is_busy());
        assert!(app.mirror().shapes.is_empty());
        assert!(app.mirror().particles.is_empty());
        assert_eq!(app.mirror().flash, None);
        assert_eq!(app.mirror().camera, app.session().effects().camera_home());
        assert_eq!(app.status, "Ready — 0 shapes");
    }

    #[test]
    fn empty_snap_is_reported() {
        let mut app = make_app();
        app.handle_hands(vec![synth_hand(0.5, 0.5, 1.0, Pose::Snap)], ms(0));
        assert_eq!(app.status, "SNAP — nothing to destroy");
    }

    #[test]
    fn invalid_config_fails_startup() {
        let mut sculpt = SculptConfig::default();
        sculpt.effects.flash_opacity = 2.0;
        assert!(AppState::new(AppConfig { sculpt, seed: Some(5) }).is_err());
    }

    #[test]
    fn idle_frames_keep_status() {
        let mut app = make_app();
        let before = app.status.clone();
        app.handle_hands(vec![synth_hand(0.5, 0.5, 1.0, Pose::Open)], ms(0));
        assert_eq!(app.status, before);
    }
}
