//! Camera shake and full-screen flash that accompany a snap.
//!
//! Both are fire-and-forget scheduler tasks; the disintegration join does
//! not wait for them.

use std::time::Duration;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EffectsConfig;
use crate::scene::{SceneCommand, SceneSink};
use crate::scheduler::{Scheduler, TimedTask};

// ════════════════════════════════════════════════════════════════════════════
// CameraShake
// ════════════════════════════════════════════════════════════════════════════

/// Jitters the camera in x/y with an intensity that decays linearly to zero,
/// then puts it back exactly where it rests.
pub struct CameraShake {
    home:      Vec3,
    intensity: f32,
    duration:  Duration,
    rng:       StdRng,
}

impl CameraShake {
    pub fn new(home: Vec3, intensity: f32, duration: Duration, seed: u64) -> Self {
        CameraShake { home, intensity, duration, rng: StdRng::seed_from_u64(seed) }
    }
}

impl TimedTask for CameraShake {
    fn duration(&self) -> Duration { self.duration }

    fn update(&mut self, progress: f32, scene: &mut dyn SceneSink) {
        let falloff = self.intensity * (1.0 - progress);
        let dx = (self.rng.gen::<f32>() - 0.5) * falloff;
        let dy = (self.rng.gen::<f32>() - 0.5) * falloff;
        scene.submit(SceneCommand::SetCameraPosition(self.home + Vec3::new(dx, dy, 0.0)));
    }

    fn finish(&mut self, scene: &mut dyn SceneSink) {
        scene.submit(SceneCommand::SetCameraPosition(self.home));
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Flash
// ════════════════════════════════════════════════════════════════════════════

/// Translucent full-bleed plane fading from `peak` to nothing.
pub struct Flash {
    peak:     f32,
    duration: Duration,
}

impl Flash {
    pub fn new(peak: f32, duration: Duration) -> Self {
        Flash { peak, duration }
    }
}

impl TimedTask for Flash {
    fn duration(&self) -> Duration { self.duration }

    fn start(&mut self, scene: &mut dyn SceneSink) {
        scene.submit(SceneCommand::ShowFlash { opacity: self.peak });
    }

    fn update(&mut self, progress: f32, scene: &mut dyn SceneSink) {
        scene.submit(SceneCommand::SetFlashOpacity(self.peak * (1.0 - progress)));
    }

    fn finish(&mut self, scene: &mut dyn SceneSink) {
        scene.submit(SceneCommand::HideFlash);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FeedbackEffects
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default)]
pub struct FeedbackEffects {
    config: EffectsConfig,
}

impl FeedbackEffects {
    pub fn new(config: EffectsConfig) -> Self {
        FeedbackEffects { config }
    }

    /// Where the camera rests when nothing shakes it.
    pub fn camera_home(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.config.camera_distance)
    }

    /// Queue one flash and one shake.
    pub fn trigger<R: Rng + ?Sized>(&self, scheduler: &mut Scheduler, rng: &mut R) {
        scheduler.spawn(Box::new(Flash::new(
            self.config.flash_opacity,
            Duration::from_millis(self.config.flash_ms),
        )));
        scheduler.spawn(Box::new(CameraShake::new(
            self.camera_home(),
            self.config.shake_intensity,
            Duration::from_millis(self.config.shake_ms),
            rng.gen(),
        )));
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    #[test]
    fn flash_fades_then_hides() {
        let mut s = Scheduler::new();
        s.spawn(Box::new(Flash::new(0.8, ms(1_000))));
        let mut log: Vec<SceneCommand> = Vec::new();

        s.advance(ms(500), &mut log);
        assert_eq!(log[0], SceneCommand::ShowFlash { opacity: 0.8 });
        match log[1] {
            SceneCommand::SetFlashOpacity(o) => assert!((o - 0.4).abs() < 1e-6),
            ref other => panic!("unexpected {:?}", other),
        }

        log.clear();
        s.advance(ms(500), &mut log);
        assert_eq!(log, vec![SceneCommand::HideFlash]);
        assert!(s.is_idle());
    }

    #[test]
    fn shake_stays_bounded_and_restores_home() {
        let home = Vec3::new(0.0, 0.0, 5.0);
        let mut s = Scheduler::new();
        s.spawn(Box::new(CameraShake::new(home, 0.3, ms(1_000), 3)));
        let mut log: Vec<SceneCommand> = Vec::new();

        for _ in 0..59 {
            s.advance(ms(16), &mut log);
        }
        for cmd in &log {
            let SceneCommand::SetCameraPosition(p) = cmd else { panic!("{:?}", cmd) };
            assert!((p.x - home.x).abs() <= 0.15);
            assert!((p.y - home.y).abs() <= 0.15);
            assert_eq!(p.z, home.z);
        }

        log.clear();
        s.advance(ms(100), &mut log);
        assert_eq!(log, vec![SceneCommand::SetCameraPosition(home)]);
    }

    #[test]
    fn trigger_queues_two_loose_tasks() {
        let effects = FeedbackEffects::default();
        let mut s = Scheduler::new();
        effects.trigger(&mut s, &mut StdRng::seed_from_u64(1));
        assert_eq!(s.len(), 2);
        assert_eq!(effects.camera_home(), Vec3::new(0.0, 0.0, 5.0));
    }
}
