//! Snap disintegration: every live shape bursts into particles.
//!
//! A snap takes the whole shape collection in one swap.  Each taken shape
//! gets its own [`ParticleBurst`] with a random start delay; the bursts run
//! as one scheduler group and the engine stays busy until that group
//! completes.  New shapes created in the meantime land in the fresh
//! registry and are never touched by the running bursts.

use std::f32::consts::TAU;
use std::time::Duration;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::DisintegrationConfig;
use crate::effects::FeedbackEffects;
use crate::scene::{ParticleId, SceneCommand, SceneSink};
use crate::scheduler::{GroupId, Scheduler, TickReport, TimedTask};
use crate::shape::{Color, Shape, ShapeRegistry};

// ════════════════════════════════════════════════════════════════════════════
// Particle
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleKind {
    Cube,
    Sphere,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub kind:       ParticleKind,
    pub color:      Color,
    pub position:   Vec3,
    /// View units per tick.
    pub velocity:   Vec3,
    pub rotation:   Vec3,
    /// Radians per tick, per axis.
    pub spin:       Vec3,
    pub opacity:    f32,
    pub scale:      f32,
    /// Swells to the peak scale before shrinking away.
    pub grows_first: bool,
}

impl Particle {
    /// Scatter one particle around `shape`.
    fn spawn<R: Rng + ?Sized>(shape: &Shape, cfg: &DisintegrationConfig, rng: &mut R) -> Self {
        let mut centered = |width: f32| (rng.gen::<f32>() - 0.5) * width;
        let spread = shape.scale * cfg.spread;
        let offset   = Vec3::new(centered(spread), centered(spread), centered(spread));
        let velocity = Vec3::new(
            centered(cfg.velocity_range),
            centered(cfg.velocity_range),
            centered(cfg.velocity_range),
        );
        let spin = Vec3::new(
            centered(cfg.spin_range),
            centered(cfg.spin_range),
            centered(cfg.spin_range),
        );

        Particle {
            kind:        if rng.gen_bool(0.5) { ParticleKind::Cube } else { ParticleKind::Sphere },
            color:       shape.color.jitter(cfg.color_jitter, rng),
            position:    shape.position + offset,
            velocity,
            rotation:    Vec3::new(rng.gen_range(0.0..TAU), rng.gen_range(0.0..TAU), rng.gen_range(0.0..TAU)),
            spin,
            opacity:     1.0,
            scale:       1.0,
            grows_first: rng.gen_bool(cfg.grow_probability),
        }
    }

    /// One simulation tick at `progress` through the burst.
    pub fn step(&mut self, progress: f32, cfg: &DisintegrationConfig) {
        self.velocity.y -= cfg.gravity;
        self.position   += self.velocity;
        self.rotation   += self.spin;
        self.opacity     = 1.0 - progress;
        self.scale = if self.grows_first {
            grow_then_shrink(progress, cfg.grow_peak, cfg.grow_phase)
        } else {
            self.scale * cfg.shrink_decay
        };
    }
}

/// Linear swell from 1 to `peak` over `[0, phase)`, then linear fall from
/// `peak` to 0 over `[phase, 1]`.
pub fn grow_then_shrink(progress: f32, peak: f32, phase: f32) -> f32 {
    if progress < phase {
        1.0 + (peak - 1.0) * progress / phase
    } else {
        (peak * (1.0 - (progress - phase) / (1.0 - phase))).max(0.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ParticleBurst — one shape's disintegration
// ════════════════════════════════════════════════════════════════════════════

/// Owns a drained shape until its particles are gone.
pub struct ParticleBurst {
    shape:     Shape,
    delay:     Duration,
    config:    DisintegrationConfig,
    particles: Vec<Particle>,
    rng:       StdRng,
}

impl ParticleBurst {
    pub fn new(shape: Shape, delay: Duration, config: DisintegrationConfig, seed: u64) -> Self {
        ParticleBurst {
            shape,
            delay,
            config,
            particles: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn particle_id(&self, index: usize) -> ParticleId {
        ParticleId { burst: self.shape.id, index: index as u32 }
    }

    pub fn particles(&self) -> &[Particle] { &self.particles }
}

impl TimedTask for ParticleBurst {
    fn delay(&self) -> Duration { self.delay }

    fn duration(&self) -> Duration { Duration::from_millis(self.config.duration_ms) }

    fn start(&mut self, scene: &mut dyn SceneSink) {
        self.shape.visible = false;
        scene.submit(SceneCommand::SetShapeVisible { id: self.shape.id, visible: false });

        self.particles = (0..self.config.particle_count)
            .map(|_| Particle::spawn(&self.shape, &self.config, &mut self.rng))
            .collect();
        for (i, p) in self.particles.iter().enumerate() {
            let id = self.particle_id(i);
            scene.submit(SceneCommand::AddParticle { id, kind: p.kind, color: p.color });
            scene.submit(SceneCommand::particle(id, p));
        }
        debug!(shape = self.shape.id.0, particles = self.particles.len(), "burst started");
    }

    fn update(&mut self, progress: f32, scene: &mut dyn SceneSink) {
        for (i, p) in self.particles.iter_mut().enumerate() {
            p.step(progress, &self.config);
            let id = ParticleId { burst: self.shape.id, index: i as u32 };
            scene.submit(SceneCommand::particle(id, p));
        }
    }

    fn finish(&mut self, scene: &mut dyn SceneSink) {
        for i in 0..self.particles.len() {
            scene.submit(SceneCommand::RemoveParticle(self.particle_id(i)));
        }
        self.particles.clear();
        scene.submit(SceneCommand::RemoveShape(self.shape.id));
        debug!(shape = self.shape.id.0, "burst finished");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DisintegrationEngine
// ════════════════════════════════════════════════════════════════════════════

/// Result of a snap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapOutcome {
    /// A run started over this many shapes.
    Started { shapes: usize, group: GroupId },
    /// A run is already in flight.
    IgnoredBusy,
    /// Nothing to destroy.
    IgnoredEmpty,
}

/// Globally exclusive snap runs.
#[derive(Debug, Default)]
pub struct DisintegrationEngine {
    config: DisintegrationConfig,
    /// Group of the in-flight run; `Some` means busy.
    run:    Option<GroupId>,
}

impl DisintegrationEngine {
    pub fn new(config: DisintegrationConfig) -> Self {
        DisintegrationEngine { config, run: None }
    }

    pub fn is_busy(&self) -> bool { self.run.is_some() }

    /// Handle a snap: take every shape from `registry` and queue one
    /// staggered burst per shape plus the feedback effects.
    pub fn trigger<R: Rng + ?Sized>(
        &mut self,
        registry:  &mut ShapeRegistry,
        scheduler: &mut Scheduler,
        effects:   &FeedbackEffects,
        rng:       &mut R,
    ) -> SnapOutcome {
        if self.is_busy() {
            debug!("snap ignored: disintegration in flight");
            return SnapOutcome::IgnoredBusy;
        }
        if registry.is_empty() {
            debug!("snap ignored: no shapes");
            return SnapOutcome::IgnoredEmpty;
        }

        effects.trigger(scheduler, rng);

        let drained = registry.drain_all();
        let shapes  = drained.len();
        let bursts: Vec<Box<dyn TimedTask>> = drained
            .into_iter()
            .map(|shape| {
                let delay = if self.config.max_stagger_ms == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_millis(rng.gen_range(0..self.config.max_stagger_ms))
                };
                Box::new(ParticleBurst::new(shape, delay, self.config.clone(), rng.gen()))
                    as Box<dyn TimedTask>
            })
            .collect();

        let group = scheduler.spawn_group(bursts);
        self.run = Some(group);
        info!(shapes, "snap: disintegrating");
        SnapOutcome::Started { shapes, group }
    }

    /// Release the busy flag once the run's group has completed.
    /// Returns true on the tick the run ends.
    pub fn on_tick(&mut self, report: &TickReport) -> bool {
        match self.run {
            Some(group) if report.completed_groups.contains(&group) => {
                self.run = None;
                info!("disintegration complete");
                true
            }
            _ => false,
        }
    }

    /// Cut the in-flight run short.  Every burst removes its particles and
    /// its shape from the scene, whether or not it had fired.
    pub fn cancel(&mut self, scheduler: &mut Scheduler, scene: &mut dyn SceneSink) -> bool {
        match self.run.take() {
            Some(group) => {
                scheduler.cancel_group(group, scene);
                info!("disintegration cancelled");
                true
            }
            None => false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NullScene;

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    fn shape_at(registry: &mut ShapeRegistry, rng: &mut StdRng, x: f32) -> Shape {
        registry.create(Vec3::new(x, 0.0, 0.0), rng, &mut NullScene).clone()
    }

    #[test]
    fn grow_curve_peaks_then_vanishes() {
        assert!((grow_then_shrink(0.0, 1.3, 0.3) - 1.0).abs() < 1e-6);
        assert!((grow_then_shrink(0.15, 1.3, 0.3) - 1.15).abs() < 1e-5);
        assert!((grow_then_shrink(0.3, 1.3, 0.3) - 1.3).abs() < 1e-5);
        assert!((grow_then_shrink(0.65, 1.3, 0.3) - 0.65).abs() < 1e-5);
        assert!(grow_then_shrink(1.0, 1.3, 0.3).abs() < 1e-6);
    }

    #[test]
    fn particle_step_applies_gravity_and_fade() {
        let cfg = DisintegrationConfig::default();
        let mut p = Particle {
            kind:        ParticleKind::Cube,
            color:       Color::WHITE,
            position:    Vec3::ZERO,
            velocity:    Vec3::new(0.1, 0.0, 0.0),
            rotation:    Vec3::ZERO,
            spin:        Vec3::splat(0.05),
            opacity:     1.0,
            scale:       1.0,
            grows_first: false,
        };
        p.step(0.25, &cfg);
        assert!((p.velocity.y - (-0.0005)).abs() < 1e-6);
        assert!((p.position.x - 0.1).abs() < 1e-6);
        assert!((p.position.y - (-0.0005)).abs() < 1e-6);
        assert!((p.rotation.z - 0.05).abs() < 1e-6);
        assert!((p.opacity - 0.75).abs() < 1e-6);
        assert!((p.scale - 0.99).abs() < 1e-6);
        p.step(0.5, &cfg);
        assert!((p.scale - (0.99 * 0.99)).abs() < 1e-6);
    }

    #[test]
    fn spawned_particles_stay_near_their_shape() {
        let cfg = DisintegrationConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut registry = ShapeRegistry::new();
        let mut shape = shape_at(&mut registry, &mut rng, 2.0);
        shape.scale = 2.0;

        let particles: Vec<Particle> =
            (0..500).map(|_| Particle::spawn(&shape, &cfg, &mut rng)).collect();
        let half_spread = 0.5 * shape.scale * cfg.spread;
        for p in &particles {
            let off = p.position - shape.position;
            assert!(off.abs().max_element() <= half_spread + 1e-5);
            assert!(p.velocity.abs().max_element() <= 0.1 + 1e-6);
            assert!((p.color.r - shape.color.r).abs() <= 0.1 + 1e-6);
        }
        let growers = particles.iter().filter(|p| p.grows_first).count();
        assert!((100..200).contains(&growers), "growers = {}", growers);
    }

    #[test]
    fn burst_hides_shape_then_removes_everything() {
        let mut cfg = DisintegrationConfig::default();
        cfg.particle_count = 4;
        let mut rng = StdRng::seed_from_u64(9);
        let mut registry = ShapeRegistry::new();
        let shape = shape_at(&mut registry, &mut rng, 0.0);
        let id = shape.id;

        let mut s = Scheduler::new();
        s.spawn(Box::new(ParticleBurst::new(shape, ms(100), cfg, 1)));
        let mut log: Vec<SceneCommand> = Vec::new();

        s.advance(ms(50), &mut log);
        assert!(log.is_empty());

        s.advance(ms(60), &mut log);
        assert_eq!(log[0], SceneCommand::SetShapeVisible { id, visible: false });
        let added = log.iter().filter(|c| matches!(c, SceneCommand::AddParticle { .. })).count();
        assert_eq!(added, 4);

        log.clear();
        s.advance(ms(2_000), &mut log);
        let removed = log.iter().filter(|c| matches!(c, SceneCommand::RemoveParticle(_))).count();
        assert_eq!(removed, 4);
        assert_eq!(log.last(), Some(&SceneCommand::RemoveShape(id)));
        assert!(s.is_idle());
    }

    #[test]
    fn snap_drains_and_goes_busy() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut registry = ShapeRegistry::new();
        shape_at(&mut registry, &mut rng, 0.0);
        shape_at(&mut registry, &mut rng, 1.0);
        let mut scheduler = Scheduler::new();
        let mut engine = DisintegrationEngine::default();
        let effects = FeedbackEffects::default();

        let outcome = engine.trigger(&mut registry, &mut scheduler, &effects, &mut rng);
        assert!(matches!(outcome, SnapOutcome::Started { shapes: 2, .. }));
        assert!(registry.is_empty());
        assert!(engine.is_busy());
        // Two bursts, one flash, one shake.
        assert_eq!(scheduler.len(), 4);
    }

    #[test]
    fn snap_ignored_when_busy_or_empty() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut registry = ShapeRegistry::new();
        let mut scheduler = Scheduler::new();
        let mut engine = DisintegrationEngine::default();
        let effects = FeedbackEffects::default();

        assert_eq!(
            engine.trigger(&mut registry, &mut scheduler, &effects, &mut rng),
            SnapOutcome::IgnoredEmpty
        );
        assert!(scheduler.is_idle());

        shape_at(&mut registry, &mut rng, 0.0);
        engine.trigger(&mut registry, &mut scheduler, &effects, &mut rng);
        let queued = scheduler.len();

        shape_at(&mut registry, &mut rng, 0.0);
        assert_eq!(
            engine.trigger(&mut registry, &mut scheduler, &effects, &mut rng),
            SnapOutcome::IgnoredBusy
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(scheduler.len(), queued);
    }

    #[test]
    fn busy_released_after_last_burst() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut registry = ShapeRegistry::new();
        for x in 0..5 {
            shape_at(&mut registry, &mut rng, x as f32);
        }
        let mut scheduler = Scheduler::new();
        let mut engine = DisintegrationEngine::default();
        engine.trigger(&mut registry, &mut scheduler, &FeedbackEffects::default(), &mut rng);

        let mut elapsed = Duration::ZERO;
        let mut released_at = None;
        while elapsed < ms(3_000) {
            let report = scheduler.advance(ms(16), &mut NullScene);
            elapsed += ms(16);
            if engine.on_tick(&report) {
                released_at = Some(elapsed);
                break;
            }
        }
        let released_at = released_at.expect("run never completed");
        assert!(released_at >= ms(2_000));
        assert!(released_at <= ms(2_500 + 16));
        assert!(!engine.is_busy());
        assert!(scheduler.is_idle());
    }

    #[test]
    fn cancel_releases_immediately() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut registry = ShapeRegistry::new();
        shape_at(&mut registry, &mut rng, 0.0);
        let mut scheduler = Scheduler::new();
        let mut engine = DisintegrationEngine::default();
        engine.trigger(&mut registry, &mut scheduler, &FeedbackEffects::default(), &mut rng);

        assert!(engine.cancel(&mut scheduler, &mut NullScene));
        assert!(!engine.is_busy());
        assert!(!engine.cancel(&mut scheduler, &mut NullScene));
        // Flash and shake are not part of the run.
        assert_eq!(scheduler.len(), 2);
    }
}
