//! Engine configuration.
//!
//! Every threshold and animation constant lives here.  The defaults are the
//! calibration the engine was tuned with for a webcam framing a person at
//! arm's length; a TOML file can override any subset of them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SculptConfig {
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub disintegration: DisintegrationConfig,
    #[serde(default)]
    pub effects: EffectsConfig,
}

/// Gesture classification thresholds, in normalized landmark units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Thumb-tip to index-tip 3D distance below which a hand pinches.
    pub pinch_threshold: f32,
    /// Thumb-tip to middle-tip 3D distance below which a hand snaps.
    pub snap_threshold: f32,
    /// 2D distance between the two index tips that gates creation.
    pub index_proximity_threshold: f32,
}

/// Interaction state machine tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Minimum time between two shape creations (ms).
    pub creation_cooldown_ms: u64,
    /// A pinch only grabs shapes closer than this (view units).
    pub grab_radius: f32,
    /// View units spanned by the full normalized frame.
    pub view_scale: f32,
    /// Ambient rotation per render tick for shapes nobody holds (radians).
    pub idle_spin: f32,
}

/// Particle burst tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisintegrationConfig {
    pub particle_count: usize,
    pub duration_ms: u64,
    /// Upper bound (exclusive) of each burst's random start delay.
    pub max_stagger_ms: u64,
    /// Subtracted from vertical velocity every tick.
    pub gravity: f32,
    /// Probability that a particle swells before shrinking.
    pub grow_probability: f64,
    pub grow_peak: f32,
    /// Fraction of the run spent swelling.
    pub grow_phase: f32,
    /// Per-tick scale factor for particles that only shrink.
    pub shrink_decay: f32,
    /// Max per-channel deviation from the shape's color.
    pub color_jitter: f32,
    /// Spawn spread as a fraction of the shape's scale.
    pub spread: f32,
    /// Full width of the per-axis initial velocity range.
    pub velocity_range: f32,
    /// Full width of the per-axis spin range.
    pub spin_range: f32,
}

/// Camera shake and flash tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub shake_ms: u64,
    pub shake_intensity: f32,
    pub flash_ms: u64,
    pub flash_opacity: f32,
    /// Resting camera distance from the origin along +z.
    pub camera_distance: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_threshold:           0.06,
            snap_threshold:            0.03,
            index_proximity_threshold: 0.12,
        }
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            creation_cooldown_ms: 1_000,
            grab_radius:          1.5,
            view_scale:           10.0,
            idle_spin:            0.01,
        }
    }
}

impl Default for DisintegrationConfig {
    fn default() -> Self {
        Self {
            particle_count:   100,
            duration_ms:      2_000,
            max_stagger_ms:   500,
            gravity:          0.0005,
            grow_probability: 0.3,
            grow_peak:        1.3,
            grow_phase:       0.3,
            shrink_decay:     0.99,
            color_jitter:     0.1,
            spread:           0.8,
            velocity_range:   0.2,
            spin_range:       0.2,
        }
    }
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            shake_ms:        1_000,
            shake_intensity: 0.3,
            flash_ms:        1_000,
            flash_opacity:   0.8,
            camera_distance: 5.0,
        }
    }
}

impl SculptConfig {
    /// Validate config values are within acceptable ranges.
    /// Returns the first invalid field as `Error::Config`.
    pub fn validate(&self) -> Result<()> {
        let g = &self.gesture;
        for (name, v) in [
            ("pinch_threshold", g.pinch_threshold),
            ("snap_threshold", g.snap_threshold),
            ("index_proximity_threshold", g.index_proximity_threshold),
        ] {
            if !(v > 0.0) {
                return Err(Error::Config(format!("{} must be > 0, got {}", name, v)));
            }
        }
        // Same fingers, same frame: snap must stay distinguishable from pinch.
        if g.snap_threshold >= g.pinch_threshold {
            return Err(Error::Config(format!(
                "snap_threshold ({}) must be below pinch_threshold ({})",
                g.snap_threshold, g.pinch_threshold
            )));
        }

        let i = &self.interaction;
        if !(i.grab_radius > 0.0) {
            return Err(Error::Config(format!("grab_radius must be > 0, got {}", i.grab_radius)));
        }
        if !(i.view_scale > 0.0) {
            return Err(Error::Config(format!("view_scale must be > 0, got {}", i.view_scale)));
        }

        let d = &self.disintegration;
        if d.duration_ms == 0 {
            return Err(Error::Config("disintegration duration_ms must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&d.grow_probability) {
            return Err(Error::Config(format!(
                "grow_probability must be in [0, 1], got {}", d.grow_probability
            )));
        }
        if !(d.grow_phase > 0.0 && d.grow_phase < 1.0) {
            return Err(Error::Config(format!(
                "grow_phase must be in (0, 1), got {}", d.grow_phase
            )));
        }
        if !(0.0..=1.0).contains(&d.shrink_decay) {
            return Err(Error::Config(format!(
                "shrink_decay must be in [0, 1], got {}", d.shrink_decay
            )));
        }

        let e = &self.effects;
        if !(0.0..=1.0).contains(&e.flash_opacity) {
            return Err(Error::Config(format!(
                "flash_opacity must be in [0, 1], got {}", e.flash_opacity
            )));
        }
        if !(e.camera_distance > 0.0) {
            return Err(Error::Config(format!(
                "camera_distance must be > 0, got {}", e.camera_distance
            )));
        }
        Ok(())
    }

    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
