//! Gesture classification from raw landmark geometry.
//!
//! Classification is a pure function of the current frame's hands.  Nothing
//! is remembered between frames; debouncing and gesture continuity are the
//! interaction state machine's job.

use glam::Vec2;

use crate::config::GestureConfig;
use crate::geometry::{distance_2d, distance_3d, midpoint_2d};
use crate::landmark::HandFrame;

// ════════════════════════════════════════════════════════════════════════════
// GestureEvent
// ════════════════════════════════════════════════════════════════════════════

/// A gesture recognised in one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureEvent {
    /// Hand at this input index pinches (thumb tip on index tip).
    Pinch(usize),

    /// Some hand snaps (thumb tip on middle tip).
    Snap,

    /// Both hands pinch.  `center` is the normalized 2D midpoint of the two
    /// index tips, `distance` their 2D separation.
    TwoHandPinch { center: Vec2, distance: f32 },

    /// Whether the two index tips are close enough to create a shape.
    /// Only emitted alongside `TwoHandPinch`.
    IndexProximity(bool),
}

/// All gestures of one frame, in evaluation order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Classification {
    pub events: Vec<GestureEvent>,
}

impl Classification {
    pub fn is_snap(&self) -> bool {
        self.events.contains(&GestureEvent::Snap)
    }

    /// `(center, distance, index_tips_close)` when both hands pinch.
    pub fn two_hand_pinch(&self) -> Option<(Vec2, f32, bool)> {
        let (center, distance) = self.events.iter().find_map(|e| match *e {
            GestureEvent::TwoHandPinch { center, distance } => Some((center, distance)),
            _ => None,
        })?;
        let close = self.events.contains(&GestureEvent::IndexProximity(true));
        Some((center, distance, close))
    }

    pub fn is_pinching(&self, hand: usize) -> bool {
        self.events.contains(&GestureEvent::Pinch(hand))
    }

    pub fn is_empty(&self) -> bool { self.events.is_empty() }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureClassifier
// ════════════════════════════════════════════════════════════════════════════

/// Threshold-based classifier over thumb, index and middle tips.
#[derive(Clone, Debug, Default)]
pub struct GestureClassifier {
    thresholds: GestureConfig,
}

impl GestureClassifier {
    pub fn new(thresholds: GestureConfig) -> Self {
        GestureClassifier { thresholds }
    }

    pub fn thresholds(&self) -> &GestureConfig { &self.thresholds }

    /// Thumb tip and index tip closer than the pinch threshold (3D, strict).
    pub fn is_pinch(&self, hand: &HandFrame) -> bool {
        distance_3d(hand.thumb_tip(), hand.index_tip()) < self.thresholds.pinch_threshold
    }

    /// Thumb tip and middle tip closer than the snap threshold (3D, strict).
    pub fn is_snap(&self, hand: &HandFrame) -> bool {
        distance_3d(hand.thumb_tip(), hand.middle_tip()) < self.thresholds.snap_threshold
    }

    /// The two index tips closer than the proximity threshold (2D, strict).
    pub fn index_proximity(&self, left: &HandFrame, right: &HandFrame) -> bool {
        distance_2d(left.index_tip(), right.index_tip())
            < self.thresholds.index_proximity_threshold
    }

    /// Classify one frame.
    ///
    /// Order: snap on any hand ends classification; then the two-hand
    /// pinch; otherwise one `Pinch` per pinching hand.  Hands beyond the
    /// second are ignored.
    pub fn classify(&self, hands: &[HandFrame]) -> Classification {
        let hands = &hands[..hands.len().min(2)];
        let mut events = Vec::new();

        if hands.iter().any(|h| self.is_snap(h)) {
            events.push(GestureEvent::Snap);
            return Classification { events };
        }

        if let [left, right] = hands {
            if self.is_pinch(left) && self.is_pinch(right) {
                let (li, ri) = (left.index_tip(), right.index_tip());
                events.push(GestureEvent::TwoHandPinch {
                    center:   midpoint_2d(li, ri),
                    distance: distance_2d(li, ri),
                });
                events.push(GestureEvent::IndexProximity(self.index_proximity(left, right)));
                return Classification { events };
            }
        }

        for (i, hand) in hands.iter().enumerate() {
            if self.is_pinch(hand) {
                events.push(GestureEvent::Pinch(i));
            }
        }
        Classification { events }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
