//! Hand landmarks as delivered by the inference collaborator.
//!
//! Coordinates are normalized to the video frame: `x` and `y` in `[0, 1]`
//! with `y` growing downward, `z` a relative, unnormalized depth.

use glam::{Vec2, Vec3};

use crate::{Error, Result};

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices (MediaPipe hand model)
// ════════════════════════════════════════════════════════════════════════════

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_DIP:  usize = 7;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_PIP:   usize = 14;
pub const RING_DIP:   usize = 15;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_DIP:  usize = 19;
pub const PINKY_TIP:  usize = 20;

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// A single normalized keypoint on a detected hand.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    pub fn xyz(self) -> Vec3 { Vec3::new(self.x, self.y, self.z) }

    /// Image-plane position, depth dropped.
    pub fn xy(self) -> Vec2 { Vec2::new(self.x, self.y) }
}

// ════════════════════════════════════════════════════════════════════════════
// HandFrame
// ════════════════════════════════════════════════════════════════════════════

/// The 21 landmarks of one hand in one inference frame.
///
/// Frames carry no identity: a hand seen in two consecutive frames is two
/// unrelated `HandFrame`s.
#[derive(Clone, Debug, PartialEq)]
pub struct HandFrame {
    landmarks: [Landmark; LANDMARK_COUNT],
}

impl HandFrame {
    /// Build a frame from a slice that must hold exactly 21 landmarks.
    pub fn new(landmarks: &[Landmark]) -> Result<Self> {
        let landmarks: [Landmark; LANDMARK_COUNT] = landmarks
            .try_into()
            .map_err(|_| Error::LandmarkCount {
                expected: LANDMARK_COUNT,
                found:    landmarks.len(),
            })?;
        Ok(HandFrame { landmarks })
    }

    pub fn from_array(landmarks: [Landmark; LANDMARK_COUNT]) -> Self {
        HandFrame { landmarks }
    }

    pub fn landmarks(&self) -> &[Landmark; LANDMARK_COUNT] { &self.landmarks }

    /// Landmark by index; indices follow the constants in this module.
    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.landmarks.get(index).copied()
    }

    pub fn thumb_tip(&self)  -> Landmark { self.landmarks[THUMB_TIP] }
    pub fn index_tip(&self)  -> Landmark { self.landmarks[INDEX_TIP] }
    pub fn middle_tip(&self) -> Landmark { self.landmarks[MIDDLE_TIP] }
}

// ════════════════════════════════════════════════════════════════════════════
// Overlay markers
// ════════════════════════════════════════════════════════════════════════════

/// Fingertips the 2D overlay draws for one hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FingertipMarkers {
    pub thumb:  Landmark,
    pub index:  Landmark,
    pub middle: Landmark,
}

/// Thumb, index and middle tips of every present hand, in input order.
/// Read-only data for the overlay; nothing flows back into the engine.
pub fn fingertip_markers(hands: &[HandFrame]) -> Vec<FingertipMarkers> {
    hands
        .iter()
        .map(|h| FingertipMarkers {
            thumb:  h.thumb_tip(),
            index:  h.index_tip(),
            middle: h.middle_tip(),
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn open_hand() -> Vec<Landmark> {
        (0..LANDMARK_COUNT)
            .map(|i| Landmark::new(0.5, 0.5 + i as f32 * 0.01, 0.0))
            .collect()
    }

    #[test]
    fn frame_requires_21_landmarks() {
        let short = vec![Landmark::default(); 20];
        match HandFrame::new(&short) {
            Err(Error::LandmarkCount { expected, found }) => {
                assert_eq!(expected, 21);
                assert_eq!(found, 20);
            }
            other => panic!("expected LandmarkCount error, got {:?}", other),
        }
        assert!(HandFrame::new(&vec![Landmark::default(); 22]).is_err());
    }

    #[test]
    fn named_tips_match_indices() {
        let frame = HandFrame::new(&open_hand()).unwrap();
        assert_eq!(frame.thumb_tip(),  frame.landmarks()[4]);
        assert_eq!(frame.index_tip(),  frame.landmarks()[8]);
        assert_eq!(frame.middle_tip(), frame.landmarks()[12]);
        assert_eq!(frame.get(21), None);
    }

    #[test]
    fn markers_one_per_hand() {
        let frame = HandFrame::new(&open_hand()).unwrap();
        let markers = fingertip_markers(&[frame.clone(), frame.clone()]);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[1].middle, frame.middle_tip());
        assert!(fingertip_markers(&[]).is_empty());
    }
}
