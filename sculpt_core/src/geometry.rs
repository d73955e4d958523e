//! Pure distance and projection helpers over landmarks.

use glam::{Vec2, Vec3};

use crate::landmark::Landmark;

/// Euclidean distance in normalized 3D (depth included).
pub fn distance_3d(a: Landmark, b: Landmark) -> f32 {
    a.xyz().distance(b.xyz())
}

/// Euclidean distance in the image plane (depth ignored).
pub fn distance_2d(a: Landmark, b: Landmark) -> f32 {
    a.xy().distance(b.xy())
}

pub fn midpoint_2d(a: Landmark, b: Landmark) -> Vec2 {
    (a.xy() + b.xy()) * 0.5
}

/// Map a normalized image point into view space.
///
/// `(0.5, 0.5)` lands on the origin; `scale` view units span the full frame
/// on each axis.  Image `y` grows downward, view `y` grows upward, and the
/// result always sits on the `z = 0` plane.
pub fn project_to_view(point: Vec2, scale: f32) -> Vec3 {
    Vec3::new((point.x - 0.5) * scale, (0.5 - point.y) * scale, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_3d_includes_depth() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(0.0, 0.03, 0.04);
        assert!((distance_3d(a, b) - 0.05).abs() < 1e-6);
        assert!((distance_2d(a, b) - 0.03).abs() < 1e-6);
    }

    #[test]
    fn projection_centers_frame_on_origin() {
        assert_eq!(project_to_view(Vec2::new(0.5, 0.5), 10.0), Vec3::ZERO);
        let top_left = project_to_view(Vec2::new(0.0, 0.0), 10.0);
        assert!((top_left.x - (-5.0)).abs() < 1e-6);
        assert!((top_left.y - 5.0).abs() < 1e-6);
        assert_eq!(top_left.z, 0.0);
    }

    #[test]
    fn midpoint_is_average() {
        let m = midpoint_2d(Landmark::new(0.4, 0.2, 0.9), Landmark::new(0.6, 0.4, -0.3));
        assert!((m.x - 0.5).abs() < 1e-6);
        assert!((m.y - 0.3).abs() < 1e-6);
    }
}
