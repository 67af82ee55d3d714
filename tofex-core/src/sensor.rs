use crate::geometry::Vec3;

/// Distance written in place of a reading when the ray found nothing in range.
pub const NO_HIT_SENTINEL: f32 = -1.0;

/// Nearest intersection along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub distance: f32,
    pub point: Vec3,
}

impl Hit {
    pub fn along(origin: Vec3, direction: Vec3, distance: f32) -> Self {
        Self {
            distance,
            point: origin + direction * distance,
        }
    }

    /// True when the hit lies in `[0, max_range)` and is a real number.
    pub fn within(&self, max_range: f32) -> bool {
        self.distance.is_finite() && self.distance >= 0.0 && self.distance < max_range
    }
}

/// Ray intersection query provided by the host physics.
pub trait RayCaster {
    /// Nearest hit from `origin` along unit `direction`, closer than `max_range`.
    fn cast(&self, origin: Vec3, direction: Vec3, max_range: f32) -> Option<Hit>;
}

impl<T: RayCaster + ?Sized> RayCaster for &T {
    fn cast(&self, origin: Vec3, direction: Vec3, max_range: f32) -> Option<Hit> {
        (**self).cast(origin, direction, max_range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_range_check() {
        let hit = Hit::along(Vec3::ZERO, Vec3::FORWARD, 3.0);
        assert_eq!(hit.point, Vec3::new(3.0, 0.0, 0.0));
        assert!(hit.within(10.0));
        assert!(!hit.within(3.0));
        assert!(!Hit::along(Vec3::ZERO, Vec3::FORWARD, f32::NAN).within(10.0));
        assert!(!Hit::along(Vec3::ZERO, Vec3::FORWARD, -0.5).within(10.0));
    }
}
