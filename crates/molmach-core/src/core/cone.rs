use super::geometry::{Vector, binding_vector};
use super::loc_rot::Placement;

/// A finite right circular cone with a flat cap.
///
/// The cone opens from `apex` towards `base`; its half-angle is `aperture / 2`. A point is
/// inside when it lies within the angular opening and its projection onto the axis is strictly
/// shorter than the axis itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    pub apex: Vector,
    pub base: Vector,
    pub aperture: f64,
}

impl Cone {
    pub fn new(apex: Vector, base: Vector, aperture: f64) -> Self {
        Self { apex, base, aperture }
    }

    /// Builds the cone a sensor sees: apex at the sensor, axis along the sensor's local +Y,
    /// length `range`.
    pub fn from_placement(placement: &impl Placement, range: f64, aperture: f64) -> Self {
        let apex = placement.location();
        let base = apex + placement.rotation() * (binding_vector() * range);
        Self::new(apex, base, aperture)
    }

    pub fn contains(&self, point: &Vector) -> bool {
        let axis = self.base - self.apex;
        let offset = point - self.apex;

        let axis_length = axis.norm();
        let offset_length = offset.norm();
        if axis_length == 0.0 || offset_length == 0.0 {
            return false;
        }

        let projection = offset.dot(&axis) / axis_length;
        let cos_angle = projection / offset_length;

        cos_angle > (self.aperture / 2.0).cos() && projection < axis_length
    }
}
