//! Placements: a location paired with a rotation.
//!
//! [`LocRot`] is an immutable snapshot; [`LocRotState`] is a live placement that is mutated in
//! place by whoever owns it (a spatial link, an interpolating structure). Both implement
//! [`Placement`], so code that only reads a placement accepts either.

use super::geometry::{Rotation, Vector, approx_eq_rotation, approx_eq_vector, lerp_vector, slerp_rotation};
use serde::{Deserialize, Serialize};

pub trait Placement {
    fn location(&self) -> Vector;
    fn rotation(&self) -> Rotation;

    fn to_loc_rot(&self) -> LocRot {
        LocRot::new(self.location(), self.rotation())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocRot {
    pub location: Vector,
    pub rotation: Rotation,
}

impl Default for LocRot {
    fn default() -> Self {
        Self::identity()
    }
}

impl LocRot {
    pub fn new(location: Vector, rotation: Rotation) -> Self {
        Self { location, rotation }
    }

    pub fn identity() -> Self {
        Self::new(Vector::zeros(), Rotation::identity())
    }

    pub fn from_location(location: Vector) -> Self {
        Self::new(location, Rotation::identity())
    }

    /// Applies a placement expressed relative to `root` and returns it in `root`'s parent space.
    ///
    /// # Arguments
    ///
    /// * `root` - The parent placement.
    /// * `relative` - A placement in `root`'s local frame.
    ///
    /// # Return
    ///
    /// `location = root.location + root.rotation * relative.location` and
    /// `rotation = root.rotation * relative.rotation`.
    pub fn combine(root: &impl Placement, relative: &impl Placement) -> Self {
        let root_rotation = root.rotation();
        Self::new(
            root.location() + root_rotation * relative.location(),
            root_rotation * relative.rotation(),
        )
    }

    /// Interpolates location linearly and rotation spherically.
    pub fn lerp(a: &impl Placement, b: &impl Placement, t: f64) -> Self {
        Self::new(
            lerp_vector(&a.location(), &b.location(), t),
            slerp_rotation(&a.rotation(), &b.rotation(), t),
        )
    }

    pub fn inverse(&self) -> Self {
        let inverse_rotation = self.rotation.inverse();
        Self::new(-(inverse_rotation * self.location), inverse_rotation)
    }

    pub fn approx_eq(&self, other: &impl Placement, epsilon: f64) -> bool {
        approx_eq_vector(&self.location, &other.location(), epsilon)
            && approx_eq_rotation(&self.rotation, &other.rotation(), epsilon)
    }
}

impl Placement for LocRot {
    fn location(&self) -> Vector {
        self.location
    }

    fn rotation(&self) -> Rotation {
        self.rotation
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocRotState {
    current: LocRot,
}

impl LocRotState {
    pub fn new(initial: LocRot) -> Self {
        Self { current: initial }
    }

    pub fn set(&mut self, value: &impl Placement) {
        self.current = value.to_loc_rot();
    }

    pub fn set_location(&mut self, location: Vector) {
        self.current.location = location;
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.current.rotation = rotation;
    }

    pub fn translate(&mut self, delta: &Vector) {
        self.current.location += delta;
    }

    pub fn set_lerp(&mut self, a: &impl Placement, b: &impl Placement, t: f64) {
        self.current = LocRot::lerp(a, b, t);
    }

    pub fn snapshot(&self) -> LocRot {
        self.current
    }
}

impl Placement for LocRotState {
    fn location(&self) -> Vector {
        self.current.location
    }

    fn rotation(&self) -> Rotation {
        self.current.rotation
    }
}

impl From<LocRot> for LocRotState {
    fn from(value: LocRot) -> Self {
        Self::new(value)
    }
}

/// Serializable form of a placement: `[x, y, z]` and a quaternion as `[x, y, z, w]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocRotRecord {
    pub location: [f64; 3],
    #[serde(default = "identity_quaternion")]
    pub rotation: [f64; 4],
}

fn identity_quaternion() -> [f64; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

impl From<LocRot> for LocRotRecord {
    fn from(value: LocRot) -> Self {
        let q = value.rotation.coords;
        Self {
            location: [value.location.x, value.location.y, value.location.z],
            rotation: [q.x, q.y, q.z, q.w],
        }
    }
}

impl From<LocRotRecord> for LocRot {
    fn from(value: LocRotRecord) -> Self {
        let [x, y, z, w] = value.rotation;
        LocRot::new(
            Vector::from(value.location),
            Rotation::from_quaternion(nalgebra::Quaternion::new(w, x, y, z)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::{EPSILON, rotation_from_yaw_pitch_roll_degrees};
    use std::f64::consts::PI;

    fn quarter_turn_about_z() -> Rotation {
        Rotation::from_axis_angle(&Vector::z_axis(), PI / 2.0)
    }

    #[test]
    fn combine_rotates_relative_location_into_root_frame() {
        let root = LocRot::new(Vector::new(1.0, 0.0, 0.0), quarter_turn_about_z());
        let relative = LocRot::from_location(Vector::new(1.0, 0.0, 0.0));

        let combined = LocRot::combine(&root, &relative);

        assert!(approx_eq_vector(&combined.location, &Vector::new(1.0, 1.0, 0.0), EPSILON));
        assert!(approx_eq_rotation(&combined.rotation, &quarter_turn_about_z(), EPSILON));
    }

    #[test]
    fn combine_with_inverse_yields_identity() {
        let placement = LocRot::new(
            Vector::new(3.0, -2.0, 5.0),
            rotation_from_yaw_pitch_roll_degrees(10.0, 45.0, -30.0),
        );
        let identity = LocRot::combine(&placement, &placement.inverse());
        assert!(identity.approx_eq(&LocRot::identity(), EPSILON));
    }

    #[test]
    fn lerp_endpoints_match_inputs() {
        let a = LocRot::identity();
        let b = LocRot::new(Vector::new(2.0, 4.0, 6.0), quarter_turn_about_z());

        assert!(LocRot::lerp(&a, &b, 0.0).approx_eq(&a, EPSILON));
        assert!(LocRot::lerp(&a, &b, 1.0).approx_eq(&b, EPSILON));

        let mid = LocRot::lerp(&a, &b, 0.5);
        assert!(approx_eq_vector(&mid.location, &Vector::new(1.0, 2.0, 3.0), EPSILON));
    }

    #[test]
    fn state_is_mutated_in_place() {
        let mut state = LocRotState::default();
        state.set_location(Vector::new(1.0, 2.0, 3.0));
        state.translate(&Vector::new(1.0, 0.0, 0.0));
        assert_eq!(state.location(), Vector::new(2.0, 2.0, 3.0));

        state.set(&LocRot::identity());
        assert_eq!(state.snapshot(), LocRot::identity());
    }

    #[test]
    fn record_conversion_preserves_placement() {
        let placement = LocRot::new(
            Vector::new(0.5, 1.5, -2.0),
            rotation_from_yaw_pitch_roll_degrees(20.0, 0.0, 70.0),
        );
        let restored = LocRot::from(LocRotRecord::from(placement));
        assert!(restored.approx_eq(&placement, EPSILON));
    }
}
