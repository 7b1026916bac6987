use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use rand::Rng;
use std::f64::consts::{PI, TAU};

pub type Vector = Vector3<f64>;
pub type Rotation = UnitQuaternion<f64>;

/// Tolerance used by the approximate comparisons in this crate.
pub const EPSILON: f64 = 1e-6;

/// The local axis along which a binding site points.
pub fn binding_vector() -> Vector {
    Vector::y()
}

/// The relative rotation between two bound sites: a half turn about +Z, which maps the
/// binding vector of one site onto the reversed binding vector of its peer.
pub fn binding_rotation() -> Rotation {
    Rotation::from_axis_angle(&Vector::z_axis(), PI)
}

pub fn lerp_vector(a: &Vector, b: &Vector, t: f64) -> Vector {
    a.lerp(b, t)
}

/// Spherical interpolation that never panics.
///
/// nalgebra refuses to slerp between (nearly) coincident quaternions whose angle is too small
/// to normalize; in that case a normalized linear interpolation gives the same result.
pub fn slerp_rotation(a: &Rotation, b: &Rotation, t: f64) -> Rotation {
    a.try_slerp(b, t, 1e-12).unwrap_or_else(|| a.nlerp(b, t))
}

pub fn approx_eq_vector(a: &Vector, b: &Vector, epsilon: f64) -> bool {
    (a - b).norm() <= epsilon
}

/// Compares two rotations, treating `q` and `-q` as the same rotation.
pub fn approx_eq_rotation(a: &Rotation, b: &Rotation, epsilon: f64) -> bool {
    a.coords.dot(&b.coords).abs() >= 1.0 - epsilon
}

/// Ease-out cubic remap of a progress value: `1 - (1 - p)^3`.
pub fn ease_out_cubic(p: f64) -> f64 {
    let inv = 1.0 - p;
    1.0 - inv * inv * inv
}

/// Builds a rotation from yaw (about Y), pitch (about X) and roll (about Z), in degrees.
/// Roll is applied first, then pitch, then yaw.
pub fn rotation_from_yaw_pitch_roll_degrees(yaw: f64, pitch: f64, roll: f64) -> Rotation {
    Rotation::from_axis_angle(&Vector::y_axis(), yaw.to_radians())
        * Rotation::from_axis_angle(&Vector::x_axis(), pitch.to_radians())
        * Rotation::from_axis_angle(&Vector::z_axis(), roll.to_radians())
}

pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vector {
    let z: f64 = rng.gen_range(-1.0..=1.0);
    let theta: f64 = rng.gen_range(0.0..TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vector::new(r * theta.cos(), r * theta.sin(), z)
}

/// Uniformly distributed random rotation (Shoemake's method).
pub fn random_rotation<R: Rng + ?Sized>(rng: &mut R) -> Rotation {
    let u1: f64 = rng.gen_range(0.0..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    let u3: f64 = rng.gen_range(0.0..1.0);

    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    let (x, y) = (a * (TAU * u2).sin(), a * (TAU * u2).cos());
    let (z, w) = (b * (TAU * u3).sin(), b * (TAU * u3).cos());

    Rotation::from_quaternion(Quaternion::new(w, x, y, z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn binding_rotation_reverses_binding_vector() {
        let flipped = binding_rotation() * binding_vector();
        assert!(approx_eq_vector(&flipped, &-binding_vector(), EPSILON));
    }

    #[test]
    fn ease_out_cubic_hits_both_ends_exactly() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn slerp_rotation_handles_identical_inputs() {
        let q = rotation_from_yaw_pitch_roll_degrees(30.0, 0.0, 0.0);
        let r = slerp_rotation(&q, &q, 0.5);
        assert!(approx_eq_rotation(&q, &r, EPSILON));
    }

    #[test]
    fn slerp_rotation_halfway_between_quarter_turns() {
        let a = Rotation::identity();
        let b = Rotation::from_axis_angle(&Vector::z_axis(), PI / 2.0);
        let half = slerp_rotation(&a, &b, 0.5);
        let expected = Rotation::from_axis_angle(&Vector::z_axis(), PI / 4.0);
        assert!(approx_eq_rotation(&half, &expected, EPSILON));
    }

    #[test]
    fn approx_eq_rotation_treats_negated_quaternion_as_equal() {
        let q = rotation_from_yaw_pitch_roll_degrees(10.0, 20.0, 30.0);
        let negated = Rotation::new_unchecked(-q.into_inner());
        assert!(approx_eq_rotation(&q, &negated, EPSILON));
    }

    #[test]
    fn yaw_rotates_about_y_axis() {
        let q = rotation_from_yaw_pitch_roll_degrees(90.0, 0.0, 0.0);
        let rotated = q * Vector::x();
        assert!(approx_eq_vector(&rotated, &-Vector::z(), EPSILON));
    }

    #[test]
    fn random_samples_are_normalized_and_reproducible() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..32 {
            let v = random_unit_vector(&mut a);
            assert!((v.norm() - 1.0).abs() < 1e-9);
            assert_eq!(v, random_unit_vector(&mut b));

            let q = random_rotation(&mut a);
            assert!((q.into_inner().norm() - 1.0).abs() < 1e-9);
            assert_eq!(q, random_rotation(&mut b));
        }
    }
}
