use crate::core::geometry::Vector;
use rand::Rng;

/// An axis-aligned box that bounds floating compounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Compartment {
    id: String,
    min: Vector,
    max: Vector,
}

impl Compartment {
    /// Creates a compartment from two opposite corners given in any order.
    pub fn new(id: impl Into<String>, corner_a: Vector, corner_b: Vector) -> Self {
        Self {
            id: id.into(),
            min: corner_a.inf(&corner_b),
            max: corner_a.sup(&corner_b),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn min(&self) -> Vector {
        self.min
    }

    pub fn max(&self) -> Vector {
        self.max
    }

    pub fn center(&self) -> Vector {
        (self.min + self.max) / 2.0
    }

    pub fn size(&self) -> Vector {
        self.max - self.min
    }

    pub fn contains(&self, point: &Vector) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }

    /// Clamps `point` into the box. Points already inside are returned unchanged.
    pub fn nearest_point(&self, point: &Vector) -> Vector {
        point.sup(&self.min).inf(&self.max)
    }

    /// Distance from `point` to the box; zero inside.
    pub fn distance(&self, point: &Vector) -> f64 {
        (point - self.nearest_point(point)).norm()
    }

    pub fn random_point_inside<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector {
        let mut point = self.min;
        for i in 0..3 {
            if self.max[i] > self.min[i] {
                point[i] = rng.gen_range(self.min[i]..self.max[i]);
            }
        }
        point
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn unit_box() -> Compartment {
        Compartment::new("cell", Vector::new(1.0, 1.0, 1.0), Vector::new(-1.0, -1.0, -1.0))
    }

    #[test]
    fn corners_are_normalized() {
        let c = unit_box();
        assert_eq!(c.min(), Vector::new(-1.0, -1.0, -1.0));
        assert_eq!(c.max(), Vector::new(1.0, 1.0, 1.0));
        assert_eq!(c.center(), Vector::zeros());
    }

    #[test]
    fn distance_is_zero_inside_and_positive_outside() {
        let c = unit_box();
        assert_eq!(c.distance(&Vector::new(0.5, 0.0, 0.0)), 0.0);
        assert!((c.distance(&Vector::new(4.0, 0.0, 0.0)) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn nearest_point_clamps_each_axis() {
        let c = unit_box();
        assert_eq!(
            c.nearest_point(&Vector::new(5.0, -5.0, 0.25)),
            Vector::new(1.0, -1.0, 0.25)
        );
    }

    #[test]
    fn random_points_lie_inside() {
        let c = unit_box();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..64 {
            assert!(c.contains(&c.random_point_inside(&mut rng)));
        }
    }
}
