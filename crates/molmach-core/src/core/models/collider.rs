use crate::core::geometry::Vector;

#[derive(Debug, Clone, PartialEq)]
pub enum ColliderGeometry {
    Sphere { center: Vector, radius: f64 },
}

/// Collision geometry of one conformation, in entity-local space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collider {
    geometries: Vec<ColliderGeometry>,
}

impl Collider {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(geometries: Vec<ColliderGeometry>) -> Self {
        Self { geometries }
    }

    pub fn sphere(center: Vector, radius: f64) -> Self {
        Self::new(vec![ColliderGeometry::Sphere { center, radius }])
    }

    /// The smallest sphere centered on the centroid of `positions` that contains all of them.
    pub fn bounding_sphere(positions: &[Vector]) -> Self {
        if positions.is_empty() {
            return Self::empty();
        }

        let center = positions.iter().sum::<Vector>() / positions.len() as f64;
        let radius = positions
            .iter()
            .map(|p| (p - center).norm())
            .fold(0.0, f64::max);

        Self::sphere(center, radius)
    }

    pub fn translated(&self, offset: &Vector) -> Self {
        Self::new(
            self.geometries
                .iter()
                .map(|geometry| match geometry {
                    ColliderGeometry::Sphere { center, radius } => ColliderGeometry::Sphere {
                        center: center + offset,
                        radius: *radius,
                    },
                })
                .collect(),
        )
    }

    pub fn geometries(&self) -> &[ColliderGeometry] {
        &self.geometries
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_sphere_centers_on_centroid() {
        let positions = [Vector::new(-1.0, 0.0, 0.0), Vector::new(3.0, 0.0, 0.0)];
        let collider = Collider::bounding_sphere(&positions);
        assert_eq!(
            collider.geometries(),
            &[ColliderGeometry::Sphere {
                center: Vector::new(1.0, 0.0, 0.0),
                radius: 2.0
            }]
        );
    }

    #[test]
    fn bounding_sphere_of_nothing_is_empty() {
        assert!(Collider::bounding_sphere(&[]).is_empty());
    }
}
