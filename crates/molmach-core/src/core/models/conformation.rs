use super::collider::Collider;
use crate::core::color::Color;
use crate::core::geometry::Vector;
use crate::core::loc_rot::LocRot;

/// One named, immutable shape of an entity class.
#[derive(Debug, Clone, PartialEq)]
pub struct Conformation {
    id: String,
    atom_positions: Vec<Vector>,
    marker_loc_rots: Vec<LocRot>,
    collider: Collider,
    color: Color,
}

impl Conformation {
    pub fn new(
        id: impl Into<String>,
        atom_positions: Vec<Vector>,
        marker_loc_rots: Vec<LocRot>,
        collider: Collider,
        color: Color,
    ) -> Self {
        Self {
            id: id.into(),
            atom_positions,
            marker_loc_rots,
            collider,
            color,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn atom_positions(&self) -> &[Vector] {
        &self.atom_positions
    }

    pub fn marker_loc_rots(&self) -> &[LocRot] {
        &self.marker_loc_rots
    }

    pub fn collider(&self) -> &Collider {
        &self.collider
    }

    pub fn color(&self) -> Color {
        self.color
    }
}
