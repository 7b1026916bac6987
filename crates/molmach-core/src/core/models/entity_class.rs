use super::error::ModelError;
use super::marker::MarkerClass;
use super::structure::EntityStructureClass;
use std::collections::HashSet;
use std::sync::Arc;

pub const DEFAULT_BEHAVIOR_ID: &str = "present.empty";

/// The immutable definition every entity of a kind is instantiated from.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityClass {
    id: String,
    structure_class: Arc<EntityStructureClass>,
    behavior_id: String,
    markers: Vec<MarkerClass>,
}

impl EntityClass {
    /// Validates and creates an entity class.
    ///
    /// Every conformation of `structure_class` must provide exactly one placement per marker,
    /// and marker ids must be unique.
    pub fn new(
        id: impl Into<String>,
        structure_class: Arc<EntityStructureClass>,
        behavior_id: impl Into<String>,
        markers: Vec<MarkerClass>,
    ) -> Result<Self, ModelError> {
        let mut seen = HashSet::new();
        for marker in &markers {
            if !seen.insert(marker.id()) {
                return Err(ModelError::DuplicateMarker(marker.id().to_string()));
            }
        }

        for conformation in structure_class.conformations() {
            if conformation.marker_loc_rots().len() != markers.len() {
                return Err(ModelError::MarkerCountMismatch {
                    conformation: conformation.id().to_string(),
                    expected: markers.len(),
                    found: conformation.marker_loc_rots().len(),
                });
            }
        }

        Ok(Self {
            id: id.into(),
            structure_class,
            behavior_id: behavior_id.into(),
            markers,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn structure_class(&self) -> &Arc<EntityStructureClass> {
        &self.structure_class
    }

    pub fn behavior_id(&self) -> &str {
        &self.behavior_id
    }

    pub fn markers(&self) -> &[MarkerClass] {
        &self.markers
    }

    pub fn marker_index(&self, id: &str) -> Option<usize> {
        self.markers.iter().position(|m| m.id() == id)
    }

    pub fn mass(&self) -> f64 {
        self.structure_class.mass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::color::Color;
    use crate::core::geometry::Vector;
    use crate::core::loc_rot::LocRot;
    use crate::core::models::atom::Atom;
    use crate::core::models::collider::Collider;
    use crate::core::models::conformation::Conformation;

    fn structure_with_markers(count: usize) -> Arc<EntityStructureClass> {
        Arc::new(
            EntityStructureClass::new(
                "s",
                vec![Atom::from_symbol("N").unwrap()],
                vec![Conformation::new(
                    "default",
                    vec![Vector::zeros()],
                    vec![LocRot::identity(); count],
                    Collider::empty(),
                    Color::WHITE,
                )],
            )
            .unwrap(),
        )
    }

    #[test]
    fn marker_placements_must_match_marker_layout() {
        let result = EntityClass::new(
            "e",
            structure_with_markers(1),
            DEFAULT_BEHAVIOR_ID,
            vec![MarkerClass::binding_site("a"), MarkerClass::plain("b")],
        );
        assert!(matches!(
            result,
            Err(ModelError::MarkerCountMismatch { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn marker_ids_must_be_unique() {
        let result = EntityClass::new(
            "e",
            structure_with_markers(2),
            DEFAULT_BEHAVIOR_ID,
            vec![MarkerClass::binding_site("a"), MarkerClass::plain("a")],
        );
        assert_eq!(result, Err(ModelError::DuplicateMarker("a".to_string())));
    }

    #[test]
    fn marker_index_resolves_by_id() {
        let class = EntityClass::new(
            "e",
            structure_with_markers(2),
            DEFAULT_BEHAVIOR_ID,
            vec![MarkerClass::binding_site("a"), MarkerClass::plain("b")],
        )
        .unwrap();
        assert_eq!(class.marker_index("b"), Some(1));
        assert_eq!(class.marker_index("z"), None);
        assert!((class.mass() - 14.007).abs() < 1e-9);
    }
}
