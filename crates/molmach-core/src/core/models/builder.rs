use super::atom::Atom;
use super::collider::Collider;
use super::conformation::Conformation;
use super::entity_class::{DEFAULT_BEHAVIOR_ID, EntityClass};
use super::error::ModelError;
use super::marker::MarkerClass;
use super::structure::EntityStructureClass;
use crate::core::color::Color;
use crate::core::geometry::{Vector, lerp_vector};
use crate::core::loc_rot::LocRot;
use std::sync::Arc;

const DEFAULT_CONFORMATION_ID: &str = "default";

#[derive(Debug, Clone)]
pub struct ConformationBuilder {
    id: String,
    atoms: Vec<(String, Vector)>,
    marker_loc_rots: Vec<LocRot>,
    collider: Option<Collider>,
    color: Color,
}

impl ConformationBuilder {
    fn new(id: &str, color: Color, marker_loc_rots: Vec<LocRot>) -> Self {
        Self {
            id: id.to_string(),
            atoms: Vec::new(),
            marker_loc_rots,
            collider: None,
            color,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    fn positions(&self) -> Vec<Vector> {
        self.atoms.iter().map(|(_, position)| *position).collect()
    }

    fn to_conformation(&self) -> Conformation {
        let positions = self.positions();
        let collider = self
            .collider
            .clone()
            .unwrap_or_else(|| Collider::bounding_sphere(&positions));
        Conformation::new(
            self.id.clone(),
            positions,
            self.marker_loc_rots.clone(),
            collider,
            self.color,
        )
    }
}

/// Incrementally assembles an [`EntityClass`].
///
/// Operations apply to the current conformation, which is selected with
/// [`EntityClassBuilder::set_conformation`] and defaults to `"default"`. A marker is placed in
/// every conformation when it is first defined; defining it again only moves it in the current
/// conformation. New conformations start with the marker placements of the first one.
#[derive(Debug, Clone)]
pub struct EntityClassBuilder {
    id: String,
    behavior_id: String,
    default_color: Color,
    markers: Vec<MarkerClass>,
    conformations: Vec<ConformationBuilder>,
    current: Option<usize>,
}

impl EntityClassBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            behavior_id: DEFAULT_BEHAVIOR_ID.to_string(),
            default_color: Color::WHITE,
            markers: Vec::new(),
            conformations: Vec::new(),
            current: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn behavior(&mut self, behavior_id: impl Into<String>) -> &mut Self {
        self.behavior_id = behavior_id.into();
        self
    }

    /// Color given to conformations created after this call.
    pub fn default_color(&mut self, color: Color) -> &mut Self {
        self.default_color = color;
        self
    }

    pub fn conformations(&self) -> &[ConformationBuilder] {
        &self.conformations
    }

    /// Selects a conformation, creating it if needed.
    pub fn set_conformation(&mut self, id: &str) -> &mut Self {
        let index = match self.find_conformation(id) {
            Some(index) => index,
            None => {
                let markers = self
                    .conformations
                    .first()
                    .map(|c| c.marker_loc_rots.clone())
                    .unwrap_or_default();
                self.conformations
                    .push(ConformationBuilder::new(id, self.default_color, markers));
                self.conformations.len() - 1
            }
        };
        self.current = Some(index);
        self
    }

    fn find_conformation(&self, id: &str) -> Option<usize> {
        self.conformations.iter().position(|c| c.id == id)
    }

    fn current_index(&mut self) -> usize {
        match self.current {
            Some(index) => index,
            None => {
                self.set_conformation(DEFAULT_CONFORMATION_ID);
                self.conformations.len() - 1
            }
        }
    }

    fn current_mut(&mut self) -> &mut ConformationBuilder {
        let index = self.current_index();
        &mut self.conformations[index]
    }

    pub fn color(&mut self, color: Color) -> &mut Self {
        self.current_mut().color = color;
        self
    }

    /// Overrides the generated bounding-sphere collider of the current conformation.
    pub fn collider(&mut self, collider: Collider) -> &mut Self {
        self.current_mut().collider = Some(collider);
        self
    }

    pub fn add_atom(&mut self, symbol: &str, position: Vector) -> &mut Self {
        self.current_mut().atoms.push((symbol.to_string(), position));
        self
    }

    pub fn add_atoms<I, S>(&mut self, atoms: I) -> &mut Self
    where
        I: IntoIterator<Item = (S, Vector)>,
        S: AsRef<str>,
    {
        for (symbol, position) in atoms {
            self.add_atom(symbol.as_ref(), position);
        }
        self
    }

    pub fn marker(&mut self, id: &str, loc_rot: LocRot) -> &mut Self {
        self.place_marker(MarkerClass::plain(id), loc_rot)
    }

    pub fn binding_site(&mut self, id: &str, loc_rot: LocRot) -> &mut Self {
        self.place_marker(MarkerClass::binding_site(id), loc_rot)
    }

    /// Defines a sensor. `aperture` is the full opening angle in radians.
    pub fn sensor(
        &mut self,
        id: &str,
        loc_rot: LocRot,
        range: f64,
        aperture: f64,
    ) -> Result<&mut Self, ModelError> {
        let class = MarkerClass::sensor(id, range, aperture)?;
        Ok(self.place_marker(class, loc_rot))
    }

    fn place_marker(&mut self, class: MarkerClass, loc_rot: LocRot) -> &mut Self {
        match self.markers.iter().position(|m| m.id() == class.id()) {
            Some(index) => {
                self.current_mut().marker_loc_rots[index] = loc_rot;
            }
            None => {
                self.markers.push(class);
                self.current_index();
                for conformation in &mut self.conformations {
                    conformation.marker_loc_rots.push(loc_rot);
                }
            }
        }
        self
    }

    /// Inserts a conformation part-way between two existing ones.
    ///
    /// # Arguments
    ///
    /// * `index` - Position of the new conformation in the conformation list (clamped).
    /// * `new_id` - Id of the new conformation; must not exist yet.
    /// * `start_id`, `end_id` - The conformations to interpolate between.
    /// * `progress` - `0.0` reproduces the start, `1.0` the end.
    ///
    /// Colliders are regenerated from the interpolated atoms.
    pub fn interpolate_conformation(
        &mut self,
        index: usize,
        new_id: &str,
        start_id: &str,
        end_id: &str,
        progress: f64,
    ) -> Result<&mut Self, ModelError> {
        if self.find_conformation(new_id).is_some() {
            return Err(ModelError::DuplicateConformation(new_id.to_string()));
        }
        let start = &self.conformations[self.require_conformation(start_id)?];
        let end = &self.conformations[self.require_conformation(end_id)?];

        if start.atoms.len() != end.atoms.len() {
            return Err(ModelError::AtomCountMismatch {
                conformation: end.id.clone(),
                expected: start.atoms.len(),
                found: end.atoms.len(),
            });
        }
        if start.marker_loc_rots.len() != end.marker_loc_rots.len() {
            return Err(ModelError::MarkerCountMismatch {
                conformation: end.id.clone(),
                expected: start.marker_loc_rots.len(),
                found: end.marker_loc_rots.len(),
            });
        }

        let mut conformation = ConformationBuilder::new(
            new_id,
            Color::lerp(&start.color, &end.color, progress),
            start
                .marker_loc_rots
                .iter()
                .zip(&end.marker_loc_rots)
                .map(|(a, b)| LocRot::lerp(a, b, progress))
                .collect(),
        );
        conformation.atoms = start
            .atoms
            .iter()
            .zip(&end.atoms)
            .map(|((symbol, a), (_, b))| (symbol.clone(), lerp_vector(a, b, progress)))
            .collect();

        let index = index.min(self.conformations.len());
        self.conformations.insert(index, conformation);
        if let Some(current) = self.current {
            if current >= index {
                self.current = Some(current + 1);
            }
        }
        Ok(self)
    }

    fn require_conformation(&self, id: &str) -> Result<usize, ModelError> {
        self.find_conformation(id)
            .ok_or_else(|| ModelError::ConformationNotFound {
                structure_class: self.id.clone(),
                conformation: id.to_string(),
            })
    }

    /// Moves `origin` to the local origin in every conformation.
    pub fn set_origin(&mut self, origin: Vector) -> &mut Self {
        for conformation in &mut self.conformations {
            for (_, position) in &mut conformation.atoms {
                *position -= origin;
            }
            for loc_rot in &mut conformation.marker_loc_rots {
                loc_rot.location -= origin;
            }
            if let Some(collider) = &conformation.collider {
                conformation.collider = Some(collider.translated(&-origin));
            }
        }
        self
    }

    /// Validates the accumulated definition and produces the entity class.
    ///
    /// The atom list is taken from the first conformation; every other conformation must
    /// position the same number of atoms.
    pub fn build(&self) -> Result<EntityClass, ModelError> {
        let atoms = match self.conformations.first() {
            Some(first) => first
                .atoms
                .iter()
                .map(|(symbol, _)| Atom::from_symbol(symbol))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let conformations = self
            .conformations
            .iter()
            .map(ConformationBuilder::to_conformation)
            .collect();

        let structure_class = EntityStructureClass::new(self.id.clone(), atoms, conformations)?;

        EntityClass::new(
            self.id.clone(),
            Arc::new(structure_class),
            self.behavior_id.clone(),
            self.markers.clone(),
        )
    }
}
