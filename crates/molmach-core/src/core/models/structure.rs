//! Structure classes and the live structures that animate between their conformations.

use super::atom::Atom;
use super::conformation::Conformation;
use super::error::ModelError;
use crate::core::color::Color;
use crate::core::geometry::{Vector, ease_out_cubic, lerp_vector};
use crate::core::loc_rot::LocRot;
use std::collections::HashSet;
use std::sync::Arc;

/// The immutable shape template of an entity class: its atoms and an ordered, non-empty list
/// of conformations. The first conformation is the initial one.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityStructureClass {
    id: String,
    atoms: Vec<Atom>,
    conformations: Vec<Conformation>,
}

impl EntityStructureClass {
    /// Validates and creates a structure class.
    ///
    /// # Arguments
    ///
    /// * `id` - Identifier of the structure class, usually the entity class id.
    /// * `atoms` - The atoms shared by every conformation.
    /// * `conformations` - At least one conformation. Every conformation must position every
    ///   atom and must place the same number of markers as the first one.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NoConformations`], [`ModelError::AtomCountMismatch`],
    /// [`ModelError::MarkerCountMismatch`] or [`ModelError::DuplicateConformation`].
    pub fn new(
        id: impl Into<String>,
        atoms: Vec<Atom>,
        conformations: Vec<Conformation>,
    ) -> Result<Self, ModelError> {
        let id = id.into();
        let first = conformations
            .first()
            .ok_or_else(|| ModelError::NoConformations {
                structure_class: id.clone(),
            })?;
        let marker_count = first.marker_loc_rots().len();

        let mut seen = HashSet::new();
        for conformation in &conformations {
            if !seen.insert(conformation.id()) {
                return Err(ModelError::DuplicateConformation(
                    conformation.id().to_string(),
                ));
            }
            if conformation.atom_positions().len() != atoms.len() {
                return Err(ModelError::AtomCountMismatch {
                    conformation: conformation.id().to_string(),
                    expected: atoms.len(),
                    found: conformation.atom_positions().len(),
                });
            }
            if conformation.marker_loc_rots().len() != marker_count {
                return Err(ModelError::MarkerCountMismatch {
                    conformation: conformation.id().to_string(),
                    expected: marker_count,
                    found: conformation.marker_loc_rots().len(),
                });
            }
        }

        Ok(Self {
            id,
            atoms,
            conformations,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn conformations(&self) -> &[Conformation] {
        &self.conformations
    }

    pub fn initial_conformation(&self) -> &Conformation {
        &self.conformations[0]
    }

    pub fn conformation_index(&self, id: &str) -> Option<usize> {
        self.conformations.iter().position(|c| c.id() == id)
    }

    pub fn conformation_by_id(&self, id: &str) -> Option<&Conformation> {
        self.conformations.iter().find(|c| c.id() == id)
    }

    pub fn marker_count(&self) -> usize {
        self.initial_conformation().marker_loc_rots().len()
    }

    pub fn mass(&self) -> f64 {
        self.atoms.iter().map(Atom::mass).sum()
    }

    /// A class with a single conformation never animates, so all of its entities can share
    /// one structure instance.
    pub fn shares_structure(&self) -> bool {
        self.conformations.len() == 1
    }
}

#[derive(Debug, Clone)]
struct StructureFrame {
    atom_positions: Vec<Vector>,
    marker_loc_rots: Vec<LocRot>,
    color: Color,
}

impl StructureFrame {
    fn from_conformation(conformation: &Conformation) -> Self {
        Self {
            atom_positions: conformation.atom_positions().to_vec(),
            marker_loc_rots: conformation.marker_loc_rots().to_vec(),
            color: conformation.color(),
        }
    }
}

/// The live geometry of one entity (or of every entity of a class that shares its structure).
#[derive(Debug, Clone)]
pub struct EntityStructure {
    class: Arc<EntityStructureClass>,
    conformation: usize,
    current: StructureFrame,
    previous: StructureFrame,
    elapsed: f64,
    duration: f64,
    changing: bool,
    dirty: bool,
}

impl EntityStructure {
    pub fn new(class: Arc<EntityStructureClass>) -> Self {
        let frame = StructureFrame::from_conformation(class.initial_conformation());
        Self {
            class,
            conformation: 0,
            previous: frame.clone(),
            current: frame,
            elapsed: 0.0,
            duration: 0.0,
            changing: false,
            dirty: true,
        }
    }

    pub fn class(&self) -> &Arc<EntityStructureClass> {
        &self.class
    }

    /// The conformation being shown or interpolated towards.
    pub fn conformation(&self) -> &Conformation {
        &self.class.conformations()[self.conformation]
    }

    /// Starts interpolating towards another conformation.
    ///
    /// # Arguments
    ///
    /// * `id` - The target conformation. Setting the current conformation again does nothing.
    /// * `duration` - Interpolation time in simulated seconds. Zero or less completes on the
    ///   next update.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ConformationNotFound`] if the class has no such conformation.
    pub fn set_conformation(&mut self, id: &str, duration: f64) -> Result<(), ModelError> {
        let target = self
            .class
            .conformation_index(id)
            .ok_or_else(|| ModelError::ConformationNotFound {
                structure_class: self.class.id().to_string(),
                conformation: id.to_string(),
            })?;

        if target == self.conformation {
            return Ok(());
        }

        self.previous = self.current.clone();
        self.conformation = target;
        self.elapsed = 0.0;
        self.duration = duration;
        self.changing = true;
        self.dirty = true;
        Ok(())
    }

    /// Advances the interpolation by `dt` simulated seconds.
    pub fn update(&mut self, dt: f64) {
        if !self.changing {
            return;
        }
        self.dirty = true;
        self.elapsed += dt;

        let progress = if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        };

        let class = Arc::clone(&self.class);
        let target = &class.conformations()[self.conformation];

        if progress >= 1.0 {
            self.current = StructureFrame::from_conformation(target);
            self.changing = false;
            return;
        }

        let f = ease_out_cubic(progress);
        for (current, (from, to)) in self.current.atom_positions.iter_mut().zip(
            self.previous
                .atom_positions
                .iter()
                .zip(target.atom_positions()),
        ) {
            *current = lerp_vector(from, to, f);
        }
        for (current, (from, to)) in self.current.marker_loc_rots.iter_mut().zip(
            self.previous
                .marker_loc_rots
                .iter()
                .zip(target.marker_loc_rots()),
        ) {
            *current = LocRot::lerp(from, to, f);
        }
        self.current.color = Color::lerp(&self.previous.color, &target.color(), f);
    }

    pub fn is_changing(&self) -> bool {
        self.changing
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether the structure changed since the last poll and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Runs `action` only if the structure changed since the last poll, then clears the flag.
    pub fn execute_if_dirty(&mut self, action: impl FnOnce(&EntityStructure)) {
        if self.take_dirty() {
            action(self);
        }
    }

    pub fn atom_positions(&self) -> &[Vector] {
        &self.current.atom_positions
    }

    pub fn marker_loc_rots(&self) -> &[LocRot] {
        &self.current.marker_loc_rots
    }

    pub fn marker_loc_rot(&self, index: usize) -> Option<&LocRot> {
        self.current.marker_loc_rots.get(index)
    }

    pub fn color(&self) -> Color {
        self.current.color
    }
}
