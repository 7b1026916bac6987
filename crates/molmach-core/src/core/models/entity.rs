use super::entity_class::EntityClass;
use super::ids::{CompoundId, StructureId};
use super::marker::{BindingSite, Marker, MarkerKind, Sensor};
use crate::core::loc_rot::{LocRot, LocRotState};
use std::sync::Arc;

/// An indivisible simulated unit.
///
/// Entities are owned by the environment's arena and referenced by [`super::ids::EntityId`].
/// The placement is written by the alignment pass of the entity's compound; everything that
/// relates this entity to others (binding-site peers, compound membership) is a handle.
#[derive(Debug)]
pub struct Entity {
    class: Arc<EntityClass>,
    serial: u64,
    structure: StructureId,
    pub(crate) binding_sites: Vec<BindingSite>,
    sensors: Vec<Sensor>,
    markers: Vec<Marker>,
    pub(crate) compound: Option<CompoundId>,
    pub(crate) loc_rot: LocRotState,
    pub(crate) disposed: bool,
}

impl Entity {
    /// Instantiates the marker layout of `class`, sorting markers into binding sites, sensors,
    /// and plain markers. The entity starts without a compound.
    pub fn new(class: Arc<EntityClass>, serial: u64, structure: StructureId) -> Self {
        let mut binding_sites = Vec::new();
        let mut sensors = Vec::new();
        let mut markers = Vec::new();

        for (index, marker_class) in class.markers().iter().enumerate() {
            let marker = Marker::new(marker_class.id(), index);
            match marker_class.kind() {
                MarkerKind::Plain => markers.push(marker),
                MarkerKind::BindingSite => binding_sites.push(BindingSite::new(marker)),
                MarkerKind::Sensor { range, aperture } => {
                    sensors.push(Sensor::new(marker, range, aperture))
                }
            }
        }

        Self {
            class,
            serial,
            structure,
            binding_sites,
            sensors,
            markers,
            compound: None,
            loc_rot: LocRotState::default(),
            disposed: false,
        }
    }

    pub fn class(&self) -> &Arc<EntityClass> {
        &self.class
    }

    pub fn class_id(&self) -> &str {
        self.class.id()
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn structure(&self) -> StructureId {
        self.structure
    }

    pub fn binding_sites(&self) -> &[BindingSite] {
        &self.binding_sites
    }

    pub fn binding_site(&self, index: usize) -> Option<&BindingSite> {
        self.binding_sites.get(index)
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn sensor(&self, index: usize) -> Option<&Sensor> {
        self.sensors.get(index)
    }

    /// Plain markers, i.e. markers that are neither binding sites nor sensors.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn binding_site_index(&self, id: &str) -> Option<usize> {
        self.binding_sites.iter().position(|s| s.id() == id)
    }

    pub fn sensor_index(&self, id: &str) -> Option<usize> {
        self.sensors.iter().position(|s| s.id() == id)
    }

    /// Index of any marker (plain, binding site, or sensor) in the class layout.
    pub fn marker_index(&self, id: &str) -> Option<usize> {
        self.class.marker_index(id)
    }

    pub fn compound(&self) -> Option<CompoundId> {
        self.compound
    }

    pub fn loc_rot(&self) -> LocRot {
        self.loc_rot.snapshot()
    }

    pub fn mass(&self) -> f64 {
        self.class.mass()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn has_free_binding_site(&self) -> bool {
        self.binding_sites.iter().any(BindingSite::is_free)
    }

    /// Short, human-readable identity: the class id followed by the serial in hex.
    pub fn diagnostic_id(&self) -> String {
        format!("{}({:x})", self.class.id(), self.serial)
    }
}
