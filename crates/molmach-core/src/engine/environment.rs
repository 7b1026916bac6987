//! The environment: owner of the simulated population and driver of the per-tick update.

use super::clock::SimTimer;
use super::compound::Compound;
use super::concentration::{ConcentrationController, EntityFactoryRegistry};
use super::config::SimulationConfig;
use super::error::EngineError;
use crate::behaviors::behavior::{BehaviorContext, BehaviorInit, EntityBehavior};
use crate::behaviors::registry::BehaviorRegistry;
use crate::core::iterate_list::IterateList;
use crate::core::library::EntityClassLibrary;
use crate::core::loc_rot::LocRot;
use crate::core::models::compartment::Compartment;
use crate::core::models::entity::Entity;
use crate::core::models::entity_class::EntityClass;
use crate::core::models::ids::{CompoundId, EntityId, StructureId};
use crate::core::models::marker::{BindingState, SiteRef};
use crate::core::models::structure::EntityStructure;
use rand::SeedableRng;
use rand::rngs::StdRng;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, trace};

/// The authoritative collection of entity classes, entities, structures, and compounds.
///
/// `Environment` is the only component allowed to create entities and compounds or to reset
/// the population. [`Environment::update`] runs one simulated tick in a fixed order:
/// concentration controllers, structures, entities (behaviors), then compounds (alignment and
/// spatial links). Disposed entities and compounds stay addressable until the pass that visits
/// them removes them.
pub struct Environment {
    config: SimulationConfig,
    pub(crate) rng: StdRng,
    time: SimTimer,
    next_serial: u64,

    entity_classes: HashMap<String, Arc<EntityClass>>,
    entity_class_order: Vec<String>,

    pub(crate) entities: SlotMap<EntityId, Entity>,
    pub(crate) entity_order: IterateList<EntityId>,
    pub(crate) behaviors: SecondaryMap<EntityId, Box<dyn EntityBehavior>>,
    behavior_registry: BehaviorRegistry,

    pub(crate) structures: SlotMap<StructureId, EntityStructure>,
    shared_structures: HashMap<String, StructureId>,

    pub(crate) compounds: SlotMap<CompoundId, Compound>,
    pub(crate) compound_order: IterateList<CompoundId>,

    compartments: Vec<Compartment>,
    controllers: Vec<ConcentrationController>,
    factory_registry: EntityFactoryRegistry,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl Environment {
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_registries(
            config,
            BehaviorRegistry::with_presets(),
            EntityFactoryRegistry::with_presets(),
        )
    }

    pub fn with_registries(
        config: SimulationConfig,
        behavior_registry: BehaviorRegistry,
        factory_registry: EntityFactoryRegistry,
    ) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            time: SimTimer::new(),
            next_serial: 0,
            entity_classes: HashMap::new(),
            entity_class_order: Vec::new(),
            entities: SlotMap::with_key(),
            entity_order: IterateList::new(),
            behaviors: SecondaryMap::new(),
            behavior_registry,
            structures: SlotMap::with_key(),
            shared_structures: HashMap::new(),
            compounds: SlotMap::with_key(),
            compound_order: IterateList::new(),
            compartments: Vec::new(),
            controllers: Vec::new(),
            factory_registry,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulated seconds since creation or the last [`Environment::reset`].
    pub fn time(&self) -> f64 {
        self.time.elapsed()
    }

    pub fn behavior_registry_mut(&mut self) -> &mut BehaviorRegistry {
        &mut self.behavior_registry
    }

    pub fn factory_registry_mut(&mut self) -> &mut EntityFactoryRegistry {
        &mut self.factory_registry
    }

    // --- Entity classes ---

    /// Registers an entity class. Classes with a single conformation get one structure shared
    /// by all of their entities.
    pub fn add_entity_class(
        &mut self,
        class: impl Into<Arc<EntityClass>>,
    ) -> Result<Arc<EntityClass>, EngineError> {
        let class = class.into();
        let id = class.id().to_string();
        if self.entity_classes.contains_key(&id) {
            return Err(EngineError::DuplicateEntityClass(id));
        }

        if class.structure_class().shares_structure() {
            let structure = self.structures.insert(EntityStructure::new(Arc::clone(
                class.structure_class(),
            )));
            self.shared_structures.insert(id.clone(), structure);
        }

        info!(
            entity_class = %id,
            conformations = class.structure_class().conformations().len(),
            markers = class.markers().len(),
            "Registered entity class"
        );
        self.entity_classes.insert(id.clone(), Arc::clone(&class));
        self.entity_class_order.push(id);
        Ok(class)
    }

    pub fn add_entity_classes(&mut self, library: &EntityClassLibrary) -> Result<(), EngineError> {
        for class in library.iter() {
            self.add_entity_class(Arc::clone(class))?;
        }
        Ok(())
    }

    pub fn entity_class(&self, id: &str) -> Option<&Arc<EntityClass>> {
        self.entity_classes.get(id)
    }

    /// Registered classes in registration order.
    pub fn entity_classes(&self) -> impl Iterator<Item = &Arc<EntityClass>> {
        self.entity_class_order
            .iter()
            .filter_map(|id| self.entity_classes.get(id))
    }

    // --- Entities ---

    /// Instantiates an entity of a registered class in a compound of its own.
    ///
    /// # Arguments
    ///
    /// * `class_id` - The entity class to instantiate.
    /// * `float_at_origin` - If `true`, the new compound starts floating at the origin;
    ///   otherwise its spatial link stays undefined until the caller picks one.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EntityClassNotFound`] for unknown classes, or any error of the
    /// class's behavior factory.
    pub fn add_entity(
        &mut self,
        class_id: &str,
        float_at_origin: bool,
    ) -> Result<EntityId, EngineError> {
        let class = self
            .entity_classes
            .get(class_id)
            .cloned()
            .ok_or_else(|| EngineError::EntityClassNotFound(class_id.to_string()))?;

        let structure = match self.shared_structures.get(class_id) {
            Some(&shared) => shared,
            None => self.structures.insert(EntityStructure::new(Arc::clone(
                class.structure_class(),
            ))),
        };

        let serial = self.next_serial;
        self.next_serial += 1;

        let id = self
            .entities
            .insert(Entity::new(Arc::clone(&class), serial, structure));
        self.entity_order.push(id);

        let behavior = {
            let init = BehaviorInit::new(id, &self.entities[id], &self.config);
            self.behavior_registry.create(class.behavior_id(), &init)
        };
        match behavior {
            Ok(behavior) => {
                self.behaviors.insert(id, behavior);
            }
            Err(e) => {
                self.entity_order.remove(&id);
                self.purge_entity(id);
                return Err(e);
            }
        }

        let compound = self.create_compound(id)?;
        if float_at_origin {
            self.float_at(compound, LocRot::identity())?;
        }

        debug!(entity = %self.entities[id].diagnostic_id(), "Added entity");
        Ok(id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub(crate) fn require_entity(&self, id: EntityId) -> Result<&Entity, EngineError> {
        self.entities.get(id).ok_or(EngineError::EntityNotFound(id))
    }

    pub(crate) fn require_entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, EngineError> {
        self.entities.get_mut(id).ok_or(EngineError::EntityNotFound(id))
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.get(id).is_some_and(|e| !e.is_disposed())
    }

    /// Live (not disposed) entities in creation order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entity_order.iter().filter_map(|id| {
            self.entities
                .get(id)
                .filter(|e| !e.is_disposed())
                .map(|e| (id, e))
        })
    }

    pub fn entity_count(&self) -> usize {
        self.entities().count()
    }

    /// The entity's absolute placement as of the last alignment.
    pub fn entity_loc_rot(&self, id: EntityId) -> Result<LocRot, EngineError> {
        Ok(self.require_entity(id)?.loc_rot())
    }

    pub fn behavior(&self, id: EntityId) -> Option<&dyn EntityBehavior> {
        self.behaviors.get(id).map(|b| b.as_ref())
    }

    /// Disposes an entity: its behavior is disposed, every bond is released (ejecting the
    /// freed neighbors as floating compounds), and its now entity-less compound is disposed.
    /// Disposing twice is a no-op.
    pub fn dispose_entity(&mut self, id: EntityId) -> Result<(), EngineError> {
        let entity = self.require_entity(id)?;
        if entity.is_disposed() {
            return Ok(());
        }
        let site_count = entity.binding_sites().len();

        if let Some(mut behavior) = self.behaviors.remove(id) {
            behavior.dispose();
        }

        for site in 0..site_count {
            self.release_bond(SiteRef::new(id, site))?;
        }

        if let Some(compound) = self.require_entity(id)?.compound() {
            self.dispose_compound(compound)?;
        }

        let entity = self.require_entity_mut(id)?;
        entity.disposed = true;
        debug!(entity = %entity.diagnostic_id(), "Disposed entity");
        Ok(())
    }

    fn purge_entity(&mut self, id: EntityId) {
        self.behaviors.remove(id);
        if let Some(entity) = self.entities.remove(id) {
            let shared = self.shared_structures.get(entity.class_id()) == Some(&entity.structure());
            if !shared {
                self.structures.remove(entity.structure());
            }
            trace!(entity = %entity.diagnostic_id(), "Purged entity");
        }
    }

    // --- Structures and marker placements ---

    pub fn structure(&self, entity: EntityId) -> Option<&EntityStructure> {
        self.entities
            .get(entity)
            .and_then(|e| self.structures.get(e.structure()))
    }

    /// Mutable access for consumers that poll and clear the dirty flag.
    pub fn structure_mut(&mut self, entity: EntityId) -> Option<&mut EntityStructure> {
        let structure = self.entities.get(entity)?.structure();
        self.structures.get_mut(structure)
    }

    /// Starts interpolating an entity towards a conformation over the configured default
    /// duration.
    pub fn set_conformation(&mut self, entity: EntityId, conformation: &str) -> Result<(), EngineError> {
        let duration = self.config.default_conformation_duration;
        self.set_conformation_with_duration(entity, conformation, duration)
    }

    pub fn set_conformation_with_duration(
        &mut self,
        entity: EntityId,
        conformation: &str,
        duration: f64,
    ) -> Result<(), EngineError> {
        let structure = self.require_entity(entity)?.structure();
        self.structures
            .get_mut(structure)
            .ok_or_else(|| {
                EngineError::InvariantViolation(format!("entity {:?} has no structure", entity))
            })?
            .set_conformation(conformation, duration)?;
        Ok(())
    }

    /// A marker's placement in the entity's local frame, following the current conformation.
    pub fn marker_local_loc_rot(&self, entity: EntityId, marker: usize) -> Result<LocRot, EngineError> {
        let e = self.require_entity(entity)?;
        self.structures
            .get(e.structure())
            .and_then(|s| s.marker_loc_rot(marker))
            .copied()
            .ok_or_else(|| EngineError::MarkerNotFound {
                entity: e.diagnostic_id(),
                marker: format!("#{}", marker),
            })
    }

    /// A marker's absolute placement.
    pub fn marker_loc_rot(&self, entity: EntityId, marker: usize) -> Result<LocRot, EngineError> {
        let local = self.marker_local_loc_rot(entity, marker)?;
        Ok(LocRot::combine(&self.require_entity(entity)?.loc_rot(), &local))
    }

    pub fn marker_index(&self, entity: EntityId, id: &str) -> Result<usize, EngineError> {
        let e = self.require_entity(entity)?;
        e.marker_index(id).ok_or_else(|| EngineError::MarkerNotFound {
            entity: e.diagnostic_id(),
            marker: id.to_string(),
        })
    }

    pub fn binding_site_ref(&self, entity: EntityId, id: &str) -> Result<SiteRef, EngineError> {
        let e = self.require_entity(entity)?;
        e.binding_site_index(id)
            .map(|site| SiteRef::new(entity, site))
            .ok_or_else(|| EngineError::BindingSiteNotFound {
                entity: e.diagnostic_id(),
                site: id.to_string(),
            })
    }

    pub fn sensor_index(&self, entity: EntityId, id: &str) -> Result<usize, EngineError> {
        let e = self.require_entity(entity)?;
        e.sensor_index(id).ok_or_else(|| EngineError::SensorNotFound {
            entity: e.diagnostic_id(),
            sensor: id.to_string(),
        })
    }

    pub fn binding_site_local_loc_rot(&self, site: SiteRef) -> Result<LocRot, EngineError> {
        let marker = self.site(site)?.marker().index();
        self.marker_local_loc_rot(site.entity, marker)
    }

    pub fn binding_site_loc_rot(&self, site: SiteRef) -> Result<LocRot, EngineError> {
        let marker = self.site(site)?.marker().index();
        self.marker_loc_rot(site.entity, marker)
    }

    pub fn sensor_loc_rot(&self, entity: EntityId, sensor: usize) -> Result<LocRot, EngineError> {
        let e = self.require_entity(entity)?;
        let marker = e
            .sensor(sensor)
            .ok_or_else(|| EngineError::SensorNotFound {
                entity: e.diagnostic_id(),
                sensor: format!("#{}", sensor),
            })?
            .marker()
            .index();
        self.marker_loc_rot(entity, marker)
    }

    // --- Compartments and concentration controllers ---

    pub fn add_compartment(&mut self, compartment: Compartment) -> Result<(), EngineError> {
        if self.compartment(compartment.id()).is_some() {
            return Err(EngineError::DuplicateCompartment(compartment.id().to_string()));
        }
        self.compartments.push(compartment);
        Ok(())
    }

    pub fn compartment(&self, id: &str) -> Option<&Compartment> {
        self.compartments.iter().find(|c| c.id() == id)
    }

    pub fn compartments(&self) -> &[Compartment] {
        &self.compartments
    }

    /// Adds a controller that keeps the number of entities handled by a registered entity
    /// factory at a requested count.
    pub fn add_concentration_controller(
        &mut self,
        name: &str,
        factory_id: &str,
        min_count: usize,
        max_count: usize,
    ) -> Result<(), EngineError> {
        let factory = self.factory_registry.create(factory_id)?;
        self.controllers.push(ConcentrationController::new(
            name, factory_id, factory, min_count, max_count,
        ));
        Ok(())
    }

    pub fn concentration_controllers(&self) -> &[ConcentrationController] {
        &self.controllers
    }

    pub fn concentration_controller_mut(&mut self, name: &str) -> Option<&mut ConcentrationController> {
        self.controllers.iter_mut().find(|c| c.name() == name)
    }

    // --- Frame update ---

    /// Advances the simulation by `dt` simulated seconds.
    ///
    /// # Errors
    ///
    /// Any invariant violation or failing behavior aborts the tick and is returned as is; the
    /// population should be considered inconsistent afterwards.
    #[instrument(skip_all, name = "environment_update")]
    pub fn update(&mut self, dt: f64) -> Result<(), EngineError> {
        self.time.advance(dt);

        self.update_concentration_controllers()?;
        self.update_structures(dt);
        self.update_entities(dt)?;
        self.update_compounds(dt)?;

        self.entity_order.compact();
        self.compound_order.compact();
        Ok(())
    }

    fn update_concentration_controllers(&mut self) -> Result<(), EngineError> {
        if self.controllers.is_empty() {
            return Ok(());
        }
        let mut controllers = std::mem::take(&mut self.controllers);
        let result = controllers.iter_mut().try_for_each(|c| c.update(self));
        controllers.append(&mut self.controllers);
        self.controllers = controllers;
        result
    }

    fn update_structures(&mut self, dt: f64) {
        for (_, structure) in self.structures.iter_mut() {
            structure.update(dt);
        }
    }

    #[instrument(skip_all, name = "update_entities")]
    fn update_entities(&mut self, dt: f64) -> Result<(), EngineError> {
        let mut cursor = self.entity_order.cursor();
        while let Some(id) = cursor.next(&self.entity_order) {
            if !self.is_alive(id) {
                cursor.remove_current(&mut self.entity_order);
                self.purge_entity(id);
                continue;
            }
            self.run_behavior(id, dt)?;
        }
        Ok(())
    }

    fn run_behavior(&mut self, id: EntityId, dt: f64) -> Result<(), EngineError> {
        let Some(mut behavior) = self.behaviors.remove(id) else {
            return Ok(());
        };

        let result = {
            let mut ctx = BehaviorContext::new(self, id, dt);
            behavior.update(&mut ctx)
        };

        if self.is_alive(id) {
            self.behaviors.insert(id, behavior);
        } else {
            behavior.dispose();
        }
        result
    }

    #[instrument(skip_all, name = "update_compounds")]
    fn update_compounds(&mut self, dt: f64) -> Result<(), EngineError> {
        let mut cursor = self.compound_order.cursor();
        while let Some(id) = cursor.next(&self.compound_order) {
            if self.compounds.get(id).is_none_or(Compound::is_disposed) {
                cursor.remove_current(&mut self.compound_order);
                self.compounds.remove(id);
                continue;
            }
            self.update_compound(id, dt)?;
        }
        Ok(())
    }

    // --- Lifecycle and diagnostics ---

    /// Disposes every entity and compound and rewinds the clock. Entity classes, compartments,
    /// and concentration controllers are kept.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        for id in self.entity_order.to_vec() {
            if self.is_alive(id) {
                self.dispose_entity(id)?;
            }
        }
        for id in self.entity_order.to_vec() {
            self.purge_entity(id);
        }
        self.entity_order.clear();
        self.compounds.clear();
        self.compound_order.clear();
        self.behaviors.clear();
        self.time.reset();
        info!("Environment reset");
        Ok(())
    }

    /// One line per live entity, listing its binding sites: `_` for free, `~peer` while
    /// binding, and `peer` when bound.
    pub fn describe_entity(&self, id: EntityId) -> Option<String> {
        let entity = self.entities.get(id)?;
        let mut text = entity.diagnostic_id();
        text.push(':');
        for site in entity.binding_sites() {
            let peer = site
                .other_site()
                .and_then(|other| self.entities.get(other.entity))
                .map(Entity::diagnostic_id)
                .unwrap_or_default();
            match site.state() {
                BindingState::Free => text.push_str(" _"),
                BindingState::Binding => text.push_str(&format!(" ~{}", peer)),
                BindingState::Bound => text.push_str(&format!(" {}", peer)),
            }
        }
        if entity.compound().is_none() {
            text.push_str(" compoundless");
        }
        Some(text)
    }

    pub fn diagnostic_string(&self) -> String {
        let mut text = format!(
            "t={:.3}s entities={} compounds={}\n",
            self.time(),
            self.entity_count(),
            self.compounds().count()
        );
        for (id, _) in self.entities() {
            if let Some(line) = self.describe_entity(id) {
                text.push_str(&line);
                text.push('\n');
            }
        }
        text
    }
}
