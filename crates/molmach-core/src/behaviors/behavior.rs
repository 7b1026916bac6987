use crate::core::models::entity::Entity;
use crate::core::models::ids::{CompoundId, EntityId};
use crate::core::models::marker::SiteRef;
use crate::core::models::structure::EntityStructure;
use crate::engine::config::SimulationConfig;
use crate::engine::environment::Environment;
use crate::engine::error::EngineError;
use std::any::Any;

/// Decision logic attached to one entity.
pub trait EntityBehavior: Any {
    /// Called once per tick while the owner is alive.
    fn update(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<(), EngineError>;

    /// Called once when the owner is disposed.
    fn dispose(&mut self) {}

    fn as_any(&self) -> &dyn Any;
}

/// Constructs a behavior for a freshly added entity.
pub type BehaviorFactory = fn(&BehaviorInit<'_>) -> Result<Box<dyn EntityBehavior>, EngineError>;

/// What a behavior factory gets to see: the new entity and the simulation settings.
#[derive(Clone, Copy)]
pub struct BehaviorInit<'a> {
    entity_id: EntityId,
    entity: &'a Entity,
    config: &'a SimulationConfig,
}

impl<'a> BehaviorInit<'a> {
    pub fn new(entity_id: EntityId, entity: &'a Entity, config: &'a SimulationConfig) -> Self {
        Self {
            entity_id,
            entity,
            config,
        }
    }

    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    pub fn entity(&self) -> &'a Entity {
        self.entity
    }

    pub fn config(&self) -> &'a SimulationConfig {
        self.config
    }

    /// Resolves a binding site by id to a handle the behavior can keep.
    pub fn binding_site(&self, id: &str) -> Result<SiteRef, EngineError> {
        self.entity
            .binding_site_index(id)
            .map(|index| SiteRef::new(self.entity_id, index))
            .ok_or_else(|| EngineError::BindingSiteNotFound {
                entity: self.entity.diagnostic_id(),
                site: id.to_string(),
            })
    }

    /// Resolves a sensor by id to its index.
    pub fn sensor(&self, id: &str) -> Result<usize, EngineError> {
        self.entity
            .sensor_index(id)
            .ok_or_else(|| EngineError::SensorNotFound {
                entity: self.entity.diagnostic_id(),
                sensor: id.to_string(),
            })
    }

    /// Resolves any marker by id to its index in the class layout.
    pub fn marker(&self, id: &str) -> Result<usize, EngineError> {
        self.entity
            .marker_index(id)
            .ok_or_else(|| EngineError::MarkerNotFound {
                entity: self.entity.diagnostic_id(),
                marker: id.to_string(),
            })
    }
}

/// Per-tick access for a behavior: the environment, the owner, and the tick length.
pub struct BehaviorContext<'a> {
    env: &'a mut Environment,
    owner: EntityId,
    dt: f64,
}

impl<'a> BehaviorContext<'a> {
    pub fn new(env: &'a mut Environment, owner: EntityId, dt: f64) -> Self {
        Self { env, owner, dt }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Length of the current tick in simulated seconds.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn time(&self) -> f64 {
        self.env.time()
    }

    pub fn env(&self) -> &Environment {
        &*self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut *self.env
    }

    pub fn entity(&self) -> Result<&Entity, EngineError> {
        self.env
            .entity(self.owner)
            .ok_or(EngineError::EntityNotFound(self.owner))
    }

    pub fn structure(&self) -> Option<&EntityStructure> {
        self.env.structure(self.owner)
    }

    pub fn compound(&self) -> Option<CompoundId> {
        self.env.compound_of(self.owner)
    }

    /// Handle to the owner's binding site at `index`.
    pub fn site(&self, index: usize) -> SiteRef {
        SiteRef::new(self.owner, index)
    }

    pub fn bound_entity(&self, site: usize) -> Result<Option<EntityId>, EngineError> {
        self.env.bound_entity(self.site(site))
    }

    /// Changes the owner's conformation over the configured default duration.
    pub fn set_conformation(&mut self, conformation: &str) -> Result<(), EngineError> {
        self.env.set_conformation(self.owner, conformation)
    }
}
