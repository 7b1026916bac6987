//! Concentration control: keeping the number of a kind of entity at a requested count.
//!
//! An [`EntityFactory`] decides which entities it is responsible for and knows how to add or
//! remove one. A [`ConcentrationController`] counts the matching entities every tick and, when
//! a new count was requested, creates or deletes entities until the request is met.

use super::environment::Environment;
use super::error::EngineError;
use crate::core::geometry::{Vector, random_rotation};
use crate::core::loc_rot::LocRot;
use crate::core::models::ids::EntityId;
use std::collections::HashMap;
use tracing::info;

pub const EMPTY_FACTORY_ID: &str = "present.empty";

pub trait EntityFactory {
    /// Whether `entity` counts towards this factory's concentration.
    fn filter(&self, env: &Environment, entity: EntityId) -> bool;

    fn create(&mut self, env: &mut Environment) -> Result<(), EngineError>;

    fn delete(&mut self, env: &mut Environment, entity: EntityId) -> Result<(), EngineError>;
}

/// Matches nothing and creates nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyEntityFactory;

impl EntityFactory for EmptyEntityFactory {
    fn filter(&self, _env: &Environment, _entity: EntityId) -> bool {
        false
    }

    fn create(&mut self, _env: &mut Environment) -> Result<(), EngineError> {
        Ok(())
    }

    fn delete(&mut self, _env: &mut Environment, _entity: EntityId) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Manages the unbound entities of one class. New entities start floating at a random point
/// and orientation inside a compartment (the named one, else the first registered one, else
/// the origin).
#[derive(Debug, Clone)]
pub struct ClassEntityFactory {
    class_id: String,
    compartment_id: Option<String>,
}

impl ClassEntityFactory {
    pub fn new(class_id: impl Into<String>, compartment_id: Option<String>) -> Self {
        Self {
            class_id: class_id.into(),
            compartment_id,
        }
    }
}

impl EntityFactory for ClassEntityFactory {
    fn filter(&self, env: &Environment, entity: EntityId) -> bool {
        env.entity(entity).is_some_and(|e| {
            e.class_id() == self.class_id && e.binding_sites().iter().all(|site| site.is_free())
        })
    }

    fn create(&mut self, env: &mut Environment) -> Result<(), EngineError> {
        let compartment = match &self.compartment_id {
            Some(id) => Some(
                env.compartment(id)
                    .cloned()
                    .ok_or_else(|| EngineError::CompartmentNotFound(id.clone()))?,
            ),
            None => env.compartments().first().cloned(),
        };

        let entity = env.add_entity(&self.class_id, false)?;
        let location = match &compartment {
            Some(c) => c.random_point_inside(&mut env.rng),
            None => Vector::zeros(),
        };
        let rotation = random_rotation(&mut env.rng);

        let compound = env.compound_of(entity).ok_or_else(|| {
            EngineError::InvariantViolation("new entity has no compound".to_string())
        })?;
        env.float_at(compound, LocRot::new(location, rotation))
    }

    fn delete(&mut self, env: &mut Environment, entity: EntityId) -> Result<(), EngineError> {
        env.dispose_entity(entity)
    }
}

type FactoryConstructor = Box<dyn Fn() -> Box<dyn EntityFactory>>;

/// Id → constructor table for entity factories.
pub struct EntityFactoryRegistry {
    constructors: HashMap<String, FactoryConstructor>,
}

impl Default for EntityFactoryRegistry {
    fn default() -> Self {
        Self::with_presets()
    }
}

impl EntityFactoryRegistry {
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// A registry containing [`EmptyEntityFactory`] under [`EMPTY_FACTORY_ID`].
    pub fn with_presets() -> Self {
        let mut registry = Self::empty();
        registry.register(EMPTY_FACTORY_ID, || Box::new(EmptyEntityFactory));
        registry
    }

    pub fn register(
        &mut self,
        id: impl Into<String>,
        constructor: impl Fn() -> Box<dyn EntityFactory> + 'static,
    ) {
        self.constructors.insert(id.into(), Box::new(constructor));
    }

    /// Registers a [`ClassEntityFactory`] for `class_id` under `id`.
    pub fn register_class(&mut self, id: impl Into<String>, class_id: &str, compartment_id: Option<&str>) {
        let class_id = class_id.to_string();
        let compartment_id = compartment_id.map(str::to_string);
        self.register(id, move || {
            Box::new(ClassEntityFactory::new(class_id.clone(), compartment_id.clone()))
        });
    }

    pub fn contains(&self, id: &str) -> bool {
        self.constructors.contains_key(id)
    }

    pub fn create(&self, id: &str) -> Result<Box<dyn EntityFactory>, EngineError> {
        self.constructors
            .get(id)
            .map(|constructor| constructor())
            .ok_or_else(|| EngineError::EntityFactoryNotFound(id.to_string()))
    }
}

pub struct ConcentrationController {
    name: String,
    factory_id: String,
    factory: Box<dyn EntityFactory>,
    min_count: usize,
    max_count: usize,
    current_count: usize,
    desired_count: Option<usize>,
}

impl ConcentrationController {
    pub fn new(
        name: impl Into<String>,
        factory_id: impl Into<String>,
        factory: Box<dyn EntityFactory>,
        min_count: usize,
        max_count: usize,
    ) -> Self {
        Self {
            name: name.into(),
            factory_id: factory_id.into(),
            factory,
            min_count: min_count.min(max_count),
            max_count: min_count.max(max_count),
            current_count: 0,
            desired_count: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn factory_id(&self) -> &str {
        &self.factory_id
    }

    pub fn min_count(&self) -> usize {
        self.min_count
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Number of matching entities seen by the last update.
    pub fn current_count(&self) -> usize {
        self.current_count
    }

    /// Requests a count, clamped to `[min_count, max_count]`, applied on the next update.
    pub fn set_count(&mut self, count: usize) {
        self.desired_count = Some(count.clamp(self.min_count, self.max_count));
    }

    fn matching(&self, env: &Environment) -> Vec<EntityId> {
        env.entities()
            .map(|(id, _)| id)
            .filter(|&id| self.factory.filter(env, id))
            .collect()
    }

    pub(crate) fn update(&mut self, env: &mut Environment) -> Result<(), EngineError> {
        let matching = self.matching(env);
        self.current_count = matching.len();

        let Some(desired) = self.desired_count.take() else {
            return Ok(());
        };
        if desired == self.current_count {
            return Ok(());
        }

        info!(
            controller = %self.name,
            current = self.current_count,
            desired,
            "Adjusting concentration"
        );
        if desired > self.current_count {
            for _ in self.current_count..desired {
                self.factory.create(env)?;
            }
        } else {
            for &entity in &matching[desired..] {
                self.factory.delete(env, entity)?;
            }
        }

        self.current_count = self.matching(env).len();
        Ok(())
    }
}
