use super::behavior::{BehaviorFactory, BehaviorInit, EntityBehavior};
use super::presets::{EMPTY_BEHAVIOR_ID, EmptyBehavior, STEP_BEHAVIOR_ID, StepConformationBehavior};
use crate::engine::error::EngineError;
use std::collections::HashMap;
use tracing::warn;

/// Explicit behavior id → factory table.
#[derive(Clone)]
pub struct BehaviorRegistry {
    factories: HashMap<String, BehaviorFactory>,
}

impl Default for BehaviorRegistry {
    fn default() -> Self {
        Self::with_presets()
    }
}

impl BehaviorRegistry {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry with `present.empty` and `present.step` registered.
    pub fn with_presets() -> Self {
        let mut registry = Self::empty();
        registry.register(EMPTY_BEHAVIOR_ID, EmptyBehavior::create);
        registry.register(STEP_BEHAVIOR_ID, StepConformationBehavior::create);
        registry
    }

    /// Registers a factory, replacing any previous one with the same id.
    pub fn register(&mut self, id: impl Into<String>, factory: BehaviorFactory) {
        self.factories.insert(id.into(), factory);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Creates the behavior registered under `id`. Unknown ids get an [`EmptyBehavior`].
    ///
    /// # Errors
    ///
    /// Whatever the factory returns, typically a lookup failure for a marker it needs.
    pub fn create(&self, id: &str, init: &BehaviorInit<'_>) -> Result<Box<dyn EntityBehavior>, EngineError> {
        match self.factories.get(id) {
            Some(factory) => factory(init),
            None => {
                warn!(
                    behavior = id,
                    entity = %init.entity().diagnostic_id(),
                    "Unknown behavior id; falling back to {}",
                    EMPTY_BEHAVIOR_ID
                );
                EmptyBehavior::create(init)
            }
        }
    }
}
