//! Behaviors available to every environment.

use super::behavior::{BehaviorContext, BehaviorInit, EntityBehavior};
use super::state::StateMachine;
use crate::engine::error::EngineError;
use std::any::Any;

pub const EMPTY_BEHAVIOR_ID: &str = "present.empty";
pub const STEP_BEHAVIOR_ID: &str = "present.step";

/// Does nothing. Used for passive entities and as the fallback for unknown behavior ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyBehavior;

impl EmptyBehavior {
    pub fn create(_init: &BehaviorInit<'_>) -> Result<Box<dyn EntityBehavior>, EngineError> {
        Ok(Box::new(Self))
    }
}

impl EntityBehavior for EmptyBehavior {
    fn update(&mut self, _ctx: &mut BehaviorContext<'_>) -> Result<(), EngineError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    /// Showing a conformation, waiting for the interval to pass.
    Waiting,
    /// Interpolating towards the next conformation.
    Changing,
}

/// Cycles the owner through its class's conformations in definition order, holding each one
/// for `step_conformation_interval` seconds once the interpolation towards it has finished.
#[derive(Debug, Clone)]
pub struct StepConformationBehavior {
    machine: StateMachine<StepState>,
    conformations: Vec<String>,
    current: usize,
    interval: f64,
}

impl StepConformationBehavior {
    pub fn create(init: &BehaviorInit<'_>) -> Result<Box<dyn EntityBehavior>, EngineError> {
        let conformations = init
            .entity()
            .class()
            .structure_class()
            .conformations()
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        Ok(Box::new(Self {
            machine: StateMachine::new(StepState::Waiting),
            conformations,
            current: 0,
            interval: init.config().step_conformation_interval,
        }))
    }

    pub fn state(&self) -> StepState {
        self.machine.state()
    }

    pub fn current_conformation(&self) -> Option<&str> {
        self.conformations.get(self.current).map(String::as_str)
    }
}

impl EntityBehavior for StepConformationBehavior {
    fn update(&mut self, ctx: &mut BehaviorContext<'_>) -> Result<(), EngineError> {
        self.machine.advance(ctx.dt());
        match self.machine.state() {
            StepState::Waiting => {
                if self.conformations.len() > 1 && self.machine.seconds_in_state() >= self.interval {
                    self.current = (self.current + 1) % self.conformations.len();
                    ctx.set_conformation(&self.conformations[self.current])?;
                    self.machine.set_state(StepState::Changing);
                }
            }
            StepState::Changing => {
                if !ctx.structure().is_some_and(|s| s.is_changing()) {
                    self.machine.set_state(StepState::Waiting);
                }
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Vector;
    use crate::core::loc_rot::LocRot;
    use crate::core::models::builder::EntityClassBuilder;
    use crate::core::models::ids::EntityId;
    use crate::engine::config::SimulationConfigBuilder;
    use crate::engine::environment::Environment;

    fn stepping_env() -> (Environment, EntityId) {
        let config = SimulationConfigBuilder::new()
            .step_conformation_interval(1.0)
            .default_conformation_duration(0.5)
            .build()
            .unwrap();
        let mut env = Environment::new(config);
        let mut builder = EntityClassBuilder::new("motor");
        builder
            .behavior(STEP_BEHAVIOR_ID)
            .set_conformation("a")
            .add_atom("C", Vector::zeros())
            .marker("tip", LocRot::identity())
            .set_conformation("b")
            .add_atom("C", Vector::new(1.0, 0.0, 0.0));
        env.add_entity_class(builder.build().unwrap()).unwrap();
        let motor = env.add_entity("motor", true).unwrap();
        (env, motor)
    }

    fn conformation(env: &Environment, id: EntityId) -> String {
        env.structure(id).unwrap().conformation().id().to_string()
    }

    #[test]
    fn steps_through_conformations_and_wraps() {
        let (mut env, motor) = stepping_env();
        let dt = 0.25;

        for _ in 0..3 {
            env.update(dt).unwrap();
        }
        assert_eq!(conformation(&env, motor), "a");

        env.update(dt).unwrap();
        assert_eq!(conformation(&env, motor), "b");

        // Half a second of interpolation, then a full interval of waiting.
        for _ in 0..5 {
            env.update(dt).unwrap();
        }
        assert_eq!(conformation(&env, motor), "b");
        env.update(dt).unwrap();
        assert_eq!(conformation(&env, motor), "a");
    }

    #[test]
    fn single_conformation_never_changes() {
        let mut env = Environment::default();
        let mut builder = EntityClassBuilder::new("rock");
        builder.behavior(STEP_BEHAVIOR_ID).add_atom("Fe", Vector::zeros());
        env.add_entity_class(builder.build().unwrap()).unwrap();
        let rock = env.add_entity("rock", false).unwrap();
        for _ in 0..10 {
            env.update(0.5).unwrap();
        }
        assert_eq!(conformation(&env, rock), "default");
        let behavior = env.behavior(rock).unwrap().as_any();
        assert_eq!(
            behavior.downcast_ref::<StepConformationBehavior>().unwrap().state(),
            StepState::Waiting
        );
    }
}
