//! Anchor modes of a compound.
//!
//! A [`SpatialLink`] owns the placement every member of a compound is aligned from and decides
//! how that placement evolves from tick to tick: not at all (`Fixed`), by bounded random
//! drift (`Floating`), or by following a scripted [`super::trajectory::Trajectory`]
//! (`Trajectory`). `Undefined` and `Other` are placeholders used before a mode is chosen.

use super::clock::SimTimer;
use super::environment::Environment;
use super::error::EngineError;
use super::trajectory_link::TrajectoryLink;
use crate::core::geometry::{Vector, random_unit_vector};
use crate::core::loc_rot::LocRot;
use crate::core::models::compartment::Compartment;
use crate::core::models::ids::CompoundId;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpatialLinkType {
    Undefined,
    Other,
    Fixed,
    Floating,
    Trajectory,
}

/// What the compound should do with a link after it ran for a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkTransition {
    Keep,
    /// Replace the link by a floating link starting at its last placement.
    Float,
}

#[derive(Debug, Clone)]
pub enum SpatialLink {
    Undefined(LocRot),
    Other(LocRot),
    Fixed { loc_rot: LocRot, editable: bool },
    Floating(FloatingLink),
    Trajectory(TrajectoryLink),
}

impl SpatialLink {
    pub fn kind(&self) -> SpatialLinkType {
        match self {
            Self::Undefined(_) => SpatialLinkType::Undefined,
            Self::Other(_) => SpatialLinkType::Other,
            Self::Fixed { .. } => SpatialLinkType::Fixed,
            Self::Floating(_) => SpatialLinkType::Floating,
            Self::Trajectory(_) => SpatialLinkType::Trajectory,
        }
    }

    pub fn loc_rot(&self) -> LocRot {
        match self {
            Self::Undefined(loc_rot) | Self::Other(loc_rot) | Self::Fixed { loc_rot, .. } => *loc_rot,
            Self::Floating(link) => link.loc_rot(),
            Self::Trajectory(link) => link.loc_rot(),
        }
    }

    /// Whether the compound's colliders take part in physical contact in this mode.
    pub fn colliders_active(&self) -> bool {
        match self {
            Self::Fixed { .. } | Self::Floating(_) => true,
            Self::Trajectory(link) => link.colliders_active(),
            Self::Undefined(_) | Self::Other(_) => false,
        }
    }

    pub(crate) fn update(
        &mut self,
        env: &mut Environment,
        compound: CompoundId,
        dt: f64,
    ) -> Result<LinkTransition, EngineError> {
        match self {
            Self::Undefined(_) | Self::Other(_) | Self::Fixed { .. } => Ok(LinkTransition::Keep),
            Self::Floating(link) => {
                link.update(env, dt);
                Ok(LinkTransition::Keep)
            }
            Self::Trajectory(link) => link.update(env, compound, dt),
        }
    }
}

/// Kinematic Brownian drift: the anchor moves in a straight line at the configured float speed
/// and picks a new random heading after a random interval. The location is kept inside the
/// compartment, if any.
#[derive(Debug, Clone)]
pub struct FloatingLink {
    loc_rot: LocRot,
    velocity: Vector,
    until_direction_change: f64,
    timer: SimTimer,
    compartment: Option<Compartment>,
}

impl FloatingLink {
    /// Creates a drifting anchor. The first heading is picked on the first update.
    pub fn new(start: LocRot, compartment: Option<Compartment>) -> Self {
        let mut loc_rot = start;
        if let Some(c) = &compartment {
            loc_rot.location = c.nearest_point(&loc_rot.location);
        }
        Self {
            loc_rot,
            velocity: Vector::zeros(),
            until_direction_change: 0.0,
            timer: SimTimer::new(),
            compartment,
        }
    }

    pub fn loc_rot(&self) -> LocRot {
        self.loc_rot
    }

    pub fn velocity(&self) -> Vector {
        self.velocity
    }

    pub fn compartment(&self) -> Option<&Compartment> {
        self.compartment.as_ref()
    }

    fn update(&mut self, env: &mut Environment, dt: f64) {
        self.timer.advance(dt);
        if self.timer.has_elapsed(self.until_direction_change) {
            let config = env.config();
            let (min, max, speed) = (
                config.float_direction_change_min,
                config.float_direction_change_max,
                config.float_speed,
            );
            self.until_direction_change = if max > min {
                env.rng.gen_range(min..max)
            } else {
                min
            };
            self.velocity = random_unit_vector(&mut env.rng) * speed;
            self.timer.reset();
        }

        self.loc_rot.location += self.velocity * dt;
        if let Some(c) = &self.compartment {
            self.loc_rot.location = c.nearest_point(&self.loc_rot.location);
        }
    }
}
