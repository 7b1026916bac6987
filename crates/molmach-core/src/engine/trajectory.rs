//! Scripted motion for compound anchors.
//!
//! A [`Trajectory`] is an immutable, ordered list of [`TrajectorySection`]s. Sections refer to
//! the things they move towards through [`SpaceRef`]s, which are resolved every tick; a
//! reference whose entity has been disposed resolves to nothing and the section is skipped.

use super::config::SimulationConfig;
use super::environment::Environment;
use crate::core::loc_rot::LocRot;
use crate::core::models::ids::EntityId;
use crate::core::models::marker::SiteRef;
use std::sync::Arc;

/// A placement in the simulation that may move or disappear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpaceRef {
    Entity(EntityId),
    Marker { entity: EntityId, marker: usize },
    BindingSite(SiteRef),
    Static(LocRot),
}

impl SpaceRef {
    /// The entity whose lifetime bounds this reference, if any.
    pub fn owner(&self) -> Option<EntityId> {
        match self {
            Self::Entity(entity) | Self::Marker { entity, .. } => Some(*entity),
            Self::BindingSite(site) => Some(site.entity),
            Self::Static(_) => None,
        }
    }
}

impl Environment {
    /// Resolves a reference to its current absolute placement, or `None` once the referenced
    /// entity has ceased to exist.
    pub fn resolve(&self, space: &SpaceRef) -> Option<LocRot> {
        if let Some(owner) = space.owner() {
            if !self.is_alive(owner) {
                return None;
            }
        }
        match *space {
            SpaceRef::Entity(entity) => self.entity(entity).map(|e| e.loc_rot()),
            SpaceRef::Marker { entity, marker } => self.marker_loc_rot(entity, marker).ok(),
            SpaceRef::BindingSite(site) => self.binding_site_loc_rot(site).ok(),
            SpaceRef::Static(loc_rot) => Some(loc_rot),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrajectorySection {
    /// Interpolates the anchor from its placement at section start to `destination` over
    /// `duration` seconds.
    Movement {
        destination: SpaceRef,
        duration: f64,
        colliders_active: bool,
    },
    /// Pulls the anchor so that `apply_at` approaches `destination`, until they are closer
    /// than `distance` or `timeout` seconds have passed.
    Attraction {
        apply_at: SpaceRef,
        destination: SpaceRef,
        distance: f64,
        timeout: f64,
    },
    /// Instantly binds `active` to `passive`.
    Binding { active: SiteRef, passive: SiteRef },
    /// Releases the compound to free floating and ends the trajectory.
    Float,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    sections: Arc<[TrajectorySection]>,
}

impl Default for Trajectory {
    fn default() -> Self {
        Self::float()
    }
}

impl Trajectory {
    pub fn new(sections: Vec<TrajectorySection>) -> Self {
        Self { sections: sections.into() }
    }

    /// The default ejection: start floating right away.
    pub fn float() -> Self {
        Self::new(vec![TrajectorySection::Float])
    }

    pub fn builder() -> TrajectoryBuilder {
        TrajectoryBuilder::new()
    }

    pub fn sections(&self) -> &[TrajectorySection] {
        &self.sections
    }

    pub fn section(&self, index: usize) -> Option<&TrajectorySection> {
        self.sections.get(index)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Assembles a [`Trajectory`] section by section.
///
/// # Usage
///
/// ```ignore
/// let trajectory = Trajectory::builder()
///     .attract(SpaceRef::BindingSite(o2_site), SpaceRef::BindingSite(pocket))
///     .binding(pocket, o2_site)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct TrajectoryBuilder {
    sections: Vec<TrajectorySection>,
    attraction_distance: f64,
    attraction_timeout: f64,
}

impl Default for TrajectoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrajectoryBuilder {
    pub fn new() -> Self {
        Self::with_defaults(&SimulationConfig::default())
    }

    /// Uses the attraction distance and timeout of `config` for [`TrajectoryBuilder::attract`].
    pub fn with_defaults(config: &SimulationConfig) -> Self {
        Self {
            sections: Vec::new(),
            attraction_distance: config.attraction_distance,
            attraction_timeout: config.attraction_timeout,
        }
    }

    pub fn attract(self, apply_at: SpaceRef, destination: SpaceRef) -> Self {
        let (distance, timeout) = (self.attraction_distance, self.attraction_timeout);
        self.attract_with(apply_at, destination, distance, timeout)
    }

    pub fn attract_with(mut self, apply_at: SpaceRef, destination: SpaceRef, distance: f64, timeout: f64) -> Self {
        self.sections.push(TrajectorySection::Attraction {
            apply_at,
            destination,
            distance,
            timeout,
        });
        self
    }

    pub fn movement(mut self, destination: SpaceRef, duration: f64, colliders_active: bool) -> Self {
        self.sections.push(TrajectorySection::Movement {
            destination,
            duration,
            colliders_active,
        });
        self
    }

    pub fn binding(mut self, active: SiteRef, passive: SiteRef) -> Self {
        self.sections.push(TrajectorySection::Binding { active, passive });
        self
    }

    pub fn float(mut self) -> Self {
        self.sections.push(TrajectorySection::Float);
        self
    }

    pub fn build(self) -> Trajectory {
        Trajectory::new(self.sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Vector;
    use crate::engine::test_support::*;

    #[test]
    fn builder_uses_configured_attraction_defaults() {
        let target = SpaceRef::Static(LocRot::identity());
        let trajectory = Trajectory::builder()
            .attract(target, target)
            .movement(target, 2.0, false)
            .float()
            .build();

        assert_eq!(trajectory.len(), 3);
        assert_eq!(
            trajectory.section(0),
            Some(&TrajectorySection::Attraction {
                apply_at: target,
                destination: target,
                distance: 10.0,
                timeout: 30.0,
            })
        );
        assert_eq!(trajectory.section(2), Some(&TrajectorySection::Float));
    }

    #[test]
    fn clones_share_sections() {
        let trajectory = Trajectory::float();
        let clone = trajectory.clone();
        assert!(Arc::ptr_eq(&trajectory.sections, &clone.sections));
    }

    #[test]
    fn resolve_tracks_entity_and_reports_disposal() {
        let (mut env, ids) = rod_pair();
        let anchor = LocRot::from_location(Vector::new(2.0, 0.0, 0.0));
        let compound = env.compound_of(ids.a).unwrap();
        env.fix(compound, anchor).unwrap();
        env.update(0.1).unwrap();

        let entity = SpaceRef::Entity(ids.a);
        assert!(env.resolve(&entity).unwrap().approx_eq(&anchor, 1e-9));

        let site = SpaceRef::BindingSite(SiteRef::new(ids.a, 0));
        let expected = LocRot::combine(&anchor, &rod_site_loc_rot(0));
        assert!(env.resolve(&site).unwrap().approx_eq(&expected, 1e-9));

        env.dispose_entity(ids.a).unwrap();
        assert_eq!(env.resolve(&entity), None);
        assert_eq!(env.resolve(&site), None);
        assert!(env.resolve(&SpaceRef::Static(anchor)).is_some());
    }
}
