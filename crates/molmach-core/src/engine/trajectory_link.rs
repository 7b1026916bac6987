use super::clock::SimTimer;
use super::environment::Environment;
use super::error::EngineError;
use super::spatial_link::LinkTransition;
use super::trajectory::{Trajectory, TrajectorySection};
use crate::core::loc_rot::{LocRot, LocRotState};
use crate::core::models::ids::CompoundId;
use tracing::trace;

/// Runtime of a [`Trajectory`]: a forward-only cursor over its sections plus the anchor
/// placement the sections drive.
///
/// The cursor starts before the first section; [`TrajectoryLink::new`] moves it onto the first
/// one. Once the sections are exhausted the anchor stays where the last section left it.
#[derive(Debug, Clone)]
pub struct TrajectoryLink {
    trajectory: Trajectory,
    cursor: Option<usize>,
    section_timer: SimTimer,
    loc_rot: LocRotState,
    section_start: LocRot,
    colliders_active: bool,
}

impl TrajectoryLink {
    pub fn new(trajectory: Trajectory, start: LocRot) -> Self {
        let mut link = Self {
            trajectory,
            cursor: None,
            section_timer: SimTimer::new(),
            loc_rot: LocRotState::new(start),
            section_start: start,
            colliders_active: true,
        };
        link.next();
        link
    }

    /// Moves to the next section and restarts the section clock.
    ///
    /// # Return
    ///
    /// `false` once the trajectory is exhausted.
    pub fn next(&mut self) -> bool {
        let next = self.cursor.map_or(0, |i| i + 1).min(self.trajectory.len());
        self.cursor = Some(next);
        self.section_timer.reset();
        self.section_start = self.loc_rot.snapshot();

        match self.trajectory.section(next) {
            Some(section) => {
                self.colliders_active = match section {
                    TrajectorySection::Movement { colliders_active, .. } => *colliders_active,
                    _ => true,
                };
                true
            }
            None => {
                self.colliders_active = true;
                false
            }
        }
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn current_section(&self) -> Option<&TrajectorySection> {
        self.cursor.and_then(|i| self.trajectory.section(i))
    }

    pub fn current_section_index(&self) -> Option<usize> {
        self.cursor.filter(|&i| i < self.trajectory.len())
    }

    /// Simulated seconds spent in the current section.
    pub fn current_section_time(&self) -> f64 {
        self.section_timer.elapsed()
    }

    pub fn is_finished(&self) -> bool {
        self.current_section().is_none()
    }

    pub fn loc_rot(&self) -> LocRot {
        self.loc_rot.snapshot()
    }

    pub fn colliders_active(&self) -> bool {
        self.colliders_active
    }

    fn advance(&mut self) -> LinkTransition {
        let index = self.cursor;
        self.next();
        trace!(from = ?index, to = ?self.current_section_index(), "Trajectory section advanced");
        LinkTransition::Keep
    }

    pub(crate) fn update(
        &mut self,
        env: &mut Environment,
        _compound: CompoundId,
        dt: f64,
    ) -> Result<LinkTransition, EngineError> {
        self.section_timer.advance(dt);
        let Some(section) = self.current_section().cloned() else {
            return Ok(LinkTransition::Keep);
        };

        match section {
            TrajectorySection::Movement {
                destination,
                duration,
                ..
            } => {
                let Some(target) = env.resolve(&destination) else {
                    return Ok(self.advance());
                };
                let progress = if duration <= 0.0 {
                    1.0
                } else {
                    (self.section_timer.elapsed() / duration).min(1.0)
                };
                self.loc_rot.set_lerp(&self.section_start, &target, progress);
                if progress >= 1.0 {
                    return Ok(self.advance());
                }
            }
            TrajectorySection::Attraction {
                apply_at,
                destination,
                distance,
                timeout,
            } => {
                if self.section_timer.has_elapsed(timeout) {
                    return Ok(self.advance());
                }
                let (Some(from), Some(to)) = (env.resolve(&apply_at), env.resolve(&destination)) else {
                    return Ok(self.advance());
                };
                let offset = to.location - from.location;
                let gap = offset.norm();
                if gap <= distance {
                    return Ok(self.advance());
                }
                let step = (env.config().attraction_speed * dt).min(gap);
                self.loc_rot.translate(&(offset * (step / gap)));
            }
            TrajectorySection::Binding { active, passive } => {
                if env.is_alive(active.entity) && env.is_alive(passive.entity) {
                    env.instant_bind(active, passive)?;
                }
                return Ok(self.advance());
            }
            TrajectorySection::Float => {
                self.advance();
                return Ok(LinkTransition::Float);
            }
        }
        Ok(LinkTransition::Keep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Vector;
    use crate::core::models::marker::SiteRef;
    use crate::engine::spatial_link::{SpatialLink, SpatialLinkType};
    use crate::engine::test_support::*;
    use crate::engine::trajectory::SpaceRef;

    fn point(x: f64, y: f64, z: f64) -> SpaceRef {
        SpaceRef::Static(LocRot::from_location(Vector::new(x, y, z)))
    }

    mod cursor {
        use super::*;

        #[test]
        fn starts_on_first_section_and_runs_out() {
            let trajectory = Trajectory::builder().movement(point(1.0, 0.0, 0.0), 1.0, false).float().build();
            let mut link = TrajectoryLink::new(trajectory, LocRot::identity());
            assert_eq!(link.current_section_index(), Some(0));
            assert!(!link.colliders_active());

            assert!(link.next());
            assert_eq!(link.current_section(), Some(&TrajectorySection::Float));
            assert!(link.colliders_active());

            assert!(!link.next());
            assert!(link.is_finished());
            assert!(!link.next());
        }

        #[test]
        fn empty_trajectory_is_finished_immediately() {
            let link = TrajectoryLink::new(Trajectory::new(Vec::new()), LocRot::identity());
            assert!(link.is_finished());
        }
    }

    mod sections {
        use super::*;

        #[test]
        fn movement_reaches_destination_after_duration() {
            let (mut env, ids) = rod_pair();
            let compound = env.compound_of(ids.a).unwrap();
            env.fix(compound, LocRot::identity()).unwrap();
            let trajectory = Trajectory::builder().movement(point(4.0, 0.0, 0.0), 1.0, true).build();
            env.set_trajectory(compound, trajectory).unwrap();

            for _ in 0..5 {
                env.update(0.1).unwrap();
            }
            let halfway = env.compound(compound).unwrap().loc_rot().unwrap().location;
            assert!((halfway.x - 2.0).abs() < 1e-9);

            for _ in 0..6 {
                env.update(0.1).unwrap();
            }
            let done = env.compound(compound).unwrap().loc_rot().unwrap().location;
            assert!((done.x - 4.0).abs() < 1e-9);
        }

        #[test]
        fn attraction_never_overshoots() {
            let (mut env, ids) = rod_pair();
            let compound = env.compound_of(ids.a).unwrap();
            env.fix(compound, LocRot::identity()).unwrap();
            let trajectory = Trajectory::builder()
                .attract_with(SpaceRef::Entity(ids.a), point(30.0, 0.0, 0.0), 0.0, 100.0)
                .build();
            env.set_trajectory(compound, trajectory).unwrap();

            for _ in 0..20 {
                env.update(0.1).unwrap();
                let x = env.compound(compound).unwrap().loc_rot().unwrap().location.x;
                assert!(x <= 30.0 + 1e-9);
            }
            let x = env.compound(compound).unwrap().loc_rot().unwrap().location.x;
            assert!((x - 30.0).abs() < 1e-9);
        }

        #[test]
        fn attraction_gives_up_after_timeout() {
            let (mut env, ids) = rod_pair();
            let compound = env.compound_of(ids.a).unwrap();
            env.fix(compound, LocRot::identity()).unwrap();
            let trajectory = Trajectory::builder()
                .attract_with(SpaceRef::Entity(ids.a), point(1.0e6, 0.0, 0.0), 1.0, 0.25)
                .build();
            env.set_trajectory(compound, trajectory).unwrap();

            for _ in 0..3 {
                env.update(0.1).unwrap();
            }
            match env.compound(compound).unwrap().spatial_link() {
                Some(SpatialLink::Trajectory(link)) => assert!(link.is_finished()),
                other => panic!("unexpected link {:?}", other),
            }
        }

        #[test]
        fn disposed_destination_skips_section() {
            let (mut env, ids) = rod_pair();
            let compound = env.compound_of(ids.a).unwrap();
            env.fix(compound, LocRot::identity()).unwrap();
            let trajectory = Trajectory::builder().movement(SpaceRef::Entity(ids.b), 10.0, true).float().build();
            env.set_trajectory(compound, trajectory).unwrap();
            env.dispose_entity(ids.b).unwrap();

            env.update(0.1).unwrap();
            env.update(0.1).unwrap();
            assert_eq!(link_type_of(&env, ids.a), Some(SpatialLinkType::Floating));
        }

        #[test]
        fn binding_section_merges_compounds() {
            let (mut env, ids) = rod_pair();
            let a_compound = env.compound_of(ids.a).unwrap();
            let b_compound = env.compound_of(ids.b).unwrap();
            env.fix(a_compound, LocRot::identity()).unwrap();
            let trajectory = Trajectory::builder()
                .binding(SiteRef::new(ids.a, 0), SiteRef::new(ids.b, 0))
                .build();
            env.set_trajectory(b_compound, trajectory).unwrap();

            env.update(0.1).unwrap();

            assert_eq!(env.compound_of(ids.b), Some(a_compound));
            assert!(env.compound(b_compound).is_none_or(|c| c.is_disposed()));
            assert_eq!(link_type_of(&env, ids.a), Some(SpatialLinkType::Fixed));
        }
    }

}
