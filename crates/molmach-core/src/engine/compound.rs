use super::environment::Environment;
use super::error::EngineError;
use super::spatial_link::{FloatingLink, LinkTransition, SpatialLink};
use super::trajectory::Trajectory;
use super::trajectory_link::TrajectoryLink;
use crate::core::iterate_list::IterateList;
use crate::core::loc_rot::LocRot;
use crate::core::models::ids::{CompoundId, EntityId};
use std::collections::HashSet;
use tracing::{debug, warn};

/// A connected group of bound entities sharing one spatial anchor.
///
/// The root is only the seed of the alignment walk; any member could serve. A compound is
/// disposed exactly when it has no root, at which point its member list is empty and its
/// spatial link is gone.
#[derive(Debug)]
pub struct Compound {
    pub(crate) root: Option<EntityId>,
    pub(crate) entities: IterateList<EntityId>,
    pub(crate) mass: f64,
    pub(crate) spatial_link: Option<SpatialLink>,
}

impl Compound {
    fn new(root: EntityId, link: SpatialLink) -> Self {
        Self {
            root: Some(root),
            entities: IterateList::from_iter([root]),
            mass: 0.0,
            spatial_link: Some(link),
        }
    }

    pub fn root(&self) -> Option<EntityId> {
        self.root
    }

    /// Members in insertion order, root first.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.to_vec()
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Sum of the member masses, refreshed after every membership change.
    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn spatial_link(&self) -> Option<&SpatialLink> {
        self.spatial_link.as_ref()
    }

    /// The anchor placement, if the compound still has a link.
    pub fn loc_rot(&self) -> Option<LocRot> {
        self.spatial_link.as_ref().map(SpatialLink::loc_rot)
    }

    pub fn is_disposed(&self) -> bool {
        self.root.is_none()
    }
}

impl Environment {
    pub fn compound(&self, id: CompoundId) -> Option<&Compound> {
        self.compounds.get(id)
    }

    pub(crate) fn require_compound(&self, id: CompoundId) -> Result<&Compound, EngineError> {
        self.compounds
            .get(id)
            .filter(|c| !c.is_disposed())
            .ok_or(EngineError::CompoundNotFound(id))
    }

    fn require_compound_mut(&mut self, id: CompoundId) -> Result<&mut Compound, EngineError> {
        self.compounds
            .get_mut(id)
            .filter(|c| !c.is_disposed())
            .ok_or(EngineError::CompoundNotFound(id))
    }

    /// Live compounds in creation order.
    pub fn compounds(&self) -> impl Iterator<Item = (CompoundId, &Compound)> {
        self.compound_order.iter().filter_map(|id| {
            self.compounds
                .get(id)
                .filter(|c| !c.is_disposed())
                .map(|c| (id, c))
        })
    }

    pub fn compound_of(&self, entity: EntityId) -> Option<CompoundId> {
        self.entities.get(entity).and_then(|e| e.compound())
    }

    /// Creates a compound containing only `root`, anchored where the entity currently is. The
    /// link stays undefined until one of the link setters is called.
    ///
    /// # Errors
    ///
    /// [`EngineError::EntityAlreadyOwned`] if `root` already belongs to a compound.
    pub fn create_compound(&mut self, root: EntityId) -> Result<CompoundId, EngineError> {
        let entity = self.require_entity(root)?;
        if entity.compound().is_some() {
            return Err(EngineError::EntityAlreadyOwned {
                entity: entity.diagnostic_id(),
            });
        }

        let link = SpatialLink::Undefined(entity.loc_rot());
        let id = self.compounds.insert(Compound::new(root, link));
        self.require_entity_mut(root)?.compound = Some(id);
        self.compound_order.push(id);
        self.refresh_mass(id)?;

        debug!(compound = ?id, root = ?root, "Created compound");
        Ok(id)
    }

    /// Adds an unowned entity to a compound.
    ///
    /// # Errors
    ///
    /// [`EngineError::EntityAlreadyOwned`] if the entity belongs to any compound, including
    /// this one.
    pub fn add_entity_to_compound(
        &mut self,
        compound: CompoundId,
        entity: EntityId,
    ) -> Result<(), EngineError> {
        self.require_compound(compound)?;
        let e = self.require_entity_mut(entity)?;
        if e.compound.is_some() {
            return Err(EngineError::EntityAlreadyOwned {
                entity: e.diagnostic_id(),
            });
        }
        e.compound = Some(compound);
        self.require_compound_mut(compound)?.entities.push(entity);
        self.refresh_mass(compound)
    }

    /// Detaches the given entities from a compound. The detached entities are left without a
    /// compound; the caller is responsible for giving them a new one.
    ///
    /// Must not be called while a cursor over the compound's members is in use, since the
    /// member list is compacted.
    pub fn remove_entities(
        &mut self,
        compound: CompoundId,
        entities: &HashSet<EntityId>,
    ) -> Result<(), EngineError> {
        let c = self.require_compound_mut(compound)?;
        let mut cursor = c.entities.cursor();
        while let Some(id) = cursor.next(&c.entities) {
            if entities.contains(&id) {
                cursor.remove_current(&mut c.entities);
            }
        }
        c.entities.compact();
        if c.root.is_some_and(|root| entities.contains(&root)) {
            c.root = c.entities.first();
        }

        for &id in entities {
            if let Some(e) = self.entities.get_mut(id) {
                if e.compound == Some(compound) {
                    e.compound = None;
                }
            }
        }

        if self.compounds[compound].root.is_none() {
            return self.dispose_compound(compound);
        }
        self.refresh_mass(compound)
    }

    /// Moves every member of `other` into `this` and disposes `other`. Merging a compound
    /// into itself does nothing.
    pub fn merge_compounds(&mut self, this: CompoundId, other: CompoundId) -> Result<(), EngineError> {
        if this == other {
            return Ok(());
        }
        self.require_compound(this)?;
        let moved = self.require_compound(other)?.entity_ids();

        self.dispose_compound(other)?;
        for &entity in &moved {
            self.add_entity_to_compound(this, entity)?;
        }

        debug!(into = ?this, from = ?other, moved = moved.len(), "Merged compounds");
        Ok(())
    }

    /// Releases a compound's members and link. Already disposed compounds are left alone; the
    /// arena slot is reclaimed by the next compound pass.
    pub fn dispose_compound(&mut self, id: CompoundId) -> Result<(), EngineError> {
        let Some(compound) = self.compounds.get_mut(id) else {
            return Err(EngineError::CompoundNotFound(id));
        };
        if compound.is_disposed() {
            return Ok(());
        }

        let members = compound.entities.to_vec();
        compound.entities.clear();
        compound.root = None;
        compound.spatial_link = None;
        compound.mass = 0.0;

        for entity in members {
            if let Some(e) = self.entities.get_mut(entity) {
                if e.compound == Some(id) {
                    e.compound = None;
                }
            }
        }
        debug!(compound = ?id, "Disposed compound");
        Ok(())
    }

    pub(crate) fn refresh_mass(&mut self, id: CompoundId) -> Result<(), EngineError> {
        let mass: f64 = self
            .require_compound(id)?
            .entities
            .iter()
            .filter_map(|e| self.entities.get(e))
            .map(|e| e.mass())
            .sum();
        self.require_compound_mut(id)?.mass = mass;
        Ok(())
    }

    // --- Spatial link selection ---

    fn set_link(&mut self, id: CompoundId, link: SpatialLink) -> Result<(), EngineError> {
        self.require_compound_mut(id)?.spatial_link = Some(link);
        Ok(())
    }

    fn current_anchor(&self, id: CompoundId) -> Result<LocRot, EngineError> {
        let compound = self.require_compound(id)?;
        match compound.loc_rot() {
            Some(loc_rot) => Ok(loc_rot),
            None => compound
                .root
                .and_then(|root| self.entities.get(root))
                .map(|e| e.loc_rot())
                .ok_or(EngineError::CompoundNotFound(id)),
        }
    }

    /// Pins the compound at `loc_rot`.
    pub fn fix(&mut self, id: CompoundId, loc_rot: LocRot) -> Result<(), EngineError> {
        self.set_link(id, SpatialLink::Fixed { loc_rot, editable: false })
    }

    /// Pins the compound at `loc_rot` and allows [`Environment::move_fixed`] afterwards.
    pub fn fix_editable(&mut self, id: CompoundId, loc_rot: LocRot) -> Result<(), EngineError> {
        self.set_link(id, SpatialLink::Fixed { loc_rot, editable: true })
    }

    /// Lets the compound drift from wherever its anchor currently is.
    pub fn float(&mut self, id: CompoundId) -> Result<(), EngineError> {
        let start = self.current_anchor(id)?;
        self.float_at(id, start)
    }

    pub fn float_at(&mut self, id: CompoundId, loc_rot: LocRot) -> Result<(), EngineError> {
        let link = self.floating_link(loc_rot);
        self.set_link(id, SpatialLink::Floating(link))
    }

    /// Puts the compound on a scripted trajectory starting from its current anchor.
    pub fn set_trajectory(&mut self, id: CompoundId, trajectory: Trajectory) -> Result<(), EngineError> {
        let start = self.current_anchor(id)?;
        let link = TrajectoryLink::new(trajectory, start);
        if link.is_finished() {
            return self.float_at(id, start);
        }
        self.set_link(id, SpatialLink::Trajectory(link))
    }

    /// Moves an editable fixed (or placeholder) anchor.
    ///
    /// # Errors
    ///
    /// [`EngineError::LinkNotEditable`] for every other link mode.
    pub fn move_fixed(&mut self, id: CompoundId, target: LocRot) -> Result<(), EngineError> {
        match self.require_compound_mut(id)?.spatial_link.as_mut() {
            Some(SpatialLink::Fixed { loc_rot, editable: true }) | Some(SpatialLink::Other(loc_rot)) => {
                *loc_rot = target;
                Ok(())
            }
            _ => Err(EngineError::LinkNotEditable(id)),
        }
    }

    pub(crate) fn floating_link(&self, start: LocRot) -> FloatingLink {
        let compartment = self
            .compartments()
            .iter()
            .find(|c| c.contains(&start.location))
            .or_else(|| {
                let nearest = self.compartments().iter().min_by(|a, b| {
                    a.distance(&start.location).total_cmp(&b.distance(&start.location))
                });
                if let Some(c) = nearest {
                    warn!(
                        compartment = c.id(),
                        location = ?start.location,
                        "Floating start point lies outside every compartment; using the nearest"
                    );
                }
                nearest
            })
            .cloned();
        FloatingLink::new(start, compartment)
    }

    /// Aligns the members from the anchor, then advances the anchor's link.
    pub(crate) fn update_compound(&mut self, id: CompoundId, dt: f64) -> Result<(), EngineError> {
        let compound = &self.compounds[id];
        let (Some(root), Some(anchor)) = (compound.root, compound.loc_rot()) else {
            return Ok(());
        };
        self.align_compound(root, &anchor)?;

        let Some(mut link) = self.compounds[id].spatial_link.take() else {
            return Ok(());
        };
        let transition = link.update(self, id, dt);

        let Some(compound) = self.compounds.get_mut(id).filter(|c| !c.is_disposed()) else {
            return transition.map(|_| ());
        };
        if compound.spatial_link.is_some() {
            // The link was replaced while it was running, e.g. by a split ejecting this compound.
            return transition.map(|_| ());
        }
        match transition? {
            LinkTransition::Keep => compound.spatial_link = Some(link),
            LinkTransition::Float => {
                let floating = self.floating_link(link.loc_rot());
                self.compounds[id].spatial_link = Some(SpatialLink::Floating(floating));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Vector;
    use crate::core::models::compartment::Compartment;
    use crate::core::models::marker::SiteRef;
    use crate::engine::spatial_link::SpatialLinkType;
    use crate::engine::test_support::*;

    mod membership {
        use super::*;

        #[test]
        fn adding_an_owned_entity_is_rejected() {
            let (mut env, ids) = rod_pair();
            let a_compound = env.compound_of(ids.a).unwrap();
            assert!(matches!(
                env.add_entity_to_compound(a_compound, ids.b),
                Err(EngineError::EntityAlreadyOwned { .. })
            ));
            assert!(matches!(
                env.add_entity_to_compound(a_compound, ids.a),
                Err(EngineError::EntityAlreadyOwned { .. })
            ));
        }

        #[test]
        fn creating_a_second_compound_for_an_entity_is_rejected() {
            let (mut env, ids) = rod_pair();
            assert!(matches!(
                env.create_compound(ids.a),
                Err(EngineError::EntityAlreadyOwned { .. })
            ));
        }

        #[test]
        fn merge_moves_members_and_disposes_other() {
            let (mut env, ids) = rod_pair();
            let a = env.compound_of(ids.a).unwrap();
            let b = env.compound_of(ids.b).unwrap();

            env.merge_compounds(a, b).unwrap();

            assert_eq!(env.compound(a).unwrap().entity_ids(), vec![ids.a, ids.b]);
            assert!(env.compound(b).unwrap().is_disposed());
            assert_eq!(env.compound_of(ids.b), Some(a));
            let expected = env.entity(ids.a).unwrap().mass() + env.entity(ids.b).unwrap().mass();
            assert!((env.compound(a).unwrap().mass() - expected).abs() < 1e-12);
        }

        #[test]
        fn merge_with_self_is_a_noop() {
            let (mut env, ids) = rod_pair();
            let a = env.compound_of(ids.a).unwrap();
            env.merge_compounds(a, a).unwrap();
            assert_eq!(env.compound(a).unwrap().len(), 1);
        }

        #[test]
        fn removing_the_root_promotes_the_next_member() {
            let (mut env, ids) = rod_pair();
            let a = env.compound_of(ids.a).unwrap();
            let b = env.compound_of(ids.b).unwrap();
            env.merge_compounds(a, b).unwrap();

            env.remove_entities(a, &HashSet::from([ids.a])).unwrap();

            let compound = env.compound(a).unwrap();
            assert_eq!(compound.root(), Some(ids.b));
            assert_eq!(env.compound_of(ids.a), None);
        }

        #[test]
        fn removal_reclaims_member_slots() {
            let (mut env, ids) = rod_pair();
            let a = env.compound_of(ids.a).unwrap();
            let b = env.compound_of(ids.b).unwrap();
            env.merge_compounds(a, b).unwrap();

            env.remove_entities(a, &HashSet::from([ids.b])).unwrap();

            let compound = env.compound(a).unwrap();
            assert_eq!(compound.entity_ids(), vec![ids.a]);
            assert_eq!(compound.entities.slot_count(), 1);
        }

        #[test]
        fn repeated_bind_and_release_keeps_member_list_bounded() {
            let (mut env, ids) = rod_pair();
            let carrier = env.compound_of(ids.a).unwrap();
            env.fix(carrier, LocRot::identity()).unwrap();
            let (a, b) = (SiteRef::new(ids.a, 0), SiteRef::new(ids.b, 0));

            for _ in 0..200 {
                env.instant_bind(a, b).unwrap();
                env.release_bond(a).unwrap();
                env.update(0.01).unwrap();
            }

            let compound = env.compound(carrier).unwrap();
            assert_eq!(compound.entity_ids(), vec![ids.a]);
            assert_eq!(compound.entities.slot_count(), 1);
            assert_eq!(env.compounds().count(), 2);
        }

        #[test]
        fn disposed_compound_is_collected_by_update() {
            let (mut env, ids) = rod_pair();
            let a = env.compound_of(ids.a).unwrap();
            let b = env.compound_of(ids.b).unwrap();
            env.merge_compounds(a, b).unwrap();
            env.update(0.01).unwrap();
            assert!(env.compound(b).is_none());
            assert_eq!(env.compounds().count(), 1);
        }
    }

    mod links {
        use super::*;

        #[test]
        fn fixed_link_places_root_at_anchor() {
            let (mut env, ids) = rod_pair();
            let a = env.compound_of(ids.a).unwrap();
            let anchor = LocRot::from_location(Vector::new(3.0, 4.0, 5.0));
            env.fix(a, anchor).unwrap();
            env.update(0.1).unwrap();
            assert!(env.entity(ids.a).unwrap().loc_rot().approx_eq(&anchor, 1e-9));
        }

        #[test]
        fn only_editable_fixed_links_can_be_moved() {
            let (mut env, ids) = rod_pair();
            let a = env.compound_of(ids.a).unwrap();
            let target = LocRot::from_location(Vector::new(1.0, 0.0, 0.0));

            env.fix(a, LocRot::identity()).unwrap();
            assert!(matches!(env.move_fixed(a, target), Err(EngineError::LinkNotEditable(_))));

            env.fix_editable(a, LocRot::identity()).unwrap();
            env.move_fixed(a, target).unwrap();
            assert_eq!(env.compound(a).unwrap().loc_rot(), Some(target));
        }

        #[test]
        fn floating_picks_the_containing_compartment() {
            let mut env = rod_env();
            env.add_compartment(Compartment::new(
                "left",
                Vector::new(-10.0, -10.0, -10.0),
                Vector::new(0.0, 10.0, 10.0),
            ))
            .unwrap();
            env.add_compartment(Compartment::new(
                "right",
                Vector::new(0.0, -10.0, -10.0),
                Vector::new(10.0, 10.0, 10.0),
            ))
            .unwrap();

            let link = env.floating_link(LocRot::from_location(Vector::new(5.0, 0.0, 0.0)));
            assert_eq!(link.compartment().map(Compartment::id), Some("right"));

            let outside = env.floating_link(LocRot::from_location(Vector::new(-50.0, 0.0, 0.0)));
            assert_eq!(outside.compartment().map(Compartment::id), Some("left"));
        }

        #[test]
        fn empty_trajectory_falls_back_to_floating() {
            let (mut env, ids) = rod_pair();
            let a = env.compound_of(ids.a).unwrap();
            env.set_trajectory(a, Trajectory::new(Vec::new())).unwrap();
            assert_eq!(link_type_of(&env, ids.a), Some(SpatialLinkType::Floating));
        }
    }
}
