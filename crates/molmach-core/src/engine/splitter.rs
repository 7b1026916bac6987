use super::environment::Environment;
use super::error::EngineError;
use super::trajectory::Trajectory;
use crate::core::models::ids::{CompoundId, EntityId};
use std::collections::HashSet;
use tracing::debug;

impl Environment {
    /// Recomputes the connected components of a compound after a bond broke.
    ///
    /// Entities still reachable from the root over `Bound` sites stay. Every other component
    /// becomes a new compound rooted at its first member in the original member order and is
    /// put on `eject`.
    ///
    /// # Return
    ///
    /// The compounds created for the detached components, in creation order.
    pub fn split_compound(
        &mut self,
        id: CompoundId,
        eject: &Trajectory,
    ) -> Result<Vec<CompoundId>, EngineError> {
        let compound = self.require_compound(id)?;
        let root = compound.root.ok_or(EngineError::CompoundNotFound(id))?;
        let members = compound.entity_ids();

        let mut unassigned: HashSet<EntityId> =
            members.iter().copied().filter(|&e| e != root).collect();
        self.collect_component(root, &mut unassigned)?;
        if unassigned.is_empty() {
            return Ok(Vec::new());
        }
        self.remove_entities(id, &unassigned)?;

        let mut created = Vec::new();
        for &entity in &members {
            if !unassigned.remove(&entity) {
                continue;
            }
            let component = self.collect_component(entity, &mut unassigned)?;
            let new_id = self.create_compound(entity)?;
            for member in component {
                self.add_entity_to_compound(new_id, member)?;
            }
            self.set_trajectory(new_id, eject.clone())?;
            created.push(new_id);
        }

        debug!(compound = ?id, detached = created.len(), "Split compound");
        Ok(created)
    }

    /// Depth-first walk over `Bound` sites from `start`, claiming entities from `unassigned`.
    /// Returns the claimed entities, `start` excluded.
    fn collect_component(
        &self,
        start: EntityId,
        unassigned: &mut HashSet<EntityId>,
    ) -> Result<Vec<EntityId>, EngineError> {
        let mut stack = vec![start];
        let mut reached = Vec::new();
        while let Some(entity) = stack.pop() {
            for site in self.require_entity(entity)?.binding_sites() {
                if let Some(other) = site.bound_site() {
                    if unassigned.remove(&other.entity) {
                        reached.push(other.entity);
                        stack.push(other.entity);
                    }
                }
            }
        }
        Ok(reached)
    }
}
