//! Propagation of a compound's anchor placement through its bond graph.

use super::environment::Environment;
use super::error::EngineError;
use crate::core::geometry::binding_rotation;
use crate::core::loc_rot::LocRot;
use crate::core::models::ids::EntityId;
use crate::core::models::marker::SiteRef;
use std::collections::HashSet;
use tracing::trace;

/// Placement of an entity bound through a site whose local placement is `other_local`, given
/// the absolute placement of the site it is bound to. The two sites end up coincident and
/// facing each other.
///
/// # Arguments
///
/// * `site` - Absolute placement of the site on the already placed entity.
/// * `other_local` - Placement of the peer site in its own entity's frame.
pub fn bound_entity_loc_rot(site: &LocRot, other_local: &LocRot) -> LocRot {
    let rotation = site.rotation * binding_rotation() * other_local.rotation.inverse();
    LocRot::new(site.location - rotation * other_local.location, rotation)
}

impl Environment {
    /// Places `root` at `anchor` and every entity reachable from it over `Bound` sites
    /// relative to its neighbor. Each entity is placed once per pass, so bond cycles are safe.
    pub(crate) fn align_compound(&mut self, root: EntityId, anchor: &LocRot) -> Result<(), EngineError> {
        let mut visited = HashSet::from([root]);
        self.align_from(root, anchor, &mut visited)?;
        trace!(root = ?root, entities = visited.len(), "Aligned compound");
        Ok(())
    }

    fn align_from(
        &mut self,
        entity: EntityId,
        placement: &LocRot,
        visited: &mut HashSet<EntityId>,
    ) -> Result<(), EngineError> {
        let e = self.require_entity_mut(entity)?;
        e.loc_rot.set(placement);
        let site_count = e.binding_sites.len();

        for index in 0..site_count {
            let site = SiteRef::new(entity, index);
            let Some(other) = self.site(site)?.bound_site() else {
                continue;
            };
            if !visited.insert(other.entity) {
                continue;
            }
            if self.entity(other.entity).is_none() {
                return Err(EngineError::InvariantViolation(format!(
                    "site {:?} is bound to a missing entity",
                    site
                )));
            }

            let site_loc_rot = self.binding_site_loc_rot(site)?;
            let other_local = self.binding_site_local_loc_rot(other)?;
            let other_placement = bound_entity_loc_rot(&site_loc_rot, &other_local);
            self.align_from(other.entity, &other_placement, visited)?;
        }
        Ok(())
    }
}
