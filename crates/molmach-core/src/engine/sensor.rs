//! Cone-shaped proximity queries of sensors.
//!
//! Queries scan the live population in creation order; there is no spatial index. The
//! querying entity is never part of a result, and an empty result is an ordinary outcome.

use super::environment::Environment;
use super::error::EngineError;
use crate::behaviors::behavior::EntityBehavior;
use crate::core::cone::Cone;
use crate::core::geometry::Vector;
use crate::core::models::entity::Entity;
use crate::core::models::ids::EntityId;
use crate::core::models::marker::SiteRef;

/// Picks the item closest to `reference`. Ties keep the item seen first.
pub fn nearest<T>(
    reference: &Vector,
    items: impl IntoIterator<Item = T>,
    location: impl Fn(&T) -> Vector,
) -> Option<T> {
    let mut best: Option<(T, f64)> = None;
    for item in items {
        let distance = (location(&item) - reference).norm();
        if best.as_ref().is_none_or(|(_, d)| distance < *d) {
            best = Some((item, distance));
        }
    }
    best.map(|(item, _)| item)
}

impl Environment {
    pub fn sensor_cone(&self, entity: EntityId, sensor: usize) -> Result<Cone, EngineError> {
        let placement = self.sensor_loc_rot(entity, sensor)?;
        let e = self.require_entity(entity)?;
        let sensor = e.sensor(sensor).ok_or_else(|| EngineError::SensorNotFound {
            entity: e.diagnostic_id(),
            sensor: format!("#{}", sensor),
        })?;
        Ok(sensor.cone(&placement))
    }

    pub fn is_in_sensor_cone(&self, entity: EntityId, sensor: usize, point: &Vector) -> Result<bool, EngineError> {
        Ok(self.sensor_cone(entity, sensor)?.contains(point))
    }

    fn sensed<'a>(
        &'a self,
        entity: EntityId,
        sensor: usize,
    ) -> Result<impl Iterator<Item = (EntityId, &'a Entity)> + 'a, EngineError> {
        let cone = self.sensor_cone(entity, sensor)?;
        Ok(self
            .entities()
            .filter(move |(id, e)| *id != entity && cone.contains(&e.loc_rot().location)))
    }

    /// Every other live entity whose origin lies inside the sensor's cone.
    pub fn find_entities(&self, entity: EntityId, sensor: usize) -> Result<Vec<EntityId>, EngineError> {
        Ok(self.sensed(entity, sensor)?.map(|(id, _)| id).collect())
    }

    pub fn find_entities_of_class(
        &self,
        entity: EntityId,
        sensor: usize,
        class_id: &str,
        filter: impl Fn(&Entity) -> bool,
    ) -> Result<Vec<EntityId>, EngineError> {
        Ok(self
            .sensed(entity, sensor)?
            .filter(|(_, e)| e.class_id() == class_id && filter(e))
            .map(|(id, _)| id)
            .collect())
    }

    /// Sensed entities whose behavior is a `B` accepted by `filter`.
    pub fn find_entities_with_behavior<B: EntityBehavior>(
        &self,
        entity: EntityId,
        sensor: usize,
        filter: impl Fn(&B) -> bool,
    ) -> Result<Vec<EntityId>, EngineError> {
        Ok(self
            .sensed(entity, sensor)?
            .filter(|(id, _)| {
                self.behavior(*id)
                    .and_then(|b| b.as_any().downcast_ref::<B>())
                    .is_some_and(&filter)
            })
            .map(|(id, _)| id)
            .collect())
    }

    pub fn find_nearest_entity_of_class(
        &self,
        entity: EntityId,
        sensor: usize,
        class_id: &str,
        filter: impl Fn(&Entity) -> bool,
    ) -> Result<Option<EntityId>, EngineError> {
        let reference = self.sensor_loc_rot(entity, sensor)?.location;
        let found = self.find_entities_of_class(entity, sensor, class_id, filter)?;
        Ok(self.nearest_entity(&reference, found))
    }

    /// The nearest sensed entity of `class_id` whose binding site `site_id` is free, as a
    /// handle to that site.
    pub fn find_nearest_entity_of_class_with_free_site(
        &self,
        entity: EntityId,
        sensor: usize,
        class_id: &str,
        site_id: &str,
    ) -> Result<Option<SiteRef>, EngineError> {
        let found = self.find_nearest_entity_of_class(entity, sensor, class_id, |e| {
            e.binding_site_index(site_id)
                .and_then(|i| e.binding_site(i))
                .is_some_and(|site| site.is_free())
        })?;
        Ok(found.and_then(|id| {
            let index = self.entity(id)?.binding_site_index(site_id)?;
            Some(SiteRef::new(id, index))
        }))
    }

    pub fn find_nearest_with_behavior<B: EntityBehavior>(
        &self,
        entity: EntityId,
        sensor: usize,
        filter: impl Fn(&B) -> bool,
    ) -> Result<Option<EntityId>, EngineError> {
        let reference = self.sensor_loc_rot(entity, sensor)?.location;
        let found = self.find_entities_with_behavior(entity, sensor, filter)?;
        Ok(self.nearest_entity(&reference, found))
    }

    /// Entities that no longer exist are skipped.
    fn nearest_entity(&self, reference: &Vector, found: Vec<EntityId>) -> Option<EntityId> {
        let located = found
            .into_iter()
            .filter_map(|id| self.entity(id).map(|e| (id, e.loc_rot().location)));
        nearest(reference, located, |(_, location)| *location).map(|(id, _)| id)
    }
}
