//! Fixtures shared by the engine's unit tests.

use super::environment::Environment;
use super::spatial_link::SpatialLinkType;
use crate::core::geometry::{Rotation, Vector};
use crate::core::loc_rot::LocRot;
use crate::core::models::builder::EntityClassBuilder;
use crate::core::models::entity_class::EntityClass;
use crate::core::models::ids::EntityId;
use crate::core::models::marker::SiteRef;
use nalgebra::Vector3;
use std::f64::consts::PI;

/// Site 0 sits one unit up and faces up; site 1 sits one unit down and faces down.
pub fn rod_site_loc_rot(index: usize) -> LocRot {
    match index {
        0 => LocRot::from_location(Vector::new(0.0, 1.0, 0.0)),
        _ => LocRot::new(
            Vector::new(0.0, -1.0, 0.0),
            Rotation::from_axis_angle(&Vector3::z_axis(), PI),
        ),
    }
}

pub fn rod_class(id: &str, sites: usize) -> EntityClass {
    let mut builder = EntityClassBuilder::new(id);
    builder.add_atom("C", Vector::zeros());
    for index in 0..sites {
        builder.binding_site(&format!("s{}", index), rod_site_loc_rot(index));
    }
    builder.build().unwrap()
}

pub fn gate_class() -> EntityClass {
    let mut builder = EntityClassBuilder::new("gate");
    builder
        .set_conformation("closed")
        .add_atom("N", Vector::zeros())
        .binding_site("latch", LocRot::from_location(Vector::new(0.0, 1.0, 0.0)))
        .set_conformation("open")
        .add_atom("N", Vector::new(0.0, 0.0, 1.0))
        .binding_site("latch", LocRot::from_location(Vector::new(0.0, 2.0, 0.0)));
    builder.build().unwrap()
}

pub fn rod_env() -> Environment {
    let mut env = Environment::default();
    env.add_entity_class(rod_class("rod", 2)).unwrap();
    env
}

pub struct Pair {
    pub a: EntityId,
    pub b: EntityId,
}

/// Two unbound rods, each in its own compound with an undefined link.
pub fn rod_pair() -> (Environment, Pair) {
    let mut env = rod_env();
    let a = env.add_entity("rod", false).unwrap();
    let b = env.add_entity("rod", false).unwrap();
    (env, Pair { a, b })
}

pub fn bind(env: &mut Environment, a: EntityId, a_site: usize, b: EntityId, b_site: usize) {
    env.instant_bind(SiteRef::new(a, a_site), SiteRef::new(b, b_site))
        .unwrap();
}

/// `count` rods where rod `i` site 1 is bound to rod `i + 1` site 0, all in the first rod's
/// compound.
pub fn rod_chain(env: &mut Environment, count: usize) -> Vec<EntityId> {
    let chain: Vec<EntityId> = (0..count)
        .map(|_| env.add_entity("rod", false).unwrap())
        .collect();
    for pair in chain.windows(2) {
        bind(env, pair[0], 1, pair[1], 0);
    }
    chain
}

pub fn link_type_of(env: &Environment, entity: EntityId) -> Option<SpatialLinkType> {
    env.compound_of(entity)
        .and_then(|c| env.compound(c))
        .and_then(|c| c.spatial_link())
        .map(|link| link.kind())
}
