//! # Engine Module
//!
//! The stateful layer that owns the simulated population and keeps the entity–binding–compound
//! graph consistent while it is mutated.
//!
//! ## Overview
//!
//! [`environment::Environment`] is the single owner of every entity, structure, and compound.
//! Entities and compounds live in generational arenas; relationships between them (binding
//! site peers, compound membership) are handles, so the graph has no ownership cycles.
//! All cross-entity mutation happens through `Environment` methods spread over the modules
//! below:
//!
//! - **Binding protocol** ([`binding`]): the `Free → Binding → Bound → Free` state machine of
//!   binding sites, including the merge triggered by an initiating instant bind.
//! - **Compounds** ([`compound`]): creation, membership, merge, disposal, and the choice of
//!   spatial link.
//! - **Alignment** ([`aligner`]): propagation of the anchor placement through every bound
//!   entity, safe on cyclic bond graphs.
//! - **Split** ([`splitter`]): connected-component recomputation after a bond breaks.
//! - **Spatial links and trajectories** ([`spatial_link`], [`trajectory`],
//!   [`trajectory_link`]): how a compound's anchor moves.
//! - **Sensor queries** ([`sensor`]), **concentration control** ([`concentration`]), and the
//!   **persistence contract** ([`snapshot`]).
//!
//! ## Usage
//!
//! ```ignore
//! use molmach::engine::{config::SimulationConfig, environment::Environment};
//!
//! let mut env = Environment::new(SimulationConfig::default());
//! env.add_entity_class(o2_class)?;
//! env.add_entity_class(carrier_class)?;
//!
//! let carrier = env.add_entity("carrier", false)?;
//! let o2 = env.add_entity("o2", true)?;
//! env.instant_bind(env.binding_site_ref(carrier, "pocket")?, env.binding_site_ref(o2, "site")?)?;
//!
//! for _ in 0..60 {
//!     env.update(1.0 / 60.0)?;
//! }
//! ```

pub mod aligner;
pub mod binding;
pub mod clock;
pub mod compound;
pub mod concentration;
pub mod config;
pub mod environment;
pub mod error;
pub mod sensor;
pub mod snapshot;
pub mod spatial_link;
pub mod splitter;
pub mod trajectory;
pub mod trajectory_link;

#[cfg(test)]
pub(crate) mod test_support;
