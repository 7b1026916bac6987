//! # Behaviors Module
//!
//! Per-entity decision logic and the contract through which it drives the engine.
//!
//! ## Overview
//!
//! Every entity carries one [`behavior::EntityBehavior`], chosen by the behavior id of its
//! entity class and created once, when the entity is added, by a factory function looked up in
//! the [`registry::BehaviorRegistry`]. The factory receives a [`behavior::BehaviorInit`] and
//! resolves the markers, binding sites, and sensors the behavior needs up front, so a missing
//! id fails entity creation instead of a later tick.
//!
//! Each tick the environment hands the behavior a [`behavior::BehaviorContext`]: mutable access
//! to the environment plus the owner's handle and the tick length. Behaviors decide *when* to
//! bind, release, or change conformation; the engine keeps the graph consistent.
//!
//! ## Key Components
//!
//! - [`behavior`]: the trait, the per-tick context, and the construction contract.
//! - [`registry`]: id → factory table with the preset ids pre-registered.
//! - [`state`]: a small state machine that tracks time spent in the current state.
//! - [`presets`]: `present.empty` and `present.step`.

pub mod behavior;
pub mod presets;
pub mod registry;
pub mod state;
