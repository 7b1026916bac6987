//! # Core Module
//!
//! Passive data models and value types shared by the engine and the behaviors.
//!
//! ## Overview
//!
//! Nothing in this module knows about other entities: types here describe a single entity
//! class, a single entity, or a single geometric quantity. Cross-entity mutation lives in
//! [`crate::engine`].
//!
//! ## Key Components
//!
//! - [`geometry`] - Vector and rotation aliases plus interpolation and comparison helpers
//! - [`loc_rot`] - Placements (location + rotation) in live and snapshot form
//! - [`color`] - RGBA colors with interpolation
//! - [`cone`] - Cone containment used by sensors
//! - [`iterate_list`] - Ordered storage supporting removal at a cursor during traversal
//! - [`models`] - Entity classes, structures, conformations, markers, and entities
//! - [`library`] - Loading entity-class definitions from TOML files

pub mod color;
pub mod cone;
pub mod geometry;
pub mod iterate_list;
pub mod library;
pub mod loc_rot;
pub mod models;
