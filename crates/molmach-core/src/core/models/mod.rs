//! # Core Models Module
//!
//! The data structures that describe molecular machines: the immutable class definitions
//! shared by every instance, and the per-instance state the engine mutates.
//!
//! ## Overview
//!
//! An [`entity_class::EntityClass`] bundles a structure class (atoms plus one or more named
//! conformations), a marker layout and a behavior id. Instantiating a class produces an
//! [`entity::Entity`] with its own binding sites and sensors, and an
//! [`structure::EntityStructure`] that animates between conformations. Definitions are
//! validated when they are built, so the live simulation never observes an inconsistent
//! class.
//!
//! ## Key Components
//!
//! - [`ids`] - Generational handles for entities, compounds, and structures
//! - [`atom`] - Elements and their masses
//! - [`collider`] - Collision geometry attached to conformations
//! - [`conformation`] - A single named shape
//! - [`structure`] - Structure classes and live, interpolating structures
//! - [`marker`] - Marker classes, binding sites, and sensors
//! - [`entity_class`] - Validated entity definitions
//! - [`entity`] - Live entity instances
//! - [`compartment`] - Axis-aligned regions that contain floating compounds
//! - [`builder`] - Incremental construction of entity classes
//! - [`error`] - Construction-time validation errors
//!
//! ## Usage
//!
//! ```ignore
//! use molmach::core::models::builder::EntityClassBuilder;
//!
//! let mut builder = EntityClassBuilder::new("o2");
//! builder
//!     .add_atom("O", Vector::new(-0.6, 0.0, 0.0))
//!     .add_atom("O", Vector::new(0.6, 0.0, 0.0))
//!     .binding_site("site", LocRot::identity());
//! let class = builder.build()?;
//! ```

pub mod atom;
pub mod builder;
pub mod collider;
pub mod compartment;
pub mod conformation;
pub mod entity;
pub mod entity_class;
pub mod error;
pub mod ids;
pub mod marker;
pub mod structure;
