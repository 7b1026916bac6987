//! # MolMach Core Library
//!
//! A deterministic, frame-stepped engine for simulating populations of molecular machines:
//! discrete entities that attach to and detach from one another through binding sites,
//! forming and breaking rigid compounds, while each entity morphs between a small set of
//! pre-defined shapes ("conformations").
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture to keep passive data, graph mutation, and
//! per-species decision logic apart.
//!
//! - **[`core`]: The Foundation.** Immutable definitions (`EntityClass`, `Conformation`),
//!   placement and geometry value types (`LocRot`, `Cone`), the live per-entity animated
//!   geometry (`EntityStructure`), and the mutation-safe `IterateList`.
//!
//! - **[`engine`]: The Graph Engine.** The stateful `Environment` that owns every entity and
//!   compound and is the only component that mutates cross-entity relationships. It implements
//!   the binding protocol, compound merge and split, the alignment pass, spatial links and
//!   scripted trajectories, sensor queries, and snapshots for persistence.
//!
//! - **[`behaviors`]: The Hook Layer.** The contract through which per-entity decision logic
//!   drives the engine, an explicit id → factory registration table, and the preset behaviors.
//!
//! ## Frame Model
//!
//! An external driver calls [`engine::environment::Environment::update`] once per simulated
//! tick. The update runs concentration controllers, then structures (conformation
//! interpolation), then entity behaviors, then compounds (alignment and spatial link), all
//! synchronously and single-threaded.

pub mod behaviors;
pub mod core;
pub mod engine;
