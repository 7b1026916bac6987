//! Persistence contract for a running environment.
//!
//! A snapshot captures what is needed to rebuild the population: compartments, one record per
//! live entity (with the spatial link of compound roots that are fixed or floating), and one
//! record per established bond, written from the initiating side. Entity ids inside a
//! snapshot are stable strings (`e0`, `e1`, ...) in creation order.

use super::environment::Environment;
use super::error::EngineError;
use super::spatial_link::{SpatialLink, SpatialLinkType};
use crate::core::geometry::Vector;
use crate::core::loc_rot::{LocRot, LocRotRecord};
use crate::core::models::compartment::Compartment;
use crate::core::models::ids::EntityId;
use crate::core::models::marker::SiteRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentSnapshot {
    #[serde(default)]
    pub compartments: Vec<CompartmentRecord>,
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
    #[serde(default)]
    pub bonds: Vec<BondRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompartmentRecord {
    pub id: String,
    pub min: [f64; 3],
    pub max: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityRecord {
    pub id: String,
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_link: Option<SpatialLinkRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpatialLinkRecord {
    pub kind: SpatialLinkType,
    pub loc_rot: LocRotRecord,
    #[serde(default)]
    pub editable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BondRecord {
    pub active: SiteRecord,
    pub passive: SiteRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteRecord {
    pub entity: String,
    pub binding_site: String,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl EnvironmentSnapshot {
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path).map_err(|e| SnapshotError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| SnapshotError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let content = toml::to_string(self)?;
        std::fs::write(path, content).map_err(|e| SnapshotError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }
}

fn link_record(link: &SpatialLink) -> Option<SpatialLinkRecord> {
    let editable = match link {
        SpatialLink::Fixed { editable, .. } => *editable,
        SpatialLink::Floating(_) => false,
        _ => return None,
    };
    Some(SpatialLinkRecord {
        kind: link.kind(),
        loc_rot: link.loc_rot().into(),
        editable,
    })
}

impl Environment {
    fn is_compound_root(&self, entity: EntityId) -> bool {
        self.compound_of(entity)
            .and_then(|c| self.compound(c))
            .is_some_and(|c| c.root() == Some(entity))
    }

    /// Captures the live population.
    pub fn snapshot(&self) -> EnvironmentSnapshot {
        let names: HashMap<EntityId, String> = self
            .entities()
            .enumerate()
            .map(|(n, (id, _))| (id, format!("e{}", n)))
            .collect();

        let compartments = self
            .compartments()
            .iter()
            .map(|c| CompartmentRecord {
                id: c.id().to_string(),
                min: c.min().into(),
                max: c.max().into(),
            })
            .collect();

        let mut entities = Vec::new();
        let mut bonds = Vec::new();
        let mut root_bonds = Vec::new();
        for (id, entity) in self.entities() {
            let is_root = self.is_compound_root(id);
            let spatial_link = if is_root {
                self.compound_of(id)
                    .and_then(|c| self.compound(c))
                    .and_then(|c| c.spatial_link())
                    .and_then(link_record)
            } else {
                None
            };
            entities.push(EntityRecord {
                id: names[&id].clone(),
                class: entity.class_id().to_string(),
                spatial_link,
            });

            for site in entity.binding_sites() {
                let Some(other) = site.bound_site().filter(|_| site.is_initiator()) else {
                    continue;
                };
                let (Some(passive_name), Some(passive)) =
                    (names.get(&other.entity), self.entity(other.entity))
                else {
                    continue;
                };
                let Some(passive_site) = passive.binding_site(other.site) else {
                    continue;
                };
                let record = BondRecord {
                    active: SiteRecord {
                        entity: names[&id].clone(),
                        binding_site: site.id().to_string(),
                    },
                    passive: SiteRecord {
                        entity: passive_name.clone(),
                        binding_site: passive_site.id().to_string(),
                    },
                };
                if is_root {
                    root_bonds.push(record);
                } else {
                    bonds.push(record);
                }
            }
        }
        bonds.append(&mut root_bonds);

        EnvironmentSnapshot {
            compartments,
            entities,
            bonds,
        }
    }

    /// Replaces the population with the one described by `snapshot`.
    ///
    /// # Return
    ///
    /// The mapping from snapshot entity ids to the new entity handles.
    pub fn restore(&mut self, snapshot: &EnvironmentSnapshot) -> Result<HashMap<String, EntityId>, EngineError> {
        self.reset()?;

        for record in &snapshot.compartments {
            if self.compartment(&record.id).is_none() {
                self.add_compartment(Compartment::new(
                    record.id.clone(),
                    Vector::from(record.min),
                    Vector::from(record.max),
                ))?;
            }
        }

        let mut handles = HashMap::new();
        for record in &snapshot.entities {
            let id = self.add_entity(&record.class, false)?;
            handles.insert(record.id.clone(), id);
            if let Some(link) = &record.spatial_link {
                self.apply_link_record(id, link)?;
            }
        }

        let resolve = |env: &Environment, site: &SiteRecord| -> Result<SiteRef, EngineError> {
            let entity = handles.get(&site.entity).copied().ok_or_else(|| {
                EngineError::InvariantViolation(format!(
                    "snapshot bond references unknown entity '{}'",
                    site.entity
                ))
            })?;
            env.binding_site_ref(entity, &site.binding_site)
        };
        for bond in &snapshot.bonds {
            let active = resolve(self, &bond.active)?;
            let passive = resolve(self, &bond.passive)?;
            self.instant_bind(active, passive)?;
        }

        for record in &snapshot.entities {
            if let Some(link) = &record.spatial_link {
                let id = handles[&record.id];
                let compound = self.compound_of(id);
                if let Some(compound) = compound.and_then(|c| self.compounds.get_mut(c)) {
                    compound.root = Some(id);
                }
                self.apply_link_record(id, link)?;
            }
        }

        info!(
            entities = handles.len(),
            bonds = snapshot.bonds.len(),
            "Restored environment snapshot"
        );
        Ok(handles)
    }

    fn apply_link_record(&mut self, entity: EntityId, link: &SpatialLinkRecord) -> Result<(), EngineError> {
        let compound = self.compound_of(entity).ok_or_else(|| {
            EngineError::InvariantViolation(format!("entity {:?} has no compound", entity))
        })?;
        let loc_rot = LocRot::from(link.loc_rot);
        match link.kind {
            SpatialLinkType::Fixed if link.editable => self.fix_editable(compound, loc_rot),
            SpatialLinkType::Fixed => self.fix(compound, loc_rot),
            SpatialLinkType::Floating => self.float_at(compound, loc_rot),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::marker::BindingState;
    use crate::engine::test_support::*;
    use tempfile::NamedTempFile;

    fn chain_env() -> (Environment, Vec<EntityId>) {
        let mut env = rod_env();
        env.add_compartment(Compartment::new(
            "cell",
            Vector::new(-50.0, -50.0, -50.0),
            Vector::new(50.0, 50.0, 50.0),
        ))
        .unwrap();
        let chain = rod_chain(&mut env, 3);
        let compound = env.compound_of(chain[0]).unwrap();
        env.fix_editable(compound, LocRot::from_location(Vector::new(1.0, 2.0, 3.0)))
            .unwrap();
        env.add_entity("rod", true).unwrap();
        env.update(0.1).unwrap();
        (env, chain)
    }

    #[test]
    fn snapshot_records_bonds_from_initiators_only() {
        let (env, _) = chain_env();
        let snapshot = env.snapshot();

        assert_eq!(snapshot.entities.len(), 4);
        assert_eq!(snapshot.bonds.len(), 2);
        assert_eq!(
            snapshot.bonds.last().unwrap().active,
            SiteRecord { entity: "e0".to_string(), binding_site: "s1".to_string() }
        );

        let root = &snapshot.entities[0];
        let link = root.spatial_link.as_ref().unwrap();
        assert_eq!(link.kind, SpatialLinkType::Fixed);
        assert!(link.editable);
        assert_eq!(link.loc_rot.location, [1.0, 2.0, 3.0]);
        assert!(snapshot.entities[1].spatial_link.is_none());
        assert_eq!(
            snapshot.entities[3].spatial_link.as_ref().map(|l| l.kind),
            Some(SpatialLinkType::Floating)
        );
    }

    #[test]
    fn restore_rebuilds_graph_and_links() {
        let (mut env, _) = chain_env();
        let snapshot = env.snapshot();

        let handles = env.restore(&snapshot).unwrap();
        env.update(0.1).unwrap();

        assert_eq!(env.entity_count(), 4);
        assert_eq!(env.compounds().count(), 2);
        let (e0, e1, e2) = (handles["e0"], handles["e1"], handles["e2"]);
        assert_eq!(env.compound_of(e0), env.compound_of(e2));
        assert_eq!(env.binding_state(SiteRef::new(e1, 1)).unwrap(), BindingState::Bound);

        let compound = env.compound(env.compound_of(e0).unwrap()).unwrap();
        assert_eq!(compound.root(), Some(e0));
        assert_eq!(compound.spatial_link().map(|l| l.kind()), Some(SpatialLinkType::Fixed));
        assert!(
            env.entity(e0)
                .unwrap()
                .loc_rot()
                .approx_eq(&LocRot::from_location(Vector::new(1.0, 2.0, 3.0)), 1e-9)
        );
        assert_eq!(env.snapshot().bonds.len(), 2);
    }

    #[test]
    fn snapshot_survives_a_file_round_trip() {
        let (env, _) = chain_env();
        let snapshot = env.snapshot();
        let file = NamedTempFile::new().unwrap();

        snapshot.save(file.path()).unwrap();
        assert_eq!(EnvironmentSnapshot::load(file.path()).unwrap(), snapshot);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<EnvironmentSnapshot, _> =
            toml::from_str("[[entities]]\nid = \"e0\"\nclass = \"rod\"\ncolor = \"red\"\n");
        assert!(result.is_err());
    }
}
