use super::color::Color;
use super::geometry::Vector;
use super::loc_rot::{LocRot, LocRotRecord};
use super::models::atom::Atom;
use super::models::collider::{Collider, ColliderGeometry};
use super::models::conformation::Conformation;
use super::models::entity_class::{DEFAULT_BEHAVIOR_ID, EntityClass};
use super::models::error::ModelError;
use super::models::marker::MarkerClass;
use super::models::structure::EntityStructureClass;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct EntityClassData {
    #[serde(default = "default_behavior")]
    behavior: String,
    atoms: Vec<String>,
    #[serde(default)]
    markers: Vec<MarkerData>,
    conformations: Vec<ConformationData>,
}

fn default_behavior() -> String {
    DEFAULT_BEHAVIOR_ID.to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum MarkerData {
    Plain {
        id: String,
    },
    BindingSite {
        id: String,
    },
    Sensor {
        id: String,
        range: f64,
        aperture_degrees: f64,
    },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct ConformationData {
    id: String,
    #[serde(default = "default_color")]
    color: [f32; 4],
    atom_positions: Vec<[f64; 3]>,
    #[serde(default)]
    marker_placements: Vec<LocRotRecord>,
    colliders: Option<Vec<SphereData>>,
}

fn default_color() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct SphereData {
    center: [f64; 3],
    radius: f64,
}

/// A set of entity classes loaded from a TOML file, keyed by class id.
///
/// Each top-level table is one class:
///
/// ```toml
/// [o2]
/// atoms = ["O", "O"]
/// markers = [{ kind = "binding_site", id = "site" }]
///
/// [[o2.conformations]]
/// id = "default"
/// atom_positions = [[-0.6, 0.0, 0.0], [0.6, 0.0, 0.0]]
/// marker_placements = [{ location = [0.0, 1.0, 0.0] }]
/// ```
#[derive(Debug, Clone, Default)]
pub struct EntityClassLibrary {
    classes: BTreeMap<String, Arc<EntityClass>>,
}

impl EntityClassLibrary {
    pub fn load(path: &Path) -> Result<Self, LibraryLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LibraryLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let data: BTreeMap<String, EntityClassData> =
            toml::from_str(&content).map_err(|e| LibraryLoadError::Toml {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;

        let mut classes = BTreeMap::new();
        for (id, class_data) in data {
            let class = build_class(&id, class_data).map_err(|source| LibraryLoadError::Model {
                class: id.clone(),
                source,
            })?;
            classes.insert(id, Arc::new(class));
        }
        Ok(Self { classes })
    }

    pub fn get(&self, id: &str) -> Option<&Arc<EntityClass>> {
        self.classes.get(id)
    }

    /// Classes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<EntityClass>> {
        self.classes.values()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

fn build_class(id: &str, data: EntityClassData) -> Result<EntityClass, ModelError> {
    let atoms = data
        .atoms
        .iter()
        .map(|symbol| Atom::from_symbol(symbol))
        .collect::<Result<Vec<_>, _>>()?;

    let markers = data
        .markers
        .into_iter()
        .map(|marker| match marker {
            MarkerData::Plain { id } => Ok(MarkerClass::plain(id)),
            MarkerData::BindingSite { id } => Ok(MarkerClass::binding_site(id)),
            MarkerData::Sensor {
                id,
                range,
                aperture_degrees,
            } => MarkerClass::sensor(id, range, aperture_degrees.to_radians()),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let conformations = data
        .conformations
        .into_iter()
        .map(|c| {
            let positions: Vec<Vector> = c.atom_positions.into_iter().map(Vector::from).collect();
            let collider = match c.colliders {
                Some(spheres) => Collider::new(
                    spheres
                        .into_iter()
                        .map(|s| ColliderGeometry::Sphere {
                            center: Vector::from(s.center),
                            radius: s.radius,
                        })
                        .collect(),
                ),
                None => Collider::bounding_sphere(&positions),
            };
            Conformation::new(
                c.id,
                positions,
                c.marker_placements.into_iter().map(LocRot::from).collect(),
                collider,
                Color::from(c.color),
            )
        })
        .collect();

    let structure_class = EntityStructureClass::new(id, atoms, conformations)?;
    EntityClass::new(id, Arc::new(structure_class), data.behavior, markers)
}

#[derive(Debug, Error)]
pub enum LibraryLoadError {
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
    #[error("Invalid entity class '{class}': {source}")]
    Model { class: String, source: ModelError },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::marker::MarkerKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_library(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    const HEMOGLOBIN_LIKE: &str = r#"
[o2]
atoms = ["O", "O"]
markers = [{ kind = "binding_site", id = "site" }]

[[o2.conformations]]
id = "default"
atom_positions = [[-0.6, 0.0, 0.0], [0.6, 0.0, 0.0]]
marker_placements = [{ location = [0.0, 1.0, 0.0] }]

[carrier]
behavior = "present.step"
atoms = ["Fe"]
markers = [
    { kind = "binding_site", id = "pocket" },
    { kind = "sensor", id = "eye", range = 20.0, aperture_degrees = 90.0 },
    { kind = "plain", id = "tag" },
]

[[carrier.conformations]]
id = "tense"
color = [1.0, 0.0, 0.0, 1.0]
atom_positions = [[0.0, 0.0, 0.0]]
marker_placements = [
    { location = [0.0, 2.0, 0.0], rotation = [0.0, 0.0, 0.0, 1.0] },
    { location = [0.0, 0.0, 0.0] },
    { location = [1.0, 0.0, 0.0] },
]
colliders = [{ center = [0.0, 0.0, 0.0], radius = 3.0 }]

[[carrier.conformations]]
id = "relaxed"
atom_positions = [[0.0, 0.5, 0.0]]
marker_placements = [
    { location = [0.0, 2.5, 0.0] },
    { location = [0.0, 0.0, 0.0] },
    { location = [1.0, 0.0, 0.0] },
]
"#;

    #[test]
    fn loads_valid_library() {
        let file = write_library(HEMOGLOBIN_LIKE);
        let library = EntityClassLibrary::load(file.path()).unwrap();

        assert_eq!(library.len(), 2);
        let ids: Vec<_> = library.iter().map(|c| c.id().to_string()).collect();
        assert_eq!(ids, vec!["carrier", "o2"]);

        let carrier = library.get("carrier").unwrap();
        assert_eq!(carrier.behavior_id(), "present.step");
        assert_eq!(carrier.structure_class().conformations().len(), 2);
        match carrier.markers()[1].kind() {
            MarkerKind::Sensor { range, aperture } => {
                assert_eq!(range, 20.0);
                assert!((aperture - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
            }
            other => panic!("expected sensor, got {:?}", other),
        }

        let o2 = library.get("o2").unwrap();
        assert_eq!(o2.behavior_id(), DEFAULT_BEHAVIOR_ID);
        assert_eq!(
            o2.structure_class().initial_conformation().color(),
            Color::WHITE
        );
    }

    #[test]
    fn reports_validation_errors_with_class_id() {
        let file = write_library(
            r#"
[broken]
atoms = ["C", "C"]

[[broken.conformations]]
id = "default"
atom_positions = [[0.0, 0.0, 0.0]]
"#,
        );
        match EntityClassLibrary::load(file.path()) {
            Err(LibraryLoadError::Model { class, source }) => {
                assert_eq!(class, "broken");
                assert!(matches!(source, ModelError::AtomCountMismatch { .. }));
            }
            other => panic!("expected model error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_fields() {
        let file = write_library(
            r#"
[x]
atoms = []
mystery = 1
conformations = []
"#,
        );
        assert!(matches!(
            EntityClassLibrary::load(file.path()),
            Err(LibraryLoadError::Toml { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = EntityClassLibrary::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(LibraryLoadError::Io { .. })));
    }
}
