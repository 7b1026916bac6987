use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Structure class '{structure_class}' has no conformations")]
    NoConformations { structure_class: String },

    #[error(
        "Conformation '{conformation}' has {found} atom positions, but the structure defines {expected} atoms"
    )]
    AtomCountMismatch {
        conformation: String,
        expected: usize,
        found: usize,
    },

    #[error(
        "Conformation '{conformation}' has {found} marker placements, but {expected} markers are defined"
    )]
    MarkerCountMismatch {
        conformation: String,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate conformation id '{0}'")]
    DuplicateConformation(String),

    #[error("Duplicate marker id '{0}'")]
    DuplicateMarker(String),

    #[error("Unknown element symbol '{0}'")]
    UnknownElement(String),

    #[error("Conformation '{conformation}' not found in structure class '{structure_class}'")]
    ConformationNotFound {
        structure_class: String,
        conformation: String,
    },

    #[error("Invalid marker '{marker}': {reason}")]
    InvalidMarker { marker: String, reason: String },
}
