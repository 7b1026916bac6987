use thiserror::Error;

use crate::core::models::error::ModelError;
use crate::core::models::ids::{CompoundId, EntityId};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Entity class '{0}' is not registered")]
    EntityClassNotFound(String),

    #[error("Entity class '{0}' is already registered")]
    DuplicateEntityClass(String),

    #[error("Entity {0:?} does not exist")]
    EntityNotFound(EntityId),

    #[error("Compound {0:?} does not exist")]
    CompoundNotFound(CompoundId),

    #[error("Entity '{entity}' has no marker '{marker}'")]
    MarkerNotFound { entity: String, marker: String },

    #[error("Entity '{entity}' has no binding site '{site}'")]
    BindingSiteNotFound { entity: String, site: String },

    #[error("Entity '{entity}' has no sensor '{sensor}'")]
    SensorNotFound { entity: String, sensor: String },

    #[error("Compartment '{0}' does not exist")]
    CompartmentNotFound(String),

    #[error("Compartment '{0}' is already registered")]
    DuplicateCompartment(String),

    #[error("No entity factory registered under '{0}'")]
    EntityFactoryNotFound(String),

    #[error("Entity '{entity}' already belongs to a compound")]
    EntityAlreadyOwned { entity: String },

    #[error("The spatial link of compound {0:?} is not an editable fixed link")]
    LinkNotEditable(CompoundId),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Model error: {source}")]
    Model {
        #[from]
        source: ModelError,
    },
}
