use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("concurrent update detected: {0}")]
    Conflict(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("unit {0} has already reached its weekly cap")]
    CapReached(String),
}

impl StoreError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Failures surfaced by administrative operations.
#[derive(Debug, Error)]
pub enum RotationError {
    #[error("invalid cursor position {0}: positions start at 1")]
    InvalidPosition(i32),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("unit {unit_id} does not belong to module {module_id}")]
    UnitNotInModule { unit_id: String, module_id: String },
    #[error("selection for module {module_id} is already confirmed")]
    SelectionAlreadyConfirmed { module_id: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}
