use thiserror::Error;

/// Errors reported by the geometry decomposer, the shape stores and the render manager.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// The outline cannot produce a usable mesh (too few points, zero area, ...).
    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    /// A store is already registered under this name.
    #[error("a store named {0:?} is already registered")]
    DuplicateName(String),

    /// No store is registered under this name.
    #[error("no store named {0:?} is registered")]
    UnknownStore(String),

    /// Parallel instance attribute arrays disagree in length.
    ///
    /// This is an internal invariant violation, never a recoverable condition.
    #[error("attribute {attribute} of store {store:?} has {found} rows, expected {expected}")]
    AttributeLengthMismatch {
        store: String,
        attribute: &'static str,
        expected: usize,
        found: usize,
    },

    /// The triangulator rejected an outline that passed validation.
    #[error("triangulation failed: {0}")]
    Triangulation(String),
}

impl RenderError {
    pub(crate) fn invalid_geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry { reason: reason.into() }
    }
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
