/// Domain-level errors shared across the printlab crates.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A referenced entity does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Kind of entity, e.g. `"print area"`.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A task state transition that the state machine does not allow.
    #[error("Invalid task transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}
