use crate::model::MissingField;
use crate::store::StoreError;
use thiserror::Error;

/// Failure taxonomy for catalog operations. Callers classify by variant,
/// never by message text.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Invalid(#[from] MissingField),

    #[error("spell already exists for this system")]
    AlreadyExists,

    /// More than one spell matched an identity lookup. A name filter without
    /// a `system` filter can legitimately match spells in several systems;
    /// the caller narrows with `system` to disambiguate.
    #[error("multiple matching spells found")]
    AmbiguousMatch,

    /// Only produced by operations that must act on an existing spell
    /// (delete). Lookups report absence through an empty result instead.
    #[error("no matching spell found")]
    NotFound,

    #[error("failed to decode stored spell during {operation}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("spell store failed during {operation}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl CatalogError {
    pub(crate) fn decode(operation: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { operation, source }
    }

    pub(crate) fn store(operation: &'static str, source: StoreError) -> Self {
        Self::Store { operation, source }
    }
}
