use thiserror::Error;

use crate::access::AccessError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HydrateError {
    #[error("no type registered under id '{0}'")]
    UnknownType(String),

    #[error("no metadata registered for the runtime type of the hydration target")]
    UnregisteredTarget,

    #[error("hydration data for type '{type_id}' is not a mapping")]
    NotAMapping { type_id: String },

    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("no discrimination for '{value}' in field '{field}'")]
    UnresolvedDiscriminator { field: String, value: String },

    #[error("nesting depth exceeds limit of {limit}")]
    DepthLimit { limit: usize },

    #[error("failed to write field: {0}")]
    Access(#[from] AccessError),
}
