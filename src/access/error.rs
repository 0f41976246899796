use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AccessError {
    #[error("field '{field}' doesn't exist on type '{type_id}'")]
    UnknownField { type_id: String, field: String },

    #[error("object passed for field '{field}' has the wrong runtime type")]
    ReceiverMismatch { field: String },

    #[error("value written to field '{field}' has the wrong runtime type")]
    ValueMismatch { field: String },

    #[error("field '{field}' is method-backed and cannot be traversed for writing")]
    NotTraversable { field: String },

    #[error("no metadata registered for the runtime type reached at '{segment}'")]
    UnregisteredType { segment: String },

    #[error("invalid property path '{path}'")]
    InvalidPath { path: String },

    #[error("value at '{path}' is not a '{expected}'")]
    TypeMismatch { path: String, expected: &'static str },
}
