use thiserror::Error;

use crate::access::AccessError;
use crate::hydrate::HydrateError;
use crate::metadata::SignatureError;

/// Top-level error type for the imbue library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("hydration error: {0}")]
    Hydrate(#[from] HydrateError),

    #[error("property access error: {0}")]
    Access(#[from] AccessError),

    #[error("registration error: {0}")]
    Signature(#[from] SignatureError),
}
