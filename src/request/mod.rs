//! Action requests
//!
//! Everything the engine knows about a proposed action:
//! - `ActionKind` - closed set of action categories
//! - `ActionPayload` - kind-specific fields
//! - `RequestContext` - ambient fields present for every kind
//! - `ActionRequest` - the normalized, immutable request
//! - `normalize` - raw JSON record -> `ActionRequest`

mod normalizer;
mod types;

pub use normalizer::{normalize, NormalizationError};
pub use types::{ActionKind, ActionPayload, ActionRequest, RequestContext};
