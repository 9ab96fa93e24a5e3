//! Shared byte-transform type used by the concrete commands in this crate.

use std::sync::Arc;

/// A `bytes -> bytes` transform applied while producing output, e.g. a
/// minifier or encoding pass. Cheap to clone since it's an `Arc`.
pub type Transform = Arc<dyn Fn(Vec<u8>) -> Vec<u8> + Send + Sync>;

/// The transform that returns its input unchanged.
pub fn identity() -> Transform {
    Arc::new(|bytes| bytes)
}
