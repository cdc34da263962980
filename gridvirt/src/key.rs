/// Default row identity: callers without stable row ids can fall back to a
/// hash of the row payload (or the row index for static datasets).
pub type RowKey = u64;

/// Identity used to key the durable height cache so that measurements follow
/// rows across dataset rebuilds and reorders.
pub trait RowIdentity: core::hash::Hash + Eq + Clone {}
impl<K: core::hash::Hash + Eq + Clone> RowIdentity for K {}
