//! Persistent key-value store trait.

use crate::result::AppResult;

/// A durable local key-value store.
///
/// This is the injected persistence seam for session flags, attempt
/// counters, the lockout record, and the manager roster. Operations are
/// synchronous: the auth state machines mutate on the calling event with
/// no suspension points, so their storage must not await.
///
/// Values are plain strings; callers serialize structured values as JSON.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key is not present.
    fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Set a value, overwriting any previous value.
    fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Remove a key. Removing an absent key is a no-op.
    fn remove(&self, key: &str) -> AppResult<()>;
}
