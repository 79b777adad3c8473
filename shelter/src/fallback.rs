//! Application-level fallback tier.
//!
//! Where the named cache holds raw responses, this tier holds the last
//! successfully parsed result of a logical query (a decoded movie list, for
//! instance) as JSON in a [`KeyValueStore`]. It is independent of the named
//! cache and survives when every namespace is cleared.
//!
//! Records never expire. They are overwritten by the next success for the
//! same logical key, so free-text keys such as search terms accumulate until
//! the medium is cleared externally. A key prefix keeps them in one block
//! the host can clear.

use std::fmt;
use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use shelter_backend::KeyValueStore;
use smol_str::SmolStr;
use tracing::{debug, warn};

/// Application-defined identifier of a fallback record.
///
/// ```
/// use shelter::LogicalKey;
///
/// assert_eq!(LogicalKey::new("popular-movies").as_str(), "popular-movies");
/// assert_eq!(LogicalKey::search("alien").as_str(), "search:alien");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogicalKey(SmolStr);

impl LogicalKey {
    /// Wraps an arbitrary identifier.
    pub fn new(key: impl Into<SmolStr>) -> Self {
        LogicalKey(key.into())
    }

    /// Key of the results of a search for `term`.
    pub fn search(term: &str) -> Self {
        LogicalKey(SmolStr::from(format!("search:{term}")))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for LogicalKey {
    fn from(key: &str) -> Self {
        LogicalKey::new(key)
    }
}

impl From<String> for LogicalKey {
    fn from(key: String) -> Self {
        LogicalKey::new(key)
    }
}

/// Result of a remote call guarded by [`StaleDataFallback::with_fallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recalled<T> {
    /// The remote call succeeded.
    Fresh(T),
    /// The remote call failed; this is the last remembered result.
    Stale(T),
    /// The remote call failed and nothing was remembered.
    Empty,
}

impl<T> Recalled<T> {
    /// The value, if any.
    pub fn into_option(self) -> Option<T> {
        match self {
            Recalled::Fresh(value) | Recalled::Stale(value) => Some(value),
            Recalled::Empty => None,
        }
    }

    /// Returns `true` if the value came from the remote call.
    pub fn is_fresh(&self) -> bool {
        matches!(self, Recalled::Fresh(_))
    }

    /// Returns `true` if there is nothing to render.
    pub fn is_empty(&self) -> bool {
        matches!(self, Recalled::Empty)
    }
}

impl<T: Default> Recalled<T> {
    /// The value, or the empty state of `T`.
    pub fn unwrap_or_default(self) -> T {
        self.into_option().unwrap_or_default()
    }
}

/// Last-known-good results of logical queries, kept in a key-value store.
///
/// Every operation is infallible from the caller's side: a failed write is
/// logged and dropped, a missing or unreadable record recalls as `None`.
///
/// ```
/// use shelter::{LogicalKey, StaleDataFallback};
/// use shelter_backend::MemoryStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let fallback = StaleDataFallback::new(MemoryStore::new());
/// let key = LogicalKey::new("popular-movies");
///
/// fallback.remember(&key, &vec![1, 2, 3]).await;
/// assert_eq!(fallback.recall::<Vec<u32>>(&key).await, Some(vec![1, 2, 3]));
/// assert_eq!(fallback.recall::<Vec<u32>>(&"missing-key".into()).await, None);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StaleDataFallback<S> {
    store: S,
    prefix: SmolStr,
}

impl<S> StaleDataFallback<S>
where
    S: KeyValueStore,
{
    /// Creates a fallback tier storing records under their bare logical key.
    pub fn new(store: S) -> Self {
        StaleDataFallback {
            store,
            prefix: SmolStr::default(),
        }
    }

    /// Stores records under `prefix` followed by the logical key.
    pub fn with_prefix(mut self, prefix: impl Into<SmolStr>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn storage_key(&self, key: &LogicalKey) -> String {
        format!("{}{}", self.prefix, key.as_str())
    }

    /// Reads the last remembered value for `key`.
    ///
    /// `None` means "render the empty state", never a failure.
    pub async fn recall<T>(&self, key: &LogicalKey) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let storage_key = self.storage_key(key);
        let raw = match self.store.get(&storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(%key, "no fallback record");
                return None;
            }
            Err(error) => {
                warn!(%key, %error, store = %self.store.label(), "failed to read fallback record");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(%key, %error, "fallback record is not valid JSON for the requested type");
                None
            }
        }
    }

    /// Overwrites the record for `key` with `value`.
    ///
    /// Storage failures are logged and otherwise ignored.
    pub async fn remember<T>(&self, key: &LogicalKey, value: &T)
    where
        T: Serialize + ?Sized,
    {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%key, %error, "failed to encode fallback record");
                return;
            }
        };
        match self.store.set(&self.storage_key(key), &raw).await {
            Ok(()) => debug!(%key, bytes = raw.len(), "fallback record remembered"),
            Err(error) => {
                warn!(%key, %error, store = %self.store.label(), "failed to write fallback record")
            }
        }
    }

    /// Runs a remote call, remembering its result or recalling the last one.
    ///
    /// Never fails: the error of the remote call is logged and replaced by
    /// the remembered value, or by [`Recalled::Empty`].
    pub async fn with_fallback<T, E, F, Fut>(&self, key: &LogicalKey, call: F) -> Recalled<T>
    where
        T: Serialize + DeserializeOwned,
        E: fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match call().await {
            Ok(value) => {
                self.remember(key, &value).await;
                Recalled::Fresh(value)
            }
            Err(error) => {
                warn!(%key, %error, "remote call failed, recalling last result");
                match self.recall(key).await {
                    Some(value) => Recalled::Stale(value),
                    None => Recalled::Empty,
                }
            }
        }
    }
}
