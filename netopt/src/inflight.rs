//! Table of in-flight network calls.
//!
//! At most one physical call per [`RequestKey`] is active at any instant.
//! The first caller for a key becomes the leader and registers a shared
//! future; every concurrent caller for the same key awaits that future and
//! observes the same outcome.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, Shared};
use netopt_core::{Raw, RequestKey};

use crate::FetchError;

/// Future shared by every caller waiting on the same key.
pub(crate) type SharedFetch = Shared<BoxFuture<'static, Result<Raw, FetchError>>>;

/// Role of a caller after registering with the table.
pub(crate) enum Join {
    /// This caller started the call.
    Leader(SharedFetch),
    /// Another caller had already started it.
    Follower(SharedFetch),
}

impl Join {
    pub(crate) fn into_future(self) -> SharedFetch {
        match self {
            Join::Leader(fetch) | Join::Follower(fetch) => fetch,
        }
    }
}

#[derive(Default)]
pub(crate) struct InFlightTable {
    calls: DashMap<RequestKey, SharedFetch>,
}

impl InFlightTable {
    /// Returns the in-flight call for `key`, or registers the one built by
    /// `start`.
    ///
    /// The lookup and the registration happen under the same shard lock, so
    /// two callers can never both become leader.
    pub(crate) fn join_or_start(
        &self,
        key: &RequestKey,
        start: impl FnOnce() -> SharedFetch,
    ) -> Join {
        match self.calls.entry(key.clone()) {
            Entry::Occupied(entry) => Join::Follower(entry.get().clone()),
            Entry::Vacant(entry) => {
                let fetch = start();
                entry.insert(fetch.clone());
                Join::Leader(fetch)
            }
        }
    }

    pub(crate) fn remove(&self, key: &RequestKey) {
        self.calls.remove(key);
    }

    pub(crate) fn len(&self) -> usize {
        self.calls.len()
    }
}

impl std::fmt::Debug for InFlightTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlightTable")
            .field("calls", &self.calls.len())
            .finish()
    }
}
