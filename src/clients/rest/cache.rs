//! Response cache with in-flight coalescing.
//!
//! Entries are keyed by a [`Fingerprint`] of the request. A key maps either
//! to a settled response with an expiry instant, or to a pending dispatch
//! that later callers wait on instead of dispatching again.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Lifetime given to entries whose TTL does not fit in an [`Instant`].
const FOREVER: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::clients::rest::errors::DispatchFailure;
use crate::clients::{Request, Response};

/// Outcome of a dispatch, shared with every coalesced waiter.
pub(crate) type Settled = Result<Response, DispatchFailure>;

/// Normalized key of a request: method, URL, parameters, headers and payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Fingerprint(String);

impl Fingerprint {
    pub(crate) fn of(request: &Request) -> Self {
        let mut canonical = format!("{}\n{}\n", request.method(), request.url());
        for (name, value) in request.parameters() {
            let _ = writeln!(canonical, "p:{name}={value}");
        }
        for (name, value) in request.headers().lowercased().iter() {
            let _ = writeln!(canonical, "h:{name}={value}");
        }
        if let Some(data) = request.data() {
            let _ = writeln!(canonical, "d:{data}");
        }

        let digest = Sha256::digest(canonical.as_bytes());
        Self(URL_SAFE_NO_PAD.encode(digest))
    }

    #[cfg(test)]
    fn as_str(&self) -> &str {
        &self.0
    }
}

enum Slot {
    Ready {
        response: Response,
        expires_at: Instant,
    },
    Pending {
        flight: u64,
        receiver: watch::Receiver<Option<Settled>>,
    },
}

/// Result of a cache lookup.
pub(crate) enum Lookup<'a> {
    /// An unexpired response is stored under the key.
    Hit(Response),
    /// Another caller is dispatching this request; wait for its outcome.
    Wait(watch::Receiver<Option<Settled>>),
    /// Nobody is dispatching this request; the caller must do it and settle
    /// the returned flight.
    Lead(InFlight<'a>),
}

/// In-memory response cache shared by all operations of one client.
#[derive(Default)]
pub(crate) struct ResponseCache {
    slots: Mutex<HashMap<Fingerprint, Slot>>,
    next_flight: AtomicU64,
}

impl ResponseCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<Fingerprint, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Looks up `key`, purging expired entries first.
    pub(crate) fn lookup(&self, key: &Fingerprint) -> Lookup<'_> {
        let now = Instant::now();
        let mut slots = self.slots();
        slots.retain(|_, slot| match slot {
            Slot::Ready { expires_at, .. } => *expires_at > now,
            Slot::Pending { .. } => true,
        });

        match slots.get(key) {
            Some(Slot::Ready { response, .. }) => Lookup::Hit(response.clone()),
            Some(Slot::Pending { receiver, .. }) => Lookup::Wait(receiver.clone()),
            None => {
                let flight = self.next_flight.fetch_add(1, Ordering::Relaxed);
                let (sender, receiver) = watch::channel(None);
                slots.insert(key.clone(), Slot::Pending { flight, receiver });
                Lookup::Lead(InFlight {
                    cache: self,
                    key: key.clone(),
                    flight,
                    sender,
                })
            }
        }
    }

    /// Stores a settled response for `ttl`. The last writer wins.
    pub(crate) fn store(&self, key: Fingerprint, response: Response, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(FOREVER))
            .unwrap_or(now);
        self.slots().insert(
            key,
            Slot::Ready {
                response,
                expires_at,
            },
        );
    }

    /// Drops every settled entry. Pending dispatches are kept so their
    /// waiters still receive the outcome.
    pub(crate) fn clear(&self) {
        self.slots()
            .retain(|_, slot| matches!(slot, Slot::Pending { .. }));
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots().len()
    }
}

/// A dispatch in progress for one fingerprint.
///
/// The pending entry lives until the flight is settled or stored, so
/// identical requests keep waiting while the leader post-processes. Dropping
/// the flight unsettled (for example when the leading operation is
/// cancelled) removes the pending entry; waiters then observe a closed
/// channel and look the key up again.
pub(crate) struct InFlight<'a> {
    cache: &'a ResponseCache,
    key: Fingerprint,
    flight: u64,
    sender: watch::Sender<Option<Settled>>,
}

impl InFlight<'_> {
    /// Publishes the outcome to every waiter and removes the pending entry.
    pub(crate) fn settle(self, settled: Settled) {
        self.sender.send_replace(Some(settled));
    }

    /// Stores the response for `ttl`, replacing the pending entry, and
    /// publishes it to every waiter.
    pub(crate) fn store(self, response: Response, ttl: Duration) {
        self.cache.store(self.key.clone(), response.clone(), ttl);
        self.sender.send_replace(Some(Ok(response)));
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut slots = self.cache.slots();
        let owned = matches!(
            slots.get(&self.key),
            Some(Slot::Pending { flight, .. }) if *flight == self.flight
        );
        if owned {
            slots.remove(&self.key);
        }
    }
}
