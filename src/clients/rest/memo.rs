//! Memoized server configuration.
//!
//! The configurator result is a single shared value with at most one
//! resolution in flight. Operations that arrive while a resolution is pending
//! wait on it and receive the same outcome, success or failure.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::watch;

use crate::clients::rest::{ConfigurationError, Configurator};
use crate::config::ConfiguratorFailurePolicy;

/// Outcome of one configurator call.
pub(crate) type Resolved = Result<Option<Arc<Value>>, ConfigurationError>;

enum Slot {
    Unresolved,
    Resolving(watch::Receiver<Option<Resolved>>),
    Resolved(Resolved),
}

enum Step<'a> {
    Wait(watch::Receiver<Option<Resolved>>),
    Lead(Resolution<'a>),
}

/// Shared, memoized server configuration of one client.
pub(crate) struct ConfigurationMemo {
    slot: Mutex<Slot>,
}

impl Default for ConfigurationMemo {
    fn default() -> Self {
        Self {
            slot: Mutex::new(Slot::Unresolved),
        }
    }
}

impl ConfigurationMemo {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the memoized configuration, calling the configurator if no
    /// result is stored and no call is pending.
    ///
    /// A failure is delivered to every operation waiting on that call. Under
    /// [`ConfiguratorFailurePolicy::Retry`] it is then forgotten, so the next
    /// operation calls the configurator again; under
    /// [`ConfiguratorFailurePolicy::Poison`] it is kept.
    pub(crate) async fn resolve(
        &self,
        configurator: &dyn Configurator,
        policy: ConfiguratorFailurePolicy,
    ) -> Resolved {
        loop {
            let step = {
                let mut slot = self.slot();
                match &*slot {
                    Slot::Resolved(resolved) => return resolved.clone(),
                    Slot::Resolving(receiver) => Step::Wait(receiver.clone()),
                    Slot::Unresolved => {
                        let (sender, receiver) = watch::channel(None);
                        *slot = Slot::Resolving(receiver);
                        Step::Lead(Resolution {
                            memo: self,
                            sender: Some(sender),
                        })
                    }
                }
            };

            match step {
                Step::Wait(mut receiver) => {
                    tracing::trace!("Waiting for pending server configuration");
                    let shared = receiver
                        .wait_for(Option::is_some)
                        .await
                        .ok()
                        .and_then(|settled| (*settled).clone());
                    // A closed channel means the resolving operation was dropped.
                    if let Some(resolved) = shared {
                        return resolved;
                    }
                }
                Step::Lead(resolution) => {
                    let resolved = configurator
                        .get_configuration()
                        .await
                        .map(|configuration| configuration.map(Arc::new));
                    match &resolved {
                        Ok(configuration) => tracing::debug!(
                            provided = configuration.is_some(),
                            "Resolved server configuration"
                        ),
                        Err(error) => tracing::warn!(
                            policy = ?policy,
                            "Configurator failed: {}",
                            error
                        ),
                    }
                    let keep = resolved.is_ok() || policy == ConfiguratorFailurePolicy::Poison;
                    resolution.settle(resolved.clone(), keep);
                    return resolved;
                }
            }
        }
    }
}

/// A configurator call in progress.
///
/// Dropping it unsettled resets the slot so a later operation can resolve.
struct Resolution<'a> {
    memo: &'a ConfigurationMemo,
    sender: Option<watch::Sender<Option<Resolved>>>,
}

impl Resolution<'_> {
    fn settle(mut self, resolved: Resolved, keep: bool) {
        *self.memo.slot() = if keep {
            Slot::Resolved(resolved.clone())
        } else {
            Slot::Unresolved
        };
        if let Some(sender) = self.sender.take() {
            sender.send_replace(Some(resolved));
        }
    }
}

impl Drop for Resolution<'_> {
    fn drop(&mut self) {
        if self.sender.is_some() {
            *self.memo.slot() = Slot::Unresolved;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::BoxFuture;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct SlowConfigurator {
        calls: AtomicUsize,
        fail: bool,
    }

    impl SlowConfigurator {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl Configurator for SlowConfigurator {
        fn get_configuration(&self) -> BoxFuture<'_, Result<Option<Value>, ConfigurationError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                if self.fail {
                    Err(ConfigurationError::new("offline"))
                } else {
                    Ok(Some(json!({"zone": 1})))
                }
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_resolution_is_shared() {
        let memo = ConfigurationMemo::new();
        let configurator = SlowConfigurator::new(false);
        let policy = ConfiguratorFailurePolicy::Retry;

        let (first, second) = tokio::join!(
            memo.resolve(&configurator, policy),
            memo.resolve(&configurator, policy),
        );

        assert_eq!(first.unwrap().as_deref(), Some(&json!({"zone": 1})));
        assert_eq!(second.unwrap().as_deref(), Some(&json!({"zone": 1})));
        assert_eq!(configurator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_failure_is_forgotten_under_retry() {
        let memo = ConfigurationMemo::new();
        let configurator = SlowConfigurator::new(true);
        let policy = ConfiguratorFailurePolicy::Retry;

        let (first, second) = tokio::join!(
            memo.resolve(&configurator, policy),
            memo.resolve(&configurator, policy),
        );

        assert!(first.is_err());
        assert!(second.is_err());
        assert_eq!(configurator.calls.load(Ordering::SeqCst), 1);

        assert!(memo.resolve(&configurator, policy).await.is_err());
        assert_eq!(configurator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_resolution_lets_the_next_caller_resolve() {
        let memo = ConfigurationMemo::new();
        let configurator = SlowConfigurator::new(false);
        let policy = ConfiguratorFailurePolicy::Retry;

        let cancelled = tokio::time::timeout(
            Duration::from_millis(5),
            memo.resolve(&configurator, policy),
        )
        .await;
        assert!(cancelled.is_err());

        assert!(memo.resolve(&configurator, policy).await.is_ok());
        assert_eq!(configurator.calls.load(Ordering::SeqCst), 2);
    }
}
