// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry and polling tasks for notification listeners.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{Error, ListenerError};
use crate::types::GattNotification;

use super::ListenerKey;

/// Run state of a notification listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerState {
    /// Fetching and delivering on every tick.
    Running,
    /// Registered, but not fetching.
    Paused,
    /// Terminated. A stopped listener is no longer in the registry.
    Stopped,
}

impl ListenerState {
    /// Returns true for `Running` and `Paused`.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

/// Type alias for the fetch error observer.
type ErrorObserver = Arc<dyn Fn(&ListenerKey, &Error) + Send + Sync>;

/// One registered listener.
struct ListenerEntry {
    state_tx: watch::Sender<ListenerState>,
    task: JoinHandle<()>,
}

impl ListenerEntry {
    fn state(&self) -> ListenerState {
        *self.state_tx.borrow()
    }
}

/// Manager for notification polling tasks.
///
/// Each [`ListenerKey`] owns at most one tokio task. The task repeatedly
/// invokes the caller's fetch closure, hands every returned notification to
/// the handler in order, then sleeps for the configured interval.
///
/// # Thread Safety
///
/// The registry is guarded by a `parking_lot::Mutex` that is never held across
/// an `.await`, so control calls for different keys never wait on each other's
/// network I/O.
///
/// # Failure Handling
///
/// A failed fetch is logged (and passed to the error observer, if any); the
/// listener keeps its schedule. Errors for one key never affect another.
///
/// # Cancellation
///
/// Both the in-flight fetch and the inter-poll sleep race against the stop
/// signal. A batch that is already being delivered is always finished, so
/// [`stop`](Self::stop) returns once the current handler calls complete, and
/// no handler call happens after it returns.
///
/// # Handlers
///
/// Each batch is delivered on tokio's blocking pool and awaited before the
/// next tick, so a slow handler delays its own key's next fetch only. A
/// handler that panics ends its listener; the key is dropped from the
/// registry and can be started again.
pub struct NotificationListenerManager {
    listeners: Mutex<HashMap<ListenerKey, ListenerEntry>>,
    error_observer: Option<ErrorObserver>,
}

impl NotificationListenerManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
            error_observer: None,
        }
    }

    /// Sets a callback invoked with every transient fetch error.
    #[must_use]
    pub fn with_error_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&ListenerKey, &Error) + Send + Sync + 'static,
    {
        self.error_observer = Some(Arc::new(observer));
        self
    }

    /// Starts polling for `key`.
    ///
    /// The first fetch happens immediately, then once per `interval`.
    ///
    /// # Errors
    ///
    /// - [`ListenerError::InvalidInterval`] if `interval` is zero
    /// - [`ListenerError::NoRuntime`] if called outside a tokio runtime
    /// - [`ListenerError::Duplicate`] if `key` is already running or paused;
    ///   the existing listener is left untouched
    pub fn start<F, Fut, H>(
        &self,
        key: ListenerKey,
        fetch: F,
        handler: H,
        interval: Duration,
    ) -> Result<(), ListenerError>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<GattNotification>, Error>> + Send + 'static,
        H: FnMut(GattNotification) + Send + 'static,
    {
        if interval.is_zero() {
            return Err(ListenerError::InvalidInterval);
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ListenerError::NoRuntime)?;

        let mut listeners = self.registry();
        if listeners.contains_key(&key) {
            return Err(ListenerError::Duplicate(key));
        }

        let (state_tx, state_rx) = watch::channel(ListenerState::Running);
        let task = runtime.spawn(run_listener(
            key.clone(),
            fetch,
            handler,
            interval,
            state_rx,
            self.error_observer.clone(),
        ));

        listeners.insert(key, ListenerEntry { state_tx, task });
        Ok(())
    }

    /// Pauses a running listener.
    ///
    /// A batch already being delivered completes first. Notifications keep
    /// accumulating on the server while paused.
    ///
    /// Returns `true` if the listener went from `Running` to `Paused`.
    pub fn pause(&self, key: &ListenerKey) -> bool {
        self.transition(key, ListenerState::Running, ListenerState::Paused)
    }

    /// Resumes a paused listener on its next tick.
    ///
    /// Returns `true` if the listener went from `Paused` to `Running`.
    pub fn resume(&self, key: &ListenerKey) -> bool {
        self.transition(key, ListenerState::Paused, ListenerState::Running)
    }

    fn transition(&self, key: &ListenerKey, from: ListenerState, to: ListenerState) -> bool {
        let listeners = self.registry();
        let Some(entry) = listeners.get(key) else {
            return false;
        };

        let changed = entry.state_tx.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        });
        if changed {
            tracing::info!(%key, ?to, "Notification listener state changed");
        }
        changed
    }

    /// Stops a listener and removes it from the registry.
    ///
    /// Waits for the listener's task to finish. Unknown keys are a no-op.
    ///
    /// Returns `true` if a listener was registered for `key`.
    pub async fn stop(&self, key: &ListenerKey) -> bool {
        let entry = self.registry().remove(key);
        let Some(entry) = entry else {
            return false;
        };

        entry.state_tx.send_replace(ListenerState::Stopped);
        join(key, entry.task).await;
        true
    }

    /// Stops every listener. Returns how many were registered.
    pub async fn stop_all(&self) -> usize {
        let entries: Vec<(ListenerKey, ListenerEntry)> = self.registry().drain().collect();

        for (_, entry) in &entries {
            entry.state_tx.send_replace(ListenerState::Stopped);
        }
        let count = entries.len();
        for (key, entry) in entries {
            join(&key, entry.task).await;
        }
        count
    }

    /// Returns true if a listener for `key` is running or paused.
    #[must_use]
    pub fn is_active(&self, key: &ListenerKey) -> bool {
        self.registry().contains_key(key)
    }

    /// Returns the state of the listener for `key`, if one is registered.
    #[must_use]
    pub fn state(&self, key: &ListenerKey) -> Option<ListenerState> {
        self.registry().get(key).map(ListenerEntry::state)
    }

    /// Returns the keys of all running or paused listeners.
    #[must_use]
    pub fn active_keys(&self) -> Vec<ListenerKey> {
        self.registry().keys().cloned().collect()
    }

    /// Returns the number of running or paused listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry().len()
    }

    /// Returns true if no listener is running or paused.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locks the registry, dropping entries whose task has already ended.
    ///
    /// A task only ends on its own when its handler panicked.
    fn registry(&self) -> MutexGuard<'_, HashMap<ListenerKey, ListenerEntry>> {
        let mut listeners = self.listeners.lock();
        listeners.retain(|key, entry| {
            let finished = entry.task.is_finished();
            if finished {
                tracing::debug!(%key, "Removing finished notification listener");
            }
            !finished
        });
        listeners
    }
}

impl Default for NotificationListenerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NotificationListenerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationListenerManager")
            .field("active", &self.len())
            .field("error_observer", &self.error_observer.is_some())
            .finish_non_exhaustive()
    }
}

async fn join(key: &ListenerKey, task: JoinHandle<()>) {
    if let Err(e) = task.await
        && e.is_panic()
    {
        tracing::warn!(%key, "Notification listener task panicked");
    }
}

/// Polling loop of one listener.
async fn run_listener<F, Fut, H>(
    key: ListenerKey,
    mut fetch: F,
    mut handler: H,
    interval: Duration,
    mut state_rx: watch::Receiver<ListenerState>,
    error_observer: Option<ErrorObserver>,
) where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Vec<GattNotification>, Error>> + Send + 'static,
    H: FnMut(GattNotification) + Send + 'static,
{
    tracing::info!(%key, interval_ms = interval.as_millis(), "Notification listener started");

    loop {
        let state = *state_rx.borrow();
        match state {
            ListenerState::Stopped => break,
            ListenerState::Paused => {
                if !resumed(&mut state_rx).await || !tick(&mut state_rx, interval).await {
                    break;
                }
                continue;
            }
            ListenerState::Running => {}
        }

        let fetched = tokio::select! {
            biased;
            () = stop_requested(&mut state_rx) => break,
            result = fetch() => result,
        };

        match fetched {
            Ok(notifications) if notifications.is_empty() => {}
            Ok(notifications) => {
                tracing::debug!(%key, count = notifications.len(), "Delivering notifications");
                match deliver(handler, notifications).await {
                    Ok(returned) => handler = returned,
                    Err(e) => {
                        tracing::warn!(%key, error = %e, "Notification handler failed, stopping listener");
                        break;
                    }
                }
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "Notification fetch failed, retrying next interval");
                if let Some(observer) = &error_observer {
                    observer(&key, &e);
                }
            }
        }

        if !tick(&mut state_rx, interval).await {
            break;
        }
    }

    tracing::info!(%key, "Notification listener stopped");
}

/// Runs `handler` over a batch on the blocking pool and hands it back.
///
/// Delivery always runs to completion; stop and pause are observed after it.
async fn deliver<H>(
    mut handler: H,
    notifications: Vec<GattNotification>,
) -> Result<H, tokio::task::JoinError>
where
    H: FnMut(GattNotification) + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        for notification in notifications {
            handler(notification);
        }
        handler
    })
    .await
}

/// Completes once a stop is requested or the manager is gone.
async fn stop_requested(state_rx: &mut watch::Receiver<ListenerState>) {
    let _ = state_rx
        .wait_for(|state| *state == ListenerState::Stopped)
        .await;
}

/// Sleeps one interval. Returns `false` if a stop was requested meanwhile.
async fn tick(state_rx: &mut watch::Receiver<ListenerState>, interval: Duration) -> bool {
    tokio::select! {
        biased;
        () = stop_requested(state_rx) => false,
        () = tokio::time::sleep(interval) => true,
    }
}

/// Waits while paused. Returns `false` if stopped instead of resumed.
async fn resumed(state_rx: &mut watch::Receiver<ListenerState>) -> bool {
    state_rx
        .wait_for(|state| *state != ListenerState::Paused)
        .await
        .is_ok_and(|state| *state == ListenerState::Running)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::ProtocolError;
    use crate::response::parse_notifications;

    const INTERVAL: Duration = Duration::from_millis(100);

    type Received = Arc<Mutex<Vec<String>>>;

    fn key() -> ListenerKey {
        ListenerKey::new("B0B1139AF459", "180d", "2a37")
    }

    fn notification(value: &str) -> GattNotification {
        GattNotification::new("180d", "2a37", value)
    }

    fn recorder() -> (Received, impl FnMut(GattNotification) + Send + 'static) {
        let received: Received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        (received, move |n: GattNotification| {
            sink.lock().push(n.value().to_string());
        })
    }

    /// Plays back `script`, then returns empty batches forever.
    fn scripted(
        script: Vec<Result<Vec<GattNotification>, Error>>,
    ) -> impl FnMut() -> std::future::Ready<Result<Vec<GattNotification>, Error>> + Send + 'static
    {
        let mut script = VecDeque::from(script);
        move || std::future::ready(script.pop_front().unwrap_or_else(|| Ok(Vec::new())))
    }

    /// Returns one notification per call, numbered from 1.
    fn counting() -> (
        Arc<AtomicUsize>,
        impl FnMut() -> std::future::Ready<Result<Vec<GattNotification>, Error>> + Send + 'static,
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let fetch = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(Ok::<_, Error>(vec![notification(&n.to_string())]))
        };
        (calls, fetch)
    }

    fn timeout_error() -> Error {
        Error::Protocol(ProtocolError::Timeout(100))
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_key_is_noop() {
        let manager = NotificationListenerManager::new();
        assert!(!manager.pause(&key()));
        assert!(!manager.resume(&key()));
        assert!(!manager.stop(&key()).await);
        assert!(!manager.is_active(&key()));
        assert_eq!(manager.state(&key()), None);
        assert!(manager.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_rejected() {
        let manager = NotificationListenerManager::new();
        let (_, handler) = recorder();
        let result = manager.start(key(), scripted(Vec::new()), handler, Duration::ZERO);
        assert_eq!(result, Err(ListenerError::InvalidInterval));
        assert!(!manager.is_active(&key()));
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_batch_in_order_once() {
        let manager = NotificationListenerManager::new();
        let (received, handler) = recorder();
        let fetch = scripted(vec![Ok(vec![notification("A"), notification("B")])]);

        manager.start(key(), fetch, handler, INTERVAL).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*received.lock(), vec!["A", "B"]);

        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(*received.lock(), vec!["A", "B"]);
        assert_eq!(manager.state(&key()), Some(ListenerState::Running));
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_start_rejected() {
        let manager = NotificationListenerManager::new();
        let (calls, fetch) = counting();
        let (received, handler) = recorder();
        manager.start(key(), fetch, handler, INTERVAL).unwrap();

        let (second_received, second_handler) = recorder();
        let result = manager.start(key(), scripted(Vec::new()), second_handler, INTERVAL);
        assert_eq!(result, Err(ListenerError::Duplicate(key())));

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*received.lock(), vec!["1", "2", "3"]);
        assert!(second_received.lock().is_empty());
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_start_rejected_while_paused() {
        let manager = NotificationListenerManager::new();
        let (_, handler) = recorder();
        manager
            .start(key(), scripted(Vec::new()), handler, INTERVAL)
            .unwrap();
        assert!(manager.pause(&key()));

        let (_, handler) = recorder();
        let result = manager.start(key(), scripted(Vec::new()), handler, INTERVAL);
        assert!(matches!(result, Err(ListenerError::Duplicate(_))));
        assert_eq!(manager.state(&key()), Some(ListenerState::Paused));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_halts_fetching_and_resume_continues() {
        let manager = NotificationListenerManager::new();
        let (calls, fetch) = counting();
        let (received, handler) = recorder();
        manager.start(key(), fetch, handler, INTERVAL).unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(manager.pause(&key()));
        assert!(!manager.pause(&key()));
        assert_eq!(manager.state(&key()), Some(ListenerState::Paused));
        assert!(manager.is_active(&key()));

        let fetched_before_pause = calls.load(Ordering::SeqCst);
        let delivered_before_pause = received.lock().len();
        assert_eq!(fetched_before_pause, 2);

        tokio::time::sleep(INTERVAL * 4).await;
        assert_eq!(calls.load(Ordering::SeqCst), fetched_before_pause);
        assert_eq!(received.lock().len(), delivered_before_pause);

        assert!(manager.resume(&key()));
        assert!(!manager.resume(&key()));
        tokio::time::sleep(INTERVAL * 3).await;
        assert!(calls.load(Ordering::SeqCst) > fetched_before_pause);
        assert!(received.lock().len() > delivered_before_pause);
        assert_eq!(manager.state(&key()), Some(ListenerState::Running));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_sleep_ends_delivery() {
        let manager = NotificationListenerManager::new();
        let (calls, fetch) = counting();
        let (received, handler) = recorder();
        manager.start(key(), fetch, handler, INTERVAL).unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(manager.stop(&key()).await);

        let fetched = calls.load(Ordering::SeqCst);
        let delivered = received.lock().len();
        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(calls.load(Ordering::SeqCst), fetched);
        assert_eq!(received.lock().len(), delivered);
        assert!(!manager.is_active(&key()));
        assert_eq!(manager.state(&key()), None);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_while_paused() {
        let manager = NotificationListenerManager::new();
        let (_, handler) = recorder();
        manager
            .start(key(), scripted(Vec::new()), handler, INTERVAL)
            .unwrap();
        manager.pause(&key());

        assert!(manager.stop(&key()).await);
        assert!(!manager.resume(&key()));
        assert!(manager.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_interrupts_pending_fetch() {
        let manager = NotificationListenerManager::new();
        let (received, handler) = recorder();
        manager
            .start(
                key(),
                || std::future::pending::<Result<Vec<GattNotification>, Error>>(),
                handler,
                INTERVAL,
            )
            .unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        let stopped = tokio::time::timeout(Duration::from_secs(1), manager.stop(&key())).await;
        assert_eq!(stopped.ok(), Some(true));
        assert!(received.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop_creates_fresh_listener() {
        let manager = NotificationListenerManager::new();
        let (_, handler) = recorder();
        manager
            .start(key(), scripted(Vec::new()), handler, INTERVAL)
            .unwrap();
        manager.pause(&key());
        manager.stop(&key()).await;

        let (received, handler) = recorder();
        let fetch = scripted(vec![Ok(vec![notification("fresh")])]);
        manager.start(key(), fetch, handler, INTERVAL).unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(manager.state(&key()), Some(ListenerState::Running));
        assert_eq!(*received.lock(), vec!["fresh"]);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_error_is_not_fatal() {
        let errors = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&errors);
        let manager = NotificationListenerManager::new().with_error_observer(move |k, e| {
            assert_eq!(k, &key());
            assert!(matches!(e, Error::Protocol(ProtocolError::Timeout(100))));
            observed.fetch_add(1, Ordering::SeqCst);
        });

        let (received, handler) = recorder();
        let fetch = scripted(vec![
            Ok(vec![notification("A")]),
            Err(timeout_error()),
            Ok(vec![notification("C")]),
        ]);
        manager.start(key(), fetch, handler, INTERVAL).unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(*received.lock(), vec!["A"]);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(manager.state(&key()), Some(ListenerState::Running));

        tokio::time::sleep(INTERVAL * 2).await;
        assert_eq!(*received.lock(), vec!["A", "C"]);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_payload_delivers_nothing() {
        let manager = NotificationListenerManager::new();
        let (received, handler) = recorder();
        let mut bodies = VecDeque::from(vec!["<html>oops", "", "null"]);
        let fetch = move || {
            let body = bodies.pop_front().unwrap_or("[]");
            std::future::ready(Ok::<_, Error>(parse_notifications(body)))
        };
        manager.start(key(), fetch, handler, INTERVAL).unwrap();

        tokio::time::sleep(INTERVAL * 4).await;
        assert!(received.lock().is_empty());
        assert!(manager.is_active(&key()));
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let manager = NotificationListenerManager::new();
        let other = ListenerKey::new("B0B1139AF459", "180d", "2a38");

        let (first_calls, first_fetch) = counting();
        let (second_calls, second_fetch) = counting();
        let (_, first_handler) = recorder();
        let (_, second_handler) = recorder();
        manager
            .start(key(), first_fetch, first_handler, INTERVAL)
            .unwrap();
        manager
            .start(other.clone(), second_fetch, second_handler, INTERVAL)
            .unwrap();
        assert_eq!(manager.len(), 2);

        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.stop(&key()).await;
        let first_after_stop = first_calls.load(Ordering::SeqCst);

        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(first_calls.load(Ordering::SeqCst), first_after_stop);
        assert!(second_calls.load(Ordering::SeqCst) >= 3);
        assert_eq!(manager.active_keys(), vec![other]);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_handler_frees_the_key() {
        let manager = NotificationListenerManager::new();
        let fetch = scripted(vec![Ok(vec![notification("boom")])]);
        manager
            .start(
                key(),
                fetch,
                |_: GattNotification| panic!("handler failure"),
                INTERVAL,
            )
            .unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!manager.is_active(&key()));
        assert_eq!(manager.state(&key()), None);
        assert!(manager.active_keys().is_empty());
        assert!(manager.is_empty());
        assert!(!manager.stop(&key()).await);

        let (_, handler) = recorder();
        assert!(
            manager
                .start(key(), scripted(Vec::new()), handler, INTERVAL)
                .is_ok()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_all_clears_registry() {
        let manager = NotificationListenerManager::new();
        for characteristic in ["2a37", "2a38", "2a39"] {
            let (_, handler) = recorder();
            manager
                .start(
                    ListenerKey::new("B0B1139AF459", "180d", characteristic),
                    scripted(Vec::new()),
                    handler,
                    INTERVAL,
                )
                .unwrap();
        }
        manager.pause(&ListenerKey::new("B0B1139AF459", "180d", "2a38"));

        assert_eq!(manager.stop_all().await, 3);
        assert!(manager.is_empty());
        assert!(manager.active_keys().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_manager_stops_listeners() {
        let manager = NotificationListenerManager::new();
        let (calls, fetch) = counting();
        let (_, handler) = recorder();
        manager.start(key(), fetch, handler, INTERVAL).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(manager);
        tokio::time::sleep(Duration::from_millis(10)).await;
        let fetched = calls.load(Ordering::SeqCst);

        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(calls.load(Ordering::SeqCst), fetched);
    }

    #[test]
    fn start_outside_runtime_is_rejected() {
        let manager = NotificationListenerManager::new();
        let (_, handler) = recorder();
        let result = manager.start(key(), scripted(Vec::new()), handler, INTERVAL);
        assert_eq!(result, Err(ListenerError::NoRuntime));
        assert!(!manager.is_active(&key()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn slow_handlers_do_not_stall_other_keys() {
        let manager = NotificationListenerManager::new();
        for characteristic in ["2a38", "2a39"] {
            let (_, fetch) = counting();
            manager
                .start(
                    ListenerKey::new("B0B1139AF459", "180d", characteristic),
                    fetch,
                    |_: GattNotification| std::thread::sleep(Duration::from_millis(800)),
                    Duration::from_millis(10),
                )
                .unwrap();
        }

        let (calls, fetch) = counting();
        let (received, handler) = recorder();
        manager
            .start(key(), fetch, handler, Duration::from_millis(10))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(calls.load(Ordering::SeqCst) >= 10);
        assert!(received.lock().len() >= 10);

        assert_eq!(manager.stop_all().await, 3);
    }

    #[tokio::test]
    async fn slow_handler_does_not_stall_current_thread_runtime() {
        let manager = NotificationListenerManager::new();
        let (_, slow_fetch) = counting();
        manager
            .start(
                ListenerKey::new("B0B1139AF459", "180d", "2a38"),
                slow_fetch,
                |_: GattNotification| std::thread::sleep(Duration::from_millis(800)),
                Duration::from_millis(10),
            )
            .unwrap();

        let (calls, fetch) = counting();
        let (_, handler) = recorder();
        manager
            .start(key(), fetch, handler, Duration::from_millis(10))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(calls.load(Ordering::SeqCst) >= 10);

        manager.stop_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_waits_for_batch_in_delivery() {
        let manager = NotificationListenerManager::new();
        let (received, mut record) = recorder();
        let fetch = scripted(vec![Ok(vec![notification("A"), notification("B")])]);
        manager
            .start(
                key(),
                fetch,
                move |n: GattNotification| {
                    std::thread::sleep(Duration::from_millis(20));
                    record(n);
                },
                INTERVAL,
            )
            .unwrap();

        tokio::task::yield_now().await;
        assert!(manager.stop(&key()).await);
        let delivered = received.lock().len();
        assert!(delivered == 0 || delivered == 2);
    }

    #[test]
    fn listener_state_is_active() {
        assert!(ListenerState::Running.is_active());
        assert!(ListenerState::Paused.is_active());
        assert!(!ListenerState::Stopped.is_active());
    }
}
