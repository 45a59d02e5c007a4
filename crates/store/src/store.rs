//! Identity Store.
//!
//! ## Mutation model
//!
//! Mutations go through a FIFO queue. The caller that finds the queue idle
//! becomes the drainer: it applies one mutation, notifies every listener with
//! the resulting [`IdentityChange`], then moves on to the next queued mutation.
//! A mutation issued from inside a listener is queued and applied after the
//! current notification cycle completes, so every listener sees changes in the
//! same order. A mutation from another thread waits for the running drain to
//! finish and then drains itself: when the call returns, its change has been
//! applied and delivered.
//!
//! The lock is never held while listeners run; listeners may read the
//! snapshot, subscribe, unsubscribe, or mutate. A listener must not block on
//! another thread that mutates the same store.
//!
//! If a listener panics, mutations it queued during that cycle are discarded.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak, mpsc};
use std::thread::{self, ThreadId};

use tracing::{debug, warn};

use adminshell_auth::{Identity, IdentityPatch};

use crate::subscription::{Subscription, Watcher};

/// A snapshot replacement, as delivered to listeners.
#[derive(Debug, Clone)]
pub struct IdentityChange {
    /// Increases by one per applied mutation.
    pub revision: u64,
    /// The new snapshot. Every listener of the same revision receives the same
    /// allocation.
    pub snapshot: Option<Arc<Identity>>,
}

impl IdentityChange {
    pub fn identity(&self) -> Option<&Identity> {
        self.snapshot.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot.is_some()
    }
}

/// Explicit update of the current identity.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityUpdate {
    /// Replace the whole identity (e.g. with a server response).
    Replace(Identity),
    /// Apply a partial change to the current identity.
    Patch(IdentityPatch),
}

#[derive(Debug)]
enum Mutation {
    Hydrate(Option<Identity>),
    Update(IdentityUpdate),
    Clear,
}

type Listener = Arc<dyn Fn(&IdentityChange) + Send + Sync>;

struct ListenerEntry {
    id: u64,
    active: Arc<AtomicBool>,
    callback: Listener,
}

struct State {
    snapshot: Option<Arc<Identity>>,
    revision: u64,
    listeners: Vec<ListenerEntry>,
    next_listener_id: u64,
    queue: VecDeque<Mutation>,
    /// Thread running the current drain, if any.
    drainer: Option<ThreadId>,
}

impl State {
    /// Apply one mutation; `None` when it was a no-op.
    fn apply(&mut self, mutation: Mutation) -> Option<IdentityChange> {
        let next = match mutation {
            Mutation::Hydrate(identity) => identity.map(Arc::new),
            Mutation::Clear => None,
            Mutation::Update(update) => {
                let Some(current) = self.snapshot.as_deref() else {
                    warn!("identity update ignored: no identity in store");
                    return None;
                };
                match update {
                    IdentityUpdate::Replace(identity) => Some(Arc::new(identity)),
                    IdentityUpdate::Patch(patch) => Some(Arc::new(current.patched(&patch))),
                }
            }
        };

        self.snapshot = next;
        self.revision += 1;
        debug!(
            revision = self.revision,
            authenticated = self.snapshot.is_some(),
            "identity snapshot replaced"
        );

        Some(IdentityChange {
            revision: self.revision,
            snapshot: self.snapshot.clone(),
        })
    }

    fn active_listeners(&self) -> Vec<(Arc<AtomicBool>, Listener)> {
        self.listeners
            .iter()
            .map(|l| (Arc::clone(&l.active), Arc::clone(&l.callback)))
            .collect()
    }
}

struct Inner {
    state: Mutex<State>,
    idle: Condvar,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        // A listener panicking never leaves `State` half-written: the lock is
        // not held while listeners run.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_idle<'a>(&self, mut state: MutexGuard<'a, State>) -> MutexGuard<'a, State> {
        while state.drainer.is_some() {
            state = self.idle.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        state
    }

    /// End the drain and wake threads waiting to mutate.
    fn finish_drain(&self, state: &mut State) {
        state.drainer = None;
        self.idle.notify_all();
    }
}

/// Ends the drain if a listener unwinds mid-cycle, discarding what it queued.
struct DrainGuard<'a> {
    inner: &'a Inner,
    finished: bool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let discarded = {
            let mut state = self.inner.lock();
            let discarded = std::mem::take(&mut state.queue);
            self.inner.finish_drain(&mut state);
            discarded
        };
        if !discarded.is_empty() {
            warn!(discarded = discarded.len(), "listener panicked; queued identity mutations discarded");
        }
    }
}

/// Process-local cache of the authenticated identity.
///
/// Cloning yields another handle to the same store. Construct one per client
/// session (or per test); there is no global instance.
#[derive(Clone)]
pub struct IdentityStore {
    inner: Arc<Inner>,
}

impl Default for IdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityStore {
    /// An empty (unauthenticated) store.
    pub fn new() -> Self {
        Self::with_initial(None)
    }

    /// A store seeded with `initial`, at revision 0.
    pub fn with_initial(initial: Option<Identity>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    snapshot: initial.map(Arc::new),
                    revision: 0,
                    listeners: Vec::new(),
                    next_listener_id: 0,
                    queue: VecDeque::new(),
                    drainer: None,
                }),
                idle: Condvar::new(),
            }),
        }
    }

    /// Current snapshot. Never blocks on listeners.
    pub fn snapshot(&self) -> Option<Arc<Identity>> {
        self.inner.lock().snapshot.clone()
    }

    /// Snapshot and revision read together.
    pub fn current(&self) -> IdentityChange {
        let state = self.inner.lock();
        IdentityChange {
            revision: state.revision,
            snapshot: state.snapshot.clone(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.lock().snapshot.is_some()
    }

    /// Number of applied mutations so far.
    pub fn revision(&self) -> u64 {
        self.inner.lock().revision
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    /// Replace the snapshot with `identity` (server-rendered seed, login).
    pub fn hydrate(&self, identity: Option<Identity>) {
        self.enqueue(Mutation::Hydrate(identity));
    }

    /// Apply an explicit update. Ignored when nobody is logged in.
    pub fn update(&self, update: IdentityUpdate) {
        self.enqueue(Mutation::Update(update));
    }

    pub fn replace(&self, identity: Identity) {
        self.update(IdentityUpdate::Replace(identity));
    }

    pub fn patch(&self, patch: IdentityPatch) {
        self.update(IdentityUpdate::Patch(patch));
    }

    /// Log out: drop the snapshot and notify every listener with `None`.
    pub fn clear(&self) {
        self.enqueue(Mutation::Clear);
    }

    /// Register `listener`; it is called after every snapshot replacement,
    /// starting with the next one.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&IdentityChange) + Send + Sync + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));

        let id = {
            let mut state = self.inner.lock();
            let id = state.next_listener_id;
            state.next_listener_id += 1;
            state.listeners.push(ListenerEntry {
                id,
                active: Arc::clone(&active),
                callback: Arc::new(listener),
            });
            id
        };

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        Subscription::new(
            active,
            Box::new(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                // The entry is dropped after the lock is released: its callback
                // may own further subscriptions on this store.
                let removed = {
                    let mut state = inner.lock();
                    let index = state.listeners.iter().position(|l| l.id == id);
                    index.map(|i| state.listeners.remove(i))
                };
                drop(removed);
            }),
        )
    }

    /// Channel-backed subscription for consumers that poll.
    pub fn watch(&self) -> Watcher<IdentityChange> {
        let (tx, rx) = mpsc::channel();
        let subscription = self.subscribe(move |change| {
            // The watcher may already be gone; its subscription detaches on drop.
            let _ = tx.send(change.clone());
        });
        Watcher::new(rx, subscription)
    }

    fn enqueue(&self, mutation: Mutation) {
        let current = thread::current().id();
        {
            let mut state = self.inner.lock();
            if state.drainer == Some(current) {
                state.queue.push_back(mutation);
                debug!(queued = state.queue.len(), "mutation deferred until current notification cycle completes");
                return;
            }

            let mut state = self.inner.wait_idle(state);
            state.queue.push_back(mutation);
            state.drainer = Some(current);
        }
        self.drain();
    }

    fn drain(&self) {
        let mut guard = DrainGuard {
            inner: &self.inner,
            finished: false,
        };

        loop {
            let (change, listeners) = {
                let mut state = self.inner.lock();
                let Some(mutation) = state.queue.pop_front() else {
                    self.inner.finish_drain(&mut state);
                    guard.finished = true;
                    return;
                };
                match state.apply(mutation) {
                    Some(change) => (change, state.active_listeners()),
                    None => continue,
                }
            };

            for (active, callback) in listeners {
                if active.load(Ordering::Acquire) {
                    callback(&change);
                }
            }
        }
    }
}

impl core::fmt::Debug for IdentityStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("IdentityStore")
            .field("revision", &state.revision)
            .field("authenticated", &state.snapshot.is_some())
            .field("listeners", &state.listeners.len())
            .field("queued", &state.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adminshell_auth::{Preferences, Role, UserStatus};
    use adminshell_core::UserId;
    use std::time::Duration;

    fn user(name: &str) -> Identity {
        Identity::new(
            UserId::new(),
            format!("{name}@example.com"),
            name,
            name.to_uppercase(),
        )
        .with_role(Role::new("editor", "Editor"))
    }

    /// Listener that records every change it sees.
    fn recorder(store: &IdentityStore) -> (Arc<Mutex<Vec<IdentityChange>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = store.subscribe(move |change| sink.lock().unwrap().push(change.clone()));
        (seen, sub)
    }

    fn names(changes: &[IdentityChange]) -> Vec<Option<String>> {
        changes
            .iter()
            .map(|c| c.identity().map(|i| i.username.clone()))
            .collect()
    }

    #[test]
    fn starts_empty_or_seeded() {
        assert!(IdentityStore::new().snapshot().is_none());

        let seeded = IdentityStore::with_initial(Some(user("ana")));
        assert_eq!(seeded.snapshot().unwrap().username, "ana");
        assert_eq!(seeded.revision(), 0);
    }

    #[test]
    fn hydrate_then_subscribe_sees_next_mutation() {
        let store = IdentityStore::new();
        let ana = user("ana");
        store.hydrate(Some(ana.clone()));

        let (seen, _sub) = recorder(&store);
        assert!(seen.lock().unwrap().is_empty(), "subscribe must not replay");
        assert_eq!(store.snapshot().as_deref(), Some(&ana));
        assert_eq!(store.snapshot().as_deref(), Some(&ana));

        store.patch(IdentityPatch {
            status: Some(UserStatus::Online),
            ..Default::default()
        });

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let observed = seen[0].identity().unwrap();
        assert_eq!(observed.username, "ana");
        assert_eq!(observed.status, UserStatus::Online);
    }

    #[test]
    fn every_subscriber_observes_the_same_snapshot() {
        let store = IdentityStore::new();
        let (a, _sa) = recorder(&store);
        let (b, _sb) = recorder(&store);
        let (c, _sc) = recorder(&store);

        store.hydrate(Some(user("ana")));
        store.replace(user("bo"));

        let a = a.lock().unwrap();
        let b = b.lock().unwrap();
        let c = c.lock().unwrap();
        assert_eq!(a.len(), 2);
        for i in 0..2 {
            assert_eq!(a[i].revision, b[i].revision);
            let (sa, sb, sc) = (
                a[i].snapshot.as_ref().unwrap(),
                b[i].snapshot.as_ref().unwrap(),
                c[i].snapshot.as_ref().unwrap(),
            );
            assert!(Arc::ptr_eq(sa, sb) && Arc::ptr_eq(sb, sc));
        }
        assert!(Arc::ptr_eq(a[1].snapshot.as_ref().unwrap(), &store.snapshot().unwrap()));
    }

    #[test]
    fn clear_notifies_everyone_before_returning() {
        let store = IdentityStore::with_initial(Some(user("ana")));
        let (a, _sa) = recorder(&store);
        let (b, _sb) = recorder(&store);

        store.clear();

        assert!(store.snapshot().is_none());
        assert_eq!(names(&a.lock().unwrap()), vec![None]);
        assert_eq!(names(&b.lock().unwrap()), vec![None]);
    }

    #[test]
    fn notifications_follow_mutation_order() {
        let store = IdentityStore::new();
        let (seen, _sub) = recorder(&store);

        store.hydrate(Some(user("ana")));
        store.patch(IdentityPatch {
            preferences: Some(Preferences {
                theme: "rose".to_string(),
                ..Preferences::default()
            }),
            ..Default::default()
        });
        store.clear();

        let seen = seen.lock().unwrap();
        let revisions: Vec<u64> = seen.iter().map(|c| c.revision).collect();
        assert_eq!(revisions, vec![1, 2, 3]);
        assert_eq!(seen[0].identity().unwrap().preferences.theme, "default");
        assert_eq!(seen[1].identity().unwrap().preferences.theme, "rose");
        assert!(seen[2].snapshot.is_none());
    }

    #[test]
    fn update_without_identity_is_ignored() {
        let store = IdentityStore::new();
        let (seen, _sub) = recorder(&store);

        store.patch(IdentityPatch {
            display_name: Some("ghost".to_string()),
            ..Default::default()
        });
        store.replace(user("ghost"));

        assert!(store.snapshot().is_none());
        assert_eq!(store.revision(), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn reentrant_mutation_is_deferred_until_cycle_completes() {
        let store = IdentityStore::new();
        let log = Arc::new(Mutex::new(Vec::<String>::new()));

        // First listener reacts to login by pushing a status update.
        let reacting = {
            let store_handle = store.clone();
            let log = Arc::clone(&log);
            store.subscribe(move |change| {
                log.lock().unwrap().push(format!("first:{}", change.revision));
                let online = change
                    .identity()
                    .is_some_and(|i| i.status == UserStatus::Online);
                if change.is_authenticated() && !online {
                    store_handle.patch(IdentityPatch {
                        status: Some(UserStatus::Online),
                        ..Default::default()
                    });
                    // Still the pre-patch snapshot: the patch is queued.
                    assert_eq!(store_handle.revision(), change.revision);
                }
            })
        };
        let observing = {
            let log = Arc::clone(&log);
            store.subscribe(move |change| {
                log.lock().unwrap().push(format!("second:{}", change.revision));
            })
        };

        store.hydrate(Some(user("ana")));

        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:1", "second:1", "first:2", "second:2"]
        );
        assert_eq!(store.snapshot().unwrap().status, UserStatus::Online);
        drop((reacting, observing));
    }

    #[test]
    fn unsubscribing_during_notification_stops_delivery() {
        let store = IdentityStore::new();
        let victim_slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let victim_calls = Arc::new(Mutex::new(0u32));

        let _killer = {
            let slot = Arc::clone(&victim_slot);
            store.subscribe(move |_| {
                slot.lock().unwrap().take();
            })
        };
        let victim = {
            let calls = Arc::clone(&victim_calls);
            store.subscribe(move |_| *calls.lock().unwrap() += 1)
        };
        *victim_slot.lock().unwrap() = Some(victim);

        store.hydrate(Some(user("ana")));
        store.clear();

        assert_eq!(*victim_calls.lock().unwrap(), 0);
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn listener_can_unsubscribe_itself() {
        let store = IdentityStore::new();
        let own: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(Mutex::new(0u32));

        let sub = {
            let own = Arc::clone(&own);
            let calls = Arc::clone(&calls);
            store.subscribe(move |_| {
                *calls.lock().unwrap() += 1;
                own.lock().unwrap().take();
            })
        };
        *own.lock().unwrap() = Some(sub);

        store.hydrate(Some(user("ana")));
        store.clear();

        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn dropping_subscription_detaches() {
        let store = IdentityStore::new();
        let (seen, sub) = recorder(&store);
        assert!(sub.is_active());
        sub.unsubscribe();

        store.hydrate(Some(user("ana")));
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn independent_stores_do_not_interfere() {
        let a = IdentityStore::new();
        let b = IdentityStore::new();
        a.hydrate(Some(user("ana")));
        assert!(b.snapshot().is_none());
        assert_eq!(b.revision(), 0);
    }

    #[test]
    fn watcher_receives_changes_on_another_thread() {
        let store = IdentityStore::new();
        let watcher = store.watch();

        let handle = std::thread::spawn(move || {
            let first = watcher.recv_timeout(Duration::from_secs(5)).unwrap();
            let second = watcher.recv_timeout(Duration::from_secs(5)).unwrap();
            (first.revision, second.snapshot.is_none())
        });

        store.hydrate(Some(user("ana")));
        store.clear();

        assert_eq!(handle.join().unwrap(), (1, true));
        // The watcher was dropped with the thread.
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn panicking_listener_does_not_wedge_the_store() {
        let store = IdentityStore::new();
        let bomb = store.subscribe(|change| {
            if change.revision == 1 {
                panic!("listener failure");
            }
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            store.hydrate(Some(user("ana")));
        }));
        assert!(result.is_err());
        drop(bomb);

        let (seen, _sub) = recorder(&store);
        store.clear();
        assert_eq!(names(&seen.lock().unwrap()), vec![None]);
    }

    #[test]
    fn mutations_queued_by_a_panicking_listener_are_discarded() {
        let store = IdentityStore::new();
        let bomb = {
            let handle = store.clone();
            store.subscribe(move |change| {
                if change.revision == 1 {
                    handle.patch(IdentityPatch {
                        status: Some(UserStatus::Busy),
                        ..Default::default()
                    });
                    panic!("listener failure");
                }
            })
        };

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            store.hydrate(Some(user("ana")));
        }));
        assert!(result.is_err());
        drop(bomb);
        assert_eq!(store.revision(), 1);

        store.hydrate(Some(user("bo")));
        let snapshot = store.snapshot().unwrap();
        assert_eq!(store.revision(), 2);
        assert_eq!(snapshot.username, "bo");
        assert_eq!(snapshot.status, UserStatus::Offline);
    }

    #[test]
    fn dropping_a_listener_that_owns_another_subscription() {
        let store = IdentityStore::new();
        let (done_tx, done_rx) = mpsc::channel();

        let worker = {
            let store = store.clone();
            std::thread::spawn(move || {
                let child = store.subscribe(|_| {});
                let parent = store.subscribe(move |_| {
                    let _owned = &child;
                });
                assert_eq!(store.listener_count(), 2);
                drop(parent);
                let _ = done_tx.send(store.listener_count());
            })
        };

        assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)), Ok(0));
        worker.join().unwrap();
    }

    #[test]
    fn clear_from_another_thread_waits_for_running_drain() {
        let store = IdentityStore::new();
        let (entered_tx, entered_rx) = mpsc::channel();
        let _slow = store.subscribe(move |change| {
            if change.revision == 1 {
                let _ = entered_tx.send(());
                std::thread::sleep(Duration::from_millis(300));
            }
        });
        let (seen, _sub) = recorder(&store);

        let hydrating = {
            let store = store.clone();
            std::thread::spawn(move || store.hydrate(Some(user("ana"))))
        };
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        store.clear();

        assert!(store.snapshot().is_none());
        assert_eq!(
            names(&seen.lock().unwrap()),
            vec![Some("ana".to_string()), None]
        );
        hydrating.join().unwrap();
        assert_eq!(store.revision(), 2);
    }
}
