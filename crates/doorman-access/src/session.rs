//! Pending password sessions, one per door, with their expiry timers.
//!
//! The store is the only shared mutable state in the access flow. Every
//! operation on a door runs under that door's shard lock, so operations on
//! one door are serialized while doors on other shards proceed in parallel.
//! Locks are never held across an await; expiry callbacks run after the
//! entry has been removed and the lock released.
//!
//! # Generations
//!
//! Every installed session gets a store-wide unique generation number. A
//! timer only expires the entry it was armed for, and a checked-out session
//! can only be put back if nothing touched the door since it was taken.
//! This keeps stale timers and stale restores from ever acting on a newer
//! session.
//!
//! ```text
//! put ──► Armed ──take_if_valid──► Checkout ──restore──► Armed (same window)
//!           │                         │
//!           │ timer                   └── dropped: session consumed
//!           ▼
//!       on_expire(session)
//! ```

use doorman_core::{CardCode, DeviceId, DoorId, GrantId};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Default number of lock shards.
pub const DEFAULT_SHARDS: usize = 16;

/// Callback run by a session's timer once the session has been removed.
pub type OnExpire = Arc<dyn Fn(PendingSession) -> BoxFuture<'static, ()> + Send + Sync>;

/// An in-progress authentication attempt for one door.
///
/// Immutable once created; a wrong password does not change it.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingSession {
    pub door_id: DoorId,
    pub reader_device_id: DeviceId,
    /// Keypad to notify when the session times out.
    pub keypad_device_id: DeviceId,
    pub card_code: CardCode,
    /// Issued card whose password must be entered.
    pub grant_id: GrantId,
    pub password_hash: String,
    pub expires_at: Instant,
}

impl PendingSession {
    /// Valid strictly before `expires_at`.
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

impl fmt::Debug for PendingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSession")
            .field("door_id", &self.door_id)
            .field("reader_device_id", &self.reader_device_id)
            .field("keypad_device_id", &self.keypad_device_id)
            .field("card_code", &self.card_code)
            .field("grant_id", &self.grant_id)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Result of [`SessionStore::take_if_valid`].
#[derive(Debug)]
pub enum Take {
    /// No session was pending for the door.
    Absent,
    /// A session was pending but its window had closed; it has been removed.
    Expired(PendingSession),
    /// The session, removed from the store until restored.
    Valid(Checkout),
}

/// A session removed by [`SessionStore::take_if_valid`].
///
/// Dropping it consumes the session. Passing it to
/// [`SessionStore::restore`] puts it back with its original expiry.
pub struct Checkout {
    session: PendingSession,
    generation: u64,
    failed_attempts: u32,
    on_expire: OnExpire,
}

impl Checkout {
    pub fn session(&self) -> &PendingSession {
        &self.session
    }

    /// Wrong passwords already recorded against this session.
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn into_session(self) -> PendingSession {
        self.session
    }
}

impl fmt::Debug for Checkout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checkout")
            .field("session", &self.session)
            .field("generation", &self.generation)
            .field("failed_attempts", &self.failed_attempts)
            .finish_non_exhaustive()
    }
}

struct Armed {
    session: PendingSession,
    timer: AbortHandle,
    on_expire: OnExpire,
    failed_attempts: u32,
}

/// Per-door state. A vacant slot remembers the generation of the session
/// last taken from it so that session, and only that one, can be restored.
struct Slot {
    generation: u64,
    armed: Option<Armed>,
}

struct Inner {
    shards: Box<[Mutex<HashMap<DoorId, Slot>>]>,
    hasher: RandomState,
    next_generation: AtomicU64,
}

impl Inner {
    fn shard(&self, door_id: &DoorId) -> &Mutex<HashMap<DoorId, Slot>> {
        let index = (self.hasher.hash_one(door_id) as usize) % self.shards.len();
        &self.shards[index]
    }

    fn next_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Remove the entry armed as `generation`, if it is still installed.
    fn expire(&self, door_id: &DoorId, generation: u64) -> Option<Armed> {
        let mut slots = self.shard(door_id).lock();
        let slot = slots.get_mut(door_id)?;
        if slot.generation != generation {
            return None;
        }
        let armed = slot.armed.take()?;
        slots.remove(door_id);
        Some(armed)
    }
}

/// Holds at most one [`PendingSession`] per door and owns their timers.
///
/// Cloning is cheap; clones share the same sessions. Must be used from
/// within a tokio runtime since arming a timer spawns a task.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("shards", &self.inner.shards.len())
            .field("pending", &self.len())
            .finish()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    pub fn with_shards(shards: usize) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| Mutex::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            inner: Arc::new(Inner {
                shards,
                hasher: RandomState::new(),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Install `session` for its door and arm a timer that runs `on_expire`
    /// after `timeout` unless the session is taken or replaced first.
    ///
    /// Any session already pending for the door is replaced and its timer
    /// cancelled before the new one is armed. Returns the replaced session.
    pub fn put(
        &self,
        session: PendingSession,
        timeout: Duration,
        on_expire: OnExpire,
    ) -> Option<PendingSession> {
        let door_id = session.door_id.clone();
        let generation = self.inner.next_generation();

        let mut slots = self.inner.shard(&door_id).lock();
        let previous = slots.remove(&door_id).and_then(|slot| slot.armed).map(|old| {
            old.timer.abort();
            old.session
        });

        let timer = self.arm(door_id.clone(), generation, timeout);
        slots.insert(
            door_id,
            Slot {
                generation,
                armed: Some(Armed {
                    session,
                    timer,
                    on_expire,
                    failed_attempts: 0,
                }),
            },
        );

        previous
    }

    /// Copy of the session pending for `door_id`, if any.
    pub fn get(&self, door_id: &DoorId) -> Option<PendingSession> {
        self.inner
            .shard(door_id)
            .lock()
            .get(door_id)
            .and_then(|slot| slot.armed.as_ref())
            .map(|armed| armed.session.clone())
    }

    /// Remove the session for `door_id` and cancel its timer.
    ///
    /// The session is handed out only if `now` is strictly before its
    /// expiry; an expired session is removed all the same and reported as
    /// [`Take::Expired`].
    pub fn take_if_valid(&self, door_id: &DoorId, now: Instant) -> Take {
        let mut slots = self.inner.shard(door_id).lock();
        let Some(slot) = slots.get_mut(door_id) else {
            return Take::Absent;
        };
        let Some(armed) = slot.armed.take() else {
            return Take::Absent;
        };
        armed.timer.abort();

        if !armed.session.is_valid_at(now) {
            slots.remove(door_id);
            return Take::Expired(armed.session);
        }

        Take::Valid(Checkout {
            session: armed.session,
            generation: slot.generation,
            failed_attempts: armed.failed_attempts,
            on_expire: armed.on_expire,
        })
    }

    /// Put a checked-out session back after a failed attempt, keeping its
    /// original expiry and counting the attempt.
    ///
    /// Returns `false` (and drops the session) if the door was touched since
    /// the checkout: a new scan installed another session or the door was
    /// cleared. If the window closed meanwhile, the timer fires immediately.
    pub fn restore(&self, checkout: Checkout) -> bool {
        let Checkout {
            session,
            generation,
            failed_attempts,
            on_expire,
        } = checkout;
        let door_id = session.door_id.clone();

        let mut slots = self.inner.shard(&door_id).lock();
        let Some(slot) = slots.get_mut(&door_id) else {
            return false;
        };
        if slot.generation != generation || slot.armed.is_some() {
            return false;
        }

        let remaining = session.remaining_at(Instant::now());
        let timer = self.arm(door_id, generation, remaining);
        slot.armed = Some(Armed {
            session,
            timer,
            on_expire,
            failed_attempts: failed_attempts.saturating_add(1),
        });

        true
    }

    /// Remove the door's entry and cancel its timer. Idempotent.
    pub fn clear(&self, door_id: &DoorId) -> bool {
        let removed = self.inner.shard(door_id).lock().remove(door_id);
        match removed.and_then(|slot| slot.armed) {
            Some(armed) => {
                armed.timer.abort();
                true
            }
            None => false,
        }
    }

    /// Cancel every timer and drop every session. Returns how many
    /// sessions were pending.
    pub fn clear_all(&self) -> usize {
        let mut cleared = 0;
        for shard in self.inner.shards.iter() {
            for (door_id, slot) in shard.lock().drain() {
                if let Some(armed) = slot.armed {
                    armed.timer.abort();
                    debug!(door_id = %door_id, "Pending session cleared");
                    cleared += 1;
                }
            }
        }
        cleared
    }

    /// Number of pending sessions.
    pub fn len(&self) -> usize {
        self.inner
            .shards
            .iter()
            .map(|shard| shard.lock().values().filter(|slot| slot.armed.is_some()).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn the timer task for `generation`. Called with the shard lock
    /// held; the task itself takes the lock only after sleeping.
    fn arm(&self, door_id: DoorId, generation: u64, timeout: Duration) -> AbortHandle {
        let store: Weak<Inner> = Arc::downgrade(&self.inner);

        let task = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;

            let Some(inner) = store.upgrade() else {
                return;
            };
            let Some(armed) = inner.expire(&door_id, generation) else {
                trace!(door_id = %door_id, generation, "Stale session timer ignored");
                return;
            };
            drop(inner);

            (armed.on_expire)(armed.session).await;
        });

        task.abort_handle()
    }
}
