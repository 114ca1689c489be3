use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use time::OffsetDateTime;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::app::context::ActivityContext;
use crate::app::feed::FeedView;
use crate::domain::badge::BadgeCounts;
use crate::domain::push::{RegistrationEvent, RegistrationPhase};
use crate::AppState;

/// Mutable per-session state for one (hub, user). The epoch pins every
/// asynchronous result to the session that requested it: anything
/// produced under an older epoch is discarded at apply time.
pub struct Session {
    pub ctx: ActivityContext,
    pub epoch: u64,
    last_seen: Mutex<OffsetDateTime>,
    feed: Mutex<FeedView>,
    reset_generation: AtomicU64,
    badge: Mutex<Option<BadgeCounts>>,
    registration: Mutex<RegistrationPhase>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|err| err.into_inner())
}

impl Session {
    fn new(ctx: ActivityContext, epoch: u64) -> Self {
        Self {
            ctx,
            epoch,
            last_seen: Mutex::new(OffsetDateTime::now_utc()),
            feed: Mutex::new(FeedView::new()),
            reset_generation: AtomicU64::new(0),
            badge: Mutex::new(None),
            registration: Mutex::new(RegistrationPhase::Unregistered),
            poller: Mutex::new(None),
        }
    }

    pub fn touch(&self) {
        *lock(&self.last_seen) = OffsetDateTime::now_utc();
    }

    pub fn idle_seconds(&self) -> i64 {
        (OffsetDateTime::now_utc() - *lock(&self.last_seen)).whole_seconds()
    }

    /// Starts a new reset generation; any reset begun under an earlier
    /// generation will be discarded when it tries to apply.
    pub fn begin_reset(&self) -> u64 {
        self.reset_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn reset_generation(&self) -> u64 {
        self.reset_generation.load(Ordering::SeqCst)
    }

    pub fn feed_len(&self) -> usize {
        lock(&self.feed).len()
    }

    pub fn apply_feed_page(
        &self,
        generation: u64,
        reset: bool,
        records: Vec<crate::domain::notification::NotificationRecord>,
        has_more: bool,
    ) -> bool {
        if generation != self.reset_generation() {
            return false;
        }
        lock(&self.feed).apply_page(reset, records, has_more);
        true
    }

    pub fn note_read(&self, id: Uuid) {
        lock(&self.feed).note_read(id);
    }

    pub fn note_all_read(&self) {
        lock(&self.feed).note_all_read();
    }

    pub fn set_badges(&self, counts: BadgeCounts) {
        *lock(&self.badge) = Some(counts);
    }

    pub fn badges(&self) -> Option<BadgeCounts> {
        lock(&self.badge).clone()
    }

    pub fn registration_phase(&self) -> RegistrationPhase {
        *lock(&self.registration)
    }

    pub fn advance_registration(&self, event: RegistrationEvent) -> RegistrationPhase {
        let mut phase = lock(&self.registration);
        *phase = phase.advance(event);
        *phase
    }

    pub fn attach_poller(&self, handle: JoinHandle<()>) {
        let previous = lock(&self.poller).replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn release_poller(&self) {
        if let Some(handle) = lock(&self.poller).take() {
            handle.abort();
        }
    }
}

/// Live sessions keyed by user. A user is in at most one hub at a time;
/// switching hubs cancels the old session and starts a fresh one.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<Uuid, Arc<Session>>>>,
    epochs: Arc<AtomicU64>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            epochs: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns the session for `ctx`, creating one (or replacing a
    /// session pinned to a different hub) as needed. The bool reports
    /// whether a new session was created.
    pub fn begin(&self, ctx: ActivityContext) -> (Arc<Session>, bool) {
        let replaced = {
            let mut sessions = lock(&self.inner);
            match sessions.get(&ctx.user_id) {
                Some(existing) if existing.ctx == ctx => {
                    existing.touch();
                    return (existing.clone(), false);
                }
                _ => {
                    let epoch = self.epochs.fetch_add(1, Ordering::SeqCst) + 1;
                    let session = Arc::new(Session::new(ctx, epoch));
                    let replaced = sessions.insert(ctx.user_id, session.clone());
                    (session, replaced)
                }
            }
        };
        let (session, old) = replaced;
        if let Some(old) = old {
            tracing::debug!(
                user_id = %ctx.user_id,
                old_hub = %old.ctx.hub_id,
                new_hub = %ctx.hub_id,
                "hub changed, restarting session"
            );
            old.release_poller();
        }
        (session, true)
    }

    pub fn get(&self, user_id: Uuid) -> Option<Arc<Session>> {
        lock(&self.inner).get(&user_id).cloned()
    }

    pub fn end(&self, user_id: Uuid) -> bool {
        let removed = lock(&self.inner).remove(&user_id);
        match removed {
            Some(session) => {
                session.release_poller();
                true
            }
            None => false,
        }
    }

    /// Staleness check for poll results: true while `epoch` still names
    /// the live session for this user.
    pub fn matches(&self, user_id: Uuid, epoch: u64) -> bool {
        lock(&self.inner)
            .get(&user_id)
            .map(|session| session.epoch == epoch)
            .unwrap_or(false)
    }

    /// Applies a badge snapshot unless the session it was computed for
    /// is gone or has been replaced. Last write wins between
    /// overlapping refreshes for the same epoch; snapshots are
    /// idempotent so either order is correct.
    pub fn apply_badges(&self, ctx: ActivityContext, epoch: u64, counts: BadgeCounts) -> bool {
        let session = {
            let sessions = lock(&self.inner);
            sessions.get(&ctx.user_id).cloned()
        };
        match session {
            Some(session) if session.epoch == epoch && session.ctx == ctx => {
                session.set_badges(counts);
                true
            }
            _ => false,
        }
    }

    pub fn idle_expired(&self, user_id: Uuid, max_idle_seconds: u64) -> bool {
        self.get(user_id)
            .map(|session| session.idle_seconds() >= max_idle_seconds as i64)
            .unwrap_or(true)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Get-or-create the session and make sure its poll loop is running.
pub fn ensure(state: &AppState, ctx: ActivityContext) -> Arc<Session> {
    let (session, created) = state.sessions.begin(ctx);
    if created {
        let handle = tokio::spawn(crate::jobs::badge_poller::session_loop(
            state.clone(),
            ctx,
            session.epoch,
        ));
        session.attach_poller(handle);
    }
    session
}
