//! Presence synchronizer.
//!
//! Owns the match state and all dispatch bookkeeping behind one lock, so a
//! full "read state, compute transition, build payload, decide dispatch"
//! cycle is atomic with respect to concurrent HTTP handlers and the process
//! watcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use fraglight_types::BridgeSettings;
use tracing::{debug, info, warn};

use super::client::{ConnectionState, PresenceClient};
use super::payload::{PresencePayload, build_payload, menu_payload};
use crate::error::BridgeError;
use crate::gsi::{NormalizedSnapshot, Snapshot};
use crate::tracker::{MatchState, advance_match_state};

/// Wait between failed IPC cycles before trying a fresh connection.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

pub struct PresenceSync<C: PresenceClient> {
    inner: Mutex<SyncInner<C>>,
    settings: BridgeSettings,
    min_dispatch_interval: Duration,
    /// Liveness flag owned by the process watcher; read-only here.
    game_running: Arc<AtomicBool>,
}

struct SyncInner<C> {
    client: C,
    connection: ConnectionState,
    match_state: MatchState,
    last_snapshot: Option<NormalizedSnapshot>,
    last_fingerprint: Option<u64>,
    last_dispatch: Option<Instant>,
    retry_after: Option<Instant>,
    /// True while no presence is shown; makes clearing idempotent.
    cleared: bool,
}

impl<C: PresenceClient> PresenceSync<C> {
    pub fn new(client: C, settings: BridgeSettings, game_running: Arc<AtomicBool>) -> Self {
        let min_dispatch_interval = Duration::from_millis(settings.min_dispatch_interval_ms);
        Self {
            inner: Mutex::new(SyncInner {
                client,
                connection: ConnectionState::Disconnected,
                match_state: MatchState::default(),
                last_snapshot: None,
                last_fingerprint: None,
                last_dispatch: None,
                retry_after: None,
                cleared: true,
            }),
            settings,
            min_dispatch_interval,
            game_running,
        }
    }

    /// Fold one received snapshot into tracked state and re-sync presence.
    /// Entry point for the ingestion endpoint.
    pub fn apply_snapshot(&self, snapshot: Snapshot) -> Result<(), BridgeError> {
        let normalized = NormalizedSnapshot::from_snapshot(&snapshot);
        let mut inner = self.lock()?;
        // A stray push while the game process is not detected must not
        // drive the tracker; it would log phantom enter/leave transitions.
        if !self.game_running.load(Ordering::Relaxed) {
            self.sync_locked(&mut inner, false);
            return Ok(());
        }
        let signals = advance_match_state(&mut inner.match_state, &normalized);
        inner.last_snapshot = Some(normalized);
        self.sync_locked(&mut inner, !signals.is_empty());
        Ok(())
    }

    /// The game process was (re)detected: restart the elapsed clock and show
    /// the default presence.
    pub fn game_started(&self) {
        let Ok(mut inner) = self.lock() else { return };
        inner.match_state.restart_clock();
        inner.last_snapshot = None;
        self.sync_locked(&mut inner, true);
    }

    /// The game process disappeared: clear presence and reset match state.
    pub fn game_stopped(&self) {
        let Ok(mut inner) = self.lock() else { return };
        self.clear_locked(&mut inner);
        inner.match_state.reset();
        inner.last_snapshot = None;
        inner.last_fingerprint = None;
    }

    /// Final cleanup on process exit.
    pub fn shutdown(&self) {
        let Ok(mut inner) = self.lock() else { return };
        self.clear_locked(&mut inner);
        inner.client.dispose();
        inner.connection = ConnectionState::Disconnected;
    }

    fn lock(&self) -> Result<MutexGuard<'_, SyncInner<C>>, BridgeError> {
        self.inner
            .lock()
            .map_err(|_| BridgeError::Internal("presence state lock poisoned"))
    }

    /// One full sync cycle. Runs entirely under the lock.
    fn sync_locked(&self, inner: &mut SyncInner<C>, transitioned: bool) {
        if !self.game_running.load(Ordering::Relaxed) {
            if !inner.cleared {
                self.clear_locked(inner);
            }
            inner.match_state.reset();
            inner.last_fingerprint = None;
            return;
        }

        let payload = match &inner.last_snapshot {
            Some(snapshot) => build_payload(&inner.match_state, snapshot, &self.settings),
            None => menu_payload(inner.match_state.start_unix),
        };

        let fingerprint = payload.fingerprint();
        let changed = inner.last_fingerprint != Some(fingerprint);
        // Transitions force a dispatch even on a hash collision, but never
        // bypass the throttle; a mid-throttle candidate is dropped.
        if !changed && !transitioned {
            return;
        }
        if let Some(last) = inner.last_dispatch
            && last.elapsed() < self.min_dispatch_interval
        {
            debug!("presence update throttled");
            return;
        }

        self.dispatch_locked(inner, payload, fingerprint);
    }

    fn dispatch_locked(&self, inner: &mut SyncInner<C>, payload: PresencePayload, fingerprint: u64) {
        if !self.ensure_ready(inner) {
            return;
        }
        match inner.client.set_presence(&payload) {
            Ok(()) => {
                debug!(details = %payload.details, state = %payload.state, "presence updated");
                inner.last_fingerprint = Some(fingerprint);
                inner.last_dispatch = Some(Instant::now());
                inner.cleared = false;
            }
            Err(err) => {
                warn!(%err, "presence dispatch failed; dropping client");
                self.fail_client(inner);
            }
        }
    }

    /// Idempotent explicit clear. No-op when nothing is shown.
    fn clear_locked(&self, inner: &mut SyncInner<C>) {
        if inner.cleared {
            return;
        }
        if !self.ensure_ready(inner) {
            return;
        }
        match inner.client.clear_presence() {
            Ok(()) => {
                info!("presence cleared");
                inner.cleared = true;
                inner.last_fingerprint = None;
            }
            Err(err) => {
                warn!(%err, "presence clear failed; dropping client");
                self.fail_client(inner);
            }
        }
    }

    /// Bring the connection to `Ready`, honoring the reconnect backoff.
    /// Returns false when dispatch must be skipped this cycle.
    fn ensure_ready(&self, inner: &mut SyncInner<C>) -> bool {
        match inner.connection {
            ConnectionState::Ready => true,
            ConnectionState::Error
                if inner
                    .retry_after
                    .is_some_and(|deadline| Instant::now() < deadline) =>
            {
                debug!("presence client in backoff; skipping cycle");
                false
            }
            _ => {
                inner.connection = ConnectionState::Connecting;
                match inner.client.initialize() {
                    Ok(()) => {
                        info!("presence client connected");
                        inner.connection = ConnectionState::Ready;
                        inner.retry_after = None;
                        true
                    }
                    Err(err) => {
                        warn!(%err, "presence client failed to connect");
                        inner.connection = ConnectionState::Error;
                        inner.retry_after = Some(Instant::now() + RECONNECT_BACKOFF);
                        false
                    }
                }
            }
        }
    }

    fn fail_client(&self, inner: &mut SyncInner<C>) {
        inner.client.dispose();
        inner.connection = ConnectionState::Error;
        inner.retry_after = Some(Instant::now() + RECONNECT_BACKOFF);
    }
}

#[cfg(test)]
impl<C: PresenceClient> PresenceSync<C> {
    pub(crate) fn connection_state(&self) -> ConnectionState {
        self.inner.lock().unwrap().connection
    }

    pub(crate) fn is_in_match(&self) -> bool {
        self.inner.lock().unwrap().match_state.in_match
    }

    pub(crate) fn has_pending_snapshot(&self) -> bool {
        self.inner.lock().unwrap().last_snapshot.is_some()
    }

    pub(crate) fn last_known_map(&self) -> String {
        self.inner.lock().unwrap().match_state.last_known_map.clone()
    }

    /// Pretend the reconnect backoff already elapsed.
    pub(crate) fn expire_backoff(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.retry_after = Some(Instant::now() - Duration::from_millis(1));
    }
}
