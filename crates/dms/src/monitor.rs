//! Shared session handle
//!
//! Lets several execution contexts (the tick driver, HTTP handlers) reach one
//! session safely. Ticks never overlap: a tick arriving while another is in
//! flight fails with `ReentrantTick`. `stop` waits for the in-flight tick to
//! finish before discarding state, so no tick observes a half-cleared session.

use crate::analysis::{DetectionSnapshot, TickOutcome};
use crate::config::DmsConfig;
use crate::observation::{Frame, Observation};
use crate::session::Session;
use crate::DmsError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

/// Whether a session is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Monitoring,
    Stopped,
}

struct ActiveSession {
    id: Uuid,
    session: Session,
}

/// Thread-safe owner of at most one running session
#[derive(Default)]
pub struct Monitor {
    slot: Mutex<Option<ActiveSession>>,
    ticking: AtomicBool,
}

/// Clears the in-flight flag when the tick ends, even on panic
struct TickGuard<'a>(&'a AtomicBool);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // A tick panicked mid-commit; its state cannot be trusted
                warn!("Session lock poisoned, discarding session state");
                let mut guard = poisoned.into_inner();
                *guard = None;
                self.slot.clear_poison();
                guard
            }
        }
    }

    /// Start a new session
    pub fn start(&self, config: DmsConfig) -> Result<Uuid, DmsError> {
        let mut slot = self.lock();
        if slot.is_some() {
            return Err(DmsError::SessionAlreadyStarted);
        }
        let session = Session::start(config)?;
        let id = Uuid::new_v4();
        info!("Session {} started", id);
        *slot = Some(ActiveSession { id, session });
        Ok(id)
    }

    /// Stop the running session, returning its final snapshot
    ///
    /// Blocks until an in-flight tick completes. Stopping when nothing runs
    /// is not an error.
    pub fn stop(&self) -> Option<DetectionSnapshot> {
        let active = self.lock().take()?;
        info!("Session {} stopped", active.id);
        Some(active.session.stop())
    }

    /// Run one tick on the current session
    pub fn tick(&self, frame: &Frame) -> Result<TickOutcome, DmsError> {
        self.tick_matching(frame, None)
    }

    /// Run one tick only if session `id` is still the running one
    ///
    /// Fails with `SessionNotStarted` once that session has been stopped,
    /// even if another session was started since.
    pub fn tick_session(&self, id: Uuid, frame: &Frame) -> Result<TickOutcome, DmsError> {
        self.tick_matching(frame, Some(id))
    }

    fn tick_matching(&self, frame: &Frame, id: Option<Uuid>) -> Result<TickOutcome, DmsError> {
        if self
            .ticking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Rejected overlapping tick");
            return Err(DmsError::ReentrantTick);
        }
        let _guard = TickGuard(&self.ticking);

        let mut slot = self.lock();
        let active = slot
            .as_mut()
            .filter(|active| id.map_or(true, |id| active.id == id))
            .ok_or(DmsError::SessionNotStarted)?;
        Ok(active.session.tick(frame))
    }

    pub fn status(&self) -> SessionStatus {
        if self.lock().is_some() {
            SessionStatus::Monitoring
        } else {
            SessionStatus::Stopped
        }
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.lock().as_ref().map(|active| active.id)
    }

    /// Latest snapshot of the running session
    pub fn snapshot(&self) -> Option<DetectionSnapshot> {
        self.lock().as_ref().map(|active| active.session.snapshot())
    }

    /// Up to `count` most recent observations, oldest first
    pub fn recent_observations(&self, count: usize) -> Option<Vec<Observation>> {
        self.lock()
            .as_ref()
            .map(|active| active.session.history().recent_window(count).copied().collect())
    }

    /// Configuration of the running session
    pub fn config(&self) -> Option<DmsConfig> {
        self.lock().as_ref().map(|active| active.session.config().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::EyeReading;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn closed() -> Frame {
        Frame::new(vec![EyeReading::new(0, 0, false, 0.9)])
    }

    #[test]
    fn test_tick_before_start() {
        let monitor = Monitor::new();
        assert_eq!(monitor.tick(&closed()).unwrap_err(), DmsError::SessionNotStarted);
        assert_eq!(monitor.status(), SessionStatus::Stopped);
    }

    #[test]
    fn test_tick_after_stop() {
        let monitor = Monitor::new();
        monitor.start(DmsConfig::default()).unwrap();
        monitor.tick(&closed()).unwrap();
        assert!(monitor.stop().is_some());
        assert_eq!(monitor.tick(&closed()).unwrap_err(), DmsError::SessionNotStarted);
        assert!(monitor.snapshot().is_none());
    }

    #[test]
    fn test_double_start_rejected() {
        let monitor = Monitor::new();
        monitor.start(DmsConfig::default()).unwrap();
        assert_eq!(
            monitor.start(DmsConfig::default()).unwrap_err(),
            DmsError::SessionAlreadyStarted
        );
    }

    #[test]
    fn test_invalid_config_leaves_monitor_stopped() {
        let monitor = Monitor::new();
        let config = DmsConfig {
            sampling_period_ms: 0,
            ..Default::default()
        };
        assert!(matches!(monitor.start(config), Err(DmsError::InvalidConfig(_))));
        assert_eq!(monitor.status(), SessionStatus::Stopped);
    }

    #[test]
    fn test_restart_is_fresh() {
        let monitor = Monitor::new();
        monitor.start(DmsConfig::default()).unwrap();
        for _ in 0..10 {
            monitor.tick(&closed()).unwrap();
        }
        monitor.stop();

        let first = monitor.start(DmsConfig::default()).unwrap();
        assert_eq!(monitor.snapshot(), Some(DetectionSnapshot::default()));
        assert_eq!(monitor.recent_observations(30), Some(vec![]));
        assert_eq!(monitor.session_id(), Some(first));
    }

    #[test]
    fn test_tick_session_rejects_replaced_session() {
        let monitor = Monitor::new();
        let first = monitor.start(DmsConfig::default()).unwrap();
        assert!(monitor.tick_session(first, &closed()).is_ok());

        monitor.stop();
        let second = monitor.start(DmsConfig::default()).unwrap();

        assert_eq!(
            monitor.tick_session(first, &closed()).unwrap_err(),
            DmsError::SessionNotStarted
        );
        assert_eq!(monitor.snapshot().unwrap().tick, 0);
        assert_eq!(monitor.tick_session(second, &closed()).unwrap().snapshot.tick, 1);
    }

    #[test]
    fn test_overlapping_tick_rejected() {
        let monitor = Monitor::new();
        monitor.start(DmsConfig::default()).unwrap();

        // Simulate a tick in flight
        monitor.ticking.store(true, Ordering::Release);
        assert_eq!(monitor.tick(&closed()).unwrap_err(), DmsError::ReentrantTick);

        monitor.ticking.store(false, Ordering::Release);
        assert!(monitor.tick(&closed()).is_ok());
    }

    #[test]
    fn test_stop_waits_for_session_lock() {
        let monitor = Arc::new(Monitor::new());
        monitor.start(DmsConfig::default()).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let held = {
            let monitor = Arc::clone(&monitor);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let slot = monitor.lock();
                barrier.wait();
                thread::sleep(std::time::Duration::from_millis(50));
                slot.as_ref().map(|active| active.session.ticks())
            })
        };

        barrier.wait();
        // Blocks until the other thread releases the session
        let final_snapshot = monitor.stop();
        assert!(final_snapshot.is_some());
        assert_eq!(held.join().unwrap(), Some(0));
        assert_eq!(monitor.status(), SessionStatus::Stopped);
    }

    #[test]
    fn test_concurrent_ticks_never_interleave() {
        let monitor = Arc::new(Monitor::new());
        monitor.start(DmsConfig::default()).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let monitor = Arc::clone(&monitor);
                thread::spawn(move || {
                    (0..50)
                        .filter(|_| monitor.tick(&closed()).is_ok())
                        .count()
                })
            })
            .collect();
        let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        let snapshot = monitor.snapshot().unwrap();
        assert_eq!(snapshot.tick, accepted as u64);
        assert_eq!(monitor.recent_observations(30).unwrap().len(), accepted.min(30));
    }
}
