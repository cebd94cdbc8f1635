//! Fixed-period tick driver
//!
//! Pulls one frame of readings per sampling period from an external source
//! and ticks the shared `Monitor`. Outcomes are forwarded on a channel to the
//! presentation and alerting consumers.

use crate::analysis::TickOutcome;
use crate::monitor::Monitor;
use crate::observation::Frame;
use crate::DmsError;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Producer of per-tick eye readings
///
/// Implementations collect every classification for a frame before
/// returning it. `None` ends the stream.
pub trait ObservationSource: Send {
    fn next_frame(&mut self) -> Option<Frame>;
}

/// Source replaying prerecorded frames in order
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    frames: VecDeque<Frame>,
}

impl ReplaySource {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl ObservationSource for ReplaySource {
    fn next_frame(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }
}

/// Frames pushed from another task
impl ObservationSource for mpsc::Receiver<Frame> {
    fn next_frame(&mut self) -> Option<Frame> {
        match self.try_recv() {
            Ok(frame) => Some(frame),
            // Nothing classified this period
            Err(mpsc::error::TryRecvError::Empty) => Some(Frame::empty()),
            Err(mpsc::error::TryRecvError::Disconnected) => None,
        }
    }
}

/// Drives one tick per sampling period
pub struct TickDriver {
    monitor: Arc<Monitor>,
    period: Duration,
    /// When set, only this session is ticked
    session: Option<Uuid>,
}

impl TickDriver {
    pub fn new(monitor: Arc<Monitor>, period: Duration) -> Self {
        Self {
            monitor,
            period,
            session: None,
        }
    }

    /// Restrict the driver to one session; it exits once that session stops
    pub fn for_session(mut self, id: Uuid) -> Self {
        self.session = Some(id);
        self
    }

    /// Run until the source ends, the receiver goes away or the session stops
    ///
    /// Returns the number of ticks completed. A tick that collides with one
    /// started elsewhere is skipped along with its frame.
    pub async fn run<S: ObservationSource>(
        &self,
        mut source: S,
        outcomes: mpsc::Sender<TickOutcome>,
    ) -> Result<u64, DmsError> {
        info!("Tick driver running every {:?}", self.period);

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut completed = 0u64;

        loop {
            interval.tick().await;

            let Some(frame) = source.next_frame() else {
                info!("Observation source exhausted after {} ticks", completed);
                break;
            };

            let ticked = match self.session {
                Some(id) => self.monitor.tick_session(id, &frame),
                None => self.monitor.tick(&frame),
            };
            match ticked {
                Ok(outcome) => {
                    completed += 1;
                    debug!("Driver tick {} done", completed);
                    if outcomes.send(outcome).await.is_err() {
                        info!("Outcome receiver dropped, stopping driver");
                        break;
                    }
                }
                Err(DmsError::ReentrantTick) => {
                    warn!("Skipping frame: previous tick still in flight");
                }
                Err(DmsError::SessionNotStarted) => {
                    info!("Session stopped, tick driver exiting");
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DmsConfig;
    use crate::observation::EyeReading;

    fn closed_frames(n: usize) -> Vec<Frame> {
        (0..n)
            .map(|_| Frame::new(vec![EyeReading::new(0, 0, false, 0.9)]))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_raises_alert() {
        let monitor = Arc::new(Monitor::new());
        monitor.start(DmsConfig::default()).unwrap();

        let driver = TickDriver::new(Arc::clone(&monitor), Duration::from_millis(100));
        let (tx, mut rx) = mpsc::channel(32);

        let ticks = driver.run(ReplaySource::new(closed_frames(10)), tx).await.unwrap();
        assert_eq!(ticks, 10);

        let mut edges = 0;
        let mut last = None;
        while let Some(outcome) = rx.recv().await {
            if outcome.has_rising_edge() {
                edges += 1;
                assert_eq!(outcome.snapshot.tick, 8);
            }
            last = Some(outcome.snapshot);
        }
        assert_eq!(edges, 1);
        let last = last.unwrap();
        assert!(last.alert_active);
        assert_eq!(last.drowsiness_alerts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exits_when_session_not_running() {
        let monitor = Arc::new(Monitor::new());
        let driver = TickDriver::new(monitor, Duration::from_millis(100));
        let (tx, _rx) = mpsc::channel(4);

        let ticks = driver.run(ReplaySource::new(closed_frames(3)), tx).await.unwrap();
        assert_eq!(ticks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exits_when_receiver_dropped() {
        let monitor = Arc::new(Monitor::new());
        monitor.start(DmsConfig::default()).unwrap();
        let driver = TickDriver::new(Arc::clone(&monitor), Duration::from_millis(100));
        let (tx, rx) = mpsc::channel(4);
        drop(rx);

        let source = ReplaySource::new(closed_frames(5));
        let ticks = driver.run(source, tx).await.unwrap();
        assert_eq!(ticks, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bound_driver_leaves_next_session_alone() {
        let monitor = Arc::new(Monitor::new());
        let first = monitor.start(DmsConfig::default()).unwrap();
        let driver = TickDriver::new(Arc::clone(&monitor), Duration::from_millis(100)).for_session(first);

        let (frame_tx, frame_rx) = mpsc::channel(32);
        for frame in closed_frames(20) {
            frame_tx.send(frame).await.unwrap();
        }
        drop(frame_tx);

        monitor.stop();
        monitor.start(DmsConfig::default()).unwrap();

        let (tx, _rx) = mpsc::channel(32);
        let ticks = driver.run(frame_rx, tx).await.unwrap();
        assert_eq!(ticks, 0);
        assert_eq!(monitor.snapshot().unwrap().tick, 0);
        assert_eq!(monitor.recent_observations(30), Some(vec![]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_source_idles_with_empty_frames() {
        let monitor = Arc::new(Monitor::new());
        monitor.start(DmsConfig::default()).unwrap();
        let driver = TickDriver::new(Arc::clone(&monitor), Duration::from_millis(100));

        let (frame_tx, frame_rx) = mpsc::channel(8);
        let (tx, mut rx) = mpsc::channel(8);

        frame_tx.send(closed_frames(1).remove(0)).await.unwrap();
        let handle = tokio::spawn(async move { driver.run(frame_rx, tx).await });

        let first = rx.recv().await.unwrap();
        assert_eq!(first.snapshot.total_eyes, 1);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.snapshot.total_eyes, 0);

        drop(frame_tx);
        drop(rx);
        assert!(handle.await.unwrap().is_ok());
    }
}
