//! Alert delivery targets

use crate::manager::AlertNotification;
use crate::AlertError;
use tokio::sync::mpsc;
use tracing::warn;

/// Receives delivered alerts
///
/// `deliver` must not block; the manager calls it from the tick path.
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &str;

    fn deliver(&self, notification: &AlertNotification) -> Result<(), AlertError>;
}

/// Writes alerts to the log
#[derive(Debug, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn deliver(&self, notification: &AlertNotification) -> Result<(), AlertError> {
        warn!(
            alert = notification.alert_number,
            tick = notification.tick,
            "{}",
            notification.message
        );
        Ok(())
    }
}

/// Forwards alerts to a channel (e.g. a recording trigger or push notifier)
#[derive(Debug)]
pub struct ChannelSink {
    name: String,
    tx: mpsc::Sender<AlertNotification>,
}

impl ChannelSink {
    pub fn new(name: impl Into<String>, tx: mpsc::Sender<AlertNotification>) -> Self {
        Self {
            name: name.into(),
            tx,
        }
    }
}

impl AlertSink for ChannelSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn deliver(&self, notification: &AlertNotification) -> Result<(), AlertError> {
        self.tx.try_send(notification.clone()).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => AlertError::SinkFull(self.name.clone()),
            mpsc::error::TrySendError::Closed(_) => AlertError::SinkClosed(self.name.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> AlertNotification {
        AlertNotification {
            alert_number: 1,
            tick: 8,
            timestamp_ms: 800,
            accuracy_percent: 99.5,
            message: "wake up".to_string(),
        }
    }

    #[test]
    fn test_channel_sink_errors() {
        let (tx, rx) = mpsc::channel(1);
        let sink = ChannelSink::new("recorder", tx);

        assert!(sink.deliver(&notification()).is_ok());
        assert_eq!(
            sink.deliver(&notification()),
            Err(AlertError::SinkFull("recorder".to_string()))
        );

        drop(rx);
        assert_eq!(
            sink.deliver(&notification()),
            Err(AlertError::SinkClosed("recorder".to_string()))
        );
    }

    #[test]
    fn test_log_sink() {
        assert!(LogSink.deliver(&notification()).is_ok());
        assert_eq!(LogSink.name(), "log");
    }
}
