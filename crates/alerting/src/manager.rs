//! Alert Manager Implementation

use crate::sink::AlertSink;
use dms::{AlertEvent, TickOutcome};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Banner shown to the driver on a delivered alert
pub const DROWSINESS_MESSAGE: &str = "DRIVER DROWSINESS DETECTED - PLEASE TAKE A BREAK!";

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Minimum gap between delivered alerts (seconds)
    pub cooldown_seconds: u64,
    /// Maximum alerts delivered per hour before throttling
    pub max_alerts_per_hour: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 30,
            max_alerts_per_hour: 20,
        }
    }
}

/// Notification handed to sinks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertNotification {
    /// Alert number within the session
    pub alert_number: u64,
    pub tick: u64,
    pub timestamp_ms: u64,
    /// Display heuristic at the time of the alert
    pub accuracy_percent: f64,
    pub message: String,
}

/// State of a delivered alert
#[derive(Debug, Clone)]
pub struct AlertState {
    /// When it was delivered
    pub delivered_at: Instant,
    /// Whether the driver acknowledged it
    pub acknowledged: bool,
}

/// Alert manager for throttling and delivery
pub struct AlertManager {
    config: AlertConfig,
    sinks: Vec<Box<dyn AlertSink>>,
    /// Delivered alerts by alert number
    states: BTreeMap<u64, AlertState>,
    last_delivered: Option<Instant>,
    /// Alerts delivered in current hour
    hourly_count: usize,
    hour_start: Instant,
    suppressed: u64,
}

impl AlertManager {
    /// Create a new alert manager
    pub fn new(config: AlertConfig) -> Self {
        info!("Creating alert manager with config: {:?}", config);
        Self {
            config,
            sinks: Vec::new(),
            states: BTreeMap::new(),
            last_delivered: None,
            hourly_count: 0,
            hour_start: Instant::now(),
            suppressed: 0,
        }
    }

    /// Register a delivery target
    pub fn add_sink(&mut self, sink: Box<dyn AlertSink>) {
        info!("Registered alert sink: {}", sink.name());
        self.sinks.push(sink);
    }

    /// Builder-style sink registration
    pub fn with_sink(mut self, sink: Box<dyn AlertSink>) -> Self {
        self.add_sink(sink);
        self
    }

    /// Check whether an alert may be delivered at `now`
    pub fn should_deliver_at(&mut self, now: Instant) -> bool {
        // Reset hourly counter if needed
        if now.saturating_duration_since(self.hour_start) > Duration::from_secs(3600) {
            self.hourly_count = 0;
            self.hour_start = now;
        }

        if self.hourly_count >= self.config.max_alerts_per_hour {
            warn!("Alert throttled: max alerts per hour reached");
            return false;
        }

        if let Some(last) = self.last_delivered {
            let cooldown = Duration::from_secs(self.config.cooldown_seconds);
            if now.saturating_duration_since(last) < cooldown {
                debug!("Alert suppressed: in cooldown period");
                return false;
            }
        }

        true
    }

    /// Handle a tick outcome; delivers a notification on a permitted rising edge
    pub fn process(&mut self, outcome: &TickOutcome) -> Option<AlertNotification> {
        let event = outcome.alert_rising_edge?;
        self.process_event_at(&event, outcome.snapshot.accuracy_percent, Instant::now())
    }

    /// Handle a rising edge observed at `now`
    pub fn process_event_at(
        &mut self,
        event: &AlertEvent,
        accuracy_percent: f64,
        now: Instant,
    ) -> Option<AlertNotification> {
        if !self.should_deliver_at(now) {
            self.suppressed += 1;
            return None;
        }

        let notification = AlertNotification {
            alert_number: event.alert_number,
            tick: event.tick,
            timestamp_ms: event.timestamp_ms,
            accuracy_percent,
            message: DROWSINESS_MESSAGE.to_string(),
        };
        self.record_delivery(event.alert_number, now);

        for sink in &self.sinks {
            if let Err(err) = sink.deliver(&notification) {
                warn!("Alert #{} not delivered: {}", event.alert_number, err);
            }
        }

        Some(notification)
    }

    fn record_delivery(&mut self, alert_number: u64, now: Instant) {
        self.hourly_count += 1;
        self.last_delivered = Some(now);
        self.states.insert(
            alert_number,
            AlertState {
                delivered_at: now,
                acknowledged: false,
            },
        );
        info!("Alert delivered: #{} (hourly count: {})", alert_number, self.hourly_count);
    }

    /// Acknowledge an alert
    pub fn acknowledge(&mut self, alert_number: u64) -> bool {
        if let Some(state) = self.states.get_mut(&alert_number) {
            state.acknowledged = true;
            info!("Alert acknowledged: #{}", alert_number);
            true
        } else {
            false
        }
    }

    /// Delivered alerts not yet acknowledged, oldest first
    pub fn pending(&self) -> Vec<(u64, &AlertState)> {
        self.states
            .iter()
            .filter(|(_, state)| !state.acknowledged)
            .map(|(number, state)| (*number, state))
            .collect()
    }

    /// Get hourly alert count
    pub fn hourly_count(&self) -> usize {
        self.hourly_count
    }

    /// Rising edges that were not delivered
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// Clear all alert state (on session stop); sinks stay registered
    pub fn clear(&mut self) {
        self.states.clear();
        self.last_delivered = None;
        self.hourly_count = 0;
        self.hour_start = Instant::now();
        self.suppressed = 0;
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}
