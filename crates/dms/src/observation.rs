//! Eye observations delivered by the external classifier

use serde::{Deserialize, Serialize};

/// Open probability above which the classifier output reads as "open"
pub const OPEN_PROBABILITY_CUTOFF: f64 = 0.5;

/// Confidence above which a closed reading is drawn as confidently closed
pub const CONFIDENT_CLOSED: f64 = 0.7;

/// One classified eye region, as delivered for a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeReading {
    /// Face index within the frame
    pub face_index: u32,
    /// Eye index within the face
    pub eye_index: u32,
    /// Classifier verdict
    pub is_open: bool,
    /// Confidence in the verdict (expected 0-1)
    pub confidence: f64,
}

impl EyeReading {
    /// Create a reading from an explicit verdict
    pub fn new(face_index: u32, eye_index: u32, is_open: bool, confidence: f64) -> Self {
        Self {
            face_index,
            eye_index,
            is_open,
            confidence,
        }
    }

    /// Create a reading from the classifier's open-eye probability
    ///
    /// Confidence is expressed in the direction of the verdict, so a very
    /// closed eye (probability near 0) is also a confident reading.
    pub fn from_open_probability(face_index: u32, eye_index: u32, open_probability: f64) -> Self {
        let is_open = open_probability > OPEN_PROBABILITY_CUTOFF;
        let confidence = if is_open {
            open_probability
        } else {
            1.0 - open_probability
        };
        Self::new(face_index, eye_index, is_open, confidence)
    }

    /// Overlay label for this reading
    pub fn label(&self) -> EyeLabel {
        if self.is_open {
            EyeLabel::Open
        } else if self.confidence > CONFIDENT_CLOSED {
            EyeLabel::Closed
        } else {
            EyeLabel::Uncertain
        }
    }
}

/// Display classification of a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeLabel {
    Open,
    Closed,
    /// Closed verdict with a weak probability
    Uncertain,
}

/// All readings for one tick, in fold order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<EyeReading>", into = "Vec<EyeReading>")]
pub struct Frame {
    readings: Vec<EyeReading>,
}

impl Frame {
    /// Build a frame, ordering readings by face then by eye
    ///
    /// The sort is stable, so a source that already delivers in order is
    /// left untouched and duplicates keep their delivery order.
    pub fn new(mut readings: Vec<EyeReading>) -> Self {
        readings.sort_by_key(|r| (r.face_index, r.eye_index));
        Self { readings }
    }

    /// Frame with no detected eyes
    pub fn empty() -> Self {
        Self::default()
    }

    /// Readings in fold order
    pub fn readings(&self) -> &[EyeReading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl From<Vec<EyeReading>> for Frame {
    fn from(readings: Vec<EyeReading>) -> Self {
        Self::new(readings)
    }
}

impl From<Frame> for Vec<EyeReading> {
    fn from(frame: Frame) -> Self {
        frame.readings
    }
}

impl FromIterator<EyeReading> for Frame {
    fn from_iter<I: IntoIterator<Item = EyeReading>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Observation folded into a session's history
///
/// Created only by the session, after the confidence has been validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    is_open: bool,
    confidence: f64,
    timestamp_ms: u64,
}

impl Observation {
    pub(crate) fn new(is_open: bool, confidence: f64, timestamp_ms: u64) -> Self {
        Self {
            is_open,
            confidence,
            timestamp_ms,
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Tick timestamp (ms since epoch)
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_mapping() {
        let open = EyeReading::from_open_probability(0, 0, 0.92);
        assert!(open.is_open);
        assert!((open.confidence - 0.92).abs() < 1e-9);

        let closed = EyeReading::from_open_probability(0, 1, 0.1);
        assert!(!closed.is_open);
        assert!((closed.confidence - 0.9).abs() < 1e-9);

        // The cutoff itself reads as closed
        let edge = EyeReading::from_open_probability(0, 0, 0.5);
        assert!(!edge.is_open);
        assert!((edge.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_labels() {
        assert_eq!(EyeReading::from_open_probability(0, 0, 0.8).label(), EyeLabel::Open);
        assert_eq!(EyeReading::from_open_probability(0, 0, 0.2).label(), EyeLabel::Closed);
        assert_eq!(EyeReading::from_open_probability(0, 0, 0.4).label(), EyeLabel::Uncertain);
    }

    #[test]
    fn test_frame_orders_by_face_then_eye() {
        let frame = Frame::new(vec![
            EyeReading::new(1, 0, true, 0.9),
            EyeReading::new(0, 1, false, 0.8),
            EyeReading::new(0, 0, true, 0.7),
            EyeReading::new(1, 1, false, 0.6),
        ]);

        let order: Vec<(u32, u32)> = frame
            .readings()
            .iter()
            .map(|r| (r.face_index, r.eye_index))
            .collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_frame_deserializes_from_list() {
        let frame: Frame = serde_json::from_str(
            r#"[
                {"face_index": 0, "eye_index": 1, "is_open": false, "confidence": 0.9},
                {"face_index": 0, "eye_index": 0, "is_open": true, "confidence": 0.8}
            ]"#,
        )
        .unwrap();

        assert_eq!(frame.len(), 2);
        assert_eq!(frame.readings()[0].eye_index, 0);
    }
}
