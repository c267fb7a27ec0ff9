use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const FACE_SCORE_MIN: f64 = 0.4;
pub const FACE_SCORE_MAX: f64 = 0.99;
pub const VOICE_MIN: f64 = -1.0;
pub const VOICE_MAX: f64 = 1.0;
pub const PERCENT_MIN: f64 = 0.0;
pub const PERCENT_MAX: f64 = 100.0;
pub const BLINK_MIN: f64 = 5.0;
pub const BLINK_MAX: f64 = 40.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Emotion {
    Happy,
    Sad,
    Neutral,
    Angry,
    Fear,
    Disgust,
    Surprise,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Neutral,
        Emotion::Angry,
        Emotion::Fear,
        Emotion::Disgust,
        Emotion::Surprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "Happy",
            Emotion::Sad => "Sad",
            Emotion::Neutral => "Neutral",
            Emotion::Angry => "Angry",
            Emotion::Fear => "Fear",
            Emotion::Disgust => "Disgust",
            Emotion::Surprise => "Surprise",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dominant facial emotion and the classifier's confidence in it (0 to 1).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FaceEmotion {
    pub emotion: Emotion,
    pub score: f64,
}

/// One timestamped snapshot of the simulated sensing pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub face_emotion: FaceEmotion,
    /// -1 (negative) to 1 (positive)
    pub voice_emotion_score: f64,
    /// 0 to 100
    pub engagement_score: f64,
    /// 0 to 100
    pub confusion_level: f64,
    /// Blinks per minute, 5 to 40
    pub blink_rate: f64,
}

impl Reading {
    /// Starting point for the very first session.
    pub fn seed(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            face_emotion: FaceEmotion {
                emotion: Emotion::Neutral,
                score: 0.8,
            },
            voice_emotion_score: 0.1,
            engagement_score: 85.0,
            confusion_level: 10.0,
            blink_rate: 15.0,
        }
    }

    pub fn dominant_emotion(&self) -> Emotion {
        self.face_emotion.emotion
    }

    pub fn within_bounds(&self) -> bool {
        let face = self.face_emotion.score;
        (FACE_SCORE_MIN..=FACE_SCORE_MAX).contains(&face)
            && (VOICE_MIN..=VOICE_MAX).contains(&self.voice_emotion_score)
            && (PERCENT_MIN..=PERCENT_MAX).contains(&self.engagement_score)
            && (PERCENT_MIN..=PERCENT_MAX).contains(&self.confusion_level)
            && (BLINK_MIN..=BLINK_MAX).contains(&self.blink_rate)
    }
}
